//! ERP access port and the typed query layer over it.

pub mod ports;
pub mod query;

pub use ports::ErpClient;
pub use query::{
    false_as_none, read_group, search_count, search_read, zero_when_false, Many2one, ReadGroupRow,
    SearchReadOptions,
};
