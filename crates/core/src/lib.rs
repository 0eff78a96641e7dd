//! # Mirador Core
//!
//! Business logic for Mirador.
//!
//! This crate contains:
//! - The ERP access port and the typed query layer over it
//! - Company resolution (directory, alias table, filter building)
//! - Report routines (financial, CRM, HR, subscriptions)
//! - Assistant tool catalog and dispatch
//!
//! ## Architecture
//! - Depends only on `mirador-domain`
//! - Defines the ports implemented by `mirador-infra`
//! - No I/O besides what flows through the ports

pub mod assistant;
pub mod erp;
pub mod reports;
pub mod resolver;

pub use assistant::{tool_catalog, AssistantTools, ToolSpec};
pub use erp::{ErpClient, Many2one, ReadGroupRow, SearchReadOptions};
pub use resolver::{CompanyFilter, CompanyMatch, CompanyResolver};

#[cfg(test)]
pub(crate) mod test_support;
