//! Odoo JSON-RPC client
//!
//! The pieces stack bottom-up: [`transport::JsonRpcTransport`] speaks the
//! wire protocol, [`session::SessionManager`] owns authentication and the
//! poisoned-session replay, and [`client::OdooClient`] adds the result
//! cache and in-flight deduplication behind the `ErpClient` port.

pub mod cache;
pub mod client;
pub mod dedup;
pub mod session;
pub mod transport;

pub use cache::ResultCache;
pub use client::OdooClient;
pub use dedup::InflightRegistry;
pub use session::SessionManager;
pub use transport::{JsonRpcTransport, RpcError};
