//! # Mirador Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The Odoo JSON-RPC transport and session handling
//! - Result caching and in-flight call deduplication
//! - Configuration loading (environment first, file fallback)
//!
//! ## Architecture
//! - Implements the `ErpClient` port defined in `mirador-core`
//! - Depends on `mirador-domain` and `mirador-core`
//! - Contains all "impure" code (network I/O, environment, filesystem)

pub mod config;
pub mod odoo;
pub mod time;

// Re-export commonly used items
pub use config::*;
pub use odoo::*;
pub use time::{Clock, MockClock, SystemClock};
