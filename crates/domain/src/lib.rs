//! # Mirador Domain
//!
//! Business domain types and models for Mirador.
//!
//! This crate contains:
//! - Report payload types (P&L, cashflow, CRM, HR, subscriptions)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Date-range and money helpers shared by every report
//!
//! ## Architecture
//! - No dependencies on other Mirador crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod dates;
pub mod errors;
pub mod money;
pub mod reports;

// Re-export commonly used items
pub use config::*;
pub use dates::DateRange;
pub use errors::*;
pub use money::round2;
pub use reports::*;
