//! # Mirador API
//!
//! HTTP layer - route handlers and the binary entry point.
//!
//! This crate contains:
//! - The axum route table (dashboard → data layer bridge)
//! - Application context (dependency injection)
//! - Domain-error to HTTP-status mapping
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Handlers stay thin; all business logic lives in `core`

pub mod context;
pub mod error;
pub mod routes;

// Re-export for convenience
pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use routes::router;
