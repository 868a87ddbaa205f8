//! HTTP server layer
//!
//! Axum server with:
//! - Static form page on `/` (and any unmatched path)
//! - Dual-write submit endpoint on `/submit`
//! - Request tracing
//! - Graceful shutdown
//! - Plain-text error responses

pub mod error;
pub mod form;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, ServerConfig};
