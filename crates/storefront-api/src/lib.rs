//! Storefront API Library
//!
//! This crate provides the HTTP surface of the upload service: the upload and
//! health handlers, the centralized error handler and application setup.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
