//! Storefront Core Library
//!
//! This crate provides the configuration, error types, localized client messages
//! and shared models used by every storefront upload component.

pub mod config;
pub mod error;
pub mod messages;
pub mod models;

// Re-export commonly used types
pub use config::{Config, ServerConfig, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use messages::{Locale, MessageKey};
pub use models::UploadResult;
