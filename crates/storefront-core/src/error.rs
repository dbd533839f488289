//! Error types module
//!
//! This module provides the closed set of errors the upload service can surface.
//! Crate-local errors (storage, validation, decoding) convert into `AppError`,
//! and the HTTP layer renders it through the `ErrorMetadata` trait.

use std::io;

use crate::messages::{Locale, MessageKey};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like rejected uploads
    Debug,
    /// Warning level - for client errors worth noticing
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_TOO_SMALL")
    fn error_code(&self) -> &'static str;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message in the given language
    fn client_message(&self, locale: Locale) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing file field, or a file refused by the type filter.
    #[error("No file attached")]
    NoFileAttached,

    #[error("File too small: {size} bytes, minimum is {min} bytes")]
    FileTooSmall { size: u64, min: u64 },

    #[error("File too large: maximum is {max} bytes")]
    PayloadTooLarge { max: u64 },

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (u16, &'static str, Option<&'static str>, bool, LogLevel) {
    match err {
        AppError::NoFileAttached => (
            400,
            "NO_FILE_ATTACHED",
            Some("Attach an image in the 'file' form field"),
            false,
            LogLevel::Debug,
        ),
        AppError::FileTooSmall { .. } => (
            400,
            "FILE_TOO_SMALL",
            Some("Upload a larger image"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge { .. } => (
            413,
            "PAYLOAD_TOO_LARGE",
            Some("Reduce file size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidImage(_) => (
            400,
            "INVALID_IMAGE",
            Some("Check image format and try a different file"),
            false,
            LogLevel::Warn,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (404, "NOT_FOUND", None, false, LogLevel::Debug),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::NoFileAttached => "NoFileAttached",
            AppError::FileTooSmall { .. } => "FileTooSmall",
            AppError::PayloadTooLarge { .. } => "PayloadTooLarge",
            AppError::InvalidImage(_) => "InvalidImage",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    pub fn message_key(&self) -> MessageKey {
        match self {
            AppError::NoFileAttached => MessageKey::NoFileAttached,
            AppError::FileTooSmall { .. } => MessageKey::FileTooSmall,
            AppError::PayloadTooLarge { .. } => MessageKey::FileTooLarge,
            AppError::InvalidImage(_) => MessageKey::InvalidImage,
            AppError::BadRequest(_) => MessageKey::BadRequest,
            AppError::NotFound(_) => MessageKey::NotFound,
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                MessageKey::InternalError
            }
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self, locale: Locale) -> String {
        locale.message(self.message_key()).to_string()
    }
}
