//! Storage abstraction trait
//!
//! This module defines the Storage trait implemented by the upload sink.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use storefront_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The stream carried more than the allowed number of bytes.
    #[error("File exceeds the maximum size of {max} bytes")]
    TooLarge { max: u64 },

    /// The incoming byte stream failed before it was fully read.
    #[error("Upload stream failed: {0}")]
    StreamError(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked request body handed to the sink.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send + 'a>>;

/// A file written by the sink. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated storage name (random token + normalized extension)
    pub name: String,
    /// Absolute path on disk
    pub path: PathBuf,
    /// Bytes written
    pub size: u64,
}

/// Storage abstraction trait
///
/// Names are single path components inside a flat directory; anything that
/// could address a file outside of it is rejected with `InvalidName`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `stream` into a new file called `name`.
    ///
    /// Fails with `AlreadyExists` if the name is taken and with `TooLarge` as
    /// soon as the next chunk would push the file past `max_bytes`. On any
    /// error the partially written file is removed.
    async fn write_stream<'a>(
        &self,
        name: &str,
        max_bytes: u64,
        stream: ByteStream<'a>,
    ) -> StorageResult<StoredFile>;

    /// Read a stored file back into memory
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Delete a stored file. Deleting a missing file is not an error.
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Check that the backing directory can currently accept writes
    async fn health_check(&self) -> StorageResult<()>;

    /// Directory files are stored in
    fn base_path(&self) -> &Path;
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { max } => AppError::PayloadTooLarge { max },
            StorageError::StreamError(msg) => AppError::BadRequest(msg),
            StorageError::NotFound(name) => AppError::NotFound(name),
            other => AppError::Internal(other.to_string()),
        }
    }
}
