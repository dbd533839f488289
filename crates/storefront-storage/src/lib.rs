//! Storefront Storage Library
//!
//! This crate provides the storage side of the upload pipeline: random storage
//! names, the `Storage` trait and the local-disk implementation.
//!
//! # Layout
//!
//! Uploads are kept in one flat directory. Names are single path components
//! (`{32 hex chars}{.ext}`); the directory holds no manifest.

pub mod factory;
pub mod local;
pub mod names;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use names::{NameGenerator, RandomNameGenerator};
pub use traits::{ByteStream, Storage, StorageError, StorageResult, StoredFile};
