//! Storage doubles for fault scenarios.

use std::path::Path;

use async_trait::async_trait;
use storefront_storage::{
    ByteStream, LocalStorage, Storage, StorageError, StorageResult, StoredFile,
};

/// Path leaked in the read error; must never reach a client.
pub const PRIVATE_PATH: &str = "/srv/private/uploads";

/// Writes through to disk but fails every read-back.
pub struct UnreadableStorage(pub LocalStorage);

#[async_trait]
impl Storage for UnreadableStorage {
    async fn write_stream<'a>(
        &self,
        name: &str,
        max_bytes: u64,
        stream: ByteStream<'a>,
    ) -> StorageResult<StoredFile> {
        self.0.write_stream(name, max_bytes, stream).await
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        Err(StorageError::ReadFailed(format!(
            "I/O error reading {}/{}",
            PRIVATE_PATH, name
        )))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        self.0.delete(name).await
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        self.0.exists(name).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.0.health_check().await
    }

    fn base_path(&self) -> &Path {
        self.0.base_path()
    }
}
