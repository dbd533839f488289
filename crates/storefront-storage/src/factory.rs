use crate::{LocalStorage, Storage, StorageResult};
use std::sync::Arc;
use storefront_core::UploadConfig;

/// Create the storage backend uploads are written to
pub async fn create_storage(config: &UploadConfig) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(&config.temp_dir).await?;

    tracing::info!(
        path = %storage.base_path().display(),
        "Local upload storage initialized"
    );

    Ok(Arc::new(storage))
}
