//! Shared application state

use std::sync::Arc;

use storefront_core::UploadConfig;
use storefront_processing::UploadPipeline;
use storefront_storage::Storage;

/// State shared by every handler
pub struct AppState {
    pub pipeline: UploadPipeline,
}

impl AppState {
    pub fn new(upload: UploadConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            pipeline: UploadPipeline::new(upload, storage),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.pipeline.storage()
    }
}
