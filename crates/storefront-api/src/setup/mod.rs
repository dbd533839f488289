//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use storefront_core::Config;
use storefront_storage::Storage;

/// Build storage, pipeline and router from a validated configuration.
///
/// Tracing is not initialized here so tests can build the app repeatedly.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    let storage = storefront_storage::create_storage(&config.upload)
        .await
        .context("Failed to initialize upload storage")?;

    build_app(&config, storage)
}

/// Build state and router over an already initialized storage backend.
pub fn build_app(
    config: &Config,
    storage: Arc<dyn Storage>,
) -> Result<(Arc<AppState>, axum::Router)> {
    let state = Arc::new(AppState::new(config.upload.clone(), storage));
    let router = routes::setup_routes(config, state.clone())?;

    Ok((state, router))
}
