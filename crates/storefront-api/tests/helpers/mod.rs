//! Test helpers: build the router over a temporary upload directory.
//!
//! Run from workspace root: `cargo test -p storefront-api`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use axum_test::TestServer;
use storefront_api::setup::{build_app, initialize_app};
use storefront_core::{Config, Locale, UploadConfig};
use storefront_storage::{LocalStorage, Storage};
use tempfile::TempDir;

/// Test application: server plus the directory uploads land in.
pub struct TestApp {
    pub server: TestServer,
    pub upload_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of the files currently stored.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.upload_dir)
            .expect("read upload dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

/// Configuration used by most tests: defaults over a fresh directory.
pub fn create_test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.upload = UploadConfig {
        temp_dir: temp_dir.path().join("uploads"),
        ..UploadConfig::default()
    };
    config
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup a test app after letting the caller adjust the configuration.
pub async fn setup_test_app_with<F>(configure: F) -> TestApp
where
    F: FnOnce(&mut Config),
{
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let mut config = create_test_config(&temp_dir);
    configure(&mut config);

    let (state, router) = initialize_app(config)
        .await
        .expect("Failed to initialize app");
    let upload_dir = state.storage().base_path().to_path_buf();

    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        upload_dir,
        _temp_dir: temp_dir,
    }
}

pub async fn setup_test_app_with_locale(locale: Locale) -> TestApp {
    setup_test_app_with(|config| config.server.locale = locale).await
}

/// Setup a test app over a storage backend wrapping the local one.
pub async fn setup_test_app_with_storage<F, S>(wrap: F) -> TestApp
where
    F: FnOnce(LocalStorage) -> S,
    S: Storage + 'static,
{
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = create_test_config(&temp_dir);

    let local = LocalStorage::new(&config.upload.temp_dir)
        .await
        .expect("Failed to create local storage");
    let upload_dir = local.base_path().to_path_buf();
    let storage: Arc<dyn Storage> = Arc::new(wrap(local));

    let (_state, router) = build_app(&config, storage).expect("Failed to build app");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        upload_dir,
        _temp_dir: temp_dir,
    }
}
