use crate::names::random_token;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredFile};
use async_trait::async_trait;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Files live directly under `base_path`; there are no sub-directories.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the directory if needed.
    ///
    /// # Arguments
    /// * `base_path` - Directory uploads are written to (e.g., "public/temp")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let base_path = fs::canonicalize(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert a file name to a path inside the storage directory
    ///
    /// Only plain names are accepted: no separators, no parent references and
    /// no hidden files.
    fn name_to_path(&self, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\', '\0'])
            || name.contains("..")
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        Ok(self.base_path.join(name))
    }
}

/// Removes a file on drop unless disarmed. Covers error returns and a request
/// future being dropped mid-write.
struct PartialFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed partial upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove partial upload"
            ),
        }
    }
}

/// Copy `stream` into `file`, refusing any chunk that would take the total past `max_bytes`.
async fn copy_capped(
    mut file: fs::File,
    path: &Path,
    max_bytes: u64,
    mut stream: ByteStream<'_>,
) -> StorageResult<u64> {
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let len = chunk.len() as u64;

        if written.saturating_add(len) > max_bytes {
            tracing::debug!(
                path = %path.display(),
                written_bytes = written,
                max_bytes,
                "Upload exceeded size ceiling, aborting write"
            );
            return Err(StorageError::TooLarge { max: max_bytes });
        }

        file.write_all(&chunk).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        written += len;
    }

    file.flush().await?;
    file.sync_all().await.map_err(|e| {
        StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
    })?;

    Ok(written)
}

#[async_trait]
impl Storage for LocalStorage {
    async fn write_stream<'a>(
        &self,
        name: &str,
        max_bytes: u64,
        stream: ByteStream<'a>,
    ) -> StorageResult<StoredFile> {
        let path = self.name_to_path(name)?;
        let start = Instant::now();

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(name.to_string()),
                _ => StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                )),
            })?;

        // Armed only after create_new succeeded, so an existing file is never touched.
        let guard = PartialFileGuard::new(path.clone());

        match copy_capped(file, &path, max_bytes, stream).await {
            Ok(size) => {
                guard.disarm();

                tracing::info!(
                    path = %path.display(),
                    name = %name,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream write successful"
                );

                Ok(StoredFile {
                    name: name.to_string(),
                    path,
                    size,
                })
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream write failed"
                );
                Err(e)
            }
        }
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.name_to_path(name)?;
        let start = Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::ReadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(data)
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.name_to_path(name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.name_to_path(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let probe = self.base_path.join(format!(".ready-{}", random_token()));

        fs::write(&probe, b"ok").await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Storage directory {} is not writable: {}",
                self.base_path.display(),
                e
            ))
        })?;
        fs::remove_file(&probe).await?;

        Ok(())
    }

    fn base_path(&self) -> &Path {
        &self.base_path
    }
}
