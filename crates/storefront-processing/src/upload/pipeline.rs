//! Upload pipeline: type filter → disk sink → post-write decode → response.
//!
//! Each stage can end the request. Nothing written by a rejected request is
//! left on disk: the sink removes partial files itself, and anything rejected
//! after a complete write is deleted here before the error is returned.

use std::sync::Arc;

use storefront_core::{AppError, UploadConfig, UploadResult};
use storefront_storage::{NameGenerator, RandomNameGenerator, Storage, StorageError, StoredFile};

use super::types::{RejectionPoint, UploadRequest, UploadStage};
use crate::image::{DecodeError, ImageInfo, ImageProcessor};
use crate::validator::UploadValidator;

/// Fresh names tried before giving up on finding a free one.
const MAX_NAME_ATTEMPTS: usize = 3;

pub struct UploadPipeline {
    config: UploadConfig,
    validator: UploadValidator,
    names: Arc<dyn NameGenerator>,
    storage: Arc<dyn Storage>,
}

impl UploadPipeline {
    pub fn new(config: UploadConfig, storage: Arc<dyn Storage>) -> Self {
        let names = Arc::new(RandomNameGenerator::new(&config.allowed_extensions));
        Self {
            validator: UploadValidator::from_config(&config),
            config,
            names,
            storage,
        }
    }

    pub fn with_name_generator(mut self, names: Arc<dyn NameGenerator>) -> Self {
        self.names = names;
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Run one upload through every stage.
    #[tracing::instrument(
        skip(self, request),
        fields(
            original_name = %request.original_filename,
            content_type = %request.content_type,
            declared_size = ?request.declared_size,
        )
    )]
    pub async fn process(&self, request: UploadRequest<'_>) -> Result<UploadResult, AppError> {
        let UploadRequest {
            original_filename,
            content_type,
            declared_size,
            stream,
        } = request;

        tracing::debug!(stage = %UploadStage::Received, "Upload received");

        // Refused types are reported as a missing file; the stream is never read.
        if let Err(e) = self.validator.validate_content_type(&content_type) {
            return Err(reject(RejectionPoint::Received, e.into()));
        }
        if let Some(size) = declared_size {
            if let Err(e) = self.validator.validate_declared_size(size) {
                return Err(reject(RejectionPoint::Received, e.into()));
            }
        }
        tracing::debug!(stage = %UploadStage::TypeChecked, "Upload admitted");

        let name = self.allocate_name(&original_filename).await?;
        let stored = match self
            .storage
            .write_stream(&name, self.validator.max_file_size(), stream)
            .await
        {
            Ok(stored) => stored,
            Err(e) => return Err(reject(write_rejection_point(&e), e.into())),
        };
        tracing::debug!(
            stage = %UploadStage::Written,
            name = %stored.name,
            size_bytes = stored.size,
            "Upload written"
        );

        let pending = UnconfirmedUpload::new(self.storage.clone(), &stored.name);
        let info = match self.confirm(&stored).await {
            Ok(info) => info,
            Err((at, err)) => {
                pending.discard().await;
                return Err(reject(at, err));
            }
        };
        pending.keep();
        tracing::debug!(
            stage = %UploadStage::Decoded,
            kind = %info.kind,
            width = info.width,
            height = info.height,
            "Upload decoded"
        );

        let result = UploadResult {
            file_name: self.config.public_file_path(&stored.name),
            original_name: original_filename,
        };

        tracing::info!(
            stage = %UploadStage::Composed,
            file_name = %result.file_name,
            size_bytes = stored.size,
            kind = %info.kind,
            "Upload accepted"
        );

        Ok(result)
    }

    /// Pick a name that is not taken yet. `write_stream` still refuses to
    /// overwrite, so a name claimed in between fails the request instead.
    async fn allocate_name(&self, original_filename: &str) -> Result<String, AppError> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let name = self.names.generate(original_filename);
            if !self.storage.exists(&name).await? {
                return Ok(name);
            }
            tracing::warn!(name = %name, attempt, "Generated storage name already taken");
        }

        Err(AppError::Internal(format!(
            "Could not allocate a free storage name after {} attempts",
            MAX_NAME_ATTEMPTS
        )))
    }

    /// Size floor, then decode what is actually on disk.
    async fn confirm(&self, stored: &StoredFile) -> Result<ImageInfo, (RejectionPoint, AppError)> {
        self.validator
            .validate_file_size(stored.size)
            .map_err(|e| (RejectionPoint::Written, AppError::from(e)))?;

        // The file was just written; failing to read it back is a system fault.
        let data = self.storage.read(&stored.name).await.map_err(|e| {
            (
                RejectionPoint::Written,
                AppError::Internal(format!("Failed to read back upload {}: {}", stored.name, e)),
            )
        })?;

        ImageProcessor::extract_dimensions(data)
            .await
            .map_err(|e| (decode_rejection_point(&e), AppError::from(e)))
    }
}

/// A written file that has not been confirmed as an image yet.
///
/// If the request is dropped before `keep` or `discard` runs (client gone,
/// request timeout) the file is removed in the background.
struct UnconfirmedUpload {
    storage: Arc<dyn Storage>,
    name: String,
    armed: bool,
}

impl UnconfirmedUpload {
    fn new(storage: Arc<dyn Storage>, name: &str) -> Self {
        Self {
            storage,
            name: name.to_string(),
            armed: true,
        }
    }

    fn keep(mut self) {
        self.armed = false;
    }

    /// Delete the file before the rejection is returned.
    async fn discard(mut self) {
        if let Err(e) = self.storage.delete(&self.name).await {
            tracing::error!(
                name = %self.name,
                error = %e,
                "Failed to delete rejected upload"
            );
        }
        self.armed = false;
    }
}

impl Drop for UnconfirmedUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let storage = self.storage.clone();
        let name = std::mem::take(&mut self.name);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(name = %name, "Upload abandoned before confirmation, removing");
                handle.spawn(async move {
                    if let Err(e) = storage.delete(&name).await {
                        tracing::error!(name = %name, error = %e, "Failed to delete abandoned upload");
                    }
                });
            }
            Err(_) => {
                tracing::error!(name = %name, "No runtime to delete abandoned upload");
            }
        }
    }
}

/// Size violations are found while writing; anything else means the body never arrived intact.
fn write_rejection_point(err: &StorageError) -> RejectionPoint {
    match err {
        StorageError::TooLarge { .. } => RejectionPoint::Written,
        _ => RejectionPoint::Received,
    }
}

fn decode_rejection_point(err: &DecodeError) -> RejectionPoint {
    match err {
        DecodeError::Task(_) => RejectionPoint::Written,
        _ => RejectionPoint::Decoded,
    }
}

fn reject(at: RejectionPoint, err: AppError) -> AppError {
    tracing::debug!(
        stage = %UploadStage::Rejected { at },
        error = %err,
        "Upload rejected"
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_of_size;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;
    use std::path::Path;
    use std::sync::Mutex;
    use std::task::Poll;
    use std::time::Duration;
    use storefront_storage::{ByteStream, LocalStorage, StorageResult};
    use tempfile::{tempdir, TempDir};

    fn body(data: Vec<u8>) -> ByteStream<'static> {
        let chunks: Vec<_> = data
            .chunks(1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Box::pin(stream::iter(chunks))
    }

    fn untouched_body() -> ByteStream<'static> {
        Box::pin(stream::poll_fn(
            |_| -> Poll<Option<Result<Bytes, StorageError>>> { panic!("stream must not be read") },
        ))
    }

    fn request(name: &str, content_type: &str, stream: ByteStream<'static>) -> UploadRequest<'static> {
        UploadRequest {
            original_filename: name.to_string(),
            content_type: content_type.to_string(),
            declared_size: None,
            stream,
        }
    }

    async fn pipeline_with(config: UploadConfig) -> (UploadPipeline, TempDir) {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (UploadPipeline::new(config, Arc::new(storage)), dir)
    }

    async fn pipeline() -> (UploadPipeline, TempDir) {
        pipeline_with(UploadConfig::default()).await
    }

    fn stored_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn is_generated(name: &str, ext: &str) -> bool {
        let Some(token) = name.strip_suffix(ext) else {
            return false;
        };
        token.len() == 32 && token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    }

    #[tokio::test]
    async fn test_accepts_valid_png() {
        let (pipeline, dir) = pipeline().await;

        let result = pipeline
            .process(request("photo.PNG", "image/png", body(png_of_size(3000))))
            .await
            .unwrap();

        assert_eq!(result.original_name, "photo.PNG");
        let name = result.file_name.strip_prefix('/').unwrap();
        assert!(is_generated(name, ".png"), "unexpected name {}", name);

        let on_disk = std::fs::metadata(dir.path().join(name)).unwrap();
        assert_eq!(on_disk.len(), 3000);
    }

    #[tokio::test]
    async fn test_public_path_prefix() {
        let config = UploadConfig {
            public_path: Some("images".to_string()),
            ..UploadConfig::default()
        };
        let (pipeline, _dir) = pipeline_with(config).await;

        let result = pipeline
            .process(request("cat.png", "image/png", body(png_of_size(4096))))
            .await
            .unwrap();

        let name = result.file_name.strip_prefix("/images/").unwrap();
        assert!(is_generated(name, ".png"));
    }

    #[tokio::test]
    async fn test_disallowed_extension_is_dropped() {
        let (pipeline, _dir) = pipeline().await;

        let result = pipeline
            .process(request("image.php", "image/png", body(png_of_size(3000))))
            .await
            .unwrap();

        assert!(is_generated(result.file_name.strip_prefix('/').unwrap(), ""));
        assert_eq!(result.original_name, "image.php");
    }

    #[tokio::test]
    async fn test_refused_type_is_no_file_and_stream_untouched() {
        let (pipeline, dir) = pipeline().await;

        let err = pipeline
            .process(request("notes.txt", "text/plain", untouched_body()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoFileAttached));
        assert!(stored_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_small_file_is_rejected_and_removed() {
        let (pipeline, dir) = pipeline().await;

        let err = pipeline
            .process(request("tiny.png", "image/png", body(png_of_size(1000))))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::FileTooSmall {
                size: 1000,
                min: 2048
            }
        ));
        assert!(stored_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_floor_applies_before_decoding() {
        let (pipeline, _dir) = pipeline().await;

        let err = pipeline
            .process(request("tiny.gif", "image/gif", body(vec![b'x'; 1000])))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FileTooSmall { .. }));
    }

    #[tokio::test]
    async fn test_oversized_stream_is_aborted() {
        let (pipeline, dir) = pipeline().await;

        let chunk = Bytes::from(vec![0u8; 64 * 1024]);
        let chunks: Vec<_> = (0..161).map(|_| Ok(chunk.clone())).collect();
        let stream: ByteStream<'static> = Box::pin(stream::iter(chunks));

        let err = pipeline
            .process(request("huge.png", "image/png", stream))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge { max } if max == 10 * 1024 * 1024));
        assert!(stored_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_declared_size_over_ceiling_skips_write() {
        let (pipeline, dir) = pipeline().await;

        let mut req = request("huge.png", "image/png", untouched_body());
        req.declared_size = Some(11 * 1024 * 1024);

        let err = pipeline.process(req).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { .. }));
        assert!(stored_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_text_disguised_as_png_is_invalid() {
        let (pipeline, dir) = pipeline().await;

        let text = "plain text pretending to be a picture\n"
            .repeat(100)
            .into_bytes()[..3000]
            .to_vec();

        let err = pipeline
            .process(request("fake.png", "image/png", body(text)))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidImage(_)));
        assert!(stored_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_accepts_svg() {
        let (pipeline, _dir) = pipeline().await;

        let mut svg = String::from(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64" viewBox="0 0 64 64">"#,
        );
        while svg.len() < 3000 {
            svg.push_str(r#"<rect x="1" y="1" width="2" height="2" fill="red"/>"#);
        }
        svg.push_str("</svg>");

        let result = pipeline
            .process(request("logo.SVG", "image/svg+xml", body(svg.into_bytes())))
            .await
            .unwrap();

        assert!(is_generated(result.file_name.strip_prefix('/').unwrap(), ".svg"));
    }

    #[tokio::test]
    async fn test_svg_without_size_is_invalid() {
        let (pipeline, dir) = pipeline().await;

        let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg">"#);
        while svg.len() < 3000 {
            svg.push_str("<g/>");
        }
        svg.push_str("</svg>");

        let err = pipeline
            .process(request("blank.svg", "image/svg+xml", body(svg.into_bytes())))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidImage(_)));
        assert!(stored_files(dir.path()).is_empty());
    }

    struct ScriptedNames(Mutex<Vec<String>>);

    impl NameGenerator for ScriptedNames {
        fn generate(&self, _original_name: &str) -> String {
            self.0.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn test_taken_name_is_regenerated() {
        let (pipeline, dir) = pipeline().await;
        std::fs::write(dir.path().join("taken.png"), b"existing").unwrap();

        let pipeline = pipeline.with_name_generator(Arc::new(ScriptedNames(Mutex::new(vec![
            "taken.png".to_string(),
            "free.png".to_string(),
        ]))));

        let result = pipeline
            .process(request("a.png", "image/png", body(png_of_size(3000))))
            .await
            .unwrap();

        assert_eq!(result.file_name, "/free.png");
        assert_eq!(std::fs::read(dir.path().join("taken.png")).unwrap(), b"existing");
    }

    #[tokio::test]
    async fn test_gives_up_after_repeated_collisions() {
        let (pipeline, dir) = pipeline().await;
        std::fs::write(dir.path().join("taken.png"), b"existing").unwrap();

        let pipeline = pipeline.with_name_generator(Arc::new(ScriptedNames(Mutex::new(
            vec!["taken.png".to_string(); MAX_NAME_ATTEMPTS],
        ))));

        let err = pipeline
            .process(request("a.png", "image/png", untouched_body()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_mixed_case_type_is_refused_without_writing() {
        let (pipeline, dir) = pipeline().await;

        for content_type in ["IMAGE/PNG", "image/svg+xml; charset=utf-8"] {
            let err = pipeline
                .process(request("photo.png", content_type, untouched_body()))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NoFileAttached));
        }
        assert!(stored_files(dir.path()).is_empty());
    }

    #[derive(Clone, Copy)]
    enum ReadBack {
        Fail,
        Hang,
    }

    /// Writes to disk for real, but cannot read files back.
    struct UnreadableStorage {
        inner: LocalStorage,
        read_back: ReadBack,
        deleted: Mutex<Vec<String>>,
    }

    impl UnreadableStorage {
        async fn new(dir: &Path, read_back: ReadBack) -> Self {
            Self {
                inner: LocalStorage::new(dir).await.unwrap(),
                read_back,
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn deleted(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Storage for UnreadableStorage {
        async fn write_stream<'a>(
            &self,
            name: &str,
            max_bytes: u64,
            stream: ByteStream<'a>,
        ) -> StorageResult<StoredFile> {
            self.inner.write_stream(name, max_bytes, stream).await
        }

        async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
            match self.read_back {
                ReadBack::Fail => Err(StorageError::ReadFailed(format!(
                    "disk fault reading /srv/private/{}",
                    name
                ))),
                ReadBack::Hang => std::future::pending().await,
            }
        }

        async fn delete(&self, name: &str) -> StorageResult<()> {
            self.deleted.lock().unwrap().push(name.to_string());
            self.inner.delete(name).await
        }

        async fn exists(&self, name: &str) -> StorageResult<bool> {
            self.inner.exists(name).await
        }

        async fn health_check(&self) -> StorageResult<()> {
            self.inner.health_check().await
        }

        fn base_path(&self) -> &Path {
            self.inner.base_path()
        }
    }

    #[tokio::test]
    async fn test_read_back_fault_is_internal_and_file_removed() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(UnreadableStorage::new(dir.path(), ReadBack::Fail).await);
        let pipeline = UploadPipeline::new(UploadConfig::default(), storage.clone());

        let err = pipeline
            .process(request("photo.png", "image/png", body(png_of_size(3000))))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(storage.deleted().len(), 1);
        assert!(stored_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_upload_is_removed() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(UnreadableStorage::new(dir.path(), ReadBack::Hang).await);
        let pipeline = UploadPipeline::new(UploadConfig::default(), storage.clone());

        let outcome = tokio::time::timeout(
            Duration::from_millis(200),
            pipeline.process(request("photo.png", "image/png", body(png_of_size(3000)))),
        )
        .await;
        assert!(outcome.is_err(), "read-back should never finish");

        for _ in 0..100 {
            if stored_files(dir.path()).is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(storage.deleted().len(), 1);
        assert!(stored_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_accepted_upload_is_kept() {
        let (pipeline, dir) = pipeline().await;

        pipeline
            .process(request("photo.png", "image/png", body(png_of_size(3000))))
            .await
            .unwrap();

        // Nothing scheduled behind the response may remove the file.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stored_files(dir.path()).len(), 1);
    }

    #[test]
    fn test_rejection_points() {
        assert_eq!(
            write_rejection_point(&StorageError::TooLarge { max: 1 }),
            RejectionPoint::Written
        );
        assert_eq!(
            write_rejection_point(&StorageError::StreamError("reset".to_string())),
            RejectionPoint::Received
        );
        assert_eq!(
            decode_rejection_point(&DecodeError::Unrecognized),
            RejectionPoint::Decoded
        );
        assert_eq!(
            decode_rejection_point(&DecodeError::ZeroDimensions { width: 0, height: 4 }),
            RejectionPoint::Decoded
        );
        assert_eq!(
            decode_rejection_point(&DecodeError::Task("panicked".to_string())),
            RejectionPoint::Written
        );
    }
}
