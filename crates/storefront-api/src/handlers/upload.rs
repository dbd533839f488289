use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header::CONTENT_LENGTH, StatusCode},
    Json,
};
use futures::StreamExt;
use storefront_core::{AppError, UploadResult};
use storefront_processing::UploadRequest;
use storefront_storage::StorageError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Upload an image
///
/// Streams the `file` field of a multipart form through the upload pipeline.
/// Fields before it are skipped; nothing after it is read. A request without a
/// usable file field, or whose file has a type outside the allow-list, is
/// answered as "no file attached".
#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = UploadResult),
        (status = 400, description = "No file, file too small or invalid image", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResult>), HttpAppError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Request is not a multipart form");
        AppError::NoFileAttached
    })?;

    let max = state.pipeline.config().max_file_size_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::from(stream_error(e, max)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A plain text field named "file" is not a file.
        let Some(original_filename) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let content_type = field.content_type().unwrap_or_default().to_owned();
        let declared_size = field
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let stream = field.map(move |chunk| chunk.map_err(|e| stream_error(e, max)));

        let result = state
            .pipeline
            .process(UploadRequest {
                original_filename,
                content_type,
                declared_size,
                stream: Box::pin(stream),
            })
            .await?;

        return Ok((StatusCode::CREATED, Json(result)));
    }

    Err(AppError::NoFileAttached.into())
}

/// A body that hit the transport length limit counts as too large; any other
/// multipart failure is a malformed request.
fn stream_error(err: MultipartError, max: u64) -> StorageError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StorageError::TooLarge { max }
    } else {
        StorageError::StreamError(err.body_text())
    }
}
