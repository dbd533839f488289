//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. The error is rendered with a
//! default body and also attached to the response, where the error handler
//! middleware picks it up, logs it once and renders the final body in the
//! deployment's language.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use storefront_core::{AppError, ErrorMetadata, Locale, LogLevel};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message in the configured language
    pub message: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: IntoResponse and AppError both live in other crates)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

/// The error behind a response, left for the error handler middleware.
#[derive(Debug, Clone)]
pub struct ErrorExtension(pub Arc<AppError>);

/// Build the JSON error response for `error`.
///
/// Details are only exposed outside production and never for sensitive errors;
/// internal failures always carry the generic message.
pub fn render_error(error: &AppError, locale: Locale, is_production: bool) -> Response {
    let status =
        StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let show_details = !is_production && !error.is_sensitive();

    let body = ErrorResponse {
        message: error.client_message(locale),
        code: error.error_code().to_string(),
        details: show_details.then(|| error.detailed_message()),
        error_type: show_details.then(|| error.error_type().to_string()),
        suggested_action: error.suggested_action().map(String::from),
    };

    (status, Json(body)).into_response()
}

pub fn log_error(error: &AppError, request_id: Option<&str>) {
    let error_type = error.error_type();
    let request_id = request_id.unwrap_or("-");
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, request_id, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, request_id, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_type,
                request_id,
                "Error occurred"
            );
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let mut response = render_error(&self.0, Locale::default(), true);
        response
            .extensions_mut()
            .insert(ErrorExtension(Arc::new(self.0)));
        response
    }
}
