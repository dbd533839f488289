//! Centralized error handling.
//!
//! Every error leaving a handler passes through here exactly once: it is logged
//! at the level its variant asks for and rendered in the configured language.
//! Plain 413 responses produced by the body limit layer are rewritten into the
//! same JSON shape.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use storefront_core::{AppError, Locale};

use super::request_id::get_request_id;
use crate::error::{log_error, render_error, ErrorExtension};

#[derive(Debug, Clone)]
pub struct ErrorHandlerState {
    pub locale: Locale,
    pub is_production: bool,
    pub max_file_size_bytes: u64,
}

pub async fn error_handler_middleware(
    State(state): State<Arc<ErrorHandlerState>>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = get_request_id(&request);
    let mut response = next.run(request).await;

    let error = match response.extensions_mut().remove::<ErrorExtension>() {
        Some(ErrorExtension(error)) => error,
        None if response.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Arc::new(AppError::PayloadTooLarge {
                max: state.max_file_size_bytes,
            })
        }
        None => return response,
    };

    log_error(&error, request_id.as_deref());

    let mut rendered = render_error(&error, state.locale, state.is_production);
    // Keep headers set by inner layers (CORS, etc.) apart from the body ones.
    for (name, value) in response.headers() {
        if name != axum::http::header::CONTENT_TYPE && name != axum::http::header::CONTENT_LENGTH
        {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}
