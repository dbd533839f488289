//! Route configuration and setup

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use storefront_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api_doc::get_openapi_spec;
use crate::handlers;
use crate::middleware::{error_handler_middleware, request_id_middleware, ErrorHandlerState};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file ceiling.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Top-level path segments owned by API routes.
const RESERVED_SEGMENTS: [&str; 3] = ["upload", "health", "api"];

/// Stored files are served as data, never as active content.
const STATIC_CONTENT_SECURITY_POLICY: &str = "default-src 'none'; style-src 'unsafe-inline'; sandbox";

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let error_state = Arc::new(ErrorHandlerState {
        locale: config.locale(),
        is_production: config.is_production(),
        max_file_size_bytes: config.max_file_size_bytes(),
    });

    let body_limit = request_body_limit(config.max_file_size_bytes())?;

    let storage_dir = state.storage().base_path().to_path_buf();

    let api = Router::new()
        .route("/upload", post(handlers::upload::upload_image))
        .route("/health/live", get(handlers::health::liveness_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(get_openapi_spec()) }),
        )
        .with_state(state);

    let app = mount_static_files(api, config.upload.public_path.as_deref(), &storage_dir)?;

    tracing::info!(
        request_timeout_secs = config.server.request_timeout_secs,
        http_concurrency_limit = config.server.http_concurrency_limit,
        body_limit_bytes = body_limit,
        "HTTP layers configured"
    );

    let app = app
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(from_fn_with_state(error_state, error_handler_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(ConcurrencyLimitLayer::new(
            config.server.http_concurrency_limit,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware));

    Ok(app)
}

/// Serve the upload directory at the public prefix, or at the root when none is set.
fn mount_static_files(
    router: Router,
    public_path: Option<&str>,
    dir: &Path,
) -> Result<Router, anyhow::Error> {
    let files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(STATIC_CONTENT_SECURITY_POLICY),
        ))
        .service(ServeDir::new(dir));

    match public_path {
        Some(prefix) => {
            let first = prefix.split('/').next().unwrap_or(prefix);
            if RESERVED_SEGMENTS.contains(&first) {
                return Err(anyhow::anyhow!(
                    "UPLOAD_PATH '{}' collides with an API route",
                    prefix
                ));
            }
            tracing::info!(prefix = %prefix, dir = %dir.display(), "Serving uploads");
            Ok(router.nest_service(&format!("/{}", prefix), files))
        }
        None => {
            tracing::info!(dir = %dir.display(), "Serving uploads at the site root");
            Ok(router.fallback_service(files))
        }
    }
}

/// Transport body limit for a given file ceiling.
fn request_body_limit(max_file_size_bytes: u64) -> Result<usize, anyhow::Error> {
    max_file_size_bytes
        .checked_add(MULTIPART_OVERHEAD_BYTES)
        .and_then(|limit| usize::try_from(limit).ok())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "UPLOAD_MAX_FILE_SIZE_BYTES ({}) is too large for a request body limit",
                max_file_size_bytes
            )
        })
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let origins = &config.server.cors_origins;

    let cors = if origins.iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS_ORIGINS entry: {}", e))?;
        CorsLayer::new().allow_origin(origins)
    };

    Ok(cors
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}
