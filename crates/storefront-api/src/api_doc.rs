//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use storefront_core::UploadResult;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Upload API",
        version = "0.1.0",
        description = "Image uploads for the storefront: one multipart file per request, validated and stored on local disk."
    ),
    paths(
        handlers::upload::upload_image,
        handlers::health::liveness_check,
        handlers::health::readiness_check,
    ),
    components(schemas(UploadResult, ErrorResponse)),
    tags(
        (name = "uploads", description = "Image upload"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
