use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response body for an accepted upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Public, root-relative path of the stored file (e.g. "/images/3f2a...c9.png")
    #[schema(example = "/0f1e2d3c4b5a69788796a5b4c3d2e1f0.png")]
    pub file_name: String,
    /// Filename as declared by the client, unchanged
    #[schema(example = "photo.PNG")]
    pub original_name: String,
}
