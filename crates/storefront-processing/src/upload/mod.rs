//! Single-file upload flow.

pub mod pipeline;
pub mod types;

pub use pipeline::UploadPipeline;
pub use types::{RejectionPoint, UploadRequest, UploadStage};
