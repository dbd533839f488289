//! Types for the upload pipeline.

use std::fmt;
use storefront_storage::ByteStream;

/// One file as received from the transport, before anything is written.
pub struct UploadRequest<'a> {
    /// Filename declared by the client, kept verbatim for the response.
    pub original_filename: String,
    pub content_type: String,
    /// Size announced by the transport, if it sent one.
    pub declared_size: Option<u64>,
    pub stream: ByteStream<'a>,
}

impl fmt::Debug for UploadRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("original_filename", &self.original_filename)
            .field("content_type", &self.content_type)
            .field("declared_size", &self.declared_size)
            .finish_non_exhaustive()
    }
}

/// Per-request progress. `Rejected` is terminal and records where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    TypeChecked,
    Written,
    Decoded,
    Composed,
    Rejected { at: RejectionPoint },
}

/// Stages a request can be rejected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionPoint {
    Received,
    Written,
    Decoded,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStage::Received => f.write_str("received"),
            UploadStage::TypeChecked => f.write_str("type_checked"),
            UploadStage::Written => f.write_str("written"),
            UploadStage::Decoded => f.write_str("decoded"),
            UploadStage::Composed => f.write_str("composed"),
            UploadStage::Rejected { at } => write!(f, "rejected_at_{}", at),
        }
    }
}

impl fmt::Display for RejectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionPoint::Received => f.write_str("received"),
            RejectionPoint::Written => f.write_str("written"),
            RejectionPoint::Decoded => f.write_str("decoded"),
        }
    }
}
