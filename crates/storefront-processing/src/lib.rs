//! Storefront Processing Library
//!
//! This crate turns an incoming upload into a confirmed image on disk: the type
//! filter and size window (`validator`), post-write decoding (`image`) and the
//! pipeline that runs them in order (`upload`).

pub mod image;
pub mod upload;
pub mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use crate::image::{DecodeError, ImageInfo, ImageKind, ImageProcessor};
pub use upload::{UploadPipeline, UploadRequest, UploadStage};
pub use validator::{UploadValidator, ValidationError};
