//! Image module
//!
//! Post-write validation of stored uploads:
//! - Raster decoding and dimension extraction (processor)
//! - SVG metadata reading without rendering (svg)

pub mod processor;
pub mod svg;

pub use processor::{DecodeError, ImageInfo, ImageKind, ImageProcessor};
pub use svg::SvgError;
