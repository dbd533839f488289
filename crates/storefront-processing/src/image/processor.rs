//! Image processor - post-write decoding and dimension extraction

use image::{ImageFormat, ImageReader};
use std::fmt;
use std::io::Cursor;
use storefront_core::AppError;

use super::svg::{svg_dimensions, SvgError};

/// Formats accepted at rest. Chosen from the bytes, never from the declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Svg,
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
            ImageKind::Svg => "svg",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    Unrecognized,

    #[error("unsupported image format: {0:?}")]
    UnsupportedFormat(ImageFormat),

    #[error("failed to decode image: {0}")]
    Raster(#[from] image::ImageError),

    #[error("failed to read svg: {0}")]
    Svg(#[from] SvgError),

    #[error("image has zero dimensions ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("decode task failed: {0}")]
    Task(String),
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Task(msg) => AppError::Internal(msg),
            other => AppError::InvalidImage(other.to_string()),
        }
    }
}

/// Sniffs, decodes and measures stored upload bytes.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Identify the format from the leading bytes.
    pub fn detect_kind(data: &[u8]) -> Result<ImageKind, DecodeError> {
        match image::guess_format(data) {
            Ok(ImageFormat::Png) => Ok(ImageKind::Png),
            Ok(ImageFormat::Jpeg) => Ok(ImageKind::Jpeg),
            Ok(ImageFormat::Gif) => Ok(ImageKind::Gif),
            Ok(other) => Err(DecodeError::UnsupportedFormat(other)),
            Err(_) if looks_like_xml(data) => Ok(ImageKind::Svg),
            Err(_) => Err(DecodeError::Unrecognized),
        }
    }

    /// Identify `data` and read its intrinsic dimensions.
    ///
    /// Raster images are measured from their header; pixel data is never
    /// decompressed, so the cost does not grow with the declared size. SVG is
    /// parsed as XML for metadata only.
    pub fn decode_dimensions(data: &[u8]) -> Result<ImageInfo, DecodeError> {
        let kind = Self::detect_kind(data)?;

        let (width, height) = match kind {
            ImageKind::Svg => svg_dimensions(data)?,
            ImageKind::Png => raster_dimensions(data, ImageFormat::Png)?,
            ImageKind::Jpeg => raster_dimensions(data, ImageFormat::Jpeg)?,
            ImageKind::Gif => raster_dimensions(data, ImageFormat::Gif)?,
        };

        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimensions { width, height });
        }

        Ok(ImageInfo {
            kind,
            width,
            height,
        })
    }

    /// Measure on the blocking pool; header parsing still does synchronous reads.
    pub async fn extract_dimensions(data: Vec<u8>) -> Result<ImageInfo, DecodeError> {
        tokio::task::spawn_blocking(move || Self::decode_dimensions(&data))
            .await
            .map_err(|e| DecodeError::Task(e.to_string()))?
    }
}

fn raster_dimensions(data: &[u8], format: ImageFormat) -> Result<(u32, u32), DecodeError> {
    Ok(ImageReader::with_format(Cursor::new(data), format).into_dimensions()?)
}

/// First meaningful byte is `<` (after an optional UTF-8 BOM and whitespace).
fn looks_like_xml(data: &[u8]) -> bool {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'<')
}
