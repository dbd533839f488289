//! SVG metadata reader
//!
//! SVG uploads are never rendered. The document is walked as plain XML to check
//! that it is well formed and to read the root element's intrinsic size. The
//! DOCTYPE is skipped, entities are not expanded and nothing is fetched.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// CSS pixels per inch.
const PX_PER_IN: f64 = 96.0;

#[derive(Debug, thiserror::Error)]
pub enum SvgError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("root element is <{0}>, not <svg>")]
    NotSvg(String),

    #[error("document has no root element")]
    MissingRoot,

    #[error("svg has no intrinsic size")]
    NoIntrinsicSize,
}

/// Intrinsic size of an SVG document in CSS pixels.
pub fn svg_dimensions(data: &[u8]) -> Result<(u32, u32), SvgError> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut size = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if size.is_none() {
                    if e.local_name().as_ref() != b"svg" {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        return Err(SvgError::NotSvg(name));
                    }
                    size = Some(root_size(&e)?);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(SvgError::Malformed(e.to_string())),
        }
        buf.clear();
    }

    match size {
        Some(Some(dimensions)) => Ok(dimensions),
        Some(None) => Err(SvgError::NoIntrinsicSize),
        None => Err(SvgError::MissingRoot),
    }
}

/// Resolve width and height from the root attributes, falling back to the viewBox.
fn root_size(root: &BytesStart<'_>) -> Result<Option<(u32, u32)>, SvgError> {
    let mut width = None;
    let mut height = None;
    let mut view_box = None;

    for attr in root.attributes() {
        let attr = attr.map_err(|e| SvgError::Malformed(e.to_string()))?;
        // Raw value: entity references stay unexpanded.
        let Ok(value) = std::str::from_utf8(&attr.value) else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"width" => width = parse_length(value),
            b"height" => height = parse_length(value),
            b"viewBox" => view_box = parse_view_box(value),
            _ => {}
        }
    }

    let size = match (width, height, view_box) {
        (Some(w), Some(h), _) => Some((w, h)),
        (Some(w), None, Some((vw, vh))) => Some((w, w * vh / vw)),
        (None, Some(h), Some((vw, vh))) => Some((h * vw / vh, h)),
        (None, None, Some((vw, vh))) => Some((vw, vh)),
        _ => None,
    };

    Ok(size.and_then(|(w, h)| Some((to_pixels(w)?, to_pixels(h)?))))
}

/// Parse an SVG length into CSS pixels. Relative units have no intrinsic size.
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();

    let (number, scale) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, PX_PER_IN / 72.0)
    } else if let Some(n) = value.strip_suffix("pc") {
        (n, PX_PER_IN / 6.0)
    } else if let Some(n) = value.strip_suffix("mm") {
        (n, PX_PER_IN / 25.4)
    } else if let Some(n) = value.strip_suffix("cm") {
        (n, PX_PER_IN / 2.54)
    } else if let Some(n) = value.strip_suffix("in") {
        (n, PX_PER_IN)
    } else if value.ends_with('%') || value.ends_with("em") || value.ends_with("ex") {
        return None;
    } else {
        (value, 1.0)
    };

    let number: f64 = number.trim().parse().ok()?;
    let px = number * scale;
    (px.is_finite() && px > 0.0).then_some(px)
}

/// `min-x min-y width height`, separated by whitespace and/or commas.
fn parse_view_box(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    match parts.as_slice() {
        [_, _, w, h] if w.is_finite() && h.is_finite() && *w > 0.0 && *h > 0.0 => Some((*w, *h)),
        _ => None,
    }
}

fn to_pixels(value: f64) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some(value.round().clamp(1.0, u32::MAX as f64) as u32)
}
