//! Test fixtures: upload bodies of controlled size.

pub use storefront_processing::testing::png_of_size;

/// Plain text well above the size floor.
pub fn text_blob(len: usize) -> Vec<u8> {
    b"not an image at all. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// An SVG with explicit dimensions, padded past the size floor with a comment.
pub fn create_test_svg(width: u32, height: u32) -> Vec<u8> {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\"><!-- ",
        width, height
    );
    svg.push_str(&"x".repeat(4096));
    svg.push_str(" --><rect width=\"10\" height=\"10\"/></svg>");
    svg.into_bytes()
}
