//! Image fixtures for tests in this crate and in crates depending on it
//! (enable the `test-support` feature).

use std::io::{Cursor, Write};

use bytes::Bytes;
use flate2::{write::ZlibEncoder, Compression};
use image::{ImageFormat, Rgba, RgbaImage};
use img_parts::png::{Png, PngChunk};

/// Private, ancillary, safe-to-copy chunk type; decoders skip it.
const PADDING_CHUNK: [u8; 4] = *b"prVt";

/// Length, type and CRC fields around every chunk body.
const CHUNK_FRAMING: usize = 12;

/// Encode a solid PNG of the given dimensions.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode png");
    out
}

/// A valid 4x4 PNG of exactly `total_len` bytes, padded with a private chunk.
pub fn png_of_size(total_len: usize) -> Vec<u8> {
    let base = create_test_png(4, 4);
    let padding = total_len
        .checked_sub(base.len() + CHUNK_FRAMING)
        .expect("total_len leaves no room for the padding chunk");

    let mut png = Png::from_bytes(Bytes::from(base)).expect("parse png");
    let chunks = png.chunks_mut();
    let iend = chunks.len() - 1;
    chunks.insert(
        iend,
        PngChunk::new(PADDING_CHUNK, Bytes::from(vec![0u8; padding])),
    );

    let out = png.encoder().bytes().to_vec();
    assert_eq!(out.len(), total_len);
    out
}

/// A `width` x `height` 1-bit grayscale PNG with every pixel black.
///
/// The pixel data deflates to a tiny fraction of its raw size, so the file
/// stays small while a full decode would need a very large buffer.
pub fn sparse_bilevel_png(width: u32, height: u32) -> Vec<u8> {
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    // bit depth 1, grayscale, deflate, adaptive filtering, no interlace
    ihdr.extend_from_slice(&[1, 0, 0, 0, 0]);

    // filter byte + packed pixels
    let row = vec![0u8; 1 + (width as usize).div_ceil(8)];
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    for _ in 0..height {
        encoder.write_all(&row).expect("deflate row");
    }
    let idat = encoder.finish().expect("finish deflate");

    let mut png = Png::from_bytes(Bytes::from(create_test_png(1, 1))).expect("parse png");
    let chunks = png.chunks_mut();
    chunks.retain(|chunk| chunk.kind() != *b"IDAT");
    for chunk in chunks.iter_mut() {
        if chunk.kind() == *b"IHDR" {
            *chunk = PngChunk::new(*b"IHDR", Bytes::from(ihdr.clone()));
        }
    }
    let iend = chunks.len() - 1;
    chunks.insert(iend, PngChunk::new(*b"IDAT", Bytes::from(idat)));

    png.encoder().bytes().to_vec()
}
