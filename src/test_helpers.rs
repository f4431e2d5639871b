//! Shared test utilities for the sd-organizer test suite.
//!
//! Builds real image files on disk: PNGs are encoded by the `image` crate and
//! then get text chunks spliced in after `IHDR`, the way generators write
//! them.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_png(&tmp.path().join("gen.png"), Some(&parameters_block("a cat", Some("sdxl"))));
//! write_jpeg(&tmp.path().join("photo.jpg"));
//! ```

use flate2::{Compression, Crc};
use flate2::write::ZlibEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::{Cursor, Write};
use std::path::Path;

// =========================================================================
// PNG chunk builders
// =========================================================================

/// Signature (8) + IHDR chunk (4 length + 4 type + 13 data + 4 CRC).
const IHDR_END: usize = 33;

/// Encode one PNG chunk with a valid CRC.
pub fn png_chunk(chunk_type: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(body);
    let mut crc = Crc::new();
    crc.update(chunk_type);
    crc.update(body);
    out.extend_from_slice(&crc.sum().to_be_bytes());
    out
}

/// `tEXt` chunk (text must be Latin-1 representable to round-trip).
pub fn text_chunk(keyword: &str, text: &str) -> Vec<u8> {
    let mut body = keyword.as_bytes().to_vec();
    body.push(0);
    body.extend(text.chars().map(|c| c as u8));
    png_chunk(b"tEXt", &body)
}

/// `zTXt` chunk with zlib-compressed ASCII text.
pub fn ztxt_chunk(keyword: &str, text: &str) -> Vec<u8> {
    let mut body = keyword.as_bytes().to_vec();
    body.extend_from_slice(&[0, 0]);
    body.extend(zlib(text.as_bytes()));
    png_chunk(b"zTXt", &body)
}

/// `iTXt` chunk with empty language and translated keyword.
pub fn itxt_chunk(keyword: &str, text: &str, compressed: bool) -> Vec<u8> {
    let mut body = keyword.as_bytes().to_vec();
    body.extend_from_slice(&[0, u8::from(compressed), 0, 0, 0]);
    if compressed {
        body.extend(zlib(text.as_bytes()));
    } else {
        body.extend_from_slice(text.as_bytes());
    }
    png_chunk(b"iTXt", &body)
}

fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

// =========================================================================
// Image files
// =========================================================================

fn encode(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Write a small valid PNG, with a `parameters` tEXt chunk when given.
pub fn write_png(path: &Path, parameters: Option<&str>) {
    let extra: Vec<Vec<u8>> = parameters
        .map(|p| vec![text_chunk("parameters", p)])
        .unwrap_or_default();
    write_png_with_chunks(path, &extra);
}

/// A small valid PNG with arbitrary extra chunks after `IHDR`.
pub fn png_bytes(chunks: &[Vec<u8>]) -> Vec<u8> {
    let encoded = encode(ImageFormat::Png);
    let mut out = encoded[..IHDR_END].to_vec();
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out.extend_from_slice(&encoded[IHDR_END..]);
    out
}

/// Write a small valid PNG with arbitrary extra chunks after `IHDR`.
pub fn write_png_with_chunks(path: &Path, chunks: &[Vec<u8>]) {
    std::fs::write(path, png_bytes(chunks)).unwrap();
}

/// Write a small valid JPEG (no text attributes).
pub fn write_jpeg(path: &Path) {
    std::fs::write(path, encode(ImageFormat::Jpeg)).unwrap();
}

// =========================================================================
// Parameter blocks
// =========================================================================

/// A typical generator block with the given prompt and optional model.
pub fn parameters_block(prompt: &str, model: Option<&str>) -> String {
    let mut block = format!(
        "{prompt}\nNegative prompt: lowres, blurry\nSteps: 20, Sampler: Euler a, CFG scale: 7, Seed: 42, Size: 512x768"
    );
    if let Some(model) = model {
        block.push_str(&format!(", Model: {model}"));
    }
    block
}
