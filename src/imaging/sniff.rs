//! Image format detection from file content.
//!
//! Filenames lie; leading bytes don't. Classification never looks at the
//! extension. The common raster formats are recognised through
//! `image::guess_format`'s magic-byte table, everything else through the
//! fixed signatures below.

use image::ImageFormat;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read from the head of a file for classification. Large enough for
/// an SVG prologue with an XML declaration and a doctype.
const HEADER_LEN: usize = 512;

/// Every image format on the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Bmp,
    Gif,
    Ief,
    Jpeg,
    Heic,
    Heif,
    Png,
    Svg,
    Tiff,
    Ico,
    Webp,
    Ras,
    Pnm,
    Pbm,
    Pgm,
    Ppm,
    Rgb,
    Xbm,
    Xpm,
    Xwd,
}

impl ImageKind {
    /// Identifier written into records as `file_type`, and the extension
    /// appended to names that lack a matching one.
    pub fn name(self) -> &'static str {
        self.extensions()[0]
    }

    /// Filename extensions considered to already match this kind.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageKind::Bmp => &["bmp"],
            ImageKind::Gif => &["gif"],
            ImageKind::Ief => &["ief"],
            ImageKind::Jpeg => &["jpeg", "jpg", "jpe"],
            ImageKind::Heic => &["heic"],
            ImageKind::Heif => &["heif"],
            ImageKind::Png => &["png"],
            ImageKind::Svg => &["svg"],
            ImageKind::Tiff => &["tiff", "tif"],
            ImageKind::Ico => &["ico"],
            ImageKind::Webp => &["webp"],
            ImageKind::Ras => &["ras"],
            ImageKind::Pnm => &["pnm"],
            ImageKind::Pbm => &["pbm"],
            ImageKind::Pgm => &["pgm"],
            ImageKind::Ppm => &["ppm"],
            ImageKind::Rgb => &["rgb"],
            ImageKind::Xbm => &["xbm"],
            ImageKind::Xpm => &["xpm"],
            ImageKind::Xwd => &["xwd"],
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a file by its content. `Ok(None)` for anything that isn't an
/// allow-listed image.
pub fn sniff_file(path: &Path) -> io::Result<Option<ImageKind>> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(sniff(&header))
}

/// Classify a buffer holding the first bytes of a file.
pub fn sniff(header: &[u8]) -> Option<ImageKind> {
    if let Ok(format) = image::guess_format(header) {
        if let Some(kind) = from_image_format(format, header) {
            return Some(kind);
        }
    }
    sniff_signature(header)
}

fn from_image_format(format: ImageFormat, header: &[u8]) -> Option<ImageKind> {
    match format {
        ImageFormat::Png => Some(ImageKind::Png),
        ImageFormat::Jpeg => Some(ImageKind::Jpeg),
        ImageFormat::Gif => Some(ImageKind::Gif),
        ImageFormat::WebP => Some(ImageKind::Webp),
        ImageFormat::Tiff => Some(ImageKind::Tiff),
        ImageFormat::Bmp => Some(ImageKind::Bmp),
        ImageFormat::Ico => Some(ImageKind::Ico),
        ImageFormat::Pnm => pnm_subtype(header),
        _ => None,
    }
}

/// `P1`/`P4` bitmap, `P2`/`P5` graymap, `P3`/`P6` pixmap, `P7` arbitrary map.
/// The magic must be followed by whitespace.
fn pnm_subtype(header: &[u8]) -> Option<ImageKind> {
    let [b'P', variant, sep, ..] = header else {
        return None;
    };
    if !sep.is_ascii_whitespace() {
        return None;
    }
    match variant {
        b'1' | b'4' => Some(ImageKind::Pbm),
        b'2' | b'5' => Some(ImageKind::Pgm),
        b'3' | b'6' => Some(ImageKind::Ppm),
        b'7' => Some(ImageKind::Pnm),
        _ => None,
    }
}

const SUN_RASTER_MAGIC: &[u8] = &[0x59, 0xA6, 0x6A, 0x95];
const SGI_MAGIC: &[u8] = &[0x01, 0xDA];
const XWD_VERSION_7: &[u8] = &[0x00, 0x00, 0x00, 0x07];
const HEIC_BRANDS: &[&[u8]] = &[b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis"];
const HEIF_BRANDS: &[&[u8]] = &[b"mif1", b"msf1"];

fn sniff_signature(header: &[u8]) -> Option<ImageKind> {
    if header.starts_with(SUN_RASTER_MAGIC) {
        return Some(ImageKind::Ras);
    }
    if header.starts_with(SGI_MAGIC) {
        return Some(ImageKind::Rgb);
    }
    if header.starts_with(b"#define ") {
        return Some(ImageKind::Xbm);
    }
    if header.starts_with(b"/* XPM */") {
        return Some(ImageKind::Xpm);
    }
    if let Some(kind) = sniff_iso_bmff(header) {
        return Some(kind);
    }
    if is_svg(header) {
        return Some(ImageKind::Svg);
    }
    // X Window Dump: big-endian header size, then file version 7.
    if header.len() >= 8 && &header[4..8] == XWD_VERSION_7 {
        let header_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        if header_size >= 100 {
            return Some(ImageKind::Xwd);
        }
    }
    None
}

/// HEIC/HEIF live in an ISO base media `ftyp` box; the major brand tells
/// them apart.
fn sniff_iso_bmff(header: &[u8]) -> Option<ImageKind> {
    if header.len() < 12 || &header[4..8] != b"ftyp" {
        return None;
    }
    let brand = &header[8..12];
    if HEIC_BRANDS.contains(&brand) {
        Some(ImageKind::Heic)
    } else if HEIF_BRANDS.contains(&brand) {
        Some(ImageKind::Heif)
    } else {
        None
    }
}

fn is_svg(header: &[u8]) -> bool {
    let text = String::from_utf8_lossy(header);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<svg") {
        return true;
    }
    (trimmed.starts_with("<?xml") || trimmed.starts_with("<!DOCTYPE svg"))
        && trimmed.contains("<svg")
}
