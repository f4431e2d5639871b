//! Destination naming for relocated images and their sidecars.
//!
//! ```text
//! input/Batch 3/00012-1234.PNG  →  output/sdxl_base/2024-05-01/00012-1234.png
//!                                  output/sdxl_base/2024-05-01/00012-1234.json
//! (name taken)                  →  output/sdxl_base/2024-05-01/00012-1234-1714550400.png
//! ```
//!
//! File names are lower-cased and always end in an extension matching the
//! sniffed content. Collisions get a `-<epoch seconds>` suffix before the
//! extension.

use crate::imaging::ImageKind;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::SystemTime;

/// Lower-cased base name of `src`, with the sniffed extension appended when
/// the name doesn't already end in one of the kind's extensions.
///
/// - `Cat.PNG` (png) → `cat.png`
/// - `cat.jpg` (jpeg) → `cat.jpg`
/// - `cat.webp` (png) → `cat.webp.png`
/// - `cat` (png) → `cat.png`
pub fn target_filename(src: &Path, kind: ImageKind) -> String {
    let basename = src
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let has_matching_ext = Path::new(&basename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| kind.extensions().contains(&ext));
    if has_matching_ext {
        basename
    } else {
        format!("{}.{}", basename, kind.name())
    }
}

/// Directory name for a model: lower-cased, path separators replaced, and
/// `default` when the model is absent or unusable as a single component.
pub fn model_dir_name(model: Option<&str>, default: &str) -> String {
    let name = model
        .map(|m| m.trim().to_lowercase().replace(['/', '\\'], "_"))
        .unwrap_or_default();
    match name.as_str() {
        "" | "." | ".." => default.to_string(),
        _ => name,
    }
}

/// `image.png` → `image.json`
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("json")
}

/// Insert `-<timestamp>` between the stem and the extension.
///
/// `a.png` → `a-1714550400.png`; applied again the suffixes accumulate:
/// `a-1714550400-1714550400.png`.
pub fn suffixed_path(path: &Path, timestamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, timestamp, ext.to_string_lossy()),
        None => format!("{}-{}", stem, timestamp),
    };
    path.with_file_name(name)
}

/// Current time as whole epoch seconds. Sampled on every call.
pub fn timestamp_now() -> String {
    crate::record::epoch_seconds(SystemTime::now())
}

/// Path as a string with platform separators normalised to `/`.
pub fn file_url(path: &Path) -> String {
    let s = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(MAIN_SEPARATOR, "/")
    }
}
