//! Input discovery.
//!
//! Walks the input location and keeps every file whose content sniffs as an
//! allow-listed image:
//!
//! ```text
//! input/
//! ├── 00001-42.png          ✓ png
//! ├── upscaled/
//! │   └── 00001-42.jpg      ✓ jpeg
//! ├── 00001-42.json         ✗ not an image signature
//! └── notes.txt             ✗
//! ```
//!
//! The input may also be a single file. Traversal is iterative (walkdir keeps
//! its own stack) and sorted by file name so runs are reproducible. Symbolic
//! links are followed; a link pointing back at one of its ancestors is
//! reported and skipped.

use crate::imaging::{ImageKind, sniff_file};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input is neither a file nor a directory: {0}")]
    InvalidInput(PathBuf),
}

/// An input file that sniffed as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredImage {
    pub path: PathBuf,
    pub kind: ImageKind,
}

/// Enumerate image files under `input` (recursively) or `input` itself.
pub fn collect_images(input: &Path) -> Result<Vec<DiscoveredImage>, ScanError> {
    if input.is_file() {
        return Ok(classify(input)?.into_iter().collect());
    }
    if !input.is_dir() {
        return Err(ScanError::InvalidInput(input.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.loop_ancestor().is_some() => {
                warn!(error = %e, "symlink loop, skipping");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(image) = classify(entry.path())? {
            images.push(image);
        }
    }
    Ok(images)
}

fn classify(path: &Path) -> Result<Option<DiscoveredImage>, ScanError> {
    let kind = sniff_file(path)?;
    if kind.is_none() {
        debug!(path = %path.display(), "not an image, skipping");
    }
    Ok(kind.map(|kind| DiscoveredImage {
        path: path.to_path_buf(),
        kind,
    }))
}
