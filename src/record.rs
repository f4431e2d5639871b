//! Per-image records: filesystem bookkeeping plus parsed parameters.
//!
//! A record is built once per discovered image and never mutated. The
//! organizer composes the sidecar JSON from it by value:
//!
//! ```text
//! file_type, file_size, create_time, create_date   ← FileInfo
//! Prompt, Negative prompt, Steps, Size, width, ... ← Parameters (win on clash)
//! file_url                                         ← final destination
//! ```
//!
//! The source path travels with the record but is never written out.

use crate::imaging::{ImageKind, MetadataReader, ReadError};
use crate::parameters::{self, KeyStyle, Parameters};
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Filesystem facts about one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub file_type: ImageKind,
    pub file_path: PathBuf,
    pub file_size: u64,
    /// Whole epoch seconds, as a string.
    pub create_time: String,
    /// `YYYY-MM-DD` in local time.
    pub create_date: String,
}

impl FileInfo {
    /// Stat the file. Creation time is used where the platform records it,
    /// modification time otherwise.
    pub fn read(path: &Path, kind: ImageKind) -> std::io::Result<Self> {
        let meta = fs::metadata(path)?;
        let created = meta.created().or_else(|_| meta.modified())?;
        Ok(Self {
            file_type: kind,
            file_path: path.to_path_buf(),
            file_size: meta.len(),
            create_time: epoch_seconds(created),
            create_date: local_date(created),
        })
    }
}

/// Whole seconds since the epoch; times before it clamp to zero.
pub fn epoch_seconds(time: SystemTime) -> String {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}

fn local_date(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d").to_string()
}

/// Everything known about one image before it is moved.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub info: FileInfo,
    pub parameters: Parameters,
}

impl ImageRecord {
    /// The sidecar JSON object for an image relocated to `file_url`.
    pub fn sidecar(&self, file_url: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "file_type".into(),
            Value::String(self.info.file_type.name().into()),
        );
        map.insert("file_size".into(), Value::from(self.info.file_size));
        map.insert(
            "create_time".into(),
            Value::String(self.info.create_time.clone()),
        );
        map.insert(
            "create_date".into(),
            Value::String(self.info.create_date.clone()),
        );
        for (key, value) in self.parameters.iter() {
            map.insert(key.into(), Value::String(value.into()));
        }
        map.insert("file_url".into(), Value::String(file_url.into()));
        map
    }
}

/// Stat an image and parse its embedded parameters.
///
/// Formats without text attributes are a soft condition: the record is
/// returned with empty parameters and a warning is logged.
pub fn read_record(
    path: &Path,
    kind: ImageKind,
    reader: &dyn MetadataReader,
    style: KeyStyle,
) -> Result<ImageRecord, ReadError> {
    let info = FileInfo::read(path, kind)?;
    let raw = match reader.read_parameters(path, kind)? {
        Some(text) => text,
        None => {
            warn!(path = %path.display(), file_type = %kind, "image has no text attributes");
            String::new()
        }
    };
    Ok(ImageRecord {
        info,
        parameters: parameters::parse(&raw, style),
    })
}
