//! Relocation of generated images into the model/date tree.
//!
//! For every discovered image that carries a non-empty prompt:
//!
//! ```text
//! 1. read     stat + parse parameters            → ImageRecord
//! 2. resolve  <output>/<model>/<YYYY-MM-DD>/     → create_dir_all
//! 3. name     <name>.<ext>, or <name>-<ts>.<ext> while taken
//! 4. sidecar  write <name>.json                  (before the move)
//! 5. move     rename source → destination
//! ```
//!
//! Images without a prompt are skipped with no side effects, and so are
//! images already sitting at their own destination, which makes running over
//! an organized tree a no-op. Processing is sequential. By default the first
//! error aborts the run; with [`OrganizeOptions::keep_going`] the failing
//! image is reported and the run continues.

use crate::config::ToolConfig;
use crate::imaging::{MetadataReader, ReadError};
use crate::naming;
use crate::parameters::KeyStyle;
use crate::record::{ImageRecord, read_record};
use crate::scan::{self, DiscoveredImage, ScanError};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Reading metadata failed: {0}")]
    Read(#[from] ReadError),
    #[error("No free file name after {1} attempts, last tried {0}")]
    NoFreeName(PathBuf, u32),
}

/// Settings for one organize run.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizeOptions {
    pub key_style: KeyStyle,
    pub default_model: String,
    pub max_rename_attempts: u32,
    pub keep_going: bool,
}

impl OrganizeOptions {
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            key_style: config.parameters.key_style,
            default_model: config.organize.default_model.clone(),
            max_rename_attempts: config.organize.max_rename_attempts,
            keep_going: config.organize.keep_going,
        }
    }
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self::from_config(&ToolConfig::default())
    }
}

/// Why an image was left where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No parameters block, or one without a prompt.
    NoPrompt,
    /// The file disappeared between discovery and processing.
    Vanished,
    /// The file already sits at its own destination.
    AlreadyOrganized,
}

/// Progress of an organize run, one event per discovered image.
#[derive(Debug, Clone, PartialEq)]
pub enum OrganizeEvent {
    Moved {
        source: PathBuf,
        destination: PathBuf,
    },
    Skipped {
        source: PathBuf,
        reason: SkipReason,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrganizeReport {
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl OrganizeReport {
    fn count(&mut self, event: &OrganizeEvent) {
        match event {
            OrganizeEvent::Moved { .. } => self.moved += 1,
            OrganizeEvent::Skipped { .. } => self.skipped += 1,
            OrganizeEvent::Failed { .. } => self.failed += 1,
        }
    }
}

impl fmt::Display for OrganizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} moved, {} skipped, {} failed",
            self.moved, self.skipped, self.failed
        )
    }
}

/// Organize every image under `input` into `output`.
pub fn organize(
    input: &Path,
    output: &Path,
    options: &OrganizeOptions,
    reader: &dyn MetadataReader,
    progress: Option<Sender<OrganizeEvent>>,
) -> Result<OrganizeReport, OrganizeError> {
    let images = scan::collect_images(input)?;
    info!(count = images.len(), input = %input.display(), "discovered images");

    let mut report = OrganizeReport::default();
    for image in &images {
        let event = match organize_image(image, output, options, reader) {
            Ok(event) => event,
            Err(e) if options.keep_going => {
                warn!(path = %image.path.display(), error = %e, "failed to organize image");
                OrganizeEvent::Failed {
                    source: image.path.clone(),
                    error: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        report.count(&event);
        if let Some(ref tx) = progress {
            tx.send(event).ok();
        }
    }
    Ok(report)
}

/// Process a single discovered image.
pub fn organize_image(
    image: &DiscoveredImage,
    output: &Path,
    options: &OrganizeOptions,
    reader: &dyn MetadataReader,
) -> Result<OrganizeEvent, OrganizeError> {
    if !image.path.exists() {
        debug!(path = %image.path.display(), "image vanished since discovery");
        return Ok(OrganizeEvent::Skipped {
            source: image.path.clone(),
            reason: SkipReason::Vanished,
        });
    }

    let record = read_record(&image.path, image.kind, reader, options.key_style)?;
    if !record.parameters.has_prompt() {
        debug!(path = %image.path.display(), "no prompt, leaving in place");
        return Ok(OrganizeEvent::Skipped {
            source: image.path.clone(),
            reason: SkipReason::NoPrompt,
        });
    }

    let planned = planned_destination(&record, output, options);
    if is_same_file(&planned, &image.path) {
        debug!(path = %image.path.display(), "already organized, leaving in place");
        return Ok(OrganizeEvent::Skipped {
            source: image.path.clone(),
            reason: SkipReason::AlreadyOrganized,
        });
    }
    if let Some(dir) = planned.parent() {
        fs::create_dir_all(dir)?;
    }
    let destination = free_destination(planned, options.max_rename_attempts)?;

    let sidecar = record.sidecar(&naming::file_url(&destination));
    let json = serde_json::to_string_pretty(&Value::Object(sidecar))?;
    fs::write(naming::sidecar_path(&destination), json)?;

    move_file(&image.path, &destination)?;

    Ok(OrganizeEvent::Moved {
        source: image.path.clone(),
        destination,
    })
}

/// `<output>/<model>/<date>/<name>` before collision handling.
pub fn planned_destination(
    record: &ImageRecord,
    output: &Path,
    options: &OrganizeOptions,
) -> PathBuf {
    let model = naming::model_dir_name(record.parameters.model(), &options.default_model);
    output
        .join(model)
        .join(&record.info.create_date)
        .join(naming::target_filename(
            &record.info.file_path,
            record.info.file_type,
        ))
}

/// A path is taken when either the image or its sidecar already exists.
fn is_taken(path: &Path) -> bool {
    path.exists() || naming::sidecar_path(path).exists()
}

/// Both paths resolve to the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// First free name: the candidate itself, then repeatedly suffixed with the
/// current timestamp, at most `max_attempts` times.
fn free_destination(candidate: PathBuf, max_attempts: u32) -> Result<PathBuf, OrganizeError> {
    let mut path = candidate;
    if !is_taken(&path) {
        return Ok(path);
    }
    for _ in 0..max_attempts {
        path = naming::suffixed_path(&path, &naming::timestamp_now());
        if !is_taken(&path) {
            return Ok(path);
        }
    }
    Err(OrganizeError::NoFreeName(path, max_attempts))
}

/// Rename, falling back to copy + delete across filesystems.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        other => other,
    }
}

/// Where an image would go, without touching the filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedImage {
    pub image: DiscoveredImage,
    /// `None` when the image would be skipped for lack of a prompt.
    pub destination: Option<PathBuf>,
    /// The planned name is already taken and would get a timestamp suffix.
    pub collides: bool,
}

/// Dry run of [`organize`]: reads and parses every image, moves nothing.
pub fn plan(
    input: &Path,
    output: &Path,
    options: &OrganizeOptions,
    reader: &dyn MetadataReader,
) -> Result<Vec<PlannedImage>, OrganizeError> {
    let images = scan::collect_images(input)?;
    let mut planned = Vec::with_capacity(images.len());
    for image in images {
        let record = read_record(&image.path, image.kind, reader, options.key_style)?;
        let destination = record
            .parameters
            .has_prompt()
            .then(|| planned_destination(&record, output, options));
        let collides = destination
            .as_deref()
            .is_some_and(|dest| is_taken(dest) && !is_same_file(dest, &image.path));
        planned.push(PlannedImage {
            image,
            destination,
            collides,
        });
    }
    Ok(planned)
}
