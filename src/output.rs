//! CLI output formatting.
//!
//! Every image gets a header line (its source path, or positional index and
//! name in listings) followed by indented context lines:
//!
//! ## Organize
//!
//! ```text
//! input/00001-42.png
//!     → output/sdxl_base/2024-05-01/00001-42.png
//! input/photo.jpg
//!     skipped: no prompt
//!
//! 1 moved, 1 skipped, 0 failed
//! ```
//!
//! ## Scan
//!
//! ```text
//! Images
//! 001 00001-42.png (png)
//!     → output/sdxl_base/2024-05-01/00001-42.png
//! 002 photo.jpg (jpeg)
//!     no prompt
//!
//! 2 images, 1 with prompt
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and is pure; `print_*`
//! wrappers write to stdout.

use crate::organize::{OrganizeEvent, PlannedImage, SkipReason};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Organize
// ============================================================================

/// Format a single organize progress event as display lines.
pub fn format_organize_event(event: &OrganizeEvent) -> Vec<String> {
    match event {
        OrganizeEvent::Moved {
            source,
            destination,
        } => vec![
            source.display().to_string(),
            format!("    \u{2192} {}", destination.display()),
        ],
        OrganizeEvent::Skipped { source, reason } => {
            let why = match reason {
                SkipReason::NoPrompt => "no prompt",
                SkipReason::Vanished => "no longer present",
                SkipReason::AlreadyOrganized => "already organized",
            };
            vec![
                source.display().to_string(),
                format!("    skipped: {}", why),
            ]
        }
        OrganizeEvent::Failed { source, error } => vec![
            source.display().to_string(),
            format!("    failed: {}", error),
        ],
    }
}

// ============================================================================
// Scan (dry run)
// ============================================================================

/// Format the dry-run listing of discovered images and where they would go.
pub fn format_plan(planned: &[PlannedImage]) -> Vec<String> {
    let mut lines = vec!["Images".to_string()];

    for (i, entry) in planned.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            file_name(&entry.image.path),
            entry.image.kind
        ));
        match &entry.destination {
            Some(dest) if entry.collides => lines.push(format!(
                "    \u{2192} {} (name taken, will be suffixed)",
                dest.display()
            )),
            Some(dest) => lines.push(format!("    \u{2192} {}", dest.display())),
            None => lines.push("    no prompt".to_string()),
        }
    }

    let with_prompt = planned.iter().filter(|p| p.destination.is_some()).count();
    lines.push(String::new());
    lines.push(format!(
        "{} images, {} with prompt",
        planned.len(),
        with_prompt
    ));
    lines
}

/// Print the dry-run listing to stdout.
pub fn print_plan(planned: &[PlannedImage]) {
    for line in format_plan(planned) {
        println!("{}", line);
    }
}
