//! # sd-organizer
//!
//! Sorts images produced by Stable Diffusion front ends into a browsable tree.
//! The generator embeds its settings as a `parameters` text block inside each
//! image; that block is parsed, written next to the image as a JSON sidecar,
//! and used to pick the destination:
//!
//! ```text
//! input/00012-1234.png  →  output/<model>/<YYYY-MM-DD>/00012-1234.png
//!                          output/<model>/<YYYY-MM-DD>/00012-1234.json
//! ```
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan      input/      →  [DiscoveredImage]   (content sniffing, no extensions)
//! 2. Read      image       →  ImageRecord         (file facts + parsed parameters)
//! 3. Organize  record      →  output/ tree        (sidecar first, then move)
//! ```
//!
//! Images without a prompt stay where they are. Re-running on a half-processed
//! input is safe: names already taken in the output get a timestamp suffix.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the input, keeps files whose content is an allow-listed image |
//! | [`imaging`] | Content sniffing and PNG text chunks behind the [`imaging::MetadataReader`] seam |
//! | [`parameters`] | Parses the `parameters` block into an ordered key/value map |
//! | [`record`] | File facts (type, size, creation time) joined with parsed parameters |
//! | [`naming`] | Destination names, sidecar paths, timestamp suffixes, file URLs |
//! | [`organize`] | Runs the relocation, emits progress events, dry-run planning |
//! | [`config`] | Optional `sd-organizer.toml`, merged over stock defaults |
//! | [`output`] | CLI output formatting for progress and dry-run listings |
//!
//! # Design Decisions
//!
//! ## Content Over Extensions
//!
//! Generated images are often renamed, re-encoded or uploaded through tools
//! that change extensions. The file type always comes from the first bytes of
//! the file, and the destination extension follows the detected type when the
//! original one disagrees.
//!
//! ## Sidecar Before Move
//!
//! The sidecar is written before the image is moved. If the move fails, the
//! image is still in the input and the next run picks it up again; the stray
//! sidecar only claims a name, which the collision check then steps around.
//!
//! ## One Reader Seam
//!
//! Parsing never touches the filesystem. Everything container-specific sits
//! behind [`imaging::MetadataReader`], so the organizer logic is tested with a
//! mock reader and real PNG handling is tested on synthetic chunks.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod organize;
pub mod output;
pub mod parameters;
pub mod record;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
