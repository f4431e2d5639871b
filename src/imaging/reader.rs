//! Access to the embedded `parameters` text of an image container.
//!
//! [`MetadataReader`] is the seam between the organizer and the container
//! formats. The production implementation is [`ContainerReader`]; tests
//! substitute a mock so organizer logic can run on arbitrary bytes.

use super::png_text;
use super::sniff::ImageKind;
use std::path::Path;
use thiserror::Error;

/// Text-chunk keyword the generator writes its settings under.
pub const PARAMETERS_KEYWORD: &str = "parameters";

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG decoding error: {0}")]
    Png(#[from] png::DecodingError),
}

/// Reads the raw parameters block from an image file.
pub trait MetadataReader {
    /// Embedded parameters text.
    ///
    /// - `Ok(Some(text))`: the container carries text attributes; `text` is
    ///   empty when none of them is `parameters`.
    /// - `Ok(None)`: the format has no text attributes at all.
    fn read_parameters(&self, path: &Path, kind: ImageKind) -> Result<Option<String>, ReadError>;
}

/// Reads PNG text chunks. Every other format reports no text attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerReader;

impl MetadataReader for ContainerReader {
    fn read_parameters(&self, path: &Path, kind: ImageKind) -> Result<Option<String>, ReadError> {
        match kind {
            ImageKind::Png => {
                let data = std::fs::read(path)?;
                Ok(Some(
                    png_text::find_text(&data, PARAMETERS_KEYWORD)?.unwrap_or_default(),
                ))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::{write_jpeg, write_png};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Returns canned parameter blocks keyed by file name. Unknown files
    /// report no text attributes.
    #[derive(Default)]
    pub struct MockReader {
        pub blocks: HashMap<String, String>,
    }

    impl MockReader {
        pub fn with(mut self, file_name: &str, block: &str) -> Self {
            self.blocks.insert(file_name.to_string(), block.to_string());
            self
        }
    }

    impl MetadataReader for MockReader {
        fn read_parameters(
            &self,
            path: &Path,
            _kind: ImageKind,
        ) -> Result<Option<String>, ReadError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(self.blocks.get(&name).cloned())
        }
    }

    #[test]
    fn png_parameters_are_returned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gen.png");
        write_png(&path, Some("a cat\nNegative prompt: dog\nSteps: 20"));

        let text = ContainerReader.read_parameters(&path, ImageKind::Png).unwrap();
        assert_eq!(text.as_deref(), Some("a cat\nNegative prompt: dog\nSteps: 20"));
    }

    #[test]
    fn png_without_parameters_is_empty_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.png");
        write_png(&path, None);

        let text = ContainerReader.read_parameters(&path, ImageKind::Png).unwrap();
        assert_eq!(text.as_deref(), Some(""));
    }

    #[test]
    fn jpeg_has_no_text_attributes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        write_jpeg(&path);

        let text = ContainerReader.read_parameters(&path, ImageKind::Jpeg).unwrap();
        assert_eq!(text, None);
    }

    #[test]
    fn damaged_png_is_decoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(b"not a chunk stream");
        std::fs::write(&path, data).unwrap();

        let result = ContainerReader.read_parameters(&path, ImageKind::Png);
        assert!(matches!(result, Err(ReadError::Png(_))));
    }

    #[test]
    fn missing_png_is_io_error() {
        let path = PathBuf::from("/nonexistent/gen.png");
        let result = ContainerReader.read_parameters(&path, ImageKind::Png);
        assert!(matches!(result, Err(ReadError::Io(_))));
    }
}
