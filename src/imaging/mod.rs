//! Image container access: content sniffing and embedded text, no pixels.
//!
//! | Concern | Where |
//! |---|---|
//! | **Identify** | [`sniff`]: `image::guess_format` + fixed signatures |
//! | **Text chunks** | [`png_text`]: `tEXt` / `zTXt` / `iTXt` through the `png` decoder |
//! | **Parameters** | [`MetadataReader`] trait + [`ContainerReader`] |

pub mod png_text;
pub mod reader;
pub mod sniff;

pub use reader::{ContainerReader, MetadataReader, PARAMETERS_KEYWORD, ReadError};
pub use sniff::{ImageKind, sniff, sniff_file};
