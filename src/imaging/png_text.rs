//! PNG text chunks, read through the `png` decoder.
//!
//! All three textual chunk kinds are collected:
//! - `tEXt`: Latin-1
//! - `zTXt`: zlib-compressed Latin-1
//! - `iTXt`: UTF-8, optionally zlib-compressed
//!
//! Only the chunks ahead of the image data are read; pixels are never
//! decoded. Generators write their text there. A compressed chunk that fails
//! to inflate is skipped, while a damaged file structure is an error.

use png::{Decoder, DecodingError};
use std::io::Cursor;
use tracing::debug;

/// One decoded text chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub keyword: String,
    pub text: String,
}

/// Collect the text chunks of a PNG file: `tEXt` first, then `zTXt`, then
/// `iTXt`, each in file order.
pub fn read_text_chunks(data: &[u8]) -> Result<Vec<TextChunk>, DecodingError> {
    let reader = Decoder::new(Cursor::new(data)).read_info()?;
    let info = reader.info();

    let mut chunks: Vec<TextChunk> = info
        .uncompressed_latin1_text
        .iter()
        .map(|chunk| TextChunk {
            keyword: chunk.keyword.clone(),
            text: chunk.text.clone(),
        })
        .collect();

    for chunk in &info.compressed_latin1_text {
        let mut chunk = chunk.clone();
        match chunk.decompress_text().and_then(|()| chunk.get_text()) {
            Ok(text) => chunks.push(TextChunk {
                keyword: chunk.keyword,
                text,
            }),
            Err(e) => debug!(keyword = %chunk.keyword, error = %e, "skipping undecodable zTXt chunk"),
        }
    }

    for chunk in &info.utf8_text {
        let mut chunk = chunk.clone();
        if chunk.compressed {
            if let Err(e) = chunk.decompress_text() {
                debug!(keyword = %chunk.keyword, error = %e, "skipping undecodable iTXt chunk");
                continue;
            }
        }
        match chunk.get_text() {
            Ok(text) => chunks.push(TextChunk {
                keyword: chunk.keyword,
                text,
            }),
            Err(e) => debug!(keyword = %chunk.keyword, error = %e, "skipping undecodable iTXt chunk"),
        }
    }

    Ok(chunks)
}

/// Value of the text chunk with the given keyword. When a keyword repeats,
/// the last one collected wins.
pub fn find_text(data: &[u8], keyword: &str) -> Result<Option<String>, DecodingError> {
    Ok(read_text_chunks(data)?
        .into_iter()
        .rev()
        .find(|c| c.keyword == keyword)
        .map(|c| c.text))
}
