//! Parser for the `parameters` text block embedded by image generators.
//!
//! The block is free-form, newline-delimited text with three sections:
//!
//! ```text
//! a lighthouse at dusk,                      ┐
//! oil painting, (masterpiece:1.2)            ┘ prompt (any number of lines)
//! Negative prompt: blurry, lowres            ← marker line
//! Steps: 20, Sampler: Euler a, Size: 512x768 ← parameter lines
//! ```
//!
//! Everything before the first line starting with `Negative prompt:` is the
//! prompt. The marker line carries the negative prompt. Every line after it
//! is split on `", "` and each token is read as a `key: value` pair.
//!
//! ## Known limitation
//!
//! Token splitting is purely textual. A value that itself contains `", "`
//! (quoted lora hash lists, for example) is fragmented, and fragments that
//! don't look like `key: value` are dropped. This matches what the upstream
//! tooling has always produced and is not corrected here.
//!
//! ## Derived fields
//!
//! A `size` key (`Size` in the preserved style) whose value looks like
//! `<W>x<H>` additionally produces `width` and `height`. Values that do not
//! split into exactly two parts leave those fields unset.

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

const NEGATIVE_MARKER: &str = "Negative prompt:";
const TOKEN_SEPARATOR: &str = ", ";
const SIZE_KEY: &str = "size";

/// `key: value` where the key is word/space characters and the value is
/// everything after the first colon and any whitespace following it.
static PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w\s]+):\s*(.+)").expect("parameter pattern must compile")
});

/// How parameter keys are written into the parsed record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum KeyStyle {
    /// Keys exactly as written (`CFG scale`), prompt under `Prompt`.
    #[default]
    Preserve,
    /// Lower-cased keys with spaces turned into underscores (`cfg_scale`),
    /// prompt under `prompt`.
    LowerSnakeCase,
}

impl KeyStyle {
    pub fn prompt_key(self) -> &'static str {
        match self {
            KeyStyle::Preserve => "Prompt",
            KeyStyle::LowerSnakeCase => "prompt",
        }
    }

    pub fn negative_key(self) -> &'static str {
        match self {
            KeyStyle::Preserve => "Negative prompt",
            KeyStyle::LowerSnakeCase => "negative",
        }
    }

    pub fn model_key(self) -> &'static str {
        match self {
            KeyStyle::Preserve => "Model",
            KeyStyle::LowerSnakeCase => "model",
        }
    }

    fn normalize(self, raw_key: &str) -> String {
        let key = raw_key.trim();
        match self {
            KeyStyle::Preserve => key.to_string(),
            KeyStyle::LowerSnakeCase => key.to_lowercase().replace(' ', "_"),
        }
    }
}

/// Fields extracted from one parameters block.
///
/// Immutable once built by [`parse`]; callers compose it into larger records
/// by value. Serializes as a flat JSON object of string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: BTreeMap<String, String>,
    style: KeyStyle,
}

impl Parameters {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The prompt, present only when the negative-prompt marker was found.
    pub fn prompt(&self) -> Option<&str> {
        self.get(self.style.prompt_key())
    }

    pub fn negative_prompt(&self) -> Option<&str> {
        self.get(self.style.negative_key())
    }

    pub fn model(&self) -> Option<&str> {
        self.get(self.style.model_key())
    }

    /// Whether this block carries generation metadata worth organizing.
    pub fn has_prompt(&self) -> bool {
        self.prompt().is_some_and(|p| !p.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// Parse a raw parameters block.
///
/// Never fails: an empty block, or one without a marker line, simply yields
/// a record with no prompt keys.
pub fn parse(raw: &str, style: KeyStyle) -> Parameters {
    let mut entries = BTreeMap::new();
    let mut prompt_lines: Vec<&str> = Vec::new();
    let mut prompt_ended = false;

    for line in raw.split('\n').map(str::trim) {
        if prompt_ended {
            for token in line.split(TOKEN_SEPARATOR) {
                parse_token(token, style, &mut entries);
            }
        } else if let Some(negative) = line.strip_prefix(NEGATIVE_MARKER) {
            prompt_ended = true;
            entries.insert(style.prompt_key().to_string(), prompt_lines.join("\n"));
            entries.insert(style.negative_key().to_string(), negative.trim().to_string());
        } else {
            prompt_lines.push(line);
        }
    }

    Parameters { entries, style }
}

fn parse_token(token: &str, style: KeyStyle, entries: &mut BTreeMap<String, String>) {
    let Some(caps) = PARAM_PATTERN.captures(token) else {
        return;
    };
    let key = style.normalize(&caps[1]);
    let value = caps[2].to_string();

    if key.eq_ignore_ascii_case(SIZE_KEY) {
        match split_size(&value) {
            Some((width, height)) => {
                entries.insert("width".to_string(), width.to_string());
                entries.insert("height".to_string(), height.to_string());
            }
            None => debug!(size = %value, "size value is not WxH, width/height not derived"),
        }
    }

    entries.insert(key, value);
}

/// Split `512x768` into its two halves. Anything other than exactly one `x`
/// is rejected.
fn split_size(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.split('x');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(width), Some(height), None) => Some((width, height)),
        _ => None,
    }
}
