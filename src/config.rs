//! Tool configuration.
//!
//! Handles loading, validating, and merging the optional `sd-organizer.toml`.
//! Stock defaults are the base layer; the user file overrides only the keys
//! it names; command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input_dir = "input"           # Where generated images are picked up
//! output_dir = "output"         # Root of the model/date tree
//!
//! [parameters]
//! key_style = "preserve"        # or "lower_snake_case"
//!
//! [organize]
//! default_model = "unknown"     # Directory for images without a Model field
//! max_rename_attempts = 16      # Timestamp suffixes tried before giving up
//! keep_going = false            # Log per-image failures and continue
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::parameters::KeyStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "sd-organizer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `sd-organizer.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Input location: a directory walked recursively, or a single file.
    pub input_dir: PathBuf,
    /// Root of the organized output tree.
    pub output_dir: PathBuf,
    /// How the parameters block is turned into keys.
    pub parameters: ParametersConfig,
    /// Relocation behaviour.
    pub organize: OrganizeConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            parameters: ParametersConfig::default(),
            organize: OrganizeConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.organize.max_rename_attempts == 0 {
            return Err(ConfigError::Validation(
                "organize.max_rename_attempts must be at least 1".into(),
            ));
        }
        let model = self.organize.default_model.trim();
        if model.is_empty() || model == "." || model == ".." {
            return Err(ConfigError::Validation(
                "organize.default_model must be a directory name".into(),
            ));
        }
        if model.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "organize.default_model must not contain path separators".into(),
            ));
        }
        Ok(())
    }
}

/// Parser settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParametersConfig {
    /// `preserve` keeps keys as written (`CFG scale`); `lower_snake_case`
    /// produces `cfg_scale`.
    pub key_style: KeyStyle,
}

/// Relocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrganizeConfig {
    /// Directory used when an image carries no model name.
    pub default_model: String,
    /// Timestamp-suffixed names tried when the destination already exists.
    pub max_rename_attempts: u32,
    /// Log a failing image and continue with the next one instead of
    /// aborting the run.
    pub keep_going: bool,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            default_model: "unknown".to_string(),
            max_rename_attempts: 16,
            keep_going: false,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` if it doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize, validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sd-organizer configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags win over this file.
# Unknown keys will cause an error.

# Input location: a directory (walked recursively) or a single image file.
input_dir = "input"

# Root of the output tree: <output_dir>/<model>/<YYYY-MM-DD>/<name>.<ext>
output_dir = "output"

# ---------------------------------------------------------------------------
# Parameters parsing
# ---------------------------------------------------------------------------
[parameters]
# "preserve"          keys as written:  Prompt, Negative prompt, CFG scale
# "lower_snake_case"  normalised keys:  prompt, negative, cfg_scale
key_style = "preserve"

# ---------------------------------------------------------------------------
# Organizing
# ---------------------------------------------------------------------------
[organize]
# Directory used for images whose parameters carry no model name.
default_model = "unknown"

# When the destination exists, a -<timestamp> suffix is added before the
# extension. This bounds how many suffixed names are tried.
max_rename_attempts = 16

# false: the first I/O error aborts the run.
# true:  the failing image is reported and the run continues.
keep_going = false
"##
}
