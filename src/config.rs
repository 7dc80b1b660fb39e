//! Derivation policy configuration.
//!
//! The deriver itself has no switches that change the precedence order; the
//! config only governs how loosely-typed tag values are interpreted and which
//! optional parts of the record are produced.
//!
//! ## Config File Location
//!
//! An optional `metadata.toml` in the directory handed to [`load_config`]:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [coercion]
//! numeric_strings = true         # accept "3" where a number is expected
//! fractional_numbers = "reject"  # "reject" or "truncate" values like 2.5
//!
//! [dates]
//! infer_from_filename = true     # VID_20170220_114006.mp4, 2017-03-24 19.42.30.jpg
//!
//! [output]
//! embed_exif = false             # include the camera summary in the record
//! ```
//!
//! Config files are sparse: they are merged on top of the stock defaults, so
//! a file need only name the keys it changes. Unknown keys are rejected to
//! catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "metadata.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Policy applied while deriving a [`crate::metadata::Metadata`] record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeriveConfig {
    /// How numeric tags given in unexpected shapes are read.
    pub coercion: CoercionConfig,
    /// Date resolution switches.
    pub dates: DatesConfig,
    /// Optional record sections.
    pub output: OutputConfig,
}

/// Type-coercion policy for numeric tags (`XMP:Rating`, frame counts, dimensions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoercionConfig {
    /// Parse numeric tags that arrive as strings. When false they count as absent.
    pub numeric_strings: bool,
    /// Treatment of numbers with a fractional part.
    pub fractional_numbers: FractionalPolicy,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            numeric_strings: true,
            fractional_numbers: FractionalPolicy::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FractionalPolicy {
    /// A fractional value counts as absent.
    #[default]
    Reject,
    /// Truncate toward zero.
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatesConfig {
    /// Infer the capture date from well-known filename patterns when no
    /// embedded date exists.
    pub infer_from_filename: bool,
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            infer_from_filename: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Attach an [`crate::metadata::ExifSummary`] to each record.
    pub embed_exif: bool,
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(DeriveConfig::default()).expect("default config must serialize")
}

/// Layer `overlay` onto `base` in place.
///
/// Tables merge per key, recursively. Any other overlay value (scalar, array,
/// or a table landing on a scalar) replaces what was there.
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(table), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                match table.get_mut(&key) {
                    Some(slot) => merge_toml(slot, value),
                    None => {
                        table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Read `metadata.toml` from `dir`, if there is one.
pub fn read_overlay(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    match fs::read_to_string(dir.join(CONFIG_FILE_NAME)) {
        Ok(text) => Ok(Some(toml::from_str(&text)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl DeriveConfig {
    /// Stock defaults with `overlay` (a sparse user table) applied on top.
    pub fn from_overlay(overlay: Option<toml::Value>) -> Result<DeriveConfig, ConfigError> {
        let mut layered = stock_defaults_value();
        if let Some(overlay) = overlay {
            merge_toml(&mut layered, overlay);
        }
        Ok(layered.try_into()?)
    }
}

/// The policy for media under `dir`: its `metadata.toml` over the stock
/// defaults, or the stock defaults alone when the file is missing.
pub fn load_config(dir: &Path) -> Result<DeriveConfig, ConfigError> {
    DeriveConfig::from_overlay(read_overlay(dir)?)
}

/// Returns a fully-commented stock `metadata.toml`.
pub fn stock_config_toml() -> &'static str {
    r##"# Media Metadata Configuration
# ============================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Type coercion for numeric tags (XMP:Rating, GIF:FrameCount, ImageWidth, ...)
# ---------------------------------------------------------------------------
[coercion]
# Accept numbers written as strings, e.g. Rating = "3".
# When false, such values are treated as absent.
numeric_strings = true

# What to do with a number that has a fractional part, e.g. Rating = 2.5.
# "reject"   -> treat as absent
# "truncate" -> drop the fraction (2.5 -> 2, -1.5 -> -1)
fractional_numbers = "reject"

# ---------------------------------------------------------------------------
# Dates
# ---------------------------------------------------------------------------
[dates]
# When no embedded capture date exists, infer one from filenames such as
# VID_20170220_114006.mp4 or "2017-03-24 19.42.30.jpg".
infer_from_filename = true

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Include a camera summary (make, model, exposure, aperture, ISO, focal
# length) in each derived record.
embed_exif = false
"##
}
