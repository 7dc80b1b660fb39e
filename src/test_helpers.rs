//! Shared test utilities for the media-metadata test suite.
//!
//! Provides tag-dictionary builders, a fixed clock, and a helper that turns a
//! human-readable local time into the epoch milliseconds the deriver produces.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut tags = with_source("folder/VID_20170220_114006.mp4");
//! tags.file.mime_type = Some("video/mp4".into());
//!
//! let meta = derive(&tags);
//! assert_eq!(meta.date(), local_ms("2017-02-20 11:40:06"));
//! ```

use chrono::{Local, NaiveDateTime, TimeZone};

use crate::config::DeriveConfig;
use crate::metadata::Metadata;
use crate::sidecar::Sidecar;
use crate::tags::Tags;

/// Clock value handed to the deriver when no date source is usable.
pub const FIXED_NOW: i64 = 1_700_000_000_000;

// =========================================================================
// Dates
// =========================================================================

/// Epoch milliseconds of a local wall-clock time written `YYYY-MM-DD HH:MM:SS`.
pub fn local_ms(text: &str) -> i64 {
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|e| panic!("bad test date '{text}': {e}"));
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| panic!("'{text}' does not exist in the local timezone"))
        .timestamp_millis()
}

// =========================================================================
// Fixture builders
// =========================================================================

/// Empty tags with only the source path set.
pub fn with_source(path: &str) -> Tags {
    Tags {
        source_file: Some(path.to_string()),
        ..Tags::default()
    }
}

/// Empty tags with only `File:MIMEType` set.
pub fn with_mime(mime: &str) -> Tags {
    let mut tags = Tags::default();
    tags.file.mime_type = Some(mime.to_string());
    tags
}

/// A sidecar with the given keywords (empty = unset) and star.
pub fn sidecar(keywords: &str, star: Option<&str>) -> Sidecar {
    Sidecar {
        keywords: (!keywords.is_empty()).then(|| keywords.to_string()),
        star: star.map(String::from),
        caption: None,
    }
}

// =========================================================================
// Derivation shortcuts
// =========================================================================

/// Derive with stock config, no sidecar, and the fixed clock.
pub fn derive(tags: &Tags) -> Metadata {
    Metadata::derive(tags, None, &DeriveConfig::default(), || FIXED_NOW)
}

/// Derive with stock config, a sidecar, and the fixed clock.
pub fn derive_with(tags: &Tags, sidecar: &Sidecar) -> Metadata {
    Metadata::derive(tags, Some(sidecar), &DeriveConfig::default(), || FIXED_NOW)
}
