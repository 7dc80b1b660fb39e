//! The metadata deriver.
//!
//! A [`Metadata`] record is computed once, at construction, from a primary tag
//! dictionary ([`Tags`]) and an optional legacy [`Sidecar`]. Derivation never
//! fails: every missing or unusable value falls through to the next source and
//! finally to a default.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first usable value wins:
//!
//! - **Date**: `EXIF:DateTimeOriginal` → `H264:DateTimeOriginal` →
//!   `QuickTime:CreationDate` → `QuickTime:CreateDate` → filename →
//!   `File:FileModifyDate` → now
//! - **Caption**: `EXIF:ImageDescription` → `IPTC:Caption-Abstract` →
//!   `IPTC:Headline` → `XMP:Description` → `XMP:Title` → `XMP:Label` → None
//! - **Keywords**: `IPTC:Keywords` → sidecar `keywords` → `[]`
//! - **Rating**: `XMP:Rating` → 0
//! - **Favourite**: sidecar `star == "yes"`
//!
//! The filename is only consulted when none of the four embedded date tags
//! parsed. A file with a valid `EXIF:DateTimeOriginal` is never dated by its
//! name, however date-like the name is.
//!
//! Tag dates must be exactly `YYYY:MM:DD HH:MM:SS`. Anything else, including
//! the `+11:00` suffix the extraction tool appends to `FileModifyDate` on some
//! platforms, is treated as absent. Consumers rely on this fall-through.
//!
//! ## Video and animation
//!
//! `video` and `animated` are classified independently from `File:MIMEType`:
//! `video/*` is video; `image/*` with more than one frame (`GIF:FrameCount`
//! or `PNG:AnimationFrames`) is animated.

use crate::config::DeriveConfig;
use crate::dates::{date_from_filename, local_millis, parse_tag_date};
use crate::sidecar::Sidecar;
use crate::tags::{TagValue, Tags};
use chrono::Local;
use serde::Serialize;
use tracing::{debug, trace};

type TextTag = (&'static str, fn(&Tags) -> Option<&str>);
type NumberTag = (&'static str, fn(&Tags) -> Option<&TagValue>);

/// Embedded capture-date tags, highest priority first.
const DATE_TAGS: &[TextTag] = &[
    ("EXIF:DateTimeOriginal", |t| t.exif.date_time_original.as_deref()),
    ("H264:DateTimeOriginal", |t| t.h264.date_time_original.as_deref()),
    ("QuickTime:CreationDate", |t| t.quicktime.creation_date.as_deref()),
    ("QuickTime:CreateDate", |t| t.quicktime.create_date.as_deref()),
];

const FILE_MODIFY_DATE: TextTag = ("File:FileModifyDate", |t| t.file.file_modify_date.as_deref());

/// Caption tags, highest priority first.
const CAPTION_TAGS: &[TextTag] = &[
    ("EXIF:ImageDescription", |t| t.exif.image_description.as_deref()),
    ("IPTC:Caption-Abstract", |t| t.iptc.caption_abstract.as_deref()),
    ("IPTC:Headline", |t| t.iptc.headline.as_deref()),
    ("XMP:Description", |t| t.xmp.description.as_deref()),
    ("XMP:Title", |t| t.xmp.title.as_deref()),
    ("XMP:Label", |t| t.xmp.label.as_deref()),
];

/// Frame-count tags of animated image formats.
const FRAME_COUNT_TAGS: &[NumberTag] = &[
    ("GIF:FrameCount", |t| t.gif.frame_count.as_ref()),
    ("PNG:AnimationFrames", |t| t.png.animation_frames.as_ref()),
];

const RATING: NumberTag = ("XMP:Rating", |t| t.xmp.rating.as_ref());
const IMAGE_WIDTH: NumberTag = ("File:ImageWidth", |t| t.file.image_width.as_ref());
const IMAGE_HEIGHT: NumberTag = ("File:ImageHeight", |t| t.file.image_height.as_ref());

/// Camera settings copied from `EXIF`, attached when `output.embed_exif` is on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,
}

impl ExifSummary {
    fn from_tags(tags: &Tags) -> Option<ExifSummary> {
        let exif = &tags.exif;
        let summary = ExifSummary {
            make: exif.make.clone(),
            model: exif.model.clone(),
            exposure_time: exif.exposure_time.clone(),
            f_number: exif.f_number.clone(),
            iso: exif.iso.clone(),
            focal_length: exif.focal_length.clone(),
        };
        (summary != ExifSummary::default()).then_some(summary)
    }
}

/// Canonical metadata for one media file.
///
/// Immutable: every field is computed by the constructor and exposed through
/// an accessor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    date: i64,
    video: bool,
    animated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    keywords: Vec<String>,
    rating: i64,
    favourite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exif: Option<ExifSummary>,
}

impl Metadata {
    /// Derive with the stock [`DeriveConfig`].
    pub fn new(tags: &Tags, sidecar: Option<&Sidecar>) -> Metadata {
        Self::with_config(tags, sidecar, &DeriveConfig::default())
    }

    pub fn with_config(tags: &Tags, sidecar: Option<&Sidecar>, config: &DeriveConfig) -> Metadata {
        Self::derive(tags, sidecar, config, || Local::now().timestamp_millis())
    }

    /// Derive a record. `now` supplies the date, in epoch milliseconds, when
    /// no date source at all is usable; it is not called otherwise.
    pub fn derive(
        tags: &Tags,
        sidecar: Option<&Sidecar>,
        config: &DeriveConfig,
        now: impl FnOnce() -> i64,
    ) -> Metadata {
        let category = media_category(tags);
        Metadata {
            date: resolve_date(tags, config).unwrap_or_else(now),
            video: category.is_some_and(|c| c.eq_ignore_ascii_case("video")),
            animated: category.is_some_and(|c| c.eq_ignore_ascii_case("image"))
                && frame_count(tags, config).is_some_and(|n| n > 1),
            caption: resolve(
                &CAPTION_TAGS
                    .iter()
                    .map(|(_, get)| get(tags))
                    .collect::<Vec<_>>(),
            ),
            keywords: resolve_keywords(tags, sidecar),
            rating: integer_tag(tags, RATING, config).unwrap_or(0),
            favourite: sidecar.is_some_and(Sidecar::is_starred),
            width: dimension(tags, IMAGE_WIDTH, config),
            height: dimension(tags, IMAGE_HEIGHT, config),
            exif: config
                .output
                .embed_exif
                .then(|| ExifSummary::from_tags(tags))
                .flatten(),
        }
    }

    /// Capture date as epoch milliseconds (naive local time).
    pub fn date(&self) -> i64 {
        self.date
    }

    pub fn video(&self) -> bool {
        self.video
    }

    pub fn animated(&self) -> bool {
        self.animated
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn rating(&self) -> i64 {
        self.rating
    }

    pub fn favourite(&self) -> bool {
        self.favourite
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn exif(&self) -> Option<&ExifSummary> {
        self.exif.as_ref()
    }
}

/// Resolve a field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, unchanged.
///
/// ```text
/// caption: resolve(&[exif_description, iptc_caption, iptc_headline, ...])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Split a comma-separated keyword string into trimmed, non-empty tokens.
///
/// Order is preserved and duplicates are kept.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

fn resolve_date(tags: &Tags, config: &DeriveConfig) -> Option<i64> {
    let embedded = DATE_TAGS.iter().find_map(|&tag| tag_date(tags, tag));
    if embedded.is_some() {
        return embedded;
    }

    let inferred = config
        .dates
        .infer_from_filename
        .then(|| tags.source_file())
        .flatten()
        .and_then(|path| {
            let millis = date_from_filename(path).and_then(local_millis);
            if millis.is_some() {
                trace!(path, "date inferred from filename");
            }
            millis
        });

    inferred.or_else(|| tag_date(tags, FILE_MODIFY_DATE))
}

/// Parse one date tag, logging values that are present but unusable.
fn tag_date(tags: &Tags, (label, get): TextTag) -> Option<i64> {
    let raw = get(tags)?;
    match parse_tag_date(raw).and_then(local_millis) {
        Some(millis) => {
            trace!(tag = label, raw, "date resolved");
            Some(millis)
        }
        None => {
            debug!(tag = label, raw, "unusable date, falling through");
            None
        }
    }
}

/// Top-level MIME category (`video` in `video/mp4`), if the type is well formed.
fn media_category(tags: &Tags) -> Option<&str> {
    let (category, subtype) = tags.file.mime_type.as_deref()?.trim().split_once('/')?;
    (!category.is_empty() && !subtype.is_empty()).then_some(category)
}

fn frame_count(tags: &Tags, config: &DeriveConfig) -> Option<i64> {
    FRAME_COUNT_TAGS
        .iter()
        .find_map(|&tag| integer_tag(tags, tag, config))
}

fn integer_tag(tags: &Tags, (label, get): NumberTag, config: &DeriveConfig) -> Option<i64> {
    let value = get(tags)?;
    let coerced = value.as_integer(&config.coercion);
    if coerced.is_none() {
        debug!(tag = label, ?value, "non-integer value ignored");
    }
    coerced
}

fn dimension(tags: &Tags, tag: NumberTag, config: &DeriveConfig) -> Option<u32> {
    integer_tag(tags, tag, config).and_then(|n| u32::try_from(n).ok())
}

/// IPTC keywords win over sidecar keywords whenever they are set. Only the
/// empty string counts as unset; a value such as `" , "` still wins and
/// splits to no keywords.
fn resolve_keywords(tags: &Tags, sidecar: Option<&Sidecar>) -> Vec<String> {
    let iptc = tags
        .iptc
        .keywords
        .as_ref()
        .filter(|k| !k.is_empty_text())
        .map(|k| {
            k.raw_parts()
                .iter()
                .flat_map(|part| split_keywords(part))
                .collect::<Vec<_>>()
        });
    let legacy = sidecar
        .and_then(|s| s.keywords.as_deref())
        .filter(|raw| !raw.is_empty())
        .map(split_keywords);

    iptc.or(legacy).unwrap_or_default()
}
