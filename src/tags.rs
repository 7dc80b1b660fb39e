//! Typed view of the primary tag dictionary.
//!
//! The extraction tool groups its output by namespace (`File`, `EXIF`,
//! `QuickTime`, ...) and emits one JSON object per file:
//!
//! ```text
//! {
//!   "SourceFile": "holidays/IMG_0042.jpg",
//!   "File": { "MIMEType": "image/jpeg", "FileModifyDate": "2016:10:28 17:34:58" },
//!   "EXIF": { "DateTimeOriginal": "2016:10:28 17:34:58", "ImageDescription": "Dusk" },
//!   "IPTC": { "Keywords": ["beach", "sunset"] },
//!   "XMP":  { "Rating": 3 }
//! }
//! ```
//!
//! Only the tags the deriver reads are modelled. Everything else in the dump is
//! ignored on deserialization, and every modelled tag is an `Option`, so a
//! missing namespace or tag is just `None`.
//!
//! The tool is loose about scalar types: a caption made of digits comes out as
//! a JSON number, a rating may come out as `"3"`, and a repeated IPTC dataset
//! becomes a list. String tags therefore accept any scalar, numeric tags are
//! kept as a [`TagValue`] and coerced later under the configured policy, and
//! keywords accept either shape.

use crate::config::{CoercionConfig, FractionalPolicy};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagsError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A scalar tag value exactly as the extraction tool emitted it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl TagValue {
    /// Render the value as text. Integral numbers print without a fraction.
    pub fn to_text(&self) -> String {
        match self {
            TagValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            TagValue::Number(n) => n.to_string(),
            TagValue::Text(s) => s.clone(),
            TagValue::Flag(b) => b.to_string(),
        }
    }

    /// Coerce to an integer under the given policy.
    ///
    /// - Numbers are accepted when integral; fractional numbers follow
    ///   `fractional_numbers` (reject, or truncate toward zero).
    /// - Text is parsed only when `numeric_strings` is enabled, and then goes
    ///   through the same integral check.
    /// - Flags are never numeric.
    pub fn as_integer(&self, policy: &CoercionConfig) -> Option<i64> {
        let number = match self {
            TagValue::Number(n) => *n,
            TagValue::Text(s) if policy.numeric_strings => s.trim().parse::<f64>().ok()?,
            TagValue::Text(_) | TagValue::Flag(_) => return None,
        };
        if !number.is_finite() {
            return None;
        }
        if number.fract() != 0.0 && policy.fractional_numbers == FractionalPolicy::Reject {
            return None;
        }
        let truncated = number.trunc();
        if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
            return None;
        }
        Some(truncated as i64)
    }
}

/// `IPTC:Keywords` as emitted: one string, or a list for repeated datasets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
    List(Vec<TagValue>),
    Single(TagValue),
}

impl Keywords {
    /// The raw comma-separated strings, in source order.
    pub fn raw_parts(&self) -> Vec<String> {
        match self {
            Keywords::List(items) => items.iter().map(TagValue::to_text).collect(),
            Keywords::Single(value) => vec![value.to_text()],
        }
    }

    /// True only for a single empty string, the one shape that counts as unset.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Keywords::Single(TagValue::Text(s)) if s.is_empty())
    }
}

impl From<&str> for Keywords {
    fn from(raw: &str) -> Self {
        Keywords::Single(TagValue::Text(raw.to_string()))
    }
}

/// Accept any scalar for a textual tag, storing numbers as their decimal text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TagValue>::deserialize(deserializer)?.map(|v| v.to_text()))
}

/// The primary tag dictionary for one file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tags {
    /// Path of the file the tags were read from (top-level in tool output).
    #[serde(rename = "SourceFile", deserialize_with = "lenient_string")]
    pub source_file: Option<String>,
    #[serde(rename = "File")]
    pub file: FileTags,
    #[serde(rename = "EXIF")]
    pub exif: ExifTags,
    #[serde(rename = "H264")]
    pub h264: H264Tags,
    #[serde(rename = "QuickTime")]
    pub quicktime: QuickTimeTags,
    #[serde(rename = "GIF")]
    pub gif: GifTags,
    #[serde(rename = "PNG")]
    pub png: PngTags,
    #[serde(rename = "IPTC")]
    pub iptc: IptcTags,
    #[serde(rename = "XMP")]
    pub xmp: XmpTags,
}

impl Tags {
    /// Parse one grouped JSON object.
    pub fn from_json(json: &str) -> Result<Tags, TagsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse the tool's top-level array, one object per file.
    pub fn from_json_array(json: &str) -> Result<Vec<Tags>, TagsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The source path, from the top level or failing that from `File`.
    pub fn source_file(&self) -> Option<&str> {
        self.source_file
            .as_deref()
            .or(self.file.source_file.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileTags {
    #[serde(rename = "SourceFile", deserialize_with = "lenient_string")]
    pub source_file: Option<String>,
    #[serde(rename = "FileModifyDate", deserialize_with = "lenient_string")]
    pub file_modify_date: Option<String>,
    #[serde(rename = "MIMEType", deserialize_with = "lenient_string")]
    pub mime_type: Option<String>,
    #[serde(rename = "ImageWidth")]
    pub image_width: Option<TagValue>,
    #[serde(rename = "ImageHeight")]
    pub image_height: Option<TagValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExifTags {
    #[serde(rename = "DateTimeOriginal", deserialize_with = "lenient_string")]
    pub date_time_original: Option<String>,
    #[serde(rename = "ImageDescription", deserialize_with = "lenient_string")]
    pub image_description: Option<String>,
    #[serde(rename = "Make", deserialize_with = "lenient_string")]
    pub make: Option<String>,
    #[serde(rename = "Model", deserialize_with = "lenient_string")]
    pub model: Option<String>,
    #[serde(rename = "ExposureTime", deserialize_with = "lenient_string")]
    pub exposure_time: Option<String>,
    #[serde(rename = "FNumber", deserialize_with = "lenient_string")]
    pub f_number: Option<String>,
    #[serde(rename = "ISO", deserialize_with = "lenient_string")]
    pub iso: Option<String>,
    #[serde(rename = "FocalLength", deserialize_with = "lenient_string")]
    pub focal_length: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct H264Tags {
    #[serde(rename = "DateTimeOriginal", deserialize_with = "lenient_string")]
    pub date_time_original: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuickTimeTags {
    #[serde(rename = "CreationDate", deserialize_with = "lenient_string")]
    pub creation_date: Option<String>,
    #[serde(rename = "CreateDate", deserialize_with = "lenient_string")]
    pub create_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GifTags {
    #[serde(rename = "FrameCount")]
    pub frame_count: Option<TagValue>,
}

/// Animated PNG frame count (`acTL` chunk).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PngTags {
    #[serde(rename = "AnimationFrames")]
    pub animation_frames: Option<TagValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IptcTags {
    #[serde(rename = "Caption-Abstract", deserialize_with = "lenient_string")]
    pub caption_abstract: Option<String>,
    #[serde(rename = "Headline", deserialize_with = "lenient_string")]
    pub headline: Option<String>,
    #[serde(rename = "Keywords")]
    pub keywords: Option<Keywords>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct XmpTags {
    #[serde(rename = "Description", deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(rename = "Title", deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(rename = "Label", deserialize_with = "lenient_string")]
    pub label: Option<String>,
    #[serde(rename = "Rating")]
    pub rating: Option<TagValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> CoercionConfig {
        CoercionConfig {
            numeric_strings: false,
            fractional_numbers: FractionalPolicy::Reject,
        }
    }

    #[test]
    fn parses_grouped_object() {
        let tags = Tags::from_json(
            r#"{
                "SourceFile": "folder/IMG_0001.jpg",
                "File": { "MIMEType": "image/jpeg", "FileModifyDate": "2016:10:28 17:34:58" },
                "EXIF": { "DateTimeOriginal": "2016:10:28 17:34:58" },
                "XMP": { "Rating": 4 }
            }"#,
        )
        .unwrap();
        assert_eq!(tags.source_file(), Some("folder/IMG_0001.jpg"));
        assert_eq!(tags.file.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(
            tags.exif.date_time_original.as_deref(),
            Some("2016:10:28 17:34:58")
        );
        assert_eq!(tags.xmp.rating, Some(TagValue::Number(4.0)));
    }

    #[test]
    fn missing_namespaces_are_empty() {
        let tags = Tags::from_json("{}").unwrap();
        assert_eq!(tags.source_file(), None);
        assert_eq!(tags.quicktime.create_date, None);
        assert_eq!(tags.iptc.keywords, None);
    }

    #[test]
    fn unknown_namespaces_and_tags_are_ignored() {
        let tags = Tags::from_json(
            r#"{ "Composite": { "Megapixels": 12.2 }, "EXIF": { "Orientation": "Rotate 90 CW" } }"#,
        )
        .unwrap();
        assert_eq!(tags.exif.date_time_original, None);
    }

    #[test]
    fn null_tags_are_absent() {
        let tags = Tags::from_json(r#"{ "XMP": { "Title": null, "Rating": null } }"#).unwrap();
        assert_eq!(tags.xmp.title, None);
        assert_eq!(tags.xmp.rating, None);
    }

    #[test]
    fn numeric_text_tags_become_strings() {
        let tags = Tags::from_json(r#"{ "IPTC": { "Headline": 2017 }, "EXIF": { "FNumber": 2.8 } }"#)
            .unwrap();
        assert_eq!(tags.iptc.headline.as_deref(), Some("2017"));
        assert_eq!(tags.exif.f_number.as_deref(), Some("2.8"));
    }

    #[test]
    fn source_file_falls_back_to_file_namespace() {
        let tags = Tags::from_json(r#"{ "File": { "SourceFile": "a/b.jpg" } }"#).unwrap();
        assert_eq!(tags.source_file(), Some("a/b.jpg"));

        let tags = Tags::from_json(r#"{ "SourceFile": "top.jpg", "File": { "SourceFile": "inner.jpg" } }"#)
            .unwrap();
        assert_eq!(tags.source_file(), Some("top.jpg"));
    }

    #[test]
    fn keywords_accept_string_or_list() {
        let single = Tags::from_json(r#"{ "IPTC": { "Keywords": "beach,sunset" } }"#).unwrap();
        assert_eq!(
            single.iptc.keywords.unwrap().raw_parts(),
            vec!["beach,sunset"]
        );

        let list = Tags::from_json(r#"{ "IPTC": { "Keywords": ["beach", 2016, "sunset"] } }"#)
            .unwrap();
        assert_eq!(
            list.iptc.keywords.unwrap().raw_parts(),
            vec!["beach", "2016", "sunset"]
        );
    }

    #[test]
    fn only_a_single_empty_string_is_empty_text() {
        assert!(Keywords::from("").is_empty_text());
        assert!(!Keywords::from(" , ").is_empty_text());
        assert!(!Keywords::List(vec![]).is_empty_text());
        assert!(!Keywords::Single(TagValue::Number(0.0)).is_empty_text());
    }

    #[test]
    fn parses_array_output() {
        let all = Tags::from_json_array(r#"[{ "SourceFile": "a.jpg" }, { "SourceFile": "b.mp4" }]"#)
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].source_file(), Some("b.mp4"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Tags::from_json("{ not json"),
            Err(TagsError::Json(_))
        ));
    }

    #[test]
    fn integer_coercion_of_numbers() {
        let policy = CoercionConfig::default();
        assert_eq!(TagValue::Number(3.0).as_integer(&policy), Some(3));
        assert_eq!(TagValue::Number(-1.0).as_integer(&policy), Some(-1));
        assert_eq!(TagValue::Number(2.5).as_integer(&policy), None);
        assert_eq!(TagValue::Flag(true).as_integer(&policy), None);
    }

    #[test]
    fn fractional_numbers_can_be_truncated() {
        let policy = CoercionConfig {
            fractional_numbers: FractionalPolicy::Truncate,
            ..CoercionConfig::default()
        };
        assert_eq!(TagValue::Number(2.9).as_integer(&policy), Some(2));
        assert_eq!(TagValue::Text("4.5".into()).as_integer(&policy), Some(4));
    }

    #[test]
    fn numeric_strings_follow_policy() {
        let value = TagValue::Text(" 3 ".into());
        assert_eq!(value.as_integer(&CoercionConfig::default()), Some(3));
        assert_eq!(value.as_integer(&strict()), None);
        assert_eq!(
            TagValue::Text("three".into()).as_integer(&CoercionConfig::default()),
            None
        );
    }

    #[test]
    fn to_text_drops_integral_fraction() {
        assert_eq!(TagValue::Number(10.0).to_text(), "10");
        assert_eq!(TagValue::Number(0.5).to_text(), "0.5");
        assert_eq!(TagValue::Text("x".into()).to_text(), "x");
    }
}
