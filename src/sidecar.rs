//! Secondary metadata from a legacy photo organizer.
//!
//! The organizer kept per-file metadata outside the image, in a `.picasa.ini`
//! index next to the files of each folder:
//!
//! ```text
//! [Picasa]
//! name=Holidays
//! [IMG_0042.jpg]
//! star=yes
//! keywords=beach,sunset
//! caption=Last light
//! [IMG_0043.jpg]
//! keywords=harbour
//! ```
//!
//! Each file section maps to one [`Sidecar`]. Only `keywords` and `star` take
//! part in derivation; `caption` is carried for consumers that want it.
//!
//! Parsing is total in the same way the embedded-metadata readers are:
//! malformed lines are skipped, never reported.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-file legacy metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sidecar {
    /// Comma-separated keyword list.
    pub keywords: Option<String>,
    /// `"yes"` when the file was starred.
    pub star: Option<String>,
    pub caption: Option<String>,
}

impl Sidecar {
    pub fn is_starred(&self) -> bool {
        self.star.as_deref() == Some("yes")
    }

    fn from_entries(entries: &BTreeMap<String, String>) -> Self {
        Self {
            keywords: entries.get("keywords").cloned(),
            star: entries.get("star").cloned(),
            caption: entries.get("caption").cloned(),
        }
    }
}

/// Parsed `.picasa.ini`: section name to lower-cased keys and raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PicasaIndex {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl PicasaIndex {
    pub fn parse(text: &str) -> PicasaIndex {
        let mut index = PicasaIndex::default();
        let mut current: Option<String> = None;

        for line in text.trim_start_matches('\u{feff}').lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                index.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            // Key/value lines outside any section have nowhere to go
            let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('='))
            else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            index
                .sections
                .entry(section.clone())
                .or_default()
                .insert(key, value.trim().to_string());
        }
        index
    }

    /// The sidecar for `file_name` (exact, case-sensitive section match).
    pub fn sidecar_for(&self, file_name: &str) -> Option<Sidecar> {
        self.sections.get(file_name).map(Sidecar::from_entries)
    }

    /// Names of all sections, including the folder-level `[Picasa]` one.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "\
[Picasa]
name=Holidays

[IMG_0042.jpg]
star=yes
keywords=beach,sunset
caption=Last light

; starred by accident, unstarred later
[IMG_0043.jpg]
Keywords = harbour
star=no
";

    #[test]
    fn sidecar_for_known_file() {
        let index = PicasaIndex::parse(INDEX);
        assert_eq!(
            index.sidecar_for("IMG_0042.jpg"),
            Some(Sidecar {
                keywords: Some("beach,sunset".into()),
                star: Some("yes".into()),
                caption: Some("Last light".into()),
            })
        );
    }

    #[test]
    fn keys_are_case_insensitive_and_trimmed() {
        let index = PicasaIndex::parse(INDEX);
        let sidecar = index.sidecar_for("IMG_0043.jpg").unwrap();
        assert_eq!(sidecar.keywords.as_deref(), Some("harbour"));
        assert!(!sidecar.is_starred());
    }

    #[test]
    fn unknown_file_has_no_sidecar() {
        let index = PicasaIndex::parse(INDEX);
        assert_eq!(index.sidecar_for("IMG_9999.jpg"), None);
        assert_eq!(index.sidecar_for("img_0042.jpg"), None);
    }

    #[test]
    fn section_names_in_order() {
        let index = PicasaIndex::parse(INDEX);
        let names: Vec<&str> = index.section_names().collect();
        assert_eq!(names, vec!["IMG_0042.jpg", "IMG_0043.jpg", "Picasa"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let index = PicasaIndex::parse(
            "orphan=1\n[IMG_1.jpg]\nno equals sign\n=novalue\nstar=yes\n[broken\n",
        );
        let sidecar = index.sidecar_for("IMG_1.jpg").unwrap();
        assert!(sidecar.is_starred());
        assert_eq!(sidecar.keywords, None);
    }

    #[test]
    fn handles_bom_and_crlf() {
        let index = PicasaIndex::parse("\u{feff}[IMG_1.jpg]\r\nkeywords=a,b\r\n");
        assert_eq!(
            index.sidecar_for("IMG_1.jpg").unwrap().keywords.as_deref(),
            Some("a,b")
        );
    }

    #[test]
    fn empty_section_yields_empty_sidecar() {
        let index = PicasaIndex::parse("[IMG_1.jpg]\n");
        assert_eq!(index.sidecar_for("IMG_1.jpg"), Some(Sidecar::default()));
    }

    #[test]
    fn star_must_be_exactly_yes() {
        for star in ["Yes", "YES", "true", "1", ""] {
            let sidecar = Sidecar {
                star: Some(star.into()),
                ..Sidecar::default()
            };
            assert!(!sidecar.is_starred(), "{star:?} must not count as starred");
        }
    }

    #[test]
    fn deserializes_from_flat_map() {
        let sidecar: Sidecar = serde_json::from_str(r#"{ "star": "yes" }"#).unwrap();
        assert!(sidecar.is_starred());
        assert_eq!(sidecar.keywords, None);
    }
}
