//! # Media Metadata
//!
//! Derives one canonical, typed metadata record per media file from the raw
//! tag dump of an external extraction tool (EXIF, IPTC, XMP, QuickTime, ...)
//! and an optional sidecar left behind by a legacy photo organizer.
//!
//! Many sources can answer the same question ("when was this taken?", "what
//! is the caption?") with different reliability and different notions of
//! absence. This crate settles each field with a fixed precedence order and
//! never fails: missing namespaces, missing tags and malformed values all fall
//! through to the next source and, at the end, to a safe default.
//!
//! ```text
//! Tags (tool JSON) ─┐
//!                   ├─→ Metadata::new ─→ Metadata { date, video, animated,
//! Sidecar (opt.) ───┘                               caption, keywords,
//!                                                   rating, favourite, ... }
//! ```
//!
//! No I/O happens during derivation. Running the extraction tool, reading
//! files and storing results belong to the caller.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`metadata`] | The deriver: precedence chains and the immutable [`Metadata`] record |
//! | [`tags`] | Typed primary tag dictionary, deserialized from the tool's grouped JSON |
//! | [`sidecar`] | Legacy per-file metadata and the `.picasa.ini` index parser |
//! | [`dates`] | Fixed-format tag date parser, filename date inference, local-time conversion |
//! | [`config`] | `metadata.toml` loading: coercion policy and optional record sections |
//!
//! # Design Decisions
//!
//! ## Typed Tags Over Generic Maps
//!
//! The tool's output is a dynamically keyed dictionary, but the deriver only
//! reads a fixed set of tags. Modelling them as `Option` fields turns every
//! "is this tag there?" question into a checked optional access, and renaming
//! or dropping a tag becomes a compile error instead of a silent `None`.
//!
//! ## Precedence as Data
//!
//! Each multi-source field is resolved from an ordered table of
//! `(label, extractor)` pairs rather than nested conditionals. The table is
//! the documentation of the priority order, and the label is what shows up in
//! logs when a value is skipped.
//!
//! ## Fall Through, Never Fail
//!
//! Downstream consumers depend on the exact fall-through behaviour, including
//! the surprising cases (a `FileModifyDate` with a UTC offset is ignored). The
//! deriver therefore has no error type at all. Unusable values are reported
//! through `tracing` at debug level and otherwise skipped.
//!
//! ## Naive Local Time
//!
//! Capture dates in media files carry no timezone. They are interpreted as
//! local wall-clock time and converted to epoch milliseconds with
//! `chrono::Local`, matching how the files are displayed on the machine that
//! builds the library.

pub mod config;
pub mod dates;
pub mod metadata;
pub mod sidecar;
pub mod tags;

pub use config::DeriveConfig;
pub use metadata::{ExifSummary, Metadata};
pub use sidecar::{PicasaIndex, Sidecar};
pub use tags::Tags;

#[cfg(test)]
pub(crate) mod test_helpers;
