//! Date parsing helpers used by the date precedence chain.
//!
//! Two independent sources of a capture time feed the chain:
//!
//! - **Tag dates**: embedded metadata timestamps in the fixed
//!   `YYYY:MM:DD HH:MM:SS` format. Nothing else is accepted, not even the
//!   same layout with subseconds or an offset; those fall through.
//! - **Filename dates**: two naming conventions that encode the capture time
//!   in the last path segment:
//!   - `VID_20170220_114006.mp4`, `IMG_20170220_114006.jpg` (Android camera)
//!   - `2017-03-24 19.42.30.jpg`, `2017-03-24 19.42.30-1.jpg` (organizer export)
//!
//! All parsed times are naive local wall-clock times. [`local_millis`]
//! converts them to epoch milliseconds in the local timezone. Every well-formed
//! time converts, including the ones a DST transition repeats or skips.

use chrono::{Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone};
use regex::{Captures, Regex};
use std::sync::LazyLock;

const TAG_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Layout of a tag date: `d` is an ASCII digit, anything else is literal.
const TAG_DATE_SHAPE: &[u8; 19] = b"dddd:dd:dd dd:dd:dd";

/// `VID_YYYYMMDD_HHMMSS` / `IMG_YYYYMMDD_HHMMSS`, not followed by another digit.
static ANDROID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:VID|IMG)_(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})(\d{2})(?:\D.*)?$")
        .expect("valid regex")
});

/// `YYYY-MM-DD HH.MM.SS`, optionally followed by a non-digit suffix.
static ORGANIZER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2})\.(\d{2})\.(\d{2})(?:\D.*)?$")
        .expect("valid regex")
});

/// Parse a metadata tag date (`2016:10:28 17:34:58`).
///
/// Returns `None` for anything that is not exactly that shape or that names an
/// impossible calendar date.
pub fn parse_tag_date(raw: &str) -> Option<NaiveDateTime> {
    let bytes = raw.as_bytes();
    if bytes.len() != TAG_DATE_SHAPE.len() {
        return None;
    }
    let shaped = bytes
        .iter()
        .zip(TAG_DATE_SHAPE)
        .all(|(&b, &expected)| match expected {
            b'd' => b.is_ascii_digit(),
            literal => b == literal,
        });
    if !shaped {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, TAG_DATE_FORMAT).ok()
}

/// The last segment of a `/` or `\` separated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Infer a capture time from the file name of `path`.
///
/// Only the two conventions in the module docs are recognised. A name that
/// merely contains digits (`IMG_1234.jpg`) or carries extra digits after the
/// timestamp (`IMG_20170220_1140061.jpg`) yields `None`.
pub fn date_from_filename(path: &str) -> Option<NaiveDateTime> {
    let name = file_name(path);
    [&*ANDROID_PATTERN, &*ORGANIZER_PATTERN]
        .into_iter()
        .find_map(|pattern| pattern.captures(name))
        .and_then(|caps| datetime_from_captures(&caps))
}

/// Build a datetime from six numeric capture groups (Y, M, D, h, m, s).
fn datetime_from_captures(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    let year = i32::try_from(field(1)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_opt(field(4)?, field(5)?, field(6)?)
}

/// Interpret a naive timestamp as local wall-clock time and return epoch
/// milliseconds.
pub fn local_millis(datetime: NaiveDateTime) -> Option<i64> {
    wall_clock_millis(&Local, datetime)
}

/// Epoch milliseconds of a wall-clock time in `tz`.
///
/// A time repeated by a DST fold resolves to the earlier instant. A time
/// skipped by a DST gap is read with the offset in effect before the jump, so
/// `02:30` on a spring-forward night lands at what the clock calls `03:30`.
/// Only arithmetic overflow at the edges of chrono's range yields `None`.
pub fn wall_clock_millis<Tz: TimeZone>(tz: &Tz, datetime: NaiveDateTime) -> Option<i64> {
    match tz.from_local_datetime(&datetime) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => Some(t.timestamp_millis()),
        LocalResult::None => {
            let day_before = datetime.checked_sub_signed(TimeDelta::days(1))?;
            let offset = tz.offset_from_utc_datetime(&day_before).fix();
            let utc = datetime
                .checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc().into()))?;
            Some(utc.and_utc().timestamp_millis())
        }
    }
}
