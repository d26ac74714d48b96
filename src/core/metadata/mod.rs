//! # Metadata Module
//!
//! Works out when a photo was taken.
//!
//! ## Lookup order
//! 1. EXIF `DateTimeOriginal` (shutter press)
//! 2. EXIF `DateTimeDigitized`
//! 3. EXIF `DateTime` (last edit in camera)
//! 4. Filesystem modification time
//!
//! EXIF is typically found in JPEG and TIFF files; PNG, GIF and BMP usually
//! carry none and go straight to the filesystem fallback. The result is a
//! wall-clock timestamp: EXIF stores local camera time without a zone, and
//! filesystem times are converted to the local zone to match.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// Where a capture timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    /// Embedded EXIF date tag
    Exif,
    /// Filesystem last-modified time
    FileModified,
    /// Neither was readable; the Unix epoch stands in
    Unavailable,
}

/// Best-available "when was this taken" value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTime {
    pub timestamp: NaiveDateTime,
    pub source: CaptureSource,
}

impl CaptureTime {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Capture time for `path`. Never fails: falls back to the modification
/// time, and to the epoch if the file cannot even be stat'ed.
pub fn capture_time(path: &Path) -> CaptureTime {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
    capture_time_or(path, modified)
}

/// Same as [`capture_time`] but with a modification time the caller has
/// already read, which saves a second `stat` during scanning.
pub fn capture_time_or(path: &Path, modified: Option<SystemTime>) -> CaptureTime {
    if let Some(timestamp) = exif_capture_time(path) {
        return CaptureTime {
            timestamp,
            source: CaptureSource::Exif,
        };
    }

    match modified {
        Some(time) => CaptureTime {
            timestamp: to_local_naive(time),
            source: CaptureSource::FileModified,
        },
        None => {
            debug!(path = %path.display(), "no capture date or modification time");
            CaptureTime {
                timestamp: to_local_naive(SystemTime::UNIX_EPOCH),
                source: CaptureSource::Unavailable,
            }
        }
    }
}

/// Read the first usable EXIF date tag
pub fn exif_capture_time(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(file);
    let exif_reader = Reader::new().read_from_container(&mut bufreader).ok()?;

    for tag in DATE_TAGS {
        let Some(field) = exif_reader.get_field(tag, In::PRIMARY) else {
            continue;
        };
        if let Some(parsed) = ascii_value(&field.value).and_then(|s| parse_exif_datetime(&s)) {
            return Some(parsed);
        }
        debug!(path = %path.display(), %tag, "malformed EXIF date");
    }

    None
}

/// Parse "YYYY:MM:DD HH:MM:SS" and the usual sloppy variants. A bare date
/// maps to midnight.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim_matches(|c: char| c == '\0' || c == '"' || c.is_whitespace());

    for format in ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y:%m:%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(s, format) {
            return Some(parsed);
        }
    }

    let date_part = s.split_whitespace().next()?.replace(':', "-");
    let mut parts = date_part.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

fn ascii_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        return Some(s.to_string());
    }
    None
}

fn to_local_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
