//! Photo time metadata
//!
//! Four time fields are tracked per photo:
//! - `CaptureTime`: EXIF `DateTimeOriginal`
//! - `DigitizedTime`: EXIF `DateTimeDigitized`
//! - `ModifiedTime`: EXIF `DateTime` (IFD0)
//! - `FileTime`: the filesystem modification/access time
//!
//! Embedded values use the EXIF text format `YYYY:MM:DD HH:MM:SS` and are
//! interpreted as local time when mapped onto the filesystem clock.

pub mod read;
pub mod write;

pub use read::{read_capture_time, read_file_time, read_snapshot};
pub use write::{apply_changes, write_all};

use crate::error::{Error, Result};
use chrono::{Local, NaiveDateTime, TimeZone};
use filetime::FileTime;
use serde::Serialize;
use std::fmt;

/// Text format of EXIF date/time tags
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Identifier of one writable time field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetadataField {
    CaptureTime,
    DigitizedTime,
    ModifiedTime,
    FileTime,
}

impl MetadataField {
    pub const ALL: [MetadataField; 4] = [
        MetadataField::CaptureTime,
        MetadataField::DigitizedTime,
        MetadataField::ModifiedTime,
        MetadataField::FileTime,
    ];

    /// Whether the field lives inside the image's EXIF block
    pub fn is_embedded(&self) -> bool {
        !matches!(self, MetadataField::FileTime)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataField::CaptureTime => "CaptureTime",
            MetadataField::DigitizedTime => "DigitizedTime",
            MetadataField::ModifiedTime => "ModifiedTime",
            MetadataField::FileTime => "FileTime",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested timestamp per field; `None` leaves the field untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetadataChangeSet {
    pub capture_time: Option<NaiveDateTime>,
    pub digitized_time: Option<NaiveDateTime>,
    pub modified_time: Option<NaiveDateTime>,
    pub file_time: Option<NaiveDateTime>,
}

impl MetadataChangeSet {
    /// All four fields set to the same instant (the batch contract)
    pub fn uniform(timestamp: NaiveDateTime) -> Self {
        Self {
            capture_time: Some(timestamp),
            digitized_time: Some(timestamp),
            modified_time: Some(timestamp),
            file_time: Some(timestamp),
        }
    }

    pub fn with(mut self, field: MetadataField, timestamp: NaiveDateTime) -> Self {
        self.set(field, Some(timestamp));
        self
    }

    pub fn set(&mut self, field: MetadataField, timestamp: Option<NaiveDateTime>) {
        match field {
            MetadataField::CaptureTime => self.capture_time = timestamp,
            MetadataField::DigitizedTime => self.digitized_time = timestamp,
            MetadataField::ModifiedTime => self.modified_time = timestamp,
            MetadataField::FileTime => self.file_time = timestamp,
        }
    }

    pub fn get(&self, field: MetadataField) -> Option<NaiveDateTime> {
        match field {
            MetadataField::CaptureTime => self.capture_time,
            MetadataField::DigitizedTime => self.digitized_time,
            MetadataField::ModifiedTime => self.modified_time,
            MetadataField::FileTime => self.file_time,
        }
    }

    /// Fields carrying a value, in canonical order
    pub fn fields(&self) -> Vec<MetadataField> {
        MetadataField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn has_embedded(&self) -> bool {
        self.fields().iter().any(MetadataField::is_embedded)
    }
}

/// Current value of every time field of a photo
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataSnapshot {
    pub capture_time: Option<NaiveDateTime>,
    pub digitized_time: Option<NaiveDateTime>,
    pub modified_time: Option<NaiveDateTime>,
    pub file_time: Option<NaiveDateTime>,
}

impl MetadataSnapshot {
    pub fn get(&self, field: MetadataField) -> Option<NaiveDateTime> {
        match field {
            MetadataField::CaptureTime => self.capture_time,
            MetadataField::DigitizedTime => self.digitized_time,
            MetadataField::ModifiedTime => self.modified_time,
            MetadataField::FileTime => self.file_time,
        }
    }
}

/// Format a timestamp the way EXIF stores it
pub fn format_exif_datetime(timestamp: &NaiveDateTime) -> String {
    timestamp.format(EXIF_DATETIME_FORMAT).to_string()
}

/// Parse a user-supplied timestamp.
///
/// Accepts the EXIF form plus the common ISO-like variants.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime> {
    read::parse_exif_datetime(input).ok_or_else(|| Error::TimestampParse {
        source_info: input.to_string(),
        message: format!("expected {}", EXIF_DATETIME_FORMAT),
    })
}

/// Map a local wall-clock timestamp onto the filesystem clock
pub(crate) fn to_file_time(timestamp: &NaiveDateTime) -> FileTime {
    let seconds = match Local.from_local_datetime(timestamp).earliest() {
        Some(local) => local.timestamp(),
        // Skipped by a DST transition; fall back to treating it as UTC
        None => timestamp.and_utc().timestamp(),
    };
    FileTime::from_unix_time(seconds, 0)
}
