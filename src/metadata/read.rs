//! Reading embedded EXIF times and the filesystem modification time

use super::MetadataSnapshot;
use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use exif::{Exif, In, Reader, Tag};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

fn load_exif(path: &Path) -> Result<Exif> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| Error::ExifRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn tag_time(exif: &Exif, tag: Tag) -> Option<NaiveDateTime> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let datetime = parse_exif_datetime(&field.display_value().to_string());
    trace!(?tag, ?datetime, "Read EXIF date tag");
    datetime
}

/// Read the capture time (`DateTimeOriginal`) of a photo
pub fn read_capture_time(path: &Path) -> Result<NaiveDateTime> {
    let exif = load_exif(path)?;

    tag_time(&exif, Tag::DateTimeOriginal).ok_or_else(|| Error::ExifRead {
        path: path.to_path_buf(),
        message: "No valid DateTimeOriginal tag found in EXIF data".to_string(),
    })
}

/// Read the filesystem modification time as local wall-clock time
pub fn read_file_time(path: &Path) -> Result<NaiveDateTime> {
    let modified = fs::metadata(path)?.modified()?;
    let datetime: DateTime<Local> = modified.into();
    Ok(datetime.naive_local())
}

/// Read all four time fields; missing or unreadable values are `None`
pub fn read_snapshot(path: &Path) -> Result<MetadataSnapshot> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut snapshot = MetadataSnapshot {
        file_time: read_file_time(path).ok(),
        ..Default::default()
    };

    match load_exif(path) {
        Ok(exif) => {
            snapshot.capture_time = tag_time(&exif, Tag::DateTimeOriginal);
            snapshot.digitized_time = tag_time(&exif, Tag::DateTimeDigitized);
            snapshot.modified_time = tag_time(&exif, Tag::DateTime);
        }
        Err(e) => trace!(?path, error = %e, "No EXIF data"),
    }

    Ok(snapshot)
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
pub(crate) fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    // kamadak-exif renders date tags as "2024-01-15 14:30:00", raw values
    // arrive as "2024:01:15 14:30:00", possibly quoted
    let s = s.trim().trim_matches('"');

    let formats = [
        "%Y:%m:%d %H:%M:%S",
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];

    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);

        let dt = parse_exif_datetime("\"2024:01:15 14:30:00\"").unwrap();
        assert_eq!(dt.year(), 2024);

        let dt = parse_exif_datetime("2024-01-15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);

        assert!(parse_exif_datetime("invalid").is_none());
    }

    #[test]
    fn test_capture_time_of_non_jpeg_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vacation.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();

        assert!(matches!(
            read_capture_time(&path),
            Err(Error::ExifRead { .. })
        ));
    }

    #[test]
    fn test_snapshot_without_exif() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_0001.JPG");
        fs::write(&path, b"plain bytes").unwrap();

        let snapshot = read_snapshot(&path).unwrap();
        assert!(snapshot.capture_time.is_none());
        assert!(snapshot.digitized_time.is_none());
        assert!(snapshot.modified_time.is_none());
        assert!(snapshot.file_time.is_some());
    }

    #[test]
    fn test_snapshot_of_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_snapshot(&dir.path().join("gone.jpg")),
            Err(Error::FileNotFound(_))
        ));
    }
}
