//! Writing embedded EXIF times and filesystem timestamps

use super::{MetadataChangeSet, MetadataField, format_exif_datetime, to_file_time};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

/// JPEG start-of-image marker
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

fn ensure_jpeg(path: &Path) -> Result<()> {
    let mut marker = [0u8; 2];
    let mut file = File::open(path)?;
    match file.read_exact(&mut marker) {
        Ok(()) if marker == JPEG_SOI => Ok(()),
        _ => Err(Error::NotJpeg(path.to_path_buf())),
    }
}

fn write_embedded(path: &Path, changes: &MetadataChangeSet) -> Result<()> {
    ensure_jpeg(path)?;

    let mut exif = match Metadata::new_from_path(path) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(?path, error = %e, "No readable EXIF block, starting a new one");
            Metadata::new()
        }
    };

    if let Some(t) = changes.capture_time {
        exif.set_tag(ExifTag::DateTimeOriginal(format_exif_datetime(&t)));
    }
    if let Some(t) = changes.digitized_time {
        exif.set_tag(ExifTag::CreateDate(format_exif_datetime(&t)));
    }
    if let Some(t) = changes.modified_time {
        exif.set_tag(ExifTag::ModifyDate(format_exif_datetime(&t)));
    }

    exif.write_to_file(path).map_err(|e| Error::ExifWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    trace!(?path, "Wrote EXIF date tags");
    Ok(())
}

/// Set the filesystem modification and access time
pub fn write_file_time(path: &Path, timestamp: &NaiveDateTime) -> Result<()> {
    let time = to_file_time(timestamp);
    filetime::set_file_times(path, time, time)?;
    Ok(())
}

/// Apply only the fields present in `changes`.
///
/// Embedded fields are written first (that rewrites the file, bumping its
/// mtime), then the filesystem time. Returns the fields that were written.
pub fn apply_changes(path: &Path, changes: &MetadataChangeSet) -> Result<Vec<MetadataField>> {
    if changes.has_embedded() {
        write_embedded(path, changes)?;
    }

    if let Some(t) = changes.file_time {
        write_file_time(path, &t)?;
    }

    Ok(changes.fields())
}

/// Set all three embedded fields and the filesystem time to `timestamp`.
///
/// The filesystem time is set even when the EXIF write fails; the EXIF
/// error is still returned.
pub fn write_all(path: &Path, timestamp: &NaiveDateTime) -> Result<()> {
    let embedded = write_embedded(path, &MetadataChangeSet::uniform(*timestamp));
    write_file_time(path, timestamp)?;
    embedded
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metadata::read::{read_capture_time, read_file_time, read_snapshot};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    /// 8x8 grey baseline JPEG without any EXIF block
    pub(crate) const GRAY_JPEG: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/gray.jpg"));

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 7, 4)
            .unwrap()
            .and_hms_opt(9, 15, 30)
            .unwrap()
    }

    #[test]
    fn test_file_time_only_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_0001.JPG");
        fs::write(&path, b"not really a jpeg").unwrap();

        let changes = MetadataChangeSet::default().with(MetadataField::FileTime, sample_time());
        let written = apply_changes(&path, &changes).unwrap();

        assert_eq!(written, vec![MetadataField::FileTime]);
        assert_eq!(read_file_time(&path).unwrap(), sample_time());
        // Content untouched
        assert_eq!(fs::read(&path).unwrap(), b"not really a jpeg");
    }

    #[test]
    fn test_embedded_change_on_non_jpeg_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_0001.JPG");
        fs::write(&path, b"not really a jpeg").unwrap();

        let changes = MetadataChangeSet::default().with(MetadataField::CaptureTime, sample_time());
        assert!(matches!(
            apply_changes(&path, &changes),
            Err(Error::NotJpeg(_))
        ));
        assert_eq!(fs::read(&path).unwrap(), b"not really a jpeg");
    }

    #[test]
    fn test_write_all_sets_file_time_even_if_exif_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_0001.JPG");
        fs::write(&path, b"xx").unwrap();

        let result = write_all(&path, &sample_time());
        assert!(matches!(result, Err(Error::NotJpeg(_))));
        assert_eq!(read_file_time(&path).unwrap(), sample_time());
    }

    #[test]
    fn test_empty_file_is_not_jpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        fs::write(&path, b"").unwrap();
        assert!(matches!(ensure_jpeg(&path), Err(Error::NotJpeg(_))));
    }

    #[test]
    fn test_write_all_round_trips_through_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_0001.JPG");
        fs::write(&path, GRAY_JPEG).unwrap();

        write_all(&path, &sample_time()).unwrap();

        let snapshot = read_snapshot(&path).unwrap();
        assert_eq!(snapshot.capture_time, Some(sample_time()));
        assert_eq!(snapshot.digitized_time, Some(sample_time()));
        assert_eq!(snapshot.modified_time, Some(sample_time()));
        assert_eq!(snapshot.file_time, Some(sample_time()));
        assert_eq!(read_capture_time(&path).unwrap(), sample_time());
    }

    #[test]
    fn test_embedded_fields_are_written_independently() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, GRAY_JPEG).unwrap();
        let later = sample_time() + chrono::TimeDelta::days(3);

        let capture = MetadataChangeSet::default().with(MetadataField::CaptureTime, sample_time());
        apply_changes(&path, &capture).unwrap();
        let digitized = MetadataChangeSet::default().with(MetadataField::DigitizedTime, later);
        let written = apply_changes(&path, &digitized).unwrap();

        assert_eq!(written, vec![MetadataField::DigitizedTime]);
        let snapshot = read_snapshot(&path).unwrap();
        assert_eq!(snapshot.capture_time, Some(sample_time()));
        assert_eq!(snapshot.digitized_time, Some(later));
        assert_eq!(snapshot.modified_time, None);
    }
}
