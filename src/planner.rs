//! Per-folder sequence planning
//!
//! A plan fixes, before any file is touched, which photo gets which final
//! name, which staging name it passes through, and which timestamp it will
//! carry. Sequenced photos keep their relative order and come first; other
//! photos follow in listing order.

use crate::cancel::CancellationToken;
use crate::classify::{Classification, ClassifiedFile, SEQUENCE_EXTENSION, classify, sequenced_name};
use crate::error::{Error, Result};
use crate::metadata::read_capture_time;
use crate::report::Reporter;
use chrono::{Local, NaiveDateTime, TimeDelta};
use rand::Rng;
use serde::Serialize;
use std::fs;
use std::ops::{Range, RangeInclusive};
use std::path::{Path, PathBuf};

/// Start codes drawn for folders without any sequenced photo
pub const RANDOM_START_CODES: Range<u64> = 1000..2000;

/// Gap between consecutive synthesized timestamps, in seconds
pub const GAP_SECONDS: RangeInclusive<i64> = 30..=60;

/// Prefix of every staging name
pub const STAGING_PREFIX: &str = "~resequence-";

/// Photos found in one folder, split by classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderContents {
    /// Sequenced photos, ascending by code
    pub standard: Vec<ClassifiedFile>,
    /// Other photos, in listing order
    pub other: Vec<ClassifiedFile>,
}

impl FolderContents {
    pub fn total(&self) -> usize {
        self.standard.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Classify a list of filenames.
    ///
    /// Sequenced photos are stable-sorted by code so equal codes keep their
    /// listing order.
    pub fn from_names<I, S>(names: I, reporter: &Reporter) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut contents = FolderContents::default();

        for name in names {
            let name = name.into();
            match classify(&name) {
                Classification::Sequenced(code) => {
                    contents.standard.push(ClassifiedFile::Sequenced { code, name })
                }
                Classification::Other => contents.other.push(ClassifiedFile::Other { name }),
                Classification::NotAnImage => reporter.debug(format!("Ignoring {}", name)),
            }
        }

        contents.standard.sort_by_key(|file| match file {
            ClassifiedFile::Sequenced { code, .. } => *code,
            ClassifiedFile::Other { .. } => u64::MAX,
        });
        contents
    }
}

/// List and classify the regular files of `folder`, sorted by name
pub fn scan_folder(
    folder: &Path,
    token: &CancellationToken,
    reporter: &Reporter,
) -> Result<FolderContents> {
    let mut names = Vec::new();

    for entry in fs::read_dir(folder)? {
        if token.is_cancelled() {
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                reporter.warning(format!("Skipping unreadable entry in {}: {}", folder.display(), e));
                continue;
            }
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => reporter.debug(format!("Ignoring non-UTF-8 file name {:?}", raw)),
        }
    }

    names.sort();
    Ok(FolderContents::from_names(names, reporter))
}

/// Which group of the folder an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanGroup {
    Standard,
    Other,
}

/// Where the base timestamp of a plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseSource {
    /// Capture time of the first photo in the folder
    CaptureTime,
    /// Nothing readable; the clock at planning time
    CurrentTime,
}

/// One photo's journey through the rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub original: String,
    pub staging: String,
    pub target: String,
    pub timestamp: NaiveDateTime,
    pub group: PlanGroup,
}

/// Complete rename and re-date plan for one folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencePlan {
    pub folder: PathBuf,
    pub start_code: u64,
    pub base_timestamp: NaiveDateTime,
    pub base_source: BaseSource,
    /// Entries in final order
    pub entries: Vec<PlanEntry>,
}

impl SequencePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, group: PlanGroup) -> usize {
        self.entries.iter().filter(|e| e.group == group).count()
    }
}

/// Builds [`SequencePlan`]s from an injected random source.
///
/// A planner draws one staging nonce when created, so every plan it makes
/// shares a job-scoped staging namespace.
#[derive(Debug)]
pub struct SequencePlanner<R: Rng> {
    rng: R,
    nonce: u32,
}

impl<R: Rng> SequencePlanner<R> {
    pub fn new(mut rng: R) -> Self {
        let nonce = rng.random();
        Self { rng, nonce }
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    /// Plan a folder, reading the base timestamp from the first photo
    pub fn plan(
        &mut self,
        folder: &Path,
        contents: FolderContents,
        reporter: &Reporter,
    ) -> Result<SequencePlan> {
        let now = Local::now().naive_local();
        let first = contents.standard.first().or(contents.other.first());

        let base = first.and_then(|file| {
            let path = folder.join(file.name());
            match read_capture_time(&path) {
                Ok(t) => Some(t),
                Err(e) => {
                    reporter.debug(format!("No capture time for {}: {}", file.name(), e));
                    None
                }
            }
        });

        self.plan_with_base(folder, contents, base, now, reporter)
    }

    /// Plan a folder with an already-known base timestamp.
    ///
    /// `now` is used when `base` is `None`. Fails without planning anything
    /// when the last code of the sequence would not fit in a `u64`.
    pub fn plan_with_base(
        &mut self,
        folder: &Path,
        contents: FolderContents,
        base: Option<NaiveDateTime>,
        now: NaiveDateTime,
        reporter: &Reporter,
    ) -> Result<SequencePlan> {
        reporter.info(format!(
            "Found {} IMG_XXXX.JPG files and {} other JPG files",
            contents.standard.len(),
            contents.other.len()
        ));

        let start_code = match contents.standard.first() {
            Some(ClassifiedFile::Sequenced { code, .. }) => {
                reporter.info(format!("Using existing lowest code: {}", code));
                *code
            }
            _ => {
                let code = self.rng.random_range(RANDOM_START_CODES);
                reporter.info(format!(
                    "No IMG_XXXX.JPG files found, using random starting code: {}",
                    code
                ));
                code
            }
        };

        let count = contents.total();
        if count > 0 && start_code.checked_add(count as u64 - 1).is_none() {
            return Err(Error::CodeOverflow {
                folder: folder.to_path_buf(),
                start_code,
                count,
            });
        }

        let (base_timestamp, base_source) = match base {
            Some(t) => (t, BaseSource::CaptureTime),
            None => {
                reporter.warning("Could not read creation date, using current time");
                (now, BaseSource::CurrentTime)
            }
        };
        reporter.info(format!("Base date for metadata: {}", base_timestamp));

        let timestamps = synthesize_timestamps(base_timestamp, count, &mut self.rng);

        let staged = contents
            .standard
            .into_iter()
            .enumerate()
            .map(|(i, file)| (file, PlanGroup::Standard, self.staging_name('S', i)))
            .chain(
                contents
                    .other
                    .into_iter()
                    .enumerate()
                    .map(|(i, file)| (file, PlanGroup::Other, self.staging_name('O', i))),
            );

        // Offsets stay below `count`, so the additions were checked above
        let entries = staged
            .zip(timestamps)
            .enumerate()
            .map(|(offset, ((file, group, staging), timestamp))| PlanEntry {
                original: file.name().to_string(),
                staging,
                target: sequenced_name(start_code + offset as u64),
                timestamp,
                group,
            })
            .collect();

        Ok(SequencePlan {
            folder: folder.to_path_buf(),
            start_code,
            base_timestamp,
            base_source,
            entries,
        })
    }

    fn staging_name(&self, group: char, index: usize) -> String {
        format!(
            "{}{:08x}-{}{:04}{}",
            STAGING_PREFIX, self.nonce, group, index, SEQUENCE_EXTENSION
        )
    }
}

/// Strictly ascending timestamps starting at `base`, 30 to 60 s apart
pub fn synthesize_timestamps<R: Rng>(
    base: NaiveDateTime,
    count: usize,
    rng: &mut R,
) -> Vec<NaiveDateTime> {
    let mut timestamps = Vec::with_capacity(count);
    let mut current = base;

    for i in 0..count {
        if i > 0 {
            current += TimeDelta::seconds(rng.random_range(GAP_SECONDS));
        }
        timestamps.push(current);
    }

    timestamps
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 8, 17)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn planner(seed: u64) -> SequencePlanner<StdRng> {
        SequencePlanner::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_mixed_folder_plan() {
        let contents = FolderContents::from_names(
            ["IMG_0005.JPG", "IMG_0003.JPG", "vacation.jpg", "notes.txt"],
            &Reporter::silent(),
        );
        let plan = planner(7)
            .plan_with_base(
                Path::new("/photos/01. Foto's"),
                contents,
                Some(base()),
                base(),
                &Reporter::silent(),
            )
            .unwrap();

        assert_eq!(plan.start_code, 3);
        assert_eq!(plan.base_source, BaseSource::CaptureTime);
        let pairs: Vec<_> = plan
            .entries
            .iter()
            .map(|e| (e.original.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("IMG_0003.JPG", "IMG_0003.JPG"),
                ("IMG_0005.JPG", "IMG_0004.JPG"),
                ("vacation.jpg", "IMG_0005.JPG"),
            ]
        );
        assert_eq!(plan.entries[0].timestamp, base());
        assert_eq!(plan.count(PlanGroup::Standard), 2);
        assert_eq!(plan.count(PlanGroup::Other), 1);
    }

    #[test]
    fn test_random_start_code_without_sequenced_photos() {
        for seed in 0..50 {
            let contents =
                FolderContents::from_names(["b.jpeg", "a.jpeg"], &Reporter::silent());
            let plan = planner(seed)
                .plan_with_base(
                    Path::new("/x"),
                    contents,
                    None,
                    base(),
                    &Reporter::silent(),
                )
                .unwrap();

            assert!(RANDOM_START_CODES.contains(&plan.start_code));
            assert_eq!(plan.base_source, BaseSource::CurrentTime);
            assert_eq!(plan.base_timestamp, base());
            assert_eq!(plan.entries[0].original, "b.jpeg");
            assert_eq!(plan.entries[0].target, sequenced_name(plan.start_code));
            assert_eq!(plan.entries[1].target, sequenced_name(plan.start_code + 1));
        }
    }

    #[test]
    fn test_timestamps_strictly_ascending_with_bounded_gaps() {
        let mut rng = StdRng::seed_from_u64(42);
        let timestamps = synthesize_timestamps(base(), 200, &mut rng);

        assert_eq!(timestamps.len(), 200);
        assert_eq!(timestamps[0], base());
        for pair in timestamps.windows(2) {
            let gap = (pair[1] - pair[0]).num_seconds();
            assert!(GAP_SECONDS.contains(&gap), "gap {} out of range", gap);
        }
    }

    #[test]
    fn test_no_timestamps_for_empty_folder() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(synthesize_timestamps(base(), 0, &mut rng).is_empty());
    }

    #[test]
    fn test_codes_grow_past_four_digits() {
        let contents = FolderContents::from_names(
            ["IMG_9999.JPG", "z.jpg", "y.jpg"],
            &Reporter::silent(),
        );
        let plan = planner(3)
            .plan_with_base(
                Path::new("/x"),
                contents,
                Some(base()),
                base(),
                &Reporter::silent(),
            )
            .unwrap();
        let targets: Vec<_> = plan.entries.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["IMG_9999.JPG", "IMG_10000.JPG", "IMG_10001.JPG"]);
    }

    #[test]
    fn test_largest_code_is_planned_without_overflow() {
        let name = format!("IMG_{}.JPG", u64::MAX);
        let contents = FolderContents::from_names([name.clone()], &Reporter::silent());
        let plan = planner(4)
            .plan_with_base(
                Path::new("/x"),
                contents,
                Some(base()),
                base(),
                &Reporter::silent(),
            )
            .unwrap();

        assert_eq!(plan.start_code, u64::MAX);
        assert_eq!(plan.entries[0].target, name);
    }

    #[test]
    fn test_sequence_past_largest_code_is_rejected() {
        let contents = FolderContents::from_names(
            [format!("IMG_{}.JPG", u64::MAX - 1), "a.jpg".into(), "b.jpg".into()],
            &Reporter::silent(),
        );
        let result = planner(4).plan_with_base(
            Path::new("/x"),
            contents,
            Some(base()),
            base(),
            &Reporter::silent(),
        );

        match result {
            Err(Error::CodeOverflow {
                start_code, count, ..
            }) => {
                assert_eq!(start_code, u64::MAX - 1);
                assert_eq!(count, 3);
            }
            other => panic!("expected code overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_staging_names_are_disjoint() {
        let contents = FolderContents::from_names(
            ["IMG_0001.JPG", "img_1.jpg", "IMG_0002.JPG", "a.jpg", "b.JPEG"],
            &Reporter::silent(),
        );
        let plan = planner(11)
            .plan_with_base(
                Path::new("/x"),
                contents,
                None,
                base(),
                &Reporter::silent(),
            )
            .unwrap();

        let staging: HashSet<_> = plan.entries.iter().map(|e| e.staging.clone()).collect();
        let targets: HashSet<_> = plan.entries.iter().map(|e| e.target.clone()).collect();
        let originals: HashSet<_> = plan.entries.iter().map(|e| e.original.clone()).collect();

        assert_eq!(staging.len(), plan.len());
        assert_eq!(targets.len(), plan.len());
        assert!(staging.is_disjoint(&targets));
        assert!(staging.is_disjoint(&originals));
        for name in &staging {
            assert!(name.starts_with(STAGING_PREFIX));
            // Leftovers of an interrupted run are re-read as plain photos
            assert_eq!(classify(name), Classification::Other);
        }
    }

    #[test]
    fn test_equal_codes_keep_listing_order() {
        let contents = FolderContents::from_names(
            ["IMG_0001.JPG", "IMG_01.JPG", "img_0000.jpg"],
            &Reporter::silent(),
        );
        let names: Vec<_> = contents.standard.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["img_0000.jpg", "IMG_0001.JPG", "IMG_01.JPG"]);
    }

    #[test]
    fn test_scan_folder_skips_directories_and_non_images() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("IMG_0002.JPG"), b"x").unwrap();
        fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("Thumbs.db"), b"x").unwrap();
        fs::create_dir(dir.path().join("IMG_0001.JPG")).unwrap();

        let contents =
            scan_folder(dir.path(), &CancellationToken::new(), &Reporter::silent()).unwrap();
        assert_eq!(
            contents.standard,
            vec![ClassifiedFile::Sequenced {
                code: 2,
                name: "IMG_0002.JPG".to_string()
            }]
        );
        let others: Vec<_> = contents.other.iter().map(|f| f.name()).collect();
        assert_eq!(others, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_plan_falls_back_to_now_for_unreadable_exif() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("IMG_0010.JPG"), b"no exif here").unwrap();
        let contents =
            scan_folder(dir.path(), &CancellationToken::new(), &Reporter::silent()).unwrap();

        let before = Local::now().naive_local();
        let plan = planner(5)
            .plan(dir.path(), contents, &Reporter::silent())
            .unwrap();
        let after = Local::now().naive_local();

        assert_eq!(plan.start_code, 10);
        assert_eq!(plan.base_source, BaseSource::CurrentTime);
        assert!(plan.base_timestamp >= before && plan.base_timestamp <= after);
    }
}
