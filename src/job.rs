//! Batch job over every target folder below a root
//!
//! Handles the core logic of:
//! - Validating the root and locating target folders
//! - Planning each folder's new sequence
//! - Running the two-phase rename with metadata updates
//! - Honoring stop requests between folders and files

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::locate::find_target_folders;
use crate::planner::{SequencePlan, SequencePlanner, scan_folder};
use crate::rename::{self, RenameReport};
use crate::report::Reporter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{Level, span};

/// Running counters of a batch job
#[derive(Debug, Default)]
pub struct JobStats {
    pub folders_found: AtomicUsize,
    pub folders_processed: AtomicUsize,
    pub folders_skipped: AtomicUsize,
    pub files_renamed: AtomicUsize,
    pub rename_failures: AtomicUsize,
    pub metadata_failures: AtomicUsize,
}

impl JobStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, report: &RenameReport) {
        self.files_renamed
            .fetch_add(report.renamed, Ordering::Relaxed);
        self.rename_failures.fetch_add(
            report.stage_failures + report.commit_failures,
            Ordering::Relaxed,
        );
        self.metadata_failures
            .fetch_add(report.metadata_failures, Ordering::Relaxed);
    }

    pub fn summary(&self) -> String {
        format!(
            "Folders found: {}, Processed: {}, Skipped: {}, Files renamed: {}, Rename failures: {}, Metadata failures: {}",
            self.folders_found.load(Ordering::Relaxed),
            self.folders_processed.load(Ordering::Relaxed),
            self.folders_skipped.load(Ordering::Relaxed),
            self.files_renamed.load(Ordering::Relaxed),
            self.rename_failures.load(Ordering::Relaxed),
            self.metadata_failures.load(Ordering::Relaxed)
        )
    }
}

/// Renumbers and re-dates the photos of every target folder below a root
#[derive(Debug)]
pub struct BatchJob {
    root: PathBuf,
    target_name: String,
    token: CancellationToken,
    reporter: Reporter,
    seed: Option<u64>,
    stats: Arc<JobStats>,
}

impl BatchJob {
    pub fn new(root: impl Into<PathBuf>, target_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            target_name: target_name.into(),
            token: CancellationToken::new(),
            reporter: Reporter::silent(),
            seed: None,
            stats: Arc::new(JobStats::new()),
        }
    }

    /// Deliver progress events to `reporter`
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Share an existing stop flag with this job
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Make start codes, gaps and staging names reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Handle for stopping the job from another thread
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request the job to stop; returns immediately
    pub fn stop(&self) {
        self.token.cancel();
        self.reporter
            .info("Stop requested, finishing current operation...");
    }

    pub fn stats(&self) -> &JobStats {
        &self.stats
    }

    fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::InvalidRoot(self.root.clone()));
        }
        if self.target_name.is_empty() {
            return Err(Error::Config("Target folder name must not be empty".into()));
        }
        Ok(())
    }

    fn planner(&self) -> SequencePlanner<StdRng> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        SequencePlanner::new(rng)
    }

    /// Run the batch and return the number of target folders located.
    ///
    /// Folders after a stop request are left untouched; the count still
    /// covers every folder located.
    pub fn run(&self) -> Result<usize> {
        let _span = span!(Level::INFO, "batch_run", root = %self.root.display()).entered();
        let started = Instant::now();

        self.validate()?;
        self.reporter.info(format!(
            "Starting processing operation from root path: {}",
            self.root.display()
        ));

        let folders =
            find_target_folders(&self.root, &self.target_name, &self.token, &self.reporter)?;
        self.stats
            .folders_found
            .store(folders.len(), Ordering::Relaxed);

        let mut planner = self.planner();

        for folder in &folders {
            if self.token.is_cancelled() {
                self.reporter.info("Operation stopped by user");
                break;
            }

            self.process_folder(folder.path(), &mut planner);
        }

        self.reporter.info(format!(
            "Processing completed in {:.2} seconds",
            started.elapsed().as_secs_f64()
        ));
        self.reporter.info(self.stats.summary());

        Ok(folders.len())
    }

    fn process_folder(&self, folder: &Path, planner: &mut SequencePlanner<StdRng>) {
        self.reporter
            .info(format!("Processing folder: {}", folder.display()));

        let contents = match scan_folder(folder, &self.token, &self.reporter) {
            Ok(contents) => contents,
            Err(e) => {
                self.reporter
                    .error(format!("Error reading folder {}: {}", folder.display(), e));
                self.stats.folders_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        if contents.is_empty() {
            self.reporter
                .info(format!("No JPG files found in {}", folder.display()));
            self.stats.folders_skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let result = planner
            .plan(folder, contents, &self.reporter)
            .and_then(|plan| rename::execute(plan, &self.token, &self.reporter));
        match result {
            Ok(report) => {
                self.stats.record(&report);
                self.stats.folders_processed.fetch_add(1, Ordering::Relaxed);
                self.reporter.info(format!(
                    "Finished folder {}: {} of {} files renamed",
                    folder.display(),
                    report.renamed,
                    report.staged + report.stage_failures
                ));
            }
            Err(e) => {
                self.stats.folders_skipped.fetch_add(1, Ordering::Relaxed);
                self.reporter
                    .error(format!("Skipping folder {}: {}", folder.display(), e));
            }
        }
    }

    /// Locate and plan every folder without touching any file.
    ///
    /// Folders that cannot be read or planned are logged and left out, the
    /// same way `run` skips them.
    pub fn plan_all(&self) -> Result<Vec<SequencePlan>> {
        self.validate()?;

        let folders =
            find_target_folders(&self.root, &self.target_name, &self.token, &self.reporter)?;
        let mut planner = self.planner();
        let mut plans = Vec::with_capacity(folders.len());

        for folder in &folders {
            if self.token.is_cancelled() {
                self.reporter.info("Operation stopped by user");
                break;
            }

            let contents = match scan_folder(folder.path(), &self.token, &self.reporter) {
                Ok(contents) => contents,
                Err(e) => {
                    self.reporter.error(format!(
                        "Error reading folder {}: {}",
                        folder.path().display(),
                        e
                    ));
                    continue;
                }
            };
            if contents.is_empty() {
                self.reporter
                    .info(format!("No JPG files found in {}", folder.path().display()));
                continue;
            }

            match planner.plan(folder.path(), contents, &self.reporter) {
                Ok(plan) => plans.push(plan),
                Err(e) => self.reporter.error(format!(
                    "Skipping folder {}: {}",
                    folder.path().display(),
                    e
                )),
            }
        }

        Ok(plans)
    }
}
