//! Two-phase rename of a planned folder
//!
//! Phase A moves every photo to its staging name, Phase B moves staged
//! photos to their final names and writes their metadata. Because nothing is
//! renamed to a final name until every photo has left its original name, two
//! files never compete for the same name.

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::metadata;
use crate::planner::SequencePlan;
use crate::report::Reporter;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Outcome counters for one folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    /// Photos moved to their staging name
    pub staged: usize,
    /// Photos that reached their final name
    pub renamed: usize,
    pub stage_failures: usize,
    pub commit_failures: usize,
    /// Photos renamed whose metadata could not be fully written
    pub metadata_failures: usize,
    /// A stop request interrupted the folder
    pub cancelled: bool,
}

impl RenameReport {
    /// Photos left under a staging name
    pub fn left_staged(&self) -> usize {
        self.staged - self.renamed
    }
}

/// Check that the staging names of `plan` are pairwise distinct, disjoint
/// from its final names, and not present in the folder right now.
pub fn verify_staging_names(plan: &SequencePlan) -> Result<()> {
    let mut present = HashSet::new();
    for entry in fs::read_dir(&plan.folder)? {
        if let Ok(name) = entry?.file_name().into_string() {
            present.insert(name);
        }
    }

    let targets: HashSet<&str> = plan.entries.iter().map(|e| e.target.as_str()).collect();
    let mut seen = HashSet::new();

    for entry in &plan.entries {
        let staging = entry.staging.as_str();
        if !seen.insert(staging) || targets.contains(staging) || present.contains(staging) {
            return Err(Error::StagingConflict {
                folder: plan.folder.clone(),
                name: entry.staging.clone(),
            });
        }
    }

    Ok(())
}

/// Execute `plan`.
///
/// Per-file failures are logged and counted, never returned; only a failed
/// pre-flight check aborts the folder before anything is renamed.
pub fn execute(
    plan: SequencePlan,
    token: &CancellationToken,
    reporter: &Reporter,
) -> Result<RenameReport> {
    verify_staging_names(&plan)?;

    let folder = plan.folder.as_path();
    let mut report = RenameReport::default();
    let mut staged = vec![false; plan.entries.len()];

    for (entry, flag) in plan.entries.iter().zip(staged.iter_mut()) {
        if token.is_cancelled() {
            report.cancelled = true;
            break;
        }

        match fs::rename(folder.join(&entry.original), folder.join(&entry.staging)) {
            Ok(()) => {
                *flag = true;
                report.staged += 1;
                reporter.info(format!("Renamed {} to {}", entry.original, entry.staging));
            }
            Err(e) => {
                report.stage_failures += 1;
                reporter.error(format!(
                    "Error renaming {} to temporary name: {}",
                    entry.original, e
                ));
            }
        }
    }

    for (entry, _) in plan.entries.iter().zip(&staged).filter(|(_, staged)| **staged) {
        if token.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let target = folder.join(&entry.target);
        if exists(&target) {
            report.commit_failures += 1;
            reporter.error(format!(
                "Error processing {}: {} already exists",
                entry.staging, entry.target
            ));
            continue;
        }

        if let Err(e) = fs::rename(folder.join(&entry.staging), &target) {
            report.commit_failures += 1;
            reporter.error(format!("Error processing {}: {}", entry.staging, e));
            continue;
        }
        report.renamed += 1;
        reporter.info(format!(
            "Renamed {} (originally {}) to {}",
            entry.staging, entry.original, entry.target
        ));

        match metadata::write_all(&target, &entry.timestamp) {
            Ok(()) => reporter.info(format!(
                "Updated metadata for {} to {}",
                entry.target, entry.timestamp
            )),
            Err(e) => {
                report.metadata_failures += 1;
                reporter.warning(format!(
                    "Failed to update metadata for {}: {}",
                    entry.target, e
                ));
            }
        }
    }

    if report.cancelled && report.left_staged() > 0 {
        reporter.warning(format!(
            "Stopped with {} files still under temporary names in {}",
            report.left_staged(),
            folder.display()
        ));
    }

    Ok(report)
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
