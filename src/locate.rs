//! Target folder discovery

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::report::Reporter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A directory whose base name equals the configured target folder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFolder {
    path: PathBuf,
}

impl TargetFolder {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Walk `root` and collect every directory below it named exactly `target_name`.
///
/// Unreadable subtrees are logged and skipped. If `token` is cancelled the
/// walk stops and the folders found so far are returned. Only an unreadable
/// root is reported as an error.
pub fn find_target_folders(
    root: &Path,
    target_name: &str,
    token: &CancellationToken,
    reporter: &Reporter,
) -> Result<Vec<TargetFolder>> {
    reporter.info(format!(
        "Starting search for folders named '{}' in {}",
        target_name,
        root.display()
    ));

    let mut folders = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        if token.is_cancelled() {
            reporter.info("Folder search interrupted by stop request");
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(Error::WalkDir(err)),
            Err(err) => {
                reporter.warning(format!("Skipping unreadable path: {}", err));
                continue;
            }
        };

        if entry.file_type().is_dir() && entry.file_name() == target_name {
            reporter.info(format!("Found target folder: {}", entry.path().display()));
            folders.push(TargetFolder {
                path: entry.into_path(),
            });
        }
    }

    reporter.info(format!("Found {} target folders", folders.len()));
    Ok(folders)
}
