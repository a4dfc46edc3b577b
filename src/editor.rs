//! Single-photo rename and retag, outside the batch pipeline

use crate::classify::is_image;
use crate::error::{Error, Result};
use crate::metadata::{self, MetadataChangeSet};
use crate::report::Reporter;
use std::fs;
use std::path::Path;

/// Rename `path` and/or update some of its time fields.
///
/// The rename is direct (no staging), so an existing file at the destination
/// is an error and nothing is changed. Each requested metadata field is
/// written on its own; `FileTime` only touches the filesystem clock.
/// Returns a summary of what was applied.
pub fn edit_image(
    path: &Path,
    new_name: Option<&str>,
    changes: Option<&MetadataChangeSet>,
    reporter: &Reporter,
) -> Result<String> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let current_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidName {
            name: path.display().to_string(),
            reason: "current file name is not valid UTF-8".into(),
        })?;

    let rename_to = new_name.filter(|name| !name.is_empty() && *name != current_name);
    let changes = changes.filter(|c| !c.is_empty());

    if rename_to.is_none() && changes.is_none() {
        return Err(Error::NoChanges);
    }

    let mut target = path.to_path_buf();
    if let Some(name) = rename_to {
        validate_new_name(name)?;
        target = path.with_file_name(name);
        if fs::symlink_metadata(&target).is_ok() {
            return Err(Error::Collision {
                name: name.to_string(),
            });
        }
    }

    let mut applied = Vec::new();

    if let Some(name) = rename_to {
        fs::rename(path, &target)?;
        reporter.info(format!("Renamed {} to {}", current_name, name));
        applied.push(format!("renamed to {}", name));
    }

    if let Some(changes) = changes {
        match metadata::apply_changes(&target, changes) {
            Ok(fields) => {
                let fields: Vec<_> = fields.iter().map(|f| f.as_str()).collect();
                reporter.info(format!(
                    "Updated metadata fields of {}: {}",
                    target.display(),
                    fields.join(", ")
                ));
                applied.push(format!("updated metadata fields: {}", fields.join(", ")));
            }
            Err(e) => {
                reporter.error(format!("Error editing {}: {}", target.display(), e));
                if rename_to.is_some() {
                    reporter.warning(format!(
                        "{} was renamed but its metadata was not updated",
                        target.display()
                    ));
                }
                return Err(e);
            }
        }
    }

    Ok(format!("Successfully {}", applied.join(" and ")))
}

fn validate_new_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(invalid("must be a plain file name"));
    }
    if !is_image(name) {
        return Err(invalid("must have a .jpg or .jpeg extension"));
    }
    Ok(())
}
