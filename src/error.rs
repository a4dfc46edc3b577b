//! Error types for the photo resequencer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for resequencer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the photo resequencer
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Root path is not an existing directory: {0}")]
    InvalidRoot(PathBuf),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Failed to write EXIF data to {path}: {message}")]
    ExifWrite { path: PathBuf, message: String },

    #[error("Not a JPEG file: {0}")]
    NotJpeg(PathBuf),

    #[error("Failed to parse timestamp from {source_info}: {message}")]
    TimestampParse { source_info: String, message: String },

    #[error("Cannot rename: {name} already exists in the directory")]
    Collision { name: String },

    #[error("Invalid file name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("No changes were made")]
    NoChanges,

    #[error("Staging name {name} is not unique in {folder}")]
    StagingConflict { folder: PathBuf, name: String },

    #[error("Sequence from code {start_code} cannot number {count} files in {folder}")]
    CodeOverflow {
        folder: PathBuf,
        start_code: u64,
        count: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}
