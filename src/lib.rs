//! Photo Resequencer - renumber and re-date photo folders
//!
//! This library finds every folder with a given name below a root directory
//! and rewrites its JPEG photos into a contiguous sequence with:
//! - `IMG_XXXX.JPG` names continuing from the lowest existing code
//! - Strictly ascending capture times spaced 30 to 60 seconds apart
//! - Collision-free two-phase renames through staging names
//! - Cooperative cancellation between folders and files
//!
//! A single-photo editor for manual renames and retagging is included.

pub mod cancel;
pub mod classify;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod job;
pub mod locate;
pub mod metadata;
pub mod planner;
pub mod rename;
pub mod report;

pub use cancel::CancellationToken;
pub use classify::{Classification, ClassifiedFile, classify};
pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use editor::edit_image;
pub use error::{Error, Result};
pub use job::{BatchJob, JobStats};
pub use metadata::{MetadataChangeSet, MetadataField, MetadataSnapshot};
pub use planner::{SequencePlan, SequencePlanner};
pub use rename::RenameReport;
pub use report::{LogEvent, LogSink, Reporter, Severity};
