//! CLI argument parsing with clap

use crate::config::Config;
use crate::metadata::{MetadataChangeSet, MetadataField, parse_timestamp};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Photo Resequencer - renumber and re-date photos folder by folder
///
/// Finds every folder with a given name below a root directory and gives
/// its JPEG photos a contiguous IMG_XXXX.JPG sequence with ascending
/// capture times.
#[derive(Parser, Debug)]
#[command(name = "photo-resequencer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for the log file
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output log file format as JSON
    #[arg(long, global = true)]
    pub json_log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resequence every target folder below the root
    Run(RunArgs),
    /// Rename and/or retag a single photo
    Edit(EditArgs),
    /// Print the current time fields of a photo
    Show {
        /// Photo to inspect
        file: PathBuf,
    },
    /// Print a commented sample configuration file
    SampleConfig,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Root directory to scan
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Name of the folders to resequence
    #[arg(short, long)]
    pub target: Option<String>,

    /// Dry run mode - print the plans without touching any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Seed for start codes and timestamp gaps
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// Photo to edit
    pub file: PathBuf,

    /// New file name (same folder)
    #[arg(long)]
    pub name: Option<String>,

    /// Capture time (EXIF DateTimeOriginal), "YYYY:MM:DD HH:MM:SS"
    #[arg(long, value_parser = parse_timestamp_arg)]
    pub capture: Option<NaiveDateTime>,

    /// Digitized time (EXIF DateTimeDigitized)
    #[arg(long, value_parser = parse_timestamp_arg)]
    pub digitized: Option<NaiveDateTime>,

    /// Modified time (EXIF DateTime)
    #[arg(long, value_parser = parse_timestamp_arg)]
    pub modified: Option<NaiveDateTime>,

    /// Filesystem modification time
    #[arg(long, value_parser = parse_timestamp_arg)]
    pub file_time: Option<NaiveDateTime>,

    /// Set every field not given explicitly to this time
    #[arg(long, value_parser = parse_timestamp_arg)]
    pub all: Option<NaiveDateTime>,
}

fn parse_timestamp_arg(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).map_err(|e| e.to_string())
}

impl EditArgs {
    /// Collect the requested fields; `None` when no field was given
    pub fn change_set(&self) -> Option<MetadataChangeSet> {
        let explicit = [
            (MetadataField::CaptureTime, self.capture),
            (MetadataField::DigitizedTime, self.digitized),
            (MetadataField::ModifiedTime, self.modified),
            (MetadataField::FileTime, self.file_time),
        ];

        let mut changes = MetadataChangeSet::default();
        for (field, value) in explicit {
            changes.set(field, value.or(self.all));
        }

        (!changes.is_empty()).then_some(changes)
    }
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref log_dir) = self.log_dir {
            config.log_dir = Some(log_dir.clone());
        }
        if self.verbose {
            config.verbose = true;
        }
        if self.json_log {
            config.json_log = true;
        }

        if let Command::Run(run) = &self.command {
            if let Some(ref root) = run.root {
                config.root_dir = Some(root.clone());
            }
            if let Some(ref target) = run.target {
                config.target_folder = target.clone();
            }
            if run.dry_run {
                config.dry_run = true;
            }
            if let Some(seed) = run.seed {
                config.seed = Some(seed);
            }
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
