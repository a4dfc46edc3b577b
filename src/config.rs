//! Configuration for the photo resequencer

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Folder name searched for when none is configured
pub const DEFAULT_TARGET_FOLDER: &str = "01. Foto's";

/// File name of the append-only log inside the log directory
pub const LOG_FILE_NAME: &str = "photo-resequencer.log";

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the tree to scan
    pub root_dir: Option<PathBuf>,

    /// Exact (case-sensitive) name of the folders to resequence
    pub target_folder: String,

    /// Directory receiving the log file (defaults to `Log/` next to the executable)
    pub log_dir: Option<PathBuf>,

    /// Verbose output
    pub verbose: bool,

    /// Write the log file as JSON lines
    pub json_log: bool,

    /// Plan only, do not rename or retag anything
    pub dry_run: bool,

    /// Seed for start codes and timestamp gaps (random when absent)
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: None,
            target_folder: DEFAULT_TARGET_FOLDER.to_string(),
            log_dir: None,
            verbose: false,
            json_log: false,
            dry_run: false,
            seed: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Photo Resequencer Configuration File
# This file uses TOML format (https://toml.io)

# Root of the directory tree to scan
root_dir = "D:/Photos"

# Every folder below the root with exactly this name is resequenced
target_folder = "01. Foto's"

# Directory for the append-only log file
# Defaults to a "Log" folder next to the executable
# log_dir = "D:/Photos/Log"

# Verbose output - include debug lines
verbose = false

# Write the log file as JSON lines
json_log = false

# Dry run mode - print the rename plans without touching any file
dry_run = false

# Fixed seed for start codes and timestamp gaps (omit for random)
# seed = 42
"#
        .to_string()
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert_eq!(config.root_dir, Some(PathBuf::from("D:/Photos")));
        assert_eq!(config.target_folder, DEFAULT_TARGET_FOLDER);
        assert!(!config.dry_run);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: Config = toml::from_str("verbose = true").unwrap();
        assert!(config.verbose);
        assert_eq!(config.target_folder, DEFAULT_TARGET_FOLDER);
        assert!(config.root_dir.is_none());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        let missing = Config::load_from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::ReadError { .. })));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "target_folder = [").unwrap();
        let err = Config::load_from_file(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
