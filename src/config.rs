//! Sweep configuration and optional TOML defaults.
//!
//! The runtime configuration ([`SweepConfig`]) is built once before the walk
//! and never changes afterwards. Filter thresholds, the log file and the
//! archive destination may be given defaults in a TOML file; the action
//! switches (`--list`, `--del`) are command-line only.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sweep]
//! ext = ".log"
//! size = 1024
//! log = "/var/log/dirsweep-deletes.log"
//! archive = "/srv/archive"
//! ```

use crate::actions::Action;
use crate::filter::FilterSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory defaults file.
pub const LOCAL_CONFIG_FILE: &str = ".dirsweeprc.toml";

/// Errors that can occur while loading configuration or opening sinks.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
    /// The delete log could not be opened for appending.
    LogOpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
            ConfigError::LogOpenFailed { path, source } => {
                write!(f, "Failed to open log file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::LogOpenFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Defaults loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub sweep: SweepDefaults,
}

/// The `[sweep]` table. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepDefaults {
    /// Extension filter, leading dot included.
    pub ext: Option<String>,
    /// Minimum file size in bytes.
    pub size: Option<u64>,
    /// File receiving delete audit records.
    pub log: Option<PathBuf>,
    /// Archive destination root.
    pub archive: Option<PathBuf>,
}

impl FileConfig {
    /// Load defaults from a file, with fallback to built-in defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsweeprc.toml` in the current directory
    /// 3. Look for `~/.config/dirsweep/config.toml` in home directory
    /// 4. Fall back to empty defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsweep")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load defaults from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        log::debug!("loading defaults from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Immutable configuration for one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepConfig {
    /// Extension and size thresholds.
    pub filter: FilterSettings,
    /// Whether `--list` was requested. Advisory only: [`Self::action_plan`]
    /// lists whenever delete is off and never lists when it is on, so this
    /// flag does not change which actions run.
    pub list: bool,
    /// Delete matching files.
    pub delete: bool,
    /// Archive destination root; `None` disables archiving.
    pub archive: Option<PathBuf>,
}

impl SweepConfig {
    /// Sets the archive destination. An empty path disables archiving.
    pub fn with_archive(mut self, archive: impl Into<PathBuf>) -> Self {
        let archive = archive.into();
        self.archive = if archive.as_os_str().is_empty() {
            None
        } else {
            Some(archive)
        };
        self
    }

    /// Resolves the ordered actions every matching file receives.
    ///
    /// - delete enabled: archive (if configured), then delete; list never runs
    /// - otherwise, archive configured: archive, then list
    /// - otherwise: list, whether or not `--list` was given
    pub fn action_plan(&self) -> Vec<Action> {
        if self.delete {
            let mut plan = Vec::with_capacity(2);
            if self.archive.is_some() {
                plan.push(Action::Archive);
            }
            plan.push(Action::Delete);
            plan
        } else if self.archive.is_some() {
            vec![Action::Archive, Action::List]
        } else {
            vec![Action::List]
        }
    }
}
