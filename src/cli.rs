//! Command-line interface module for dirsweep.
//!
//! This module handles:
//! - Flag parsing
//! - Merging flags with defaults from a configuration file
//! - Opening the delete log
//! - Running the sweep against stdout

use crate::config::{ConfigError, FileConfig, SweepConfig};
use crate::filter::FilterSettings;
use crate::sweeper::{self, SweepError, SweepSummary};
use clap::Parser;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Walk a directory tree and list, archive or delete matching files.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about)]
pub struct Args {
    /// Root directory to start from
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Append delete records to this file instead of stdout
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// List matching files only
    #[arg(long)]
    pub list: bool,

    /// Delete matching files
    #[arg(long)]
    pub del: bool,

    /// Copy matching files into this directory, mirroring the tree
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Only match files with this extension, dot included (e.g. ".log")
    #[arg(long)]
    pub ext: Option<String>,

    /// Only match files of at least this many bytes
    #[arg(long)]
    pub size: Option<u64>,

    /// Read defaults from this TOML file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Errors surfaced by [`run_cli`].
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be resolved; nothing was touched.
    Config(ConfigError),
    /// The sweep aborted part way.
    Sweep(SweepError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{}", e),
            Self::Sweep(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Sweep(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SweepError> for CliError {
    fn from(e: SweepError) -> Self {
        Self::Sweep(e)
    }
}

/// Fully resolved invocation: sweep configuration plus where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub root: PathBuf,
    pub log: Option<PathBuf>,
    pub config: SweepConfig,
}

impl Args {
    /// Merges flags over file defaults. Flags win.
    pub fn resolve(&self, defaults: &FileConfig) -> Invocation {
        let defaults = &defaults.sweep;
        let extension = self
            .ext
            .clone()
            .or_else(|| defaults.ext.clone())
            .unwrap_or_default();
        let min_size = self.size.or(defaults.size).unwrap_or(0);

        let mut config = SweepConfig {
            filter: FilterSettings::new(extension, min_size),
            list: self.list,
            delete: self.del,
            archive: None,
        };
        if let Some(archive) = self.archive.as_ref().or(defaults.archive.as_ref()) {
            config = config.with_archive(archive);
        }

        Invocation {
            root: self.root.clone(),
            log: self.log.clone().or_else(|| defaults.log.clone()),
            config,
        }
    }
}

/// Runs the tool for parsed `args`, writing listings to stdout.
///
/// Delete records go to the log file when one is configured, otherwise to
/// stdout alongside listings.
///
/// # Errors
///
/// Configuration errors are returned before the walk starts. Any walk or
/// action error aborts the sweep and is returned as is.
pub fn run_cli(args: &Args) -> Result<SweepSummary, CliError> {
    let defaults = FileConfig::load(args.config.as_deref())?;
    let invocation = args.resolve(&defaults);
    log::debug!("resolved invocation: {:?}", invocation);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = match invocation.log.as_deref() {
        Some(path) => {
            let mut log_file = open_log(path)?;
            sweeper::run(&invocation.root, &mut out, &mut log_file, &invocation.config)?
        }
        None => {
            // Audit records share stdout; a second handle keeps both sinks independent.
            let mut audit = io::stdout();
            sweeper::run(&invocation.root, &mut out, &mut audit, &invocation.config)?
        }
    };

    Ok(summary)
}

/// Opens the delete log for appending, creating it if needed.
pub fn open_log(path: &Path) -> Result<File, ConfigError> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    options.open(path).map_err(|e| ConfigError::LogOpenFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
