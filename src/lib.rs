//! dirsweep - walk a directory tree and act on matching files
//!
//! This library provides an extension and size filter, the list, archive and
//! delete actions, and the depth-first sweep that applies them in a fixed
//! order to every file passing the filter.

pub mod actions;
pub mod cli;
pub mod config;
pub mod filter;
pub mod output;
pub mod sweeper;

pub use actions::{Action, ActionError};
pub use config::{ConfigError, FileConfig, SweepConfig};
pub use filter::{FileEntry, FilterSettings, should_exclude};
pub use sweeper::{SweepError, SweepSummary, Sweeper, run};

pub use cli::{Args, CliError, run_cli};
