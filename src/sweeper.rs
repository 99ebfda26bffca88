//! Depth-first walk that filters entries and dispatches actions.
//!
//! Entries are visited in file-name order within each directory. Every action
//! for an entry completes before the next entry is visited, and the first
//! error from the walk or from an action aborts the sweep. Effects already
//! applied are not rolled back.

use crate::actions::{self, Action, ActionError};
use crate::config::SweepConfig;
use crate::filter::FileEntry;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors that abort a sweep.
#[derive(Debug)]
pub enum SweepError {
    /// The walk could not read an entry (or the root itself).
    Walk {
        path: Option<PathBuf>,
        source: walkdir::Error,
    },
    /// The root's target could not be read.
    Root { path: PathBuf, source: io::Error },
    /// The archive destination lies inside the tree being walked.
    ArchiveInsideRoot { archive: PathBuf, root: PathBuf },
    /// An action failed on a matching file.
    Action(ActionError),
}

impl std::fmt::Display for SweepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Walk {
                path: Some(path),
                source,
            } => write!(f, "Failed to walk {}: {}", path.display(), source),
            Self::Walk { path: None, source } => write!(f, "Failed to walk: {}", source),
            Self::Root { path, source } => {
                write!(f, "Failed to read root {}: {}", path.display(), source)
            }
            Self::ArchiveInsideRoot { archive, root } => write!(
                f,
                "Archive destination {} is inside the walked tree {}",
                archive.display(),
                root.display()
            ),
            Self::Action(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Walk { source, .. } => Some(source),
            Self::Root { source, .. } => Some(source),
            Self::ArchiveInsideRoot { .. } => None,
            Self::Action(e) => Some(e),
        }
    }
}

impl From<ActionError> for SweepError {
    fn from(e: ActionError) -> Self {
        Self::Action(e)
    }
}

impl From<walkdir::Error> for SweepError {
    fn from(e: walkdir::Error) -> Self {
        Self::Walk {
            path: e.path().map(Path::to_path_buf),
            source: e,
        }
    }
}

/// Counts of what a completed sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Entries produced by the walk, directories and the root included.
    pub visited: usize,
    /// Entries that passed the filter.
    pub matched: usize,
    pub listed: usize,
    pub archived: usize,
    pub deleted: usize,
    /// Total bytes copied into the archive tree.
    pub bytes_archived: u64,
}

/// Walks a tree and applies the configured actions to matching files.
///
/// `out` receives listed paths; `audit` receives one record per deleted file.
/// Both may point at the same destination.
pub struct Sweeper<'a, O: Write + ?Sized, A: Write + ?Sized> {
    config: &'a SweepConfig,
    plan: Vec<Action>,
    out: &'a mut O,
    audit: &'a mut A,
}

impl<'a, O: Write + ?Sized, A: Write + ?Sized> Sweeper<'a, O, A> {
    pub fn new(config: &'a SweepConfig, out: &'a mut O, audit: &'a mut A) -> Self {
        let plan = config.action_plan();
        log::debug!("action plan: {:?}", plan);
        Self {
            config,
            plan,
            out,
            audit,
        }
    }

    /// Runs the sweep from `root`.
    ///
    /// # Errors
    ///
    /// Returns the first walk or action error; entries after it are not
    /// visited. An archive destination inside `root` is refused before the
    /// walk starts, since its copies would be walked and archived again.
    pub fn run(&mut self, root: &Path) -> Result<SweepSummary, SweepError> {
        let mut summary = SweepSummary::default();

        if let Some(archive) = self.config.archive.as_deref()
            && self.plan.contains(&Action::Archive)
            && is_inside(archive, root)
        {
            return Err(SweepError::ArchiveInsideRoot {
                archive: archive.to_path_buf(),
                root: root.to_path_buf(),
            });
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            // The walk descends through a symlinked root, so classify it by its target.
            let metadata = if entry.depth() == 0 && entry.path_is_symlink() {
                fs::metadata(entry.path()).map_err(|e| SweepError::Root {
                    path: entry.path().to_path_buf(),
                    source: e,
                })?
            } else {
                entry.metadata()?
            };
            summary.visited += 1;

            let file = FileEntry::new(entry.path(), &metadata);
            if file.is_excluded(&self.config.filter) {
                log::trace!("skipping {}", file.path.display());
                continue;
            }

            summary.matched += 1;
            self.dispatch(root, &file, &mut summary)?;
        }

        Ok(summary)
    }

    fn dispatch(
        &mut self,
        root: &Path,
        file: &FileEntry,
        summary: &mut SweepSummary,
    ) -> Result<(), ActionError> {
        for action in &self.plan {
            match action {
                Action::List => {
                    actions::list_file(&file.path, &mut *self.out)?;
                    summary.listed += 1;
                }
                Action::Archive => {
                    // Plan only contains Archive when a destination is set.
                    let Some(dest_root) = self.config.archive.as_deref() else {
                        continue;
                    };
                    let (destination, bytes) = actions::archive_file(dest_root, root, &file.path)?;
                    log::debug!(
                        "archived {} -> {} ({} bytes)",
                        file.path.display(),
                        destination.display(),
                        bytes
                    );
                    summary.archived += 1;
                    summary.bytes_archived += bytes;
                }
                Action::Delete => {
                    actions::delete_file(&file.path, &mut *self.audit)?;
                    log::debug!("deleted {}", file.path.display());
                    summary.deleted += 1;
                }
            }
        }
        Ok(())
    }
}

/// Returns true if `path`, once resolved, lies at or under `root`.
///
/// `path` need not exist yet; its nearest existing ancestor is resolved and
/// the missing tail appended. Unresolvable paths are treated as outside.
fn is_inside(path: &Path, root: &Path) -> bool {
    let Ok(root) = fs::canonicalize(root) else {
        return false;
    };

    let mut existing = path.to_path_buf();
    let mut missing = Vec::new();
    let resolved = loop {
        if let Ok(resolved) = fs::canonicalize(&existing) {
            break resolved;
        }
        let (Some(name), Some(parent)) = (existing.file_name(), existing.parent()) else {
            return false;
        };
        missing.push(name.to_os_string());
        existing = if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        };
    };

    let full = missing
        .iter()
        .rev()
        .fold(resolved, |acc, name| acc.join(name));
    full.starts_with(&root)
}

/// Runs one sweep over `root`. See [`Sweeper`].
///
/// # Examples
///
/// ```no_run
/// use dirsweep::config::SweepConfig;
/// use dirsweep::filter::FilterSettings;
/// use dirsweep::sweeper::run;
/// use std::path::Path;
///
/// let config = SweepConfig {
///     filter: FilterSettings::new(".log", 0),
///     list: true,
///     ..Default::default()
/// };
/// let mut out = Vec::new();
/// let mut audit = Vec::new();
/// run(Path::new("/var/log"), &mut out, &mut audit, &config)?;
/// # Ok::<(), dirsweep::sweeper::SweepError>(())
/// ```
pub fn run<O: Write + ?Sized, A: Write + ?Sized>(
    root: &Path,
    out: &mut O,
    audit: &mut A,
    config: &SweepConfig,
) -> Result<SweepSummary, SweepError> {
    Sweeper::new(config, out, audit).run(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSettings;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sorted_depth_first_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("b")).unwrap();
        fs::write(root.join("b").join("inner.txt"), "x").unwrap();
        fs::write(root.join("a.txt"), "x").unwrap();
        fs::write(root.join("c.txt"), "x").unwrap();

        let mut out = Vec::new();
        let mut audit = Vec::new();
        let summary = run(root, &mut out, &mut audit, &SweepConfig::default()).unwrap();

        let expected = format!(
            "{}\n{}\n{}\n",
            root.join("a.txt").display(),
            root.join("b").join("inner.txt").display(),
            root.join("c.txt").display()
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(summary.visited, 5);
        assert_eq!(summary.matched, 3);
        assert_eq!(summary.listed, 3);
        assert!(audit.is_empty());
    }

    #[test]
    fn test_missing_root_is_walk_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope");

        let mut out = Vec::new();
        let mut audit = Vec::new();
        let result = run(&missing, &mut out, &mut audit, &SweepConfig::default());

        assert!(matches!(result, Err(SweepError::Walk { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn test_archive_then_delete_summary() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive_dir = TempDir::new().expect("Failed to create archive directory");
        let root = temp_dir.path();
        fs::write(root.join("one.log"), "12345").unwrap();
        fs::write(root.join("two.log"), "123").unwrap();
        fs::write(root.join("keep.gz"), "1").unwrap();

        let config = SweepConfig {
            filter: FilterSettings::new(".log", 0),
            delete: true,
            ..Default::default()
        }
        .with_archive(archive_dir.path());

        let mut out = Vec::new();
        let mut audit = Vec::new();
        let summary = run(root, &mut out, &mut audit, &config).unwrap();

        assert_eq!(summary.archived, 2);
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.listed, 0);
        assert_eq!(summary.bytes_archived, 8);
        assert!(out.is_empty());
        assert!(!root.join("one.log").exists());
        assert!(root.join("keep.gz").exists());
        assert_eq!(
            fs::read_to_string(archive_dir.path().join("one.log")).unwrap(),
            "12345"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_is_descended_not_acted_on() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let real = temp_dir.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("a.log"), "x").unwrap();
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).expect("Failed to create symlink");

        let mut out = Vec::new();
        let mut audit = Vec::new();
        run(&link, &mut out, &mut audit, &SweepConfig::default()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", link.join("a.log").display())
        );

        let config = SweepConfig {
            delete: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        let mut audit = Vec::new();
        let summary = run(&link, &mut out, &mut audit, &config).unwrap();

        assert_eq!(summary.deleted, 1);
        assert!(fs::symlink_metadata(&link).is_ok());
        assert!(!real.join("a.log").exists());
        let audit = String::from_utf8(audit).unwrap();
        assert_eq!(audit.lines().count(), 1);
        assert!(audit.ends_with(&format!(" {}\n", link.join("a.log").display())));
    }

    #[test]
    fn test_archive_inside_root_refused() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.log"), "x").unwrap();

        for archive in [root.join("backup"), root.join("existing")] {
            if archive.ends_with("existing") {
                fs::create_dir(&archive).unwrap();
            }
            let config = SweepConfig {
                delete: true,
                ..Default::default()
            }
            .with_archive(&archive);

            let mut out = Vec::new();
            let mut audit = Vec::new();
            let result = run(root, &mut out, &mut audit, &config);

            assert!(matches!(result, Err(SweepError::ArchiveInsideRoot { .. })));
            assert!(audit.is_empty());
            assert!(root.join("a.log").exists());
        }
        assert!(!root.join("backup").exists());
    }

    #[test]
    fn test_is_inside() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let other_dir = TempDir::new().expect("Failed to create other directory");
        let root = temp_dir.path();

        assert!(is_inside(root, root));
        assert!(is_inside(&root.join("missing/deeper"), root));
        assert!(!is_inside(other_dir.path(), root));
        assert!(!is_inside(&other_dir.path().join("missing"), root));
        assert!(!is_inside(root, &root.join("does-not-exist")));
    }

    #[test]
    fn test_file_root_is_listed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("single.log");
        fs::write(&file_path, "x").unwrap();

        let mut out = Vec::new();
        let mut audit = Vec::new();
        run(&file_path, &mut out, &mut audit, &SweepConfig::default()).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", file_path.display())
        );
    }
}
