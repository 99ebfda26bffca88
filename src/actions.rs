/// Action handlers applied to files that pass the filter.
///
/// This module provides the three side effects a sweep can have on a file:
/// echoing its path, copying it into a mirrored archive tree, and deleting it
/// with an audit record. Every failure is returned to the caller, which aborts
/// the sweep.
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Prefix of every audit record written by [`delete_file`].
pub const AUDIT_PREFIX: &str = "DELETED FILE: ";

/// Timestamp layout used in audit records.
const AUDIT_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Permission mode given to archived files.
#[cfg(unix)]
const ARCHIVE_FILE_MODE: u32 = 0o644;

/// The closed set of actions a sweep can apply to a matching file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Write the path to the primary output.
    List,
    /// Copy the file into the archive tree.
    Archive,
    /// Remove the file and write an audit record.
    Delete,
}

/// Errors that can occur while applying an action to a file.
#[derive(Debug)]
pub enum ActionError {
    /// Failed to write a listed path to the output.
    ListWriteFailed { path: PathBuf, source: io::Error },
    /// Failed to remove a file.
    DeleteFailed { path: PathBuf, source: io::Error },
    /// The file was removed but its audit record could not be written.
    AuditWriteFailed { path: PathBuf, source: io::Error },
    /// The file does not live under the traversal root.
    NotUnderRoot { path: PathBuf, root: PathBuf },
    /// Failed to create a directory in the archive tree.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to open the file being archived.
    SourceOpenFailed { path: PathBuf, source: io::Error },
    /// Failed to create the archive copy.
    DestinationCreateFailed { path: PathBuf, source: io::Error },
    /// Failed while copying bytes into the archive copy.
    CopyFailed {
        source_path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListWriteFailed { path, source } => {
                write!(f, "Failed to list {}: {}", path.display(), source)
            }
            Self::DeleteFailed { path, source } => {
                write!(f, "Failed to delete {}: {}", path.display(), source)
            }
            Self::AuditWriteFailed { path, source } => {
                write!(
                    f,
                    "Deleted {} but failed to write audit record: {}",
                    path.display(),
                    source
                )
            }
            Self::NotUnderRoot { path, root } => {
                write!(
                    f,
                    "Cannot archive {}: not under root {}",
                    path.display(),
                    root.display()
                )
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::SourceOpenFailed { path, source } => {
                write!(f, "Failed to open {}: {}", path.display(), source)
            }
            Self::DestinationCreateFailed { path, source } => {
                write!(f, "Failed to create {}: {}", path.display(), source)
            }
            Self::CopyFailed {
                source_path,
                destination,
                source,
            } => {
                write!(
                    f,
                    "Failed to copy {} to {}: {}",
                    source_path.display(),
                    destination.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotUnderRoot { .. } => None,
            Self::ListWriteFailed { source, .. }
            | Self::DeleteFailed { source, .. }
            | Self::AuditWriteFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::SourceOpenFailed { source, .. }
            | Self::DestinationCreateFailed { source, .. }
            | Self::CopyFailed { source, .. } => Some(source),
        }
    }
}

/// Result type for action handlers.
pub type ActionResult<T> = Result<T, ActionError>;

/// Writes `path` followed by a newline to `out`.
pub fn list_file<W: Write + ?Sized>(path: &Path, out: &mut W) -> ActionResult<()> {
    write_path_line(out, path).map_err(|e| ActionError::ListWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Removes the file at `path`, then records the removal in `audit`.
///
/// The audit record is only written once the file is gone, so the audit log
/// lists files actually removed rather than files attempted.
pub fn delete_file<W: Write + ?Sized>(path: &Path, audit: &mut W) -> ActionResult<()> {
    fs::remove_file(path).map_err(|e| ActionError::DeleteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    write_audit_record(audit, path).map_err(|e| ActionError::AuditWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes one audit record for a removed file, trailing newline included.
pub fn write_audit_record<W: Write + ?Sized>(audit: &mut W, path: &Path) -> io::Result<()> {
    write!(
        audit,
        "{}{} ",
        AUDIT_PREFIX,
        Local::now().format(AUDIT_TIME_FORMAT)
    )?;
    write_path_line(audit, path)
}

/// Writes the path bytes unchanged so non-UTF-8 names still name the file.
fn write_path_line<W: Write + ?Sized>(out: &mut W, path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        out.write_all(path.as_os_str().as_bytes())?;
    }
    #[cfg(not(unix))]
    {
        write!(out, "{}", path.display())?;
    }

    out.write_all(b"\n")
}

/// Copies `path` into the archive tree rooted at `dest_root`.
///
/// The file's location relative to `root` is preserved under `dest_root`,
/// creating intermediate directories as needed. An existing destination file
/// is truncated. Returns the destination path and the number of bytes copied.
///
/// An interrupted copy may leave a partial destination file behind. A
/// destination inside `root` would be walked again by a sweep; the sweeper
/// refuses that configuration before walking.
///
/// # Examples
///
/// ```no_run
/// use dirsweep::actions::archive_file;
/// use std::path::Path;
///
/// let (dest, bytes) = archive_file(
///     Path::new("/backup"),
///     Path::new("/var/log/app"),
///     Path::new("/var/log/app/2024/server.log"),
/// )?;
/// assert_eq!(dest, Path::new("/backup/2024/server.log"));
/// # let _ = bytes;
/// # Ok::<(), dirsweep::actions::ActionError>(())
/// ```
pub fn archive_file(dest_root: &Path, root: &Path, path: &Path) -> ActionResult<(PathBuf, u64)> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ActionError::NotUnderRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    // A file given directly as the root has no relative part; keep its name.
    let destination = if relative.as_os_str().is_empty() {
        let name = path.file_name().ok_or_else(|| ActionError::NotUnderRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;
        dest_root.join(name)
    } else {
        dest_root.join(relative)
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| ActionError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut source = File::open(path).map_err(|e| ActionError::SourceOpenFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut target =
        open_archive_target(&destination).map_err(|e| ActionError::DestinationCreateFailed {
            path: destination.clone(),
            source: e,
        })?;

    let copied = io::copy(&mut source, &mut target).map_err(|e| ActionError::CopyFailed {
        source_path: path.to_path_buf(),
        destination: destination.clone(),
        source: e,
    })?;

    Ok((destination, copied))
}

fn open_archive_target(destination: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(ARCHIVE_FILE_MODE);
    }

    options.open(destination)
}
