//! File filtering by extension and minimum size.
//!
//! Filtering is a pure decision over an entry's directory flag, extension and
//! size. Directories are never selected, although the walk still descends
//! into them.

use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Thresholds applied to every entry produced by the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSettings {
    /// Required extension including the leading dot (e.g. ".log").
    /// Empty means no extension restriction.
    pub extension: String,
    /// Minimum size in bytes. Zero means no size restriction.
    pub min_size: u64,
}

impl FilterSettings {
    pub fn new(extension: impl Into<String>, min_size: u64) -> Self {
        Self {
            extension: extension.into(),
            min_size,
        }
    }
}

/// A single entry produced by the walk, alive for one dispatch only.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path as produced by the walk (root joined with the relative path).
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes as reported by the entry's metadata.
    pub size: u64,
    /// Conventional extension of the final path segment, see [`file_extension`].
    pub extension: OsString,
}

impl FileEntry {
    /// Builds an entry from a walked path and its metadata.
    pub fn new(path: &Path, metadata: &Metadata) -> Self {
        Self {
            path: path.to_path_buf(),
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            extension: file_extension(path).to_os_string(),
        }
    }

    /// Returns true if the entry should be skipped under `settings`.
    pub fn is_excluded(&self, settings: &FilterSettings) -> bool {
        should_exclude(
            self.is_dir,
            &self.extension,
            self.size,
            &settings.extension,
            settings.min_size,
        )
    }
}

/// Returns the suffix of the file name starting at its last `.`, dot included.
///
/// Unlike [`Path::extension`], a name with a single leading dot such as
/// `.bashrc` yields `.bashrc`, and a name ending in a dot yields `"."`.
/// Names without any dot yield an empty string.
///
/// The suffix is taken from the raw name, so names that are not valid UTF-8
/// still yield their extension.
pub fn file_extension(path: &Path) -> &OsStr {
    let Some(name) = path.file_name() else {
        return OsStr::new("");
    };
    suffix_from_last_dot(name)
}

#[cfg(unix)]
fn suffix_from_last_dot(name: &OsStr) -> &OsStr {
    use std::os::unix::ffi::OsStrExt;

    let bytes = name.as_bytes();
    match bytes.iter().rposition(|&b| b == b'.') {
        Some(idx) => OsStr::from_bytes(&bytes[idx..]),
        None => OsStr::new(""),
    }
}

#[cfg(not(unix))]
fn suffix_from_last_dot(name: &OsStr) -> &OsStr {
    let Some(name) = name.to_str() else {
        return OsStr::new("");
    };
    match name.rfind('.') {
        Some(idx) => OsStr::new(&name[idx..]),
        None => OsStr::new(""),
    }
}

/// Decides whether an entry is excluded from every action.
///
/// The extension comparison is exact and case-sensitive. Files strictly
/// smaller than `min_size` are excluded; a file of exactly `min_size` bytes
/// passes.
pub fn should_exclude(
    is_dir: bool,
    extension: impl AsRef<OsStr>,
    size: u64,
    ext_filter: &str,
    min_size: u64,
) -> bool {
    // Directories may report size 0; never let them reach the thresholds.
    if is_dir {
        return true;
    }

    if !ext_filter.is_empty() && extension.as_ref() != ext_filter {
        return true;
    }

    min_size > 0 && size < min_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_always_excluded() {
        assert!(should_exclude(true, "", 0, "", 0));
        assert!(should_exclude(true, ".log", 100, ".log", 0));
        assert!(should_exclude(true, ".log", 100, ".log", 10));
        assert!(should_exclude(true, "", 0, "", 1));
    }

    #[test]
    fn test_no_restrictions_includes_files() {
        assert!(!should_exclude(false, "", 0, "", 0));
        assert!(!should_exclude(false, ".sh", 42, "", 0));
    }

    #[test]
    fn test_extension_exact_match() {
        assert!(!should_exclude(false, ".log", 5, ".log", 0));
        assert!(should_exclude(false, ".gz", 5, ".log", 0));
        assert!(should_exclude(false, ".LOG", 5, ".log", 0));
        assert!(should_exclude(false, "log", 5, ".log", 0));
        assert!(should_exclude(false, "", 5, ".log", 0));
    }

    #[test]
    fn test_min_size_boundary() {
        assert!(should_exclude(false, ".log", 9, ".log", 10));
        assert!(!should_exclude(false, ".log", 10, ".log", 10));
        assert!(!should_exclude(false, ".log", 11, ".log", 10));
        assert!(!should_exclude(false, ".log", 0, ".log", 0));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(Path::new("dir/app.log")), ".log");
        assert_eq!(file_extension(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(file_extension(Path::new("Makefile")), "");
        assert_eq!(file_extension(Path::new(".bashrc")), ".bashrc");
        assert_eq!(file_extension(Path::new("trailing.")), ".");
        assert_eq!(file_extension(Path::new("some.dir/noext")), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_extension_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("logs").join(OsStr::from_bytes(b"bad\xff.log"));
        assert_eq!(file_extension(&path), ".log");
        assert!(!should_exclude(false, file_extension(&path), 1, ".log", 0));

        let odd_suffix = Path::new(OsStr::from_bytes(b"name.l\xffg"));
        assert_eq!(file_extension(odd_suffix).as_bytes(), b".l\xffg");
        assert!(should_exclude(false, file_extension(odd_suffix), 1, ".log", 0));
    }

    #[test]
    fn test_file_entry_from_metadata() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("data.log");
        std::fs::write(&file_path, "hello world").expect("Failed to write test file");

        let metadata = std::fs::metadata(&file_path).expect("Failed to stat file");
        let entry = FileEntry::new(&file_path, &metadata);

        assert_eq!(entry.size, 11);
        assert_eq!(entry.extension, ".log");
        assert!(!entry.is_dir);
        assert!(!entry.is_excluded(&FilterSettings::new(".log", 11)));
        assert!(entry.is_excluded(&FilterSettings::new(".log", 12)));

        let dir_metadata = std::fs::metadata(temp_dir.path()).expect("Failed to stat dir");
        let dir_entry = FileEntry::new(temp_dir.path(), &dir_metadata);
        assert!(dir_entry.is_excluded(&FilterSettings::default()));
    }
}
