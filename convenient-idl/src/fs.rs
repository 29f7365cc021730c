//! Filesystem facade
//!
//! Everything the orchestrator needs from the filesystem goes through
//! [`FileSystem`], so runs can be exercised against an in-memory double.

use filetime::FileTime;
use std::fs;
use std::io;
use std::path::Path;

use crate::scanner::{ScanError, StaleFileSet, StaleSourceScanner};

/// Filesystem operations used by a generation run
pub trait FileSystem {
    /// Whether `path` exists
    fn exists(&self, path: &Path) -> bool;

    /// Whether this process can create files inside directory `path`
    fn is_writable(&self, path: &Path) -> bool;

    /// Create `path` and any missing parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy a file, creating the target's parent directories.
    ///
    /// The copy carries the source's modification time, so a source dated
    /// in the future is not stale again on the next run.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Compute the stale files of `source_root` against `timestamp_root`
    fn stale_sources(
        &self,
        scanner: &StaleSourceScanner,
        source_root: &Path,
        timestamp_root: &Path,
    ) -> Result<StaleFileSet, ScanError>;
}

/// [`FileSystem`] backed by the host filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_writable(&self, path: &Path) -> bool {
        path.is_dir() && can_write(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        let _ = fs::copy(from, to)?;

        let modified = FileTime::from_last_modification_time(&fs::metadata(from)?);
        filetime::set_file_mtime(to, modified)
    }

    fn stale_sources(
        &self,
        scanner: &StaleSourceScanner,
        source_root: &Path,
        timestamp_root: &Path,
    ) -> Result<StaleFileSet, ScanError> {
        scanner.scan(source_root, timestamp_root)
    }
}

#[cfg(unix)]
fn can_write(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};
    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn can_write(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}
