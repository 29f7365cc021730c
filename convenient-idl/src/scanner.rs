//! Stale source detection
//!
//! Walks a source root and selects the files that need to be handed to a
//! compiler backend: a file is stale when it matches at least one include
//! pattern, no exclude pattern, and its mirror under the timestamp store is
//! either missing or older than the source by more than the configured
//! granularity.
//!
//! Patterns are matched against the path relative to the source root using
//! `/` as separator. `**` spans any number of directories (including none)
//! and `*` stays within one path segment. Matching is always case-sensitive,
//! also on platforms whose filesystems are not.

use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Default include pattern when a source configuration names none.
pub const DEFAULT_INCLUDE: &str = "**/*.idl";

/// Files selected for translation in one pass, rooted at the source root.
pub type StaleFileSet = BTreeSet<PathBuf>;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Errors raised while scanning a source tree
#[derive(Debug, Error)]
pub enum ScanError {
    /// An include or exclude pattern is not a valid glob
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Parser message
        message: String,
    },

    /// The directory walk could not be completed
    #[error("Failed to walk {path}: {source}")]
    Walk {
        /// Entry that could not be read
        path: PathBuf,
        /// Underlying walk failure
        #[source]
        source: walkdir::Error,
    },

    /// Modification time could not be read
    #[error("Failed to read modification time of {path}: {source}")]
    Metadata {
        /// File being inspected
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

/// Compares a source tree against a timestamp store.
#[derive(Debug, Clone)]
pub struct StaleSourceScanner {
    granularity: Duration,
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl StaleSourceScanner {
    /// Create a scanner.
    ///
    /// An empty include list falls back to [`DEFAULT_INCLUDE`].
    pub fn new<I, E, S, T>(granularity_ms: u64, includes: I, excludes: E) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        E: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut includes = compile_patterns(includes)?;
        if includes.is_empty() {
            includes = compile_patterns([DEFAULT_INCLUDE])?;
        }
        let excludes = compile_patterns(excludes)?;

        Ok(Self {
            granularity: Duration::from_millis(granularity_ms),
            includes,
            excludes,
        })
    }

    /// Collect the stale files under `source_root`.
    ///
    /// A missing source root, or one that is not a directory, yields an empty
    /// set.
    pub fn scan(&self, source_root: &Path, timestamp_root: &Path) -> Result<StaleFileSet, ScanError> {
        let mut stale = StaleFileSet::new();

        if !source_root.is_dir() {
            debug!("Source root {} does not exist, nothing to scan", source_root.display());
            return Ok(stale);
        }

        for entry in WalkDir::new(source_root).follow_links(true) {
            let entry = entry.map_err(|e| ScanError::Walk {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| source_root.to_path_buf()),
                source: e,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(source_root) else {
                continue;
            };

            if !self.is_included(relative) {
                continue;
            }

            if self.is_stale(entry.path(), &timestamp_root.join(relative))? {
                let _ = stale.insert(entry.path().to_path_buf());
            }
        }

        debug!("Found {} stale file(s) under {}", stale.len(), source_root.display());
        Ok(stale)
    }

    /// Whether a path relative to the source root passes the filters.
    pub fn is_included(&self, relative: &Path) -> bool {
        let candidate = to_pattern_path(relative);
        self.includes.iter().any(|p| p.matches_with(&candidate, MATCH_OPTIONS))
            && !self.excludes.iter().any(|p| p.matches_with(&candidate, MATCH_OPTIONS))
    }

    fn is_stale(&self, source: &Path, target: &Path) -> Result<bool, ScanError> {
        if !target.exists() {
            return Ok(true);
        }

        let source_modified = modified(source)?;
        let target_modified = modified(target)?;

        Ok(match target_modified.checked_add(self.granularity) {
            Some(limit) => source_modified > limit,
            None => false,
        })
    }
}

fn compile_patterns<I, S>(patterns: I) -> Result<Vec<Pattern>, ScanError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| {
            Pattern::new(p.as_ref()).map_err(|e| ScanError::InvalidPattern {
                pattern: p.as_ref().to_string(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

fn to_pattern_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn modified(path: &Path) -> Result<SystemTime, ScanError> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| ScanError::Metadata {
            path: path.to_path_buf(),
            source: e,
        })
}
