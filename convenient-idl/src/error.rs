//! Error types for IDL generation runs.

use std::path::PathBuf;
use thiserror::Error;

use crate::scanner::ScanError;

/// Errors surfaced by the generation engine.
///
/// [`IdlError::is_fatal`] decides what a run does with an error: fatal ones
/// terminate [`crate::orchestrator::Orchestrator::run`], the others are logged
/// and collected in the run report.
#[derive(Debug, Error)]
pub enum IdlError {
    /// The source tree could not be walked
    #[error("Error scanning source root '{root}' for stale IDL files to reprocess: {source}")]
    Scan {
        /// Source root being scanned
        root: PathBuf,
        /// Underlying scanner failure
        #[source]
        source: ScanError,
    },

    /// The selected backend could not be located on this host
    #[error("IDL compiler not available: {0}")]
    CompilerUnavailable(String),

    /// Unknown backend selector string
    #[error("Compiler not supported: {0}")]
    UnsupportedTranslator(String),

    /// A configuration option the selected backend cannot express
    #[error("{compiler} compiler does not support {option}")]
    UnsupportedOption {
        /// Backend name
        compiler: &'static str,
        /// Human readable description of the rejected option
        option: String,
    },

    /// The backend reported a failure for one file
    #[error("IDL compilation failed for {file}: {reason}")]
    Translation {
        /// File being translated
        file: PathBuf,
        /// Exit status or launch failure description
        reason: String,
    },

    /// Copying a processed file into the timestamp store failed
    #[error("Failed to record timestamp for {file}: {source}")]
    TimestampCopy {
        /// Processed source file
        file: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The output directory exists but cannot be written to
    #[error("Unable to write to output directory: {0}")]
    OutputNotWritable(PathBuf),

    /// Configuration file could not be loaded
    #[error("Invalid configuration {path}: {reason}")]
    Config {
        /// Configuration file path
        path: PathBuf,
        /// Parse or read failure
        reason: String,
    },
}

impl IdlError {
    /// Whether this error aborts the whole run.
    ///
    /// A scan failure only ends its own source group and a timestamp copy
    /// failure only costs a retranslation on the next run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IdlError::Scan { .. } | IdlError::TimestampCopy { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IdlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_copy_is_not_fatal() {
        let err = IdlError::TimestampCopy {
            file: PathBuf::from("a.idl"),
            source: std::io::Error::other("disk full"),
        };
        assert!(!err.is_fatal());
        assert!(IdlError::UnsupportedTranslator("bogus".into()).is_fatal());
    }

    #[test]
    fn test_scan_failure_is_not_fatal() {
        let err = IdlError::Scan {
            root: PathBuf::from("src/main/idl"),
            source: ScanError::InvalidPattern {
                pattern: "[".into(),
                message: "invalid range pattern".into(),
            },
        };
        assert!(!err.is_fatal());
        assert!(
            IdlError::Translation {
                file: PathBuf::from("a.idl"),
                reason: "idlj exited with code 1".into(),
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = IdlError::UnsupportedTranslator("bogus".into());
        assert_eq!(err.to_string(), "Compiler not supported: bogus");

        let err = IdlError::UnsupportedOption {
            compiler: "idlj",
            option: "packagePrefix".into(),
        };
        assert_eq!(err.to_string(), "idlj compiler does not support packagePrefix");
    }
}
