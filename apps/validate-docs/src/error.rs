//! Error taxonomy for the validation pipeline.
//!
//! Only [`ConfigError`] is fatal; it aborts before any document is scanned
//! and maps to exit code 2 in the binary. Scan and checker errors are folded
//! into the report next to the document or snippet they belong to.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Invalid CLI input or configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("root directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("root path is not a directory: {0}")]
    RootNotDir(PathBuf),
    #[error("invalid {option}: `{value}` (expected seconds between 0.001 and 604800)")]
    InvalidSeconds { option: &'static str, value: String },
    #[error("invalid output mode `{0}` (expected human|json)")]
    InvalidOutput(String),
    #[error("jobs must be at least 1")]
    ZeroJobs,
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid exclude pattern `{pattern}`: {message}")]
    InvalidExclude { pattern: String, message: String },
    #[error("no checker configured for executable tag `{0}`")]
    MissingChecker(String),
    #[error("checker command for `{0}` is empty")]
    EmptyCommand(String),
}

/// A document that could not be read. Recorded as a report warning.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("unreadable: {source}")]
    Read {
        path: PathBuf,
        display: String,
        #[source]
        source: io::Error,
    },
    #[error("glob failed: {message}")]
    Walk { display: String, message: String },
}

impl ScanError {
    /// Root-relative path used in report lines.
    pub fn display_path(&self) -> &str {
        match self {
            ScanError::Read { display, .. } | ScanError::Walk { display, .. } => display,
        }
    }

    /// On-disk path of the unreadable document, when one is known.
    pub fn fs_path(&self) -> Option<&Path> {
        match self {
            ScanError::Read { path, .. } => Some(path),
            ScanError::Walk { .. } => None,
        }
    }
}

/// Abnormal outcomes of a single checker invocation.
///
/// A checker that runs to completion and rejects the snippet is not an error;
/// it returns a `CheckReport` with `success = false`.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("timeout")]
    Timeout,
    #[error("cancelled")]
    Cancelled,
    #[error("checker crashed: {0}")]
    Crashed(String),
    #[error("failed to start checker `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("checker i/o failed: {0}")]
    Io(#[from] io::Error),
}
