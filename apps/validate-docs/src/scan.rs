//! Document discovery under a root directory.
//!
//! Candidate paths are collected and sorted up front so that every run visits
//! documents in the same order; file contents are only read when the iterator
//! reaches them. Hidden files and directories are never matched.

use crate::error::{ConfigError, ScanError};
use crate::models::Document;
use crate::utils;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};

const WALK_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Walks a documentation tree and yields its documents.
pub struct Scanner {
    root: PathBuf,
    extensions: Vec<String>,
    exclude: Vec<Pattern>,
}

enum Candidate {
    File { path: PathBuf, display: String },
    Broken(ScanError),
}

impl Candidate {
    fn sort_key(&self) -> &str {
        match self {
            Candidate::File { display, .. } => display,
            Candidate::Broken(err) => err.display_path(),
        }
    }
}

impl Scanner {
    /// Build a scanner. Exclude patterns are globs matched against the
    /// root-relative display path.
    pub fn new(
        root: impl Into<PathBuf>,
        extensions: &[String],
        exclude: &[String],
    ) -> Result<Self, ConfigError> {
        let exclude = exclude
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| ConfigError::InvalidExclude {
                    pattern: p.clone(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily read every matching document in display-path order.
    ///
    /// Each call walks the tree again, so the sequence is restartable.
    pub fn documents(&self) -> impl Iterator<Item = Result<Document, ScanError>> + '_ {
        self.candidates().into_iter().map(|c| match c {
            Candidate::File { path, display } => match fs::read_to_string(&path) {
                Ok(text) => Ok(Document::new(path, display, text)),
                Err(source) => Err(ScanError::Read {
                    path,
                    display,
                    source,
                }),
            },
            Candidate::Broken(err) => Err(err),
        })
    }

    fn candidates(&self) -> Vec<Candidate> {
        let pattern = format!(
            "{}/**/*",
            Pattern::escape(&self.root.to_string_lossy()).trim_end_matches('/')
        );
        let entries = match glob::glob_with(&pattern, WALK_OPTIONS) {
            Ok(paths) => paths,
            Err(e) => {
                return vec![Candidate::Broken(ScanError::Walk {
                    display: ".".into(),
                    message: e.msg.to_string(),
                })]
            }
        };
        let mut out: Vec<Candidate> = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if !path.is_file() || !self.has_doc_extension(&path) {
                        continue;
                    }
                    let shown = utils::display_path(&path, &self.root);
                    if self.is_excluded(&shown) {
                        tracing::debug!(path = %shown, "excluded");
                        continue;
                    }
                    out.push(Candidate::File {
                        path,
                        display: shown,
                    });
                }
                Err(e) => {
                    let display = utils::display_path(e.path(), &self.root);
                    if self.is_excluded(&display) {
                        continue;
                    }
                    out.push(Candidate::Broken(ScanError::Walk {
                        display,
                        message: e.error().to_string(),
                    }));
                }
            }
        }
        out.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        tracing::debug!(root = %self.root.display(), documents = out.len(), "scanned");
        out
    }

    fn has_doc_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions.iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }

    fn is_excluded(&self, display: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(display))
    }
}
