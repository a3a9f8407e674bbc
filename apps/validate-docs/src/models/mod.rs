//! Shared data models for the scan/extract/check pipeline and its report.

pub mod document;

pub use document::{Attributes, Document, Snippet};

use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Final state of one snippet.
pub enum Outcome {
    Pass,
    Fail,
    Skipped,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Outcome of validating one snippet, with provenance for report lines.
///
/// `diagnostic` is always set for `Fail`. Skips carry one only when the skip
/// has a reason worth surfacing (truncated fence, cancellation, ...).
pub struct ValidationResult {
    pub path: Arc<str>,
    pub line: usize,
    pub tag: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ValidationResult {
    pub fn pass(snippet: &Snippet) -> Self {
        Self::new(snippet, Outcome::Pass, None)
    }

    pub fn fail(snippet: &Snippet, diagnostic: impl Into<String>) -> Self {
        Self::new(snippet, Outcome::Fail, Some(diagnostic.into()))
    }

    pub fn skipped(snippet: &Snippet, diagnostic: Option<String>) -> Self {
        Self::new(snippet, Outcome::Skipped, diagnostic)
    }

    fn new(snippet: &Snippet, outcome: Outcome, diagnostic: Option<String>) -> Self {
        Self {
            path: Arc::clone(&snippet.source),
            line: snippet.line,
            tag: snippet.tag.clone(),
            outcome,
            diagnostic,
        }
    }

    /// Sort key used for deterministic report order.
    pub fn location(&self) -> (&str, usize) {
        (&*self.path, self.line)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// A document that could not be scanned.
pub struct Warning {
    pub path: String,
    pub message: String,
}

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Aggregated counts used by printers and the exit status.
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    /// Count one more result; each step returns a new value.
    #[must_use]
    pub fn add(self, result: &ValidationResult) -> Self {
        let total = self.total + 1;
        match result.outcome {
            Outcome::Pass => Self {
                total,
                passed: self.passed + 1,
                ..self
            },
            Outcome::Fail => Self {
                total,
                failed: self.failed + 1,
                ..self
            },
            Outcome::Skipped => Self {
                total,
                skipped: self.skipped + 1,
                ..self
            },
        }
    }
}
