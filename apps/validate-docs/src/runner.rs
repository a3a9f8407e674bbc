//! Validation runner: turns snippets into results.
//!
//! Every snippet yields exactly one `ValidationResult`. Checker errors,
//! timeouts and panics become `Fail`; cancellation becomes `Skipped`.
//! Snippets are checked in parallel; each worker returns its result and the
//! aggregator restores a deterministic order afterwards.

use crate::checker::{CancelToken, CheckContext, CheckReport, Checker};
use crate::classify::{Class, Classifier, Language};
use crate::error::CheckerError;
use crate::models::{Snippet, ValidationResult};
use rayon::prelude::*;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default per-snippet timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const TIMEOUT_DIAGNOSTIC: &str = "timeout";
pub const CANCELLED_DIAGNOSTIC: &str = "cancelled";
pub const TRUNCATED_DIAGNOSTIC: &str = "unterminated code fence (truncated at end of file)";
pub const IGNORED_DIAGNOSTIC: &str = "ignored";

// Extra time granted to checkers that enforce the timeout themselves, so
// they can kill their child before the runner gives up on them.
const TIMEOUT_GRACE: Duration = Duration::from_millis(250);
const CANCEL_POLL: Duration = Duration::from_millis(25);

/// Checkers keyed by resolved language.
pub type Checkers = BTreeMap<Language, Arc<dyn Checker>>;

pub struct Runner {
    classifier: Classifier,
    checkers: Checkers,
    timeout: Duration,
    jobs: Option<usize>,
}

impl Runner {
    pub fn new(classifier: Classifier, checkers: Checkers, timeout: Duration) -> Self {
        Self {
            classifier,
            checkers,
            timeout,
            jobs: None,
        }
    }

    /// Bound the worker pool; `None` uses rayon's global pool.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Validate all snippets. Output order matches input order.
    pub fn run(&self, snippets: &[Snippet], cancel: &CancelToken) -> Vec<ValidationResult> {
        let work = || {
            snippets
                .par_iter()
                .map(|s| self.validate(s, cancel))
                .collect::<Vec<_>>()
        };
        match self.jobs {
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(work),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to build worker pool; using global pool");
                    work()
                }
            },
            None => work(),
        }
    }

    /// Validate one snippet.
    pub fn validate(&self, snippet: &Snippet, cancel: &CancelToken) -> ValidationResult {
        if snippet.truncated {
            return ValidationResult::skipped(snippet, Some(TRUNCATED_DIAGNOSTIC.to_string()));
        }
        if self.classifier.classify(snippet) == Class::NonExecutable {
            return ValidationResult::skipped(snippet, None);
        }
        if snippet.attrs.ignore {
            return ValidationResult::skipped(snippet, Some(IGNORED_DIAGNOSTIC.to_string()));
        }
        if cancel.is_cancelled() {
            return ValidationResult::skipped(snippet, Some(CANCELLED_DIAGNOSTIC.to_string()));
        }
        let lang = self.classifier.language(&snippet.tag);
        let Some(checker) = self.checkers.get(&lang) else {
            return ValidationResult::skipped(
                snippet,
                Some(format!("no checker configured for `{}`", lang)),
            );
        };

        let started = Instant::now();
        let outcome = self.invoke(Arc::clone(checker), snippet.code.clone(), cancel);
        tracing::debug!(
            path = %snippet.source,
            line = snippet.line,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.as_ref().map(|r| r.success).unwrap_or(false),
            "checked snippet"
        );
        interpret(snippet, outcome)
    }

    fn invoke(
        &self,
        checker: Arc<dyn Checker>,
        code: String,
        cancel: &CancelToken,
    ) -> Result<CheckReport, CheckerError> {
        let ctx = CheckContext {
            timeout: self.timeout,
            cancel: cancel.clone(),
        };
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("checker".into())
            .spawn(move || {
                let res = panic::catch_unwind(AssertUnwindSafe(|| checker.check(&code, &ctx)));
                let _ = tx.send(res);
            })?;

        // `None` when the limit is too large to represent: wait for the checker.
        let deadline = Instant::now().checked_add(self.timeout.saturating_add(TIMEOUT_GRACE));
        loop {
            let wait = match deadline {
                Some(d) => d.saturating_duration_since(Instant::now()).min(CANCEL_POLL),
                None => CANCEL_POLL,
            };
            match rx.recv_timeout(wait) {
                Ok(Ok(res)) => return res,
                Ok(Err(payload)) => {
                    return Err(CheckerError::Crashed(format!(
                        "checker panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CheckerError::Crashed(
                        "checker exited without a result".into(),
                    ))
                }
                Err(RecvTimeoutError::Timeout) => {
                    if cancel.is_cancelled() {
                        return Err(CheckerError::Cancelled);
                    }
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(CheckerError::Timeout);
                    }
                }
            }
        }
    }
}

fn interpret(
    snippet: &Snippet,
    outcome: Result<CheckReport, CheckerError>,
) -> ValidationResult {
    match outcome {
        Ok(report) if snippet.attrs.compile_fail => {
            if report.success {
                ValidationResult::fail(snippet, "expected the checker to reject this snippet")
            } else {
                ValidationResult::pass(snippet)
            }
        }
        Ok(report) if report.success => ValidationResult::pass(snippet),
        Ok(report) => ValidationResult::fail(
            snippet,
            report
                .diagnostic
                .unwrap_or_else(|| "checker reported a failure".to_string()),
        ),
        Err(CheckerError::Timeout) => ValidationResult::fail(snippet, TIMEOUT_DIAGNOSTIC),
        Err(CheckerError::Cancelled) => {
            ValidationResult::skipped(snippet, Some(CANCELLED_DIAGNOSTIC.to_string()))
        }
        Err(e) => ValidationResult::fail(snippet, e.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
