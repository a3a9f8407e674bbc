//! Report aggregation.
//!
//! Results are folded into an immutable `Summary` one at a time; failing and
//! annotated results are kept and sorted by `(path, line)` so that the
//! rendered report does not depend on execution order.

use crate::models::{Outcome, Summary, ValidationResult, Warning};
use crate::output;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Summary of one validation run. Built once by [`Report::aggregate`].
pub struct Report {
    summary: Summary,
    failures: Vec<ValidationResult>,
    notices: Vec<ValidationResult>,
    warnings: Vec<Warning>,
}

impl Report {
    /// Fold results (in any order) and scan warnings into a report.
    pub fn aggregate<I>(results: I, warnings: Vec<Warning>) -> Self
    where
        I: IntoIterator<Item = ValidationResult>,
    {
        let (summary, mut failures, mut notices) = results.into_iter().fold(
            (Summary::default(), Vec::new(), Vec::new()),
            |(summary, mut failures, mut notices), r| {
                let summary = summary.add(&r);
                match r.outcome {
                    Outcome::Fail => failures.push(r),
                    Outcome::Skipped if r.diagnostic.is_some() => notices.push(r),
                    _ => {}
                }
                (summary, failures, notices)
            },
        );
        failures.sort_by(order);
        notices.sort_by(order);
        let mut warnings = warnings;
        warnings.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));
        Report {
            summary,
            failures,
            notices,
            warnings,
        }
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Failing results sorted by `(path, line)`.
    pub fn failures(&self) -> &[ValidationResult] {
        &self.failures
    }

    /// Skipped results that carry a diagnostic, sorted by `(path, line)`.
    pub fn notices(&self) -> &[ValidationResult] {
        &self.notices
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// `0` when nothing failed, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.summary.failed == 0 {
            0
        } else {
            1
        }
    }

    /// Plain-text rendering; identical input yields identical bytes.
    pub fn render(&self) -> String {
        output::compose_human(self, false)
    }
}

fn order(a: &ValidationResult, b: &ValidationResult) -> std::cmp::Ordering {
    a.location()
        .cmp(&b.location())
        .then_with(|| a.tag.cmp(&b.tag))
        .then_with(|| a.diagnostic.cmp(&b.diagnostic))
}
