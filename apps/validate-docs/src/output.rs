//! Output rendering for validation reports.
//!
//! Supports `human` (default) and `json` outputs. The human form is plain
//! text, optionally colored; the JSON form serializes the report as is.

use crate::models::{Outcome, ValidationResult};
use crate::report::Report;
use crate::utils;
use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;
use std::fmt::Write as _;

const CONTINUATION: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Some(OutputMode::Human),
            "json" => Some(OutputMode::Json),
            _ => None,
        }
    }
}

fn use_colors(mode: OutputMode) -> bool {
    mode == OutputMode::Human && utils::colors_enabled()
}

/// Print the report to stdout in the requested mode.
pub fn print_report(report: &Report, mode: OutputMode) {
    match mode {
        OutputMode::Json => match serde_json::to_string_pretty(&compose_json(report)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} failed to serialize report: {}", utils::error_prefix(), e),
        },
        OutputMode::Human => print!("{}", compose_human(report, use_colors(mode))),
    }
}

/// Compose the human report (pure) for testing and plain rendering.
pub fn compose_human(report: &Report, color: bool) -> String {
    let mut out = String::new();
    let s = report.summary();
    let counts = format!(
        "total={} passed={} failed={} skipped={}",
        s.total, s.passed, s.failed, s.skipped
    );
    if color {
        let _ = writeln!(out, "{}", counts.bold());
    } else {
        let _ = writeln!(out, "{}", counts);
    }
    for f in report.failures() {
        let _ = writeln!(out, "{}", result_line(f, color));
    }
    for n in report.notices() {
        let _ = writeln!(out, "{}", result_line(n, color));
    }
    for w in report.warnings() {
        let prefix = if color {
            "warning:".yellow().bold().to_string()
        } else {
            "warning:".to_string()
        };
        let _ = writeln!(out, "{} {}: {}", prefix, w.path, w.message);
    }
    out
}

fn result_line(r: &ValidationResult, color: bool) -> String {
    let loc = format!("{}:{}:", r.path, r.line);
    let diag = utils::indent_continuation(r.diagnostic.as_deref().unwrap_or(""), CONTINUATION);
    match (r.outcome, color) {
        (Outcome::Skipped, false) => format!("{} skipped: {}", loc, diag),
        (Outcome::Skipped, true) => format!(
            "{} {} {}",
            loc.bold(),
            "skipped:".bright_black(),
            diag
        ),
        (_, false) => format!("{} {}", loc, diag),
        (_, true) => format!("{} {}", loc.bold(), diag.red()),
    }
}

/// Compose report JSON (pure) for testing/snapshot purposes.
pub fn compose_json(report: &Report) -> JsonVal {
    let mut v = serde_json::to_value(report).unwrap_or(JsonVal::Null);
    if let JsonVal::Object(map) = &mut v {
        map.insert("exit_code".into(), report.exit_code().into());
    }
    v
}
