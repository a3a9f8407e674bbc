//! Pipeline entry points: scan, extract, check, aggregate.
//!
//! Documents are read one at a time and dropped once their snippets are
//! extracted. Unreadable documents become report warnings; nothing but a
//! configuration error stops a run.

use crate::checker::CancelToken;
use crate::config::Effective;
use crate::error::ConfigError;
use crate::extract::extract;
use crate::models::{Snippet, Warning};
use crate::report::Report;
use crate::runner::Runner;
use crate::scan::Scanner;

/// Run the pipeline over everything `scanner` yields.
pub fn run_validation(scanner: &Scanner, runner: &Runner, cancel: &CancelToken) -> Report {
    let mut snippets: Vec<Snippet> = Vec::new();
    let mut warnings: Vec<Warning> = Vec::new();
    let mut documents = 0usize;
    for item in scanner.documents() {
        match item {
            Ok(doc) => {
                documents += 1;
                let found = extract(&doc);
                tracing::debug!(file = %doc.path.display(), snippets = found.len(), "extracted");
                snippets.extend(found);
            }
            Err(e) => {
                tracing::warn!(
                    path = %e.display_path(),
                    file = ?e.fs_path(),
                    error = %e,
                    "skipping document"
                );
                warnings.push(Warning {
                    path: e.display_path().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
    tracing::info!(
        root = %scanner.root().display(),
        documents,
        snippets = snippets.len(),
        "extracted snippets"
    );
    let results = runner.run(&snippets, cancel);
    Report::aggregate(results, warnings)
}

/// Build scanner, checkers and cancellation from `eff` and run the pipeline.
pub fn validate_docs(eff: &Effective) -> Result<Report, ConfigError> {
    let scanner = eff.scanner()?;
    let runner =
        Runner::new(eff.classifier(), eff.build_checkers()?, eff.timeout).with_jobs(eff.jobs);
    let cancel = match eff.run_timeout {
        Some(limit) => CancelToken::after(limit),
        None => CancelToken::new(),
    };
    Ok(run_validation(&scanner, &runner, &cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{CheckContext, CheckReport};
    use crate::classify::{Classifier, Language};
    use crate::error::CheckerError;
    use crate::runner::{Checkers, TIMEOUT_DIAGNOSTIC, TRUNCATED_DIAGNOSTIC};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    // Accepts everything except code containing `die-syntax`; sleeps on `sleep-forever`.
    fn fake_raku(code: &str, _: &CheckContext) -> Result<CheckReport, CheckerError> {
        if code.contains("sleep-forever") {
            thread::sleep(Duration::from_secs(3));
        }
        if code.contains("die-syntax") {
            return Ok(CheckReport::rejected("===SORRY!=== Error while compiling"));
        }
        Ok(CheckReport::ok())
    }

    fn runner(timeout: Duration) -> Runner {
        let mut checkers: Checkers = BTreeMap::new();
        checkers.insert(Language::Raku, Arc::new(fake_raku));
        Runner::new(Classifier::default(), checkers, timeout)
    }

    fn run(root: &Path) -> Report {
        let scanner = Scanner::new(root, &["md".to_string()], &[]).unwrap();
        run_validation(&scanner, &runner(Duration::from_secs(5)), &CancelToken::new())
    }

    #[test]
    fn test_single_valid_snippet_passes() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("arrays.md"),
            "# Arrays\n\n```raku\nmy @a = <x y z>;\nsay @a.elems;\n```\n",
        )
        .unwrap();
        let report = run(dir.path());
        let s = report.summary();
        assert_eq!((s.total, s.passed, s.failed, s.skipped), (1, 1, 0, 0));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_non_allow_listed_tag_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("intro.md"),
            "Install it:\n\n```shell\nzef install Foo\n```\n",
        )
        .unwrap();
        let report = run(dir.path());
        let s = report.summary();
        assert_eq!((s.total, s.skipped, s.failed), (1, 1, 0));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_failure_across_documents_reports_path_and_line() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("guide")).unwrap();
        fs::write(
            dir.path().join("guide/good.md"),
            "```raku\nsay 'ok';\n```\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("guide/regex.md"),
            "# Regexes\n\nSome prose.\n\n```raku\ndie-syntax\n```\n",
        )
        .unwrap();
        let report = run(dir.path());
        let s = report.summary();
        assert_eq!((s.total, s.passed, s.failed), (2, 1, 1));
        assert_eq!(report.exit_code(), 1);
        assert!(report
            .render()
            .contains("guide/regex.md:5: ===SORRY!=== Error while compiling\n"));
    }

    #[test]
    fn test_timeout_fails_one_snippet_and_run_completes() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("loops.md"),
            "```raku\nsleep-forever\n```\n\n```raku\nsay 1;\n```\n",
        )
        .unwrap();
        let scanner = Scanner::new(dir.path(), &["md".to_string()], &[]).unwrap();
        let report = run_validation(
            &scanner,
            &runner(Duration::from_millis(100)),
            &CancelToken::new(),
        );
        let s = report.summary();
        assert_eq!((s.total, s.passed, s.failed), (2, 1, 1));
        assert_eq!(report.failures()[0].line, 1);
        assert_eq!(report.failures()[0].diagnostic.as_deref(), Some(TIMEOUT_DIAGNOSTIC));
    }

    #[test]
    fn test_unterminated_fence_yields_one_skipped_result() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("sorting.md"),
            "# Sorting\n\n```raku\nsay <c a b>.sort;\n",
        )
        .unwrap();
        let report = run(dir.path());
        let s = report.summary();
        assert_eq!((s.total, s.skipped, s.failed), (1, 1, 0));
        assert_eq!(report.notices().len(), 1);
        assert_eq!(report.notices()[0].line, 3);
        assert_eq!(report.notices()[0].diagnostic.as_deref(), Some(TRUNCATED_DIAGNOSTIC));
    }

    #[test]
    fn test_reruns_produce_identical_reports() {
        let dir = tempdir().unwrap();
        for i in 0..8 {
            fs::write(
                dir.path().join(format!("page{}.md", i)),
                format!(
                    "```raku\nsay {i};\n```\n\n```raku\ndie-syntax {i}\n```\n\n```text\nnote\n```\n"
                ),
            )
            .unwrap();
        }
        let first = run(dir.path()).render();
        let second = run(dir.path()).render();
        assert_eq!(first, second);
        assert!(first.starts_with("total=24 passed=8 failed=8 skipped=8\n"));
    }

    #[test]
    fn test_unreadable_document_becomes_warning() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.md"), [0xffu8, 0xfe, 0xc3]).unwrap();
        fs::write(dir.path().join("good.md"), "```raku\nsay 1;\n```\n").unwrap();
        let report = run(dir.path());
        assert_eq!(report.summary().passed, 1);
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(report.warnings()[0].path, "bad.md");
        assert_eq!(report.exit_code(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_docs_with_command_checker() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(
            root.join("validate-docs.toml"),
            r#"
executable-tags = ["sh"]

[checkers.sh]
command = ["sh", "-n", "{file}"]
            "#,
        )
        .unwrap();
        fs::write(
            root.join("shell.md"),
            "```sh\necho ok\n```\n\n```sh\nif then fi (\n```\n\n```raku\nsay 1;\n```\n",
        )
        .unwrap();
        let eff = crate::config::resolve_effective(&crate::config::CliOverrides {
            root: root.to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        let report = validate_docs(&eff).unwrap();
        let s = report.summary();
        assert_eq!((s.total, s.passed, s.failed, s.skipped), (3, 1, 1, 1));
        assert_eq!(report.failures()[0].line, 5);
    }
}
