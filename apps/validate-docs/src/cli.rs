//! CLI argument parsing via `clap`.

use crate::config::CliOverrides;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "validate-docs",
    version,
    about = "Check fenced code snippets in documentation",
    long_about = "validate-docs scans a documentation tree, extracts fenced code blocks and runs each executable snippet through the checker configured for its language tag.\n\nConfiguration precedence: CLI > validate-docs.toml > defaults.\n\nExit codes: 0 all executable snippets passed, 1 a snippet failed, 2 usage or configuration error.",
    after_help = "Examples:\n  validate-docs docs\n  validate-docs docs --tag=raku --timeout=5\n  validate-docs docs --output json --jobs 4\n  validate-docs docs --config ci/validate-docs.toml --run-timeout 600",
    arg_required_else_help = true
)]
/// Top-level CLI options.
pub struct Cli {
    #[arg(help = "Root directory of the documentation files")]
    pub root: PathBuf,
    #[arg(
        long = "tag",
        value_name = "LANG",
        help = "Executable language tag; repeat to allow several (replaces configured tags)"
    )]
    pub tags: Vec<String>,
    #[arg(long, value_name = "SECONDS", help = "Per-snippet checker timeout (default: 10)")]
    pub timeout: Option<String>,
    #[arg(long, value_name = "SECONDS", help = "Abort pending checks after this many seconds")]
    pub run_timeout: Option<String>,
    #[arg(long, value_name = "N", help = "Number of parallel checker workers")]
    pub jobs: Option<usize>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, value_name = "PATH", help = "Config file (default: discovered validate-docs.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Match language tags case-sensitively")]
    pub case_sensitive: bool,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            root: self.root.clone(),
            config: self.config.clone(),
            tags: self.tags.clone(),
            timeout: self.timeout.clone(),
            run_timeout: self.run_timeout.clone(),
            jobs: self.jobs,
            output: self.output.clone(),
            case_sensitive: self.case_sensitive,
        }
    }
}
