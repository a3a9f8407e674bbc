//! validate-docs CLI binary entry point.
//! Resolves configuration, runs the pipeline and prints the report.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use validate_docs::cli::Cli;
use validate_docs::output::{self, OutputMode};
use validate_docs::{config, utils, validate};

const LOG_ENV: &str = "VALIDATE_DOCS_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    // Clap exits with status 2 on usage errors.
    let cli = Cli::parse();
    init_tracing();

    let eff = match config::resolve_effective(&cli.overrides()) {
        Ok(eff) => eff,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    };
    if eff.output == OutputMode::Human {
        match eff.config_path.as_ref() {
            Some(p) => eprintln!("{} Using config {}", utils::info_prefix(), p.display()),
            None => eprintln!(
                "{} No validate-docs.toml found; using defaults.",
                utils::note_prefix()
            ),
        }
        let classifier = eff.classifier();
        let tags: Vec<String> = classifier
            .executable_languages()
            .iter()
            .map(|l| l.to_string())
            .collect();
        eprintln!(
            "{} Checking snippets tagged [{}]",
            utils::info_prefix(),
            tags.join(", ")
        );
    }

    let report = match validate::validate_docs(&eff) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    };
    output::print_report(&report, eff.output);
    std::process::exit(report.exit_code());
}
