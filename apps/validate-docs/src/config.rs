//! Configuration discovery and effective settings resolution.
//!
//! validate-docs reads `validate-docs.toml|yaml|yml` from the documentation
//! root (or closest ancestor, stopping at a `.git` directory) unless a path is
//! given explicitly, and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `executable-tags`: `["raku"]`
//! - `case-sensitive`: false
//! - `timeout`: 10 seconds per snippet; `run-timeout`: none
//! - `extensions`: `["md", "markdown"]`
//! - `output`: `human`
//! - `aliases`: `perl6 = "raku"`, `p6 = "raku"`
//! - `checkers.raku.command`: `["raku", "-c", "{file}"]`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::checker::{CommandChecker, FILE_PLACEHOLDER};
use crate::classify::{default_aliases, Classifier, Language, RAKU};
use crate::error::ConfigError;
use crate::output::OutputMode;
use crate::runner::{Checkers, DEFAULT_TIMEOUT};
use crate::scan::Scanner;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const CONFIG_NAMES: [&str; 3] = ["validate-docs.toml", "validate-docs.yaml", "validate-docs.yml"];

/// Accepted range for `timeout` and `run-timeout`: one millisecond to one week.
const MIN_SECONDS: Duration = Duration::from_millis(1);
const MAX_SECONDS: f64 = 7.0 * 24.0 * 60.0 * 60.0;

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
/// Root configuration loaded from `validate-docs.toml|yaml`.
pub struct DocsConfig {
    pub executable_tags: Option<Vec<String>>,
    pub case_sensitive: Option<bool>,
    pub timeout: Option<f64>,
    pub run_timeout: Option<f64>,
    pub jobs: Option<usize>,
    pub extensions: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub output: Option<String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>, // alias -> tag
    #[serde(default)]
    pub checkers: BTreeMap<String, CheckerCfg>, // [checkers.<tag>]
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
/// External command for one language. `{file}` in an argument is replaced
/// by the snippet's temp file; without it the snippet goes to stdin.
pub struct CheckerCfg {
    pub command: Vec<String>,
    #[serde(default)]
    pub suffix: Option<String>,
}

/// Values taken from the command line. `None` falls through to the config.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
    pub tags: Vec<String>,
    pub timeout: Option<String>,
    pub run_timeout: Option<String>,
    pub jobs: Option<usize>,
    pub output: Option<String>,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the pipeline after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub executable_tags: Vec<String>,
    pub case_sensitive: bool,
    pub aliases: BTreeMap<String, String>,
    pub timeout: Duration,
    pub run_timeout: Option<Duration>,
    pub jobs: Option<usize>,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub output: OutputMode,
    pub checkers: BTreeMap<String, CheckerCfg>,
}

impl Effective {
    pub fn classifier(&self) -> Classifier {
        Classifier::new(
            self.executable_tags.iter(),
            self.aliases.clone(),
            self.case_sensitive,
        )
    }

    pub fn scanner(&self) -> Result<Scanner, ConfigError> {
        Scanner::new(&self.root, &self.extensions, &self.exclude)
    }

    /// Build a command checker for every executable language.
    ///
    /// Checker keys go through the same alias/case rules as snippet tags.
    pub fn build_checkers(&self) -> Result<Checkers, ConfigError> {
        let classifier = self.classifier();
        let mut by_lang: BTreeMap<Language, &CheckerCfg> = BTreeMap::new();
        for (tag, cfg) in &self.checkers {
            by_lang.insert(classifier.language(tag), cfg);
        }
        let mut out: Checkers = BTreeMap::new();
        for lang in classifier.executable_languages() {
            let cfg = by_lang
                .get(&lang)
                .ok_or_else(|| ConfigError::MissingChecker(lang.to_string()))?;
            let checker = CommandChecker::new(lang.as_str(), &cfg.command, cfg.suffix.as_deref())?;
            out.insert(lang, Arc::new(checker));
        }
        Ok(out)
    }
}

/// Built-in checker commands, keyed by tag.
pub fn default_checkers() -> BTreeMap<String, CheckerCfg> {
    let mut m = BTreeMap::new();
    m.insert(
        RAKU.to_string(),
        CheckerCfg {
            command: vec!["raku".into(), "-c".into(), FILE_PLACEHOLDER.into()],
            suffix: Some(".raku".into()),
        },
    );
    m
}

/// Walk upward from `start` looking for a config file.
///
/// Stops at the first directory holding a config file or a `.git` directory.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = start;
    loop {
        for name in CONFIG_NAMES {
            let p = cur.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
        if cur.join(".git").exists() {
            return None;
        }
        cur = cur.parent()?;
    }
}

/// Load `DocsConfig` from a TOML or YAML file (by extension).
pub fn load_config(path: &Path) -> Result<DocsConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    let parsed = if is_yaml {
        serde_yaml::from_str::<DocsConfig>(&s).map_err(|e| e.to_string())
    } else {
        toml::from_str::<DocsConfig>(&s).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse a number of seconds (`10`, `2.5`) within the accepted range.
pub fn parse_seconds(option: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidSeconds {
        option,
        value: value.to_string(),
    };
    let secs: f64 = value.trim().parse().map_err(|_| invalid())?;
    seconds(option, secs).map_err(|_| invalid())
}

fn seconds(option: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidSeconds {
        option,
        value: secs.to_string(),
    };
    if !secs.is_finite() || secs <= 0.0 || secs > MAX_SECONDS {
        return Err(invalid());
    }
    let d = Duration::try_from_secs_f64(secs).map_err(|_| invalid())?;
    if d < MIN_SECONDS {
        return Err(invalid());
    }
    Ok(d)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides) -> Result<Effective, ConfigError> {
    let root = cli.root.clone();
    if !root.exists() {
        return Err(ConfigError::MissingRoot(root));
    }
    if !root.is_dir() {
        return Err(ConfigError::RootNotDir(root));
    }

    let config_path = match cli.config.as_ref() {
        Some(p) => Some(p.clone()),
        None => find_config(&root),
    };
    let cfg = match config_path.as_ref() {
        Some(p) => load_config(p)?,
        None => DocsConfig::default(),
    };

    let executable_tags = if !cli.tags.is_empty() {
        cli.tags.clone()
    } else {
        cfg.executable_tags
            .unwrap_or_else(|| vec![RAKU.to_string()])
    };

    let timeout = match cli.timeout.as_deref() {
        Some(s) => parse_seconds("timeout", s)?,
        None => match cfg.timeout {
            Some(secs) => seconds("timeout", secs)?,
            None => DEFAULT_TIMEOUT,
        },
    };
    let run_timeout = match cli.run_timeout.as_deref() {
        Some(s) => Some(parse_seconds("run-timeout", s)?),
        None => cfg
            .run_timeout
            .map(|secs| seconds("run-timeout", secs))
            .transpose()?,
    };

    let jobs = cli.jobs.or(cfg.jobs);
    if jobs == Some(0) {
        return Err(ConfigError::ZeroJobs);
    }

    let output_str = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let output =
        OutputMode::parse(&output_str).ok_or_else(|| ConfigError::InvalidOutput(output_str))?;

    let mut aliases = default_aliases();
    aliases.extend(cfg.aliases);
    let mut checkers = default_checkers();
    checkers.extend(cfg.checkers);

    Ok(Effective {
        root,
        config_path,
        executable_tags,
        case_sensitive: cli.case_sensitive || cfg.case_sensitive.unwrap_or(false),
        aliases,
        timeout,
        run_timeout,
        jobs,
        extensions: cfg
            .extensions
            .unwrap_or_else(|| vec!["md".to_string(), "markdown".to_string()]),
        exclude: cfg.exclude.unwrap_or_default(),
        output,
        checkers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn overrides(root: &Path) -> CliOverrides {
        CliOverrides {
            root: root.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let eff = resolve_effective(&overrides(dir.path())).unwrap();
        assert!(eff.config_path.is_none());
        assert_eq!(eff.executable_tags, vec!["raku"]);
        assert_eq!(eff.timeout, Duration::from_secs(10));
        assert_eq!(eff.run_timeout, None);
        assert_eq!(eff.output, OutputMode::Human);
        assert!(!eff.case_sensitive);
        assert_eq!(eff.aliases.get("perl6").map(String::as_str), Some("raku"));
        let checkers = eff.build_checkers().unwrap();
        assert_eq!(checkers.len(), 1);
        assert!(checkers.contains_key(&Language::Raku));
    }

    #[test]
    fn test_detect_and_load_toml_from_ancestor() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("validate-docs.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
executable-tags = ["raku", "bash"]
timeout = 2.5
run-timeout = 60
jobs = 3
output = "json"
exclude = ["drafts/**"]

[aliases]
sh = "bash"

[checkers.bash]
command = ["bash", "-n", "{file}"]
            "#
        )
        .unwrap();
        let docs = root.join("docs");
        fs::create_dir(&docs).unwrap();

        let eff = resolve_effective(&overrides(&docs)).unwrap();
        assert_eq!(eff.config_path.as_deref(), Some(root.join("validate-docs.toml").as_path()));
        assert_eq!(eff.executable_tags, vec!["raku", "bash"]);
        assert_eq!(eff.timeout, Duration::from_millis(2500));
        assert_eq!(eff.run_timeout, Some(Duration::from_secs(60)));
        assert_eq!(eff.jobs, Some(3));
        assert_eq!(eff.output, OutputMode::Json);
        assert_eq!(eff.exclude, vec!["drafts/**"]);
        assert_eq!(eff.aliases.get("sh").map(String::as_str), Some("bash"));
        assert_eq!(eff.build_checkers().unwrap().len(), 2);
    }

    #[test]
    fn test_load_yaml_and_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("validate-docs.yaml"),
            "executable-tags: [raku]\ntimeout: 30\noutput: json\ncase-sensitive: false\n",
        )
        .unwrap();
        let cli = CliOverrides {
            root: root.to_path_buf(),
            tags: vec!["Perl6".into()],
            timeout: Some("4".into()),
            output: Some("human".into()),
            case_sensitive: true,
            ..Default::default()
        };
        let eff = resolve_effective(&cli).unwrap();
        assert_eq!(eff.executable_tags, vec!["Perl6"]);
        assert_eq!(eff.timeout, Duration::from_secs(4));
        assert_eq!(eff.output, OutputMode::Human);
        assert!(eff.case_sensitive);
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = tempdir().unwrap();
        let cfg = dir.path().join("custom.toml");
        fs::write(&cfg, "timeout = 1\n").unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        let cli = CliOverrides {
            root: docs,
            config: Some(cfg.clone()),
            ..Default::default()
        };
        let eff = resolve_effective(&cli).unwrap();
        assert_eq!(eff.config_path, Some(cfg));
        assert_eq!(eff.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_configuration_errors() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();

        let missing = overrides(&root.join("nope"));
        assert!(matches!(
            resolve_effective(&missing),
            Err(ConfigError::MissingRoot(_))
        ));

        fs::write(root.join("file.md"), "x").unwrap();
        assert!(matches!(
            resolve_effective(&overrides(&root.join("file.md"))),
            Err(ConfigError::RootNotDir(_))
        ));

        for bad in ["abc", "0", "-1", "NaN", "inf", "1e19", "1e-12", "604801"] {
            let cli = CliOverrides {
                timeout: Some(bad.into()),
                ..overrides(root)
            };
            assert!(matches!(
                resolve_effective(&cli),
                Err(ConfigError::InvalidSeconds { option: "timeout", .. })
            ));
        }

        let cli = CliOverrides {
            output: Some("xml".into()),
            ..overrides(root)
        };
        assert!(matches!(
            resolve_effective(&cli),
            Err(ConfigError::InvalidOutput(_))
        ));

        let cli = CliOverrides {
            jobs: Some(0),
            ..overrides(root)
        };
        assert!(matches!(resolve_effective(&cli), Err(ConfigError::ZeroJobs)));
    }

    #[test]
    fn test_invalid_config_file_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("validate-docs.toml"), "timeout = \"soon\"\n").unwrap();
        assert!(matches!(
            resolve_effective(&overrides(dir.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_executable_tag_needs_checker() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let cli = CliOverrides {
            tags: vec!["python".into()],
            ..overrides(dir.path())
        };
        let eff = resolve_effective(&cli).unwrap();
        assert!(matches!(
            eff.build_checkers(),
            Err(ConfigError::MissingChecker(t)) if t == "python"
        ));
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("timeout", "10").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_seconds("timeout", " 0.5 ").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_seconds("timeout", "0.001").unwrap(), Duration::from_millis(1));
        assert_eq!(
            parse_seconds("run-timeout", "604800").unwrap(),
            Duration::from_secs(604_800)
        );
        assert!(parse_seconds("timeout", "ten").is_err());
    }

    #[test]
    fn test_out_of_range_seconds_are_rejected() {
        for bad in ["1e19", "1e-12", "1e308", "-inf"] {
            let err = parse_seconds("run-timeout", bad).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidSeconds { option: "run-timeout", ref value } if value == bad),
                "{bad}: {err}"
            );
        }

        for (key, value) in [("timeout", "1e19"), ("timeout", "1e-12"), ("run-timeout", "1e19")] {
            let dir = tempdir().unwrap();
            fs::write(
                dir.path().join("validate-docs.toml"),
                format!("{key} = {value}\n"),
            )
            .unwrap();
            let err = resolve_effective(&overrides(dir.path())).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidSeconds { option, .. } if option == key),
                "{key} = {value}: {err}"
            );
        }

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("validate-docs.yaml"), "run-timeout: 1.0e19\n").unwrap();
        assert!(matches!(
            resolve_effective(&overrides(dir.path())),
            Err(ConfigError::InvalidSeconds { option: "run-timeout", .. })
        ));
    }
}
