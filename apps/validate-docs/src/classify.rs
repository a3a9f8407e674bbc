//! Snippet classification by declared language tag.
//!
//! Tags are normalized (case-folded unless case-sensitive matching is on),
//! resolved through an alias table, then matched against the executable
//! allow-list. Classification is a pure function of the tag string.

use crate::models::Snippet;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Tag of the documented language.
pub const RAKU: &str = "raku";

/// Aliases applied when the configuration does not override them.
pub fn default_aliases() -> BTreeMap<String, String> {
    [("perl6", RAKU), ("p6", RAKU)]
        .into_iter()
        .map(|(a, t)| (a.to_string(), t.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A resolved language tag.
pub enum Language {
    Raku,
    Other(String),
    Unspecified,
}

impl Language {
    pub fn from_canonical(tag: &str) -> Self {
        match tag {
            "" => Language::Unspecified,
            RAKU => Language::Raku,
            other => Language::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Language::Raku => RAKU,
            Language::Other(s) => s,
            Language::Unspecified => "",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Unspecified => f.write_str("(unspecified)"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Executable,
    NonExecutable,
}

/// Allow-list plus tag normalization rules.
#[derive(Debug, Clone)]
pub struct Classifier {
    executable: BTreeSet<String>,
    aliases: BTreeMap<String, String>,
    case_sensitive: bool,
}

impl Classifier {
    pub fn new<I, S>(executable: I, aliases: BTreeMap<String, String>, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let norm = |s: &str| fold(s.trim(), case_sensitive);
        let aliases: BTreeMap<String, String> = aliases
            .iter()
            .map(|(a, t)| (norm(a), norm(t)))
            .collect();
        let executable = executable
            .into_iter()
            .map(|t| {
                let t = norm(t.as_ref());
                aliases.get(&t).cloned().unwrap_or(t)
            })
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            executable,
            aliases,
            case_sensitive,
        }
    }

    /// Resolve a raw tag to its language.
    pub fn language(&self, tag: &str) -> Language {
        let t = fold(tag.trim(), self.case_sensitive);
        let canonical = self.aliases.get(&t).cloned().unwrap_or(t);
        Language::from_canonical(&canonical)
    }

    pub fn classify_tag(&self, tag: &str) -> Class {
        match self.language(tag) {
            Language::Unspecified => Class::NonExecutable,
            lang if self.executable.contains(lang.as_str()) => Class::Executable,
            _ => Class::NonExecutable,
        }
    }

    pub fn classify(&self, snippet: &Snippet) -> Class {
        self.classify_tag(&snippet.tag)
    }

    /// Canonical executable tags, sorted.
    pub fn executable_languages(&self) -> Vec<Language> {
        self.executable
            .iter()
            .map(|t| Language::from_canonical(t))
            .collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new([RAKU], default_aliases(), false)
    }
}

fn fold(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_lowercase()
    }
}
