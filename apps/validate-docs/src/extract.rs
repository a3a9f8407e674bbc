//! Fenced code block extraction.
//!
//! A fence opens with three or more backticks or tildes, optionally indented,
//! followed by an info string. The first info token is the language tag; the
//! remaining tokens are attributes (`ignore`, `compile_fail`). A fence closes
//! on a line holding only the same fence character, at least as many times as
//! the opener. Content lines lose up to the opener's indentation.

use crate::models::{Attributes, Document, Snippet};
use regex::Regex;
use std::sync::{Arc, LazyLock};

static OPEN_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)(?P<fence>`{3,}|~{3,})(?P<info>.*)$")
        .expect("fence regex is valid")
});

struct OpenFence {
    line: usize,
    indent: usize,
    ch: char,
    len: usize,
    tag: String,
    attrs: Attributes,
    body: Vec<String>,
}

impl OpenFence {
    fn into_snippet(self, source: &Arc<str>, truncated: bool) -> Snippet {
        let mut code = self.body.join("\n");
        if !self.body.is_empty() {
            code.push('\n');
        }
        Snippet {
            source: Arc::clone(source),
            line: self.line,
            tag: self.tag,
            attrs: self.attrs,
            code,
            truncated,
        }
    }

    fn closes_on(&self, line: &str) -> bool {
        let t = line.trim();
        t.chars().count() >= self.len && t.chars().all(|c| c == self.ch)
    }
}

/// Extract every fenced block of `doc` in document order.
pub fn extract(doc: &Document) -> Vec<Snippet> {
    extract_from(&doc.display, &doc.text)
}

/// Extract fenced blocks from raw text attributed to `source`.
pub fn extract_from(source: &Arc<str>, text: &str) -> Vec<Snippet> {
    let mut out = Vec::new();
    let mut open: Option<OpenFence> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if let Some(fence) = open.as_mut() {
            if fence.closes_on(line) {
                if let Some(done) = open.take() {
                    out.push(done.into_snippet(source, false));
                }
            } else {
                fence.body.push(strip_indent(line, fence.indent).to_string());
            }
            continue;
        }
        if let Some(fence) = parse_open(line, line_no) {
            open = Some(fence);
        }
    }

    if let Some(fence) = open {
        tracing::debug!(source = %source, line = fence.line, "unterminated fence");
        out.push(fence.into_snippet(source, true));
    }
    out
}

fn parse_open(line: &str, line_no: usize) -> Option<OpenFence> {
    let caps = OPEN_FENCE.captures(line)?;
    let fence = caps.name("fence")?.as_str();
    let info = caps.name("info").map(|m| m.as_str()).unwrap_or("");
    let ch = fence.chars().next()?;
    // Backtick runs followed by more backticks are inline code, not a fence.
    if ch == '`' && info.contains('`') {
        return None;
    }
    let (tag, attrs) = parse_info(info);
    Some(OpenFence {
        line: line_no,
        indent: caps.name("indent").map(|m| m.as_str().len()).unwrap_or(0),
        ch,
        len: fence.len(),
        tag,
        attrs,
        body: Vec::new(),
    })
}

/// Split an info string into the language tag and known attributes.
///
/// Accepts `raku`, `raku ignore`, `raku,compile_fail` and `{.raku .ignore}`.
pub fn parse_info(info: &str) -> (String, Attributes) {
    let mut tokens = info
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim_matches(|c| c == '{' || c == '}' || c == '.'))
        .filter(|t| !t.is_empty());
    let tag = tokens.next().unwrap_or("").to_string();
    let mut attrs = Attributes::default();
    for tok in tokens {
        match tok.to_ascii_lowercase().as_str() {
            "ignore" | "skip" => attrs.ignore = true,
            "compile_fail" | "compile-fail" => attrs.compile_fail = true,
            _ => {}
        }
    }
    (tag, attrs)
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take(indent)
        .take_while(|(_, c)| *c == ' ' || *c == '\t')
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &line[cut..]
}
