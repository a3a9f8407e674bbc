//! Documents read from disk and the snippets extracted from them.

use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
/// A documentation file and its raw text.
pub struct Document {
    /// Path on disk.
    pub path: PathBuf,
    /// Root-relative path with `/` separators.
    pub display: Arc<str>,
    pub text: String,
}

impl Document {
    pub fn new(path: PathBuf, display: impl Into<Arc<str>>, text: String) -> Self {
        Self {
            path,
            display: display.into(),
            text,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Flags read from the info string after the language tag.
pub struct Attributes {
    /// `ignore`: never hand the snippet to a checker.
    pub ignore: bool,
    /// `compile_fail`: the checker is expected to reject the snippet.
    pub compile_fail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One fenced block with provenance.
///
/// `source` is shared with the originating document's display path; the
/// snippet never holds the document text.
pub struct Snippet {
    pub source: Arc<str>,
    /// 1-indexed line of the opening fence.
    pub line: usize,
    /// Declared language tag; empty when unspecified.
    pub tag: String,
    pub attrs: Attributes,
    pub code: String,
    /// The fence was still open at end of document.
    pub truncated: bool,
}
