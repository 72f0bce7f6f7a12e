//! Text diffing between two pieces of content
//!
//! [`compute_diff`] produces a minimal ordered list of [`DiffOperation`]s:
//!
//! - `equal` + `insert` text concatenates to the target
//! - `equal` + `delete` text concatenates to the source
//!
//! Content is compared as Unicode code points by default; word and line
//! granularity only change how tokens are cut, never how lengths are counted.

mod html;
mod myers;
mod tokenize;

pub use html::render_html;

use myers::Edit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token size used when comparing content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One token per code point
    #[default]
    Chars,
    /// Word runs, whitespace runs and single punctuation marks
    Words,
    /// One token per line, terminator included
    Lines,
}

impl Granularity {
    /// Wire name (`chars`, `words`, `lines`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chars => "chars",
            Self::Words => "words",
            Self::Lines => "lines",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chars" | "char" | "characters" => Ok(Self::Chars),
            "words" | "word" => Ok(Self::Words),
            "lines" | "line" => Ok(Self::Lines),
            other => Err(DiffError::UnknownGranularity(other.to_string())),
        }
    }
}

/// Options for [`compute_diff`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffOptions {
    /// Token granularity
    #[serde(default)]
    pub granularity: Granularity,
    /// Collapse whitespace runs before comparing
    #[serde(default)]
    pub ignore_whitespace: bool,
}

impl DiffOptions {
    /// Character-level diff without normalization
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With granularity
    #[inline]
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// With whitespace normalization
    #[inline]
    #[must_use]
    pub fn ignoring_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }
}

/// Kind of a diff operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    /// Present in both
    Equal,
    /// Only in the source
    Delete,
    /// Only in the target
    Insert,
}

/// A run of text sharing one [`DiffOp`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOperation {
    /// Operation kind
    pub operation: DiffOp,
    /// Affected text
    pub text: String,
}

impl DiffOperation {
    fn new(operation: DiffOp, text: impl Into<String>) -> Self {
        Self {
            operation,
            text: text.into(),
        }
    }
}

/// Edit script and statistics between two texts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDiff {
    /// Granularity the script was computed at
    pub granularity: Granularity,
    /// Whether whitespace was normalized before comparing
    pub ignore_whitespace: bool,
    /// Ordered operations
    pub operations: Vec<DiffOperation>,
    /// Code points inserted
    pub insertions: u64,
    /// Code points deleted
    pub deletions: u64,
    /// `1 - (insertions + deletions) / max(1, len(source) + len(target))`
    pub similarity: f64,
}

impl TextDiff {
    /// True when source and target compared equal
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.insertions == 0 && self.deletions == 0
    }

    /// Concatenated `equal` and `delete` text
    #[must_use]
    pub fn source_text(&self) -> String {
        self.collect(DiffOp::Delete)
    }

    /// Concatenated `equal` and `insert` text
    #[must_use]
    pub fn target_text(&self) -> String {
        self.collect(DiffOp::Insert)
    }

    fn collect(&self, side: DiffOp) -> String {
        self.operations
            .iter()
            .filter(|op| op.operation == DiffOp::Equal || op.operation == side)
            .map(|op| op.text.as_str())
            .collect()
    }
}

/// Errors raised by the diff engine
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Granularity name not recognized
    #[error("unknown diff granularity: {0} (expected chars, words or lines)")]
    UnknownGranularity(String),
}

/// Diff `source` against `target`
#[must_use]
pub fn compute_diff(source: &str, target: &str, options: DiffOptions) -> TextDiff {
    let (source, target) = if options.ignore_whitespace {
        (
            tokenize::normalize_whitespace(source),
            tokenize::normalize_whitespace(target),
        )
    } else {
        (source.to_owned(), target.to_owned())
    };

    let a = tokenize::tokenize(&source, options.granularity);
    let b = tokenize::tokenize(&target, options.granularity);
    let operations = coalesce(&myers::edit_script(&a, &b), &a, &b);

    let mut insertions = 0u64;
    let mut deletions = 0u64;
    for op in &operations {
        let len = op.text.chars().count() as u64;
        match op.operation {
            DiffOp::Insert => insertions += len,
            DiffOp::Delete => deletions += len,
            DiffOp::Equal => {}
        }
    }

    let total = (source.chars().count() + target.chars().count()).max(1);
    #[allow(clippy::cast_precision_loss)]
    let similarity = (1.0 - (insertions + deletions) as f64 / total as f64).clamp(0.0, 1.0);

    TextDiff {
        granularity: options.granularity,
        ignore_whitespace: options.ignore_whitespace,
        operations,
        insertions,
        deletions,
        similarity,
    }
}

/// Merge consecutive edits of the same kind into text runs
fn coalesce(edits: &[Edit], a: &[&str], b: &[&str]) -> Vec<DiffOperation> {
    let mut operations: Vec<DiffOperation> = Vec::new();
    for edit in edits {
        let (kind, text) = match *edit {
            Edit::Equal(i, _) => (DiffOp::Equal, a[i]),
            Edit::Delete(i) => (DiffOp::Delete, a[i]),
            Edit::Insert(j) => (DiffOp::Insert, b[j]),
        };
        match operations.last_mut() {
            Some(last) if last.operation == kind => last.text.push_str(text),
            _ => operations.push(DiffOperation::new(kind, text)),
        }
    }
    operations
}
