//! Rule compilation and loading errors.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Position of a rule in its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRef {
    /// 1-based line number in a line-oriented rules file.
    Line(usize),
    /// 0-based index in a structured record list.
    Record(usize),
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Line(n) => write!(f, "line {}", n),
            SourceRef::Record(n) => write!(f, "record {}", n),
        }
    }
}

/// A single rule that could not be compiled.
///
/// The offending rule is dropped; compilation of the remaining rules continues.
#[derive(Debug, Error)]
#[error("{location}: {reason} (`{source_text}`)")]
pub struct RuleCompilationError {
    pub location: SourceRef,
    pub source_text: String,
    #[source]
    pub reason: CompileErrorReason,
}

impl RuleCompilationError {
    pub(crate) fn new(
        location: SourceRef,
        source_text: impl Into<String>,
        reason: CompileErrorReason,
    ) -> Self {
        Self {
            location,
            source_text: source_text.into(),
            reason,
        }
    }
}

/// Why a rule was rejected.
#[derive(Debug, Error)]
pub enum CompileErrorReason {
    /// The pattern is not a valid regular expression.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A rule line did not split into pattern, status and replacement.
    #[error("expected 3 tokens (pattern, status, replacement), found {0}")]
    TokenCount(usize),

    /// The status token is not a number.
    #[error("invalid status code `{0}`")]
    InvalidStatus(String),

    /// A structured record violates the rule schema.
    #[error("schema violation: {0}")]
    Schema(String),
}

/// Errors reading a rule source from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON rules: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML rules: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
