//! Pattern enhancement and the compiled-pattern cache.
//!
//! # Responsibilities
//! - Anchor line-oriented patterns so they match the whole path
//! - Make a trailing slash optional on every enhanced pattern
//! - Compile each distinct pattern string at most once per process
//!
//! # Design Decisions
//! - All patterns compile case-insensitively
//! - The cache is a `DashMap` keyed by the exact pattern text; concurrent
//!   compiles of the same text race harmlessly and the first insert wins
//! - `Regex` clones share the compiled program, so handing out clones is cheap

use std::sync::Arc;

use dashmap::DashMap;
use regex::{Regex, RegexBuilder};

/// Anchor a raw line pattern and make its trailing slash optional.
///
/// - `^` is prepended unless already present.
/// - `/?$` is appended, except when the pattern already ends in `$`
///   (nothing appended) or in `/?` (only `$` appended).
pub fn enhance_pattern(pattern: &str) -> String {
    let mut enhanced = String::with_capacity(pattern.len() + 4);
    if !pattern.starts_with('^') {
        enhanced.push('^');
    }
    enhanced.push_str(pattern);

    if !pattern.ends_with('$') {
        if pattern.ends_with("/?") {
            enhanced.push('$');
        } else {
            enhanced.push_str("/?$");
        }
    }
    enhanced
}

/// Build a case-insensitive regex without consulting any cache.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Process-wide memo of compiled patterns.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct PatternCache {
    inner: Arc<DashMap<String, Regex>>,
}

impl PatternCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled regex for `pattern`, compiling it on first use.
    ///
    /// Invalid patterns are not cached; every attempt reports the error.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(existing) = self.inner.get(pattern) {
            return Ok(existing.value().clone());
        }

        let compiled = compile_pattern(pattern)?;
        let entry = self.inner.entry(pattern.to_string()).or_insert(compiled);
        Ok(entry.value().clone())
    }

    /// Number of distinct patterns compiled so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_leading_anchor() {
        assert!(enhance_pattern("/old").starts_with("^/old"));
    }

    #[test]
    fn test_keeps_existing_anchor() {
        assert_eq!(enhance_pattern("^/old"), "^/old/?$");
    }

    #[test]
    fn test_adds_optional_trailing_slash() {
        assert_eq!(enhance_pattern("/old"), "^/old/?$");
    }

    #[test]
    fn test_optional_slash_already_present() {
        assert_eq!(enhance_pattern("/old/?"), "^/old/?$");
        assert_eq!(enhance_pattern("/old/?$"), "^/old/?$");
    }

    #[test]
    fn test_explicit_end_anchor_untouched() {
        assert_eq!(enhance_pattern("/old$"), "^/old$");
    }

    #[test]
    fn test_compiled_patterns_ignore_case() {
        let re = compile_pattern(&enhance_pattern("/old")).unwrap();
        assert!(re.is_match("/OLD"));
        assert!(re.is_match("/Old/"));
        assert!(!re.is_match("/older"));
    }

    #[test]
    fn test_cache_compiles_once() {
        let cache = PatternCache::new();
        let shared = cache.clone();

        cache.get_or_compile("^/a/?$").unwrap();
        shared.get_or_compile("^/a/?$").unwrap();
        cache.get_or_compile("^/b/?$").unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(shared.len(), 2);
    }

    #[test]
    fn test_cache_rejects_invalid_pattern() {
        let cache = PatternCache::new();
        assert!(cache.get_or_compile("^/(unclosed").is_err());
        assert!(cache.is_empty());
    }
}
