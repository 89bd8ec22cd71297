//! Rule matching logic.
//!
//! # Responsibilities
//! - Match exact paths (optionally together with an exact host)
//! - Match regex path patterns, optionally restricted to a host
//! - Report where in the path the match happened, with captures
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Exact paths compare lower-cased with a single trailing slash removed
//! - Pattern case-insensitivity comes from the compiled regex itself, so
//!   captures keep the request's original casing

use std::ops::Range;

use regex::{Captures, Regex};

use crate::rules::Template;

/// Lower-case a path and drop a single trailing slash (but never reduce `/` to empty).
pub fn normalize_path(path: &str) -> String {
    let lowered = path.to_lowercase();
    match lowered.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => lowered,
    }
}

/// Predicate deciding whether a rule applies to a request.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Path equality, stored normalized.
    ExactPath { path: String },

    /// Host and path equality, both stored lower-case.
    ExactHostAndPath { host: String, path: String },

    /// Regular-expression match against the path.
    PatternPath {
        /// Pattern text as written in the rule, before enhancement.
        pattern: String,
        regex: Regex,
        host: Option<String>,
    },
}

impl Matcher {
    pub fn exact_path(path: &str) -> Self {
        Matcher::ExactPath {
            path: normalize_path(path),
        }
    }

    pub fn exact_host_and_path(host: &str, path: &str) -> Self {
        Matcher::ExactHostAndPath {
            host: host.to_lowercase(),
            path: normalize_path(path),
        }
    }

    pub fn pattern(pattern: impl Into<String>, regex: Regex, host: Option<&str>) -> Self {
        Matcher::PatternPath {
            pattern: pattern.into(),
            regex,
            host: host.map(str::to_lowercase),
        }
    }

    /// The path or pattern text the rule was declared with.
    pub fn describe(&self) -> &str {
        match self {
            Matcher::ExactPath { path } | Matcher::ExactHostAndPath { path, .. } => path,
            Matcher::PatternPath { pattern, .. } => pattern,
        }
    }

    /// The compiled regex, for pattern matchers.
    pub fn regex(&self) -> Option<&Regex> {
        match self {
            Matcher::PatternPath { regex, .. } => Some(regex),
            _ => None,
        }
    }

    /// Test `path` (and `host` where required). Returns the match on success.
    pub fn find<'p>(&self, path: &'p str, host: &str) -> Option<PathMatch<'p>> {
        match self {
            Matcher::ExactPath { path: expected } => {
                (normalize_path(path) == *expected).then(|| PathMatch::whole(path))
            }
            Matcher::ExactHostAndPath {
                host: expected_host,
                path: expected,
            } => (host_matches(host, expected_host) && normalize_path(path) == *expected)
                .then(|| PathMatch::whole(path)),
            Matcher::PatternPath { regex, host: required, .. } => {
                if let Some(expected_host) = required {
                    if !host_matches(host, expected_host) {
                        return None;
                    }
                }
                let captures = regex.captures(path)?;
                let range = captures.get(0).map_or(0..path.len(), |m| m.range());
                Some(PathMatch {
                    haystack: path,
                    range,
                    captures: Some(captures),
                })
            }
        }
    }
}

fn host_matches(actual: &str, expected_lower: &str) -> bool {
    actual.eq_ignore_ascii_case(expected_lower)
}

/// A successful match of a rule against a request path.
#[derive(Debug)]
pub struct PathMatch<'p> {
    haystack: &'p str,
    range: Range<usize>,
    captures: Option<Captures<'p>>,
}

impl<'p> PathMatch<'p> {
    fn whole(path: &'p str) -> Self {
        Self {
            haystack: path,
            range: 0..path.len(),
            captures: None,
        }
    }

    /// The matched portion of the path.
    pub fn matched(&self) -> &'p str {
        &self.haystack[self.range.clone()]
    }

    /// Expand `template` with this match's captures.
    pub fn expand(&self, template: &Template) -> String {
        template.expand(self.captures.as_ref(), self.matched())
    }

    /// Replace the matched portion of the path with the expanded template,
    /// keeping any unmatched prefix and suffix.
    pub fn replace(&self, template: &Template) -> String {
        let mut out = String::with_capacity(self.haystack.len() + template.source().len());
        out.push_str(&self.haystack[..self.range.start]);
        template.expand_into(self.captures.as_ref(), self.matched(), &mut out);
        out.push_str(&self.haystack[self.range.end..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::pattern::{compile_pattern, enhance_pattern};

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/Old/"), "/old");
        assert_eq!(normalize_path("/old//"), "/old/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_exact_path_matcher() {
        let matcher = Matcher::exact_path("/About/");
        assert!(matcher.find("/about", "example.com").is_some());
        assert!(matcher.find("/ABOUT/", "example.com").is_some());
        assert!(matcher.find("/about/us", "example.com").is_none());
    }

    #[test]
    fn test_host_matcher() {
        let matcher = Matcher::exact_host_and_path("Example.com", "/a");

        assert!(matcher.find("/a", "example.com").is_some());
        assert!(matcher.find("/a", "EXAMPLE.COM").is_some()); // Case insensitive
        assert!(matcher.find("/a", "other.com").is_none());
        assert!(matcher.find("/b", "example.com").is_none());
    }

    #[test]
    fn test_pattern_matcher_keeps_original_case() {
        let regex = compile_pattern(&enhance_pattern("/old/(.*)")).unwrap();
        let matcher = Matcher::pattern("/old/(.*)", regex, None);
        let found = matcher.find("/OLD/Sub/Page", "example.com").unwrap();

        assert_eq!(found.matched(), "/OLD/Sub/Page");
        assert_eq!(found.replace(&Template::parse("/new/$1", matcher.regex())), "/new/Sub/Page");
    }

    #[test]
    fn test_pattern_matcher_with_host() {
        let regex = compile_pattern("^/api/(.*)$").unwrap();
        let matcher = Matcher::pattern("^/api/(.*)$", regex, Some("API.example.com"));
        assert!(matcher.find("/api/v1", "api.example.com").is_some());
        assert!(matcher.find("/api/v1", "www.example.com").is_none());
    }

    #[test]
    fn test_unanchored_pattern_replaces_only_match() {
        let regex = compile_pattern("/old/").unwrap();
        let matcher = Matcher::pattern("/old/", regex, None);
        let found = matcher.find("/docs/old/page", "h").unwrap();
        assert_eq!(found.replace(&Template::literal("/new/")), "/docs/new/page");
    }
}
