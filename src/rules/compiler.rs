//! Rule compilation.
//!
//! # Responsibilities
//! - Tokenize line-oriented rules (`pattern status replacement`)
//! - Validate structured records against the rule schema
//! - Compile patterns (through the shared [`PatternCache`]) and templates
//! - Optionally duplicate rules under localized path prefixes
//!
//! # Design Decisions
//! - Errors are collected per rule; the offending rule is dropped
//! - Line patterns are enhanced (anchored, optional trailing slash);
//!   record patterns are used exactly as written
//! - Localized duplicates follow their source rule, preserving order

use serde_json::Value;

use crate::routing::matcher::Matcher;
use crate::rules::error::{CompileErrorReason, RuleCompilationError, SourceRef};
use crate::rules::pattern::{enhance_pattern, PatternCache};
use crate::rules::source::{RuleRecord, RuleSource};
use crate::rules::template::Template;
use crate::rules::{Action, Rule, RuleSet};

/// Status used for structured redirects that do not name one.
pub const DEFAULT_REDIRECT_STATUS: u16 = 301;

/// Status recorded for structured rewrites.
pub const REWRITE_STATUS: u16 = 200;

/// Result of compiling a rule source.
#[derive(Debug, Default)]
pub struct CompileOutcome {
    pub rules: RuleSet,
    pub errors: Vec<RuleCompilationError>,
}

/// Compiles raw rule sources into a [`RuleSet`].
#[derive(Debug, Clone, Default)]
pub struct RuleCompiler {
    cache: PatternCache,
    localized_prefixes: Vec<String>,
}

/// A tokenized rule line.
struct LineRule<'a> {
    pattern: &'a str,
    status: u16,
    replacement: &'a str,
}

impl RuleCompiler {
    /// Create a compiler with its own pattern cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit a copy of every rule under each `/<prefix>` path.
    pub fn with_localized_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.localized_prefixes = prefixes
            .into_iter()
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    /// Compile any supported rule source.
    pub fn compile(&self, source: &RuleSource) -> CompileOutcome {
        match source {
            RuleSource::Text(text) => self.compile_text(text),
            RuleSource::Records(records) => self.compile_records(records),
        }
    }

    /// Compile line-oriented rules.
    pub fn compile_text(&self, text: &str) -> CompileOutcome {
        let mut rules = Vec::new();
        let mut errors = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let location = SourceRef::Line(index + 1);
            let line = match tokenize(raw) {
                Ok(Some(line)) => line,
                Ok(None) => continue,
                Err(reason) => {
                    errors.push(RuleCompilationError::new(location, raw.trim(), reason));
                    continue;
                }
            };

            // A broken source rule is reported once; its localized copies are skipped.
            let source_rule =
                self.line_rule(location, line.pattern, line.status, line.replacement);
            let rule = match source_rule {
                Ok(rule) => rule,
                Err(reason) => {
                    errors.push(RuleCompilationError::new(location, raw.trim(), reason));
                    continue;
                }
            };
            rules.push(rule);

            for lang in &self.localized_prefixes {
                let Some(pattern) = localize_pattern(line.pattern, lang) else {
                    continue;
                };
                let replacement = localize_target(line.replacement, lang);
                match self.line_rule(location, &pattern, line.status, &replacement) {
                    Ok(rule) => rules.push(rule),
                    Err(reason) => {
                        errors.push(RuleCompilationError::new(location, raw.trim(), reason))
                    }
                }
            }
        }

        CompileOutcome {
            rules: RuleSet::new(rules),
            errors,
        }
    }

    /// Compile structured records.
    pub fn compile_records(&self, records: &[Value]) -> CompileOutcome {
        let mut rules = Vec::new();
        let mut errors = Vec::new();

        for (index, value) in records.iter().enumerate() {
            let location = SourceRef::Record(index);
            let record = match serde_json::from_value::<RuleRecord>(value.clone()) {
                Ok(record) => record,
                Err(e) => {
                    errors.push(RuleCompilationError::new(
                        location,
                        value.to_string(),
                        CompileErrorReason::Schema(e.to_string()),
                    ));
                    continue;
                }
            };

            let rule = match self.record_rule(location, &record) {
                Ok(rule) => rule,
                Err(reason) => {
                    let error = RuleCompilationError::new(location, value.to_string(), reason);
                    errors.push(error);
                    continue;
                }
            };
            rules.push(rule);

            let localized = self
                .localized_prefixes
                .iter()
                .filter_map(|lang| localize_record(&record, lang));
            for variant in localized {
                match self.record_rule(location, &variant) {
                    Ok(rule) => rules.push(rule),
                    Err(reason) => {
                        let error = RuleCompilationError::new(location, value.to_string(), reason);
                        errors.push(error);
                    }
                }
            }
        }

        CompileOutcome {
            rules: RuleSet::new(rules),
            errors,
        }
    }

    fn line_rule(
        &self,
        location: SourceRef,
        pattern: &str,
        status: u16,
        replacement: &str,
    ) -> Result<Rule, CompileErrorReason> {
        let regex = self.cache.get_or_compile(&enhance_pattern(pattern))?;
        let template = Template::parse(replacement, Some(&regex));

        let action = if is_redirect_status(status) {
            Action::Redirect {
                status,
                location: template,
            }
        } else {
            Action::Rewrite {
                status,
                path: template,
                origin: None,
            }
        };

        Ok(Rule {
            source: location,
            matcher: Matcher::pattern(pattern, regex, None),
            action,
        })
    }

    fn record_rule(
        &self,
        location: SourceRef,
        record: &RuleRecord,
    ) -> Result<Rule, CompileErrorReason> {
        let test = &record.test;
        let host = test.host_exact.as_deref().map(str::trim).filter(|h| !h.is_empty());

        let matcher = match (&test.path_exact, &test.path_pattern) {
            (Some(path), None) => {
                if !path.starts_with('/') {
                    return Err(schema(format!("path_exact `{}` must start with '/'", path)));
                }
                match host {
                    Some(host) => Matcher::exact_host_and_path(host, path),
                    None => Matcher::exact_path(path),
                }
            }
            (None, Some(pattern)) => {
                let regex = self.cache.get_or_compile(pattern)?;
                Matcher::pattern(pattern.as_str(), regex, host)
            }
            (Some(_), Some(_)) => return Err(schema("test has both path_exact and path_pattern")),
            (None, None) => return Err(schema("test needs path_exact or path_pattern")),
        };

        let regex = matcher.regex();
        let action = match (&record.redirect, &record.rewrite) {
            (Some(redirect), None) => {
                let status = redirect.status_code.unwrap_or(DEFAULT_REDIRECT_STATUS);
                if !is_redirect_status(status) {
                    return Err(schema(format!("redirect status {} is not 3xx", status)));
                }
                Action::Redirect {
                    status,
                    location: Template::parse(&redirect.location, regex),
                }
            }
            (None, Some(rewrite)) => {
                if let Some(origin) = &rewrite.origin {
                    if !has_http_scheme(origin) {
                        let message = format!("rewrite origin `{}` must be an http(s) URL", origin);
                        return Err(schema(message));
                    }
                }
                Action::Rewrite {
                    status: REWRITE_STATUS,
                    path: Template::parse(&rewrite.path, regex),
                    origin: rewrite.origin.as_deref().map(|o| Template::parse(o, regex)),
                }
            }
            (Some(_), Some(_)) => return Err(schema("rule has both redirect and rewrite")),
            (None, None) => return Err(schema("rule needs redirect or rewrite")),
        };

        Ok(Rule {
            source: location,
            matcher,
            action,
        })
    }
}

fn schema(message: impl Into<String>) -> CompileErrorReason {
    CompileErrorReason::Schema(message.into())
}

fn is_redirect_status(status: u16) -> bool {
    (300..400).contains(&status)
}

/// Case-insensitive `http://` / `https://` prefix test.
pub fn has_http_scheme(location: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        location.len() >= scheme.len()
            && location.as_bytes()[..scheme.len()].eq_ignore_ascii_case(scheme.as_bytes())
    })
}

/// Split a rule line into its three tokens.
///
/// Returns `Ok(None)` for blank and comment lines. A token starting with `#`
/// begins a trailing comment.
fn tokenize(raw: &str) -> Result<Option<LineRule<'_>>, CompileErrorReason> {
    let tokens: Vec<&str> = raw
        .split_whitespace()
        .take_while(|t| !t.starts_with('#'))
        .collect();

    match tokens.as_slice() {
        [] => Ok(None),
        [pattern, status, replacement] => {
            let status = status
                .parse::<u16>()
                .map_err(|_| CompileErrorReason::InvalidStatus(status.to_string()))?;
            Ok(Some(LineRule {
                pattern: *pattern,
                status,
                replacement: *replacement,
            }))
        }
        other => Err(CompileErrorReason::TokenCount(other.len())),
    }
}

fn prefix_path(path: &str, lang: &str) -> String {
    if path == "/" {
        format!("/{}", lang)
    } else {
        format!("/{}{}", lang, path)
    }
}

/// `/old` → `/zh/old`, `^/old` → `^/zh/old`. Patterns not rooted at `/` are not localized.
fn localize_pattern(pattern: &str, lang: &str) -> Option<String> {
    match pattern.strip_prefix('^') {
        Some(rest) if rest.starts_with('/') => Some(format!("^{}", prefix_path(rest, lang))),
        Some(_) => None,
        None if pattern.starts_with('/') => Some(prefix_path(pattern, lang)),
        None => None,
    }
}

/// Prefix path-shaped targets; absolute URLs are left alone.
fn localize_target(target: &str, lang: &str) -> String {
    if target.starts_with('/') {
        prefix_path(target, lang)
    } else {
        target.to_string()
    }
}

fn localize_record(record: &RuleRecord, lang: &str) -> Option<RuleRecord> {
    let mut localized = record.clone();
    match (&record.test.path_exact, &record.test.path_pattern) {
        (Some(path), None) if path.starts_with('/') => {
            localized.test.path_exact = Some(prefix_path(path, lang));
        }
        (None, Some(pattern)) => {
            localized.test.path_pattern = Some(localize_pattern(pattern, lang)?);
        }
        // Invalid tests are reported once, for the source record.
        _ => return None,
    }
    if let Some(redirect) = localized.redirect.as_mut() {
        redirect.location = localize_target(&redirect.location, lang);
    }
    if let Some(rewrite) = localized.rewrite.as_mut() {
        rewrite.path = localize_target(&rewrite.path, lang);
    }
    Some(localized)
}
