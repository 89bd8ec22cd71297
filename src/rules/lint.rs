//! Static checks over a compiled rule set.
//!
//! Findings are advisory: a rule that lints badly still routes. The CLI's
//! `lint` command prints them next to compilation errors.

use std::fmt;

use crate::rules::{Action, Rule, RuleSet, SourceRef};

/// Statuses a rule is expected to declare.
pub const ALLOWED_STATUSES: [u16; 7] = [200, 301, 302, 307, 308, 404, 500];

/// What is wrong with a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintKind {
    /// The pattern starts with a scheme; only paths are ever matched.
    ProtocolInPattern,
    UnexpectedStatus(u16),
    /// The replacement neither starts with `/` nor is an absolute URL.
    ReplacementShape(String),
    /// A template references a capture group the pattern does not define.
    AmbiguousCapture(String),
}

/// A lint finding tied to the rule's source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub location: SourceRef,
    pub kind: LintKind,
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LintKind::ProtocolInPattern => {
                write!(f, "{}: pattern includes a protocol", self.location)
            }
            LintKind::UnexpectedStatus(status) => {
                write!(f, "{}: unexpected status {}", self.location, status)
            }
            LintKind::ReplacementShape(replacement) => write!(
                f,
                "{}: replacement `{}` should start with `/` or `http`",
                self.location, replacement
            ),
            LintKind::AmbiguousCapture(reference) => write!(
                f,
                "{}: `{}` does not name a capture group and expands to nothing",
                self.location, reference
            ),
        }
    }
}

/// Lint every rule, in declaration order.
pub fn lint(rules: &RuleSet) -> Vec<LintFinding> {
    rules.iter().flat_map(lint_rule).collect()
}

fn lint_rule(rule: &Rule) -> Vec<LintFinding> {
    let mut kinds = Vec::new();

    if starts_with_http(rule.matcher.describe().trim_start_matches('^')) {
        kinds.push(LintKind::ProtocolInPattern);
    }

    let status = rule.action.status();
    if !ALLOWED_STATUSES.contains(&status) {
        kinds.push(LintKind::UnexpectedStatus(status));
    }

    // Paths joined onto an origin template may be relative.
    let replacement = match &rule.action {
        Action::Redirect { location, .. } => Some(location),
        Action::Rewrite { path, origin: None, .. } => Some(path),
        Action::Rewrite { origin: Some(_), .. } => None,
    };
    if let Some(template) = replacement {
        let text = template.source();
        if !text.starts_with('/') && !starts_with_http(text) {
            kinds.push(LintKind::ReplacementShape(text.to_string()));
        }
    }

    for template in rule.action.templates() {
        kinds.extend(
            template
                .unresolved(rule.matcher.regex())
                .into_iter()
                .map(LintKind::AmbiguousCapture),
        );
    }

    kinds
        .into_iter()
        .map(|kind| LintFinding {
            location: rule.source,
            kind,
        })
        .collect()
}

fn starts_with_http(text: &str) -> bool {
    text.get(..4).is_some_and(|head| head.eq_ignore_ascii_case("http"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleCompiler;

    fn lint_text(text: &str) -> Vec<LintKind> {
        let outcome = RuleCompiler::new().compile_text(text);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        lint(&outcome.rules).into_iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_clean_rules() {
        assert!(lint_text("/old 301 /new\n/a/(.*) 200 https://example.com/$1").is_empty());
    }

    #[test]
    fn test_protocol_in_pattern() {
        assert_eq!(lint_text("http://old 301 /new"), vec![LintKind::ProtocolInPattern]);
    }

    #[test]
    fn test_unexpected_status() {
        assert_eq!(lint_text("/old 303 /new"), vec![LintKind::UnexpectedStatus(303)]);
        assert_eq!(lint_text("/old 418 /new"), vec![LintKind::UnexpectedStatus(418)]);
    }

    #[test]
    fn test_replacement_shape() {
        assert_eq!(
            lint_text("/old 301 new"),
            vec![LintKind::ReplacementShape("new".to_string())]
        );
    }

    #[test]
    fn test_ambiguous_capture() {
        assert_eq!(
            lint_text("/old/(.*) 301 /new/$2"),
            vec![LintKind::AmbiguousCapture("$2".to_string())]
        );
    }

    #[test]
    fn test_finding_reports_line() {
        let outcome = RuleCompiler::new().compile_text("/ok 301 /fine\n/old 418 /new");
        let findings = lint(&outcome.rules);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location, SourceRef::Line(2));
        assert_eq!(findings[0].to_string(), "line 2: unexpected status 418");
    }
}
