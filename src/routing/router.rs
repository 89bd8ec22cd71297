//! Rule lookup and dispatch.
//!
//! # Responsibilities
//! - Scan compiled rules in order and stop at the first match
//! - Compute the new location from the matched rule's templates
//! - Build exactly one output: redirect, same-origin or cross-origin forward
//! - Fall through to a lower-casing pass-through when nothing matches
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Pure function of (rules, request); the input request is never mutated
//! - `/old` and `/old/` match the same rules in both directions; the path
//!   as received is tried first and the output keeps whatever slash the
//!   template produces

use url::Url;

use crate::config::OriginConfig;
use crate::observability::metrics;
use crate::routing::error::RouteError;
use crate::routing::matcher::PathMatch;
use crate::routing::request::RequestDescriptor;
use crate::routing::response::{ForwardRequest, Origin, Protocol, RedirectResponse, RouterOutput};
use crate::rules::compiler::has_http_scheme;
use crate::rules::{Action, Rule, RuleSet};

/// The first rule matching a request, with its computed location.
#[derive(Debug)]
pub struct RuleMatch<'r> {
    /// Position of the rule in the rule set.
    pub index: usize,
    pub rule: &'r Rule,
    pub location: String,
}

/// Evaluates requests against an ordered rule set.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: RuleSet,
    origin: OriginConfig,
}

impl Router {
    /// Create a router with default origin settings.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            origin: OriginConfig::default(),
        }
    }

    /// Override the TLS and timeout defaults used for cross-origin rewrites.
    pub fn with_origin_defaults(mut self, origin: OriginConfig) -> Self {
        self.origin = origin;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn origin_defaults(&self) -> &OriginConfig {
        &self.origin
    }

    /// Find the first matching rule.
    ///
    /// Each rule is tried against the path as received, then against the
    /// same path with its trailing slash removed (or added, if it had none).
    /// The root path `/` has no alternate form.
    pub fn find_match(&self, request: &RequestDescriptor) -> Option<RuleMatch<'_>> {
        let path = request.path.as_str();
        let alternate = match path.strip_suffix('/') {
            Some("") => None,
            Some(stripped) => Some(stripped.to_string()),
            None => Some(format!("{}/", path)),
        };

        self.rules.iter().enumerate().find_map(|(index, rule)| {
            std::iter::once(path)
                .chain(alternate.as_deref())
                .find_map(|candidate| rule.matcher.find(candidate, &request.host))
                .map(|found| RuleMatch {
                    index,
                    rule,
                    location: new_location(rule, &found),
                })
        })
    }

    /// Route a request.
    pub fn route(&self, request: &RequestDescriptor) -> Result<RouterOutput, RouteError> {
        request.validate()?;

        let Some(found) = self.find_match(request) else {
            tracing::debug!(path = %request.path, "No rule matched");
            metrics::record_decision("no_match");
            return Ok(RouterOutput::Forward(ForwardRequest::passthrough(request)));
        };

        tracing::debug!(
            path = %request.path,
            rule = %found.rule.source,
            location = %found.location,
            "Rule matched"
        );

        let output = match &found.rule.action {
            Action::Redirect { status, .. } => {
                metrics::record_decision("redirect");
                RouterOutput::Redirect(RedirectResponse::new(*status, found.location))
            }
            Action::Rewrite { .. } if has_http_scheme(&found.location) => {
                let forwarded = self.cross_origin(request, &found.location)?;
                metrics::record_decision("origin_rewrite");
                RouterOutput::Forward(forwarded)
            }
            Action::Rewrite { .. } => {
                metrics::record_decision("rewrite");
                RouterOutput::Forward(ForwardRequest::same_origin(request, &found.location))
            }
        };
        Ok(output)
    }

    /// Route a request, forwarding it lower-cased if routing fails.
    ///
    /// A descriptor that fails validation is still forwarded as received.
    pub fn route_or_passthrough(&self, request: &RequestDescriptor) -> RouterOutput {
        self.route(request).unwrap_or_else(|e| {
            tracing::warn!(
                path = %request.path,
                error = %e,
                "Routing failed, passing request through"
            );
            metrics::record_decision("fallback");
            RouterOutput::Forward(ForwardRequest::passthrough(request))
        })
    }

    fn cross_origin(
        &self,
        request: &RequestDescriptor,
        location: &str,
    ) -> Result<ForwardRequest, RouteError> {
        let invalid = |source| RouteError::InvalidRewriteTarget {
            location: location.to_string(),
            source,
        };

        let url = Url::parse(location).map_err(invalid)?;
        let hostname = url.host_str().ok_or_else(|| invalid(url::ParseError::EmptyHost))?;
        let protocol = Protocol::from_scheme(url.scheme()).unwrap_or(Protocol::Http);
        let origin = Origin::custom(hostname, protocol, &self.origin);

        Ok(ForwardRequest::cross_origin(request, url.path(), origin))
    }
}

fn new_location(rule: &Rule, found: &PathMatch<'_>) -> String {
    match &rule.action {
        Action::Redirect { location, .. } => found.replace(location),
        Action::Rewrite { path, origin: None, .. } => found.replace(path),
        Action::Rewrite {
            path,
            origin: Some(origin),
            ..
        } => {
            let base = found.expand(origin);
            let path = found.replace(path);
            let base = base.trim_end_matches('/');
            if path.starts_with('/') {
                format!("{}{}", base, path)
            } else {
                format!("{}/{}", base, path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleCompiler;

    fn router(text: &str) -> Router {
        let outcome = RuleCompiler::new().compile_text(text);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        Router::new(outcome.rules)
    }

    fn route(router: &Router, path: &str) -> RouterOutput {
        router.route(&RequestDescriptor::new(path, "example.com")).unwrap()
    }

    #[test]
    fn test_redirect() {
        let output = route(&router("/old 301 /new"), "/old/");
        let redirect = output.as_redirect().unwrap();
        assert_eq!(redirect.status, 301);
        assert_eq!(redirect.location, "/new");
    }

    #[test]
    fn test_first_match_wins() {
        let a = router("/old/(.*) 301 /first/$1\n/old/page 301 /second");
        let b = router("/old/page 301 /second\n/old/(.*) 301 /first/$1");
        assert_eq!(route(&a, "/old/page").as_redirect().unwrap().location, "/first/page");
        assert_eq!(route(&b, "/old/page").as_redirect().unwrap().location, "/second");
    }

    #[test]
    fn test_find_match_reports_index() {
        let r = router("/a 301 /x\n/b 301 /y");
        let found = r.find_match(&RequestDescriptor::new("/B/", "h")).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.location, "/y");
    }

    #[test]
    fn test_explicit_end_anchor_still_ignores_trailing_slash() {
        let r = router("/old$ 301 /new");
        assert_eq!(route(&r, "/old/").as_redirect().unwrap().location, "/new");
    }

    #[test]
    fn test_slash_terminated_rule_matches_bare_path() {
        let r = router("/a/$ 301 /x");
        assert_eq!(route(&r, "/a").as_redirect().unwrap().location, "/x");
        assert_eq!(route(&r, "/a/").as_redirect().unwrap().location, "/x");
    }

    #[test]
    fn test_trailing_slash_equivalence_keeps_rule_order() {
        let records = vec![
            serde_json::json!({
                "test": {"path_pattern": "^/a/$"},
                "redirect": {"location": "/slash"}
            }),
            serde_json::json!({
                "test": {"path_pattern": "^/a$"},
                "redirect": {"location": "/noslash"}
            }),
        ];
        let outcome = RuleCompiler::new().compile_records(&records);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        let r = Router::new(outcome.rules);

        assert_eq!(route(&r, "/a").as_redirect().unwrap().location, "/slash");
        assert_eq!(route(&r, "/a/").as_redirect().unwrap().location, "/slash");
    }

    #[test]
    fn test_root_path_has_no_alternate() {
        let records = vec![serde_json::json!({
            "test": {"path_pattern": "^//$"},
            "redirect": {"location": "/x"}
        })];
        let r = Router::new(RuleCompiler::new().compile_records(&records).rules);
        assert!(r.find_match(&RequestDescriptor::new("/", "h")).is_none());
    }

    #[test]
    fn test_rewrite_keeps_existing_origin_override() {
        let override_origin =
            Origin::custom("origin.example.com", Protocol::Https, &OriginConfig::default());
        let request =
            RequestDescriptor::new("/old", "example.com").with_origin(override_origin.clone());

        let output = router("/old 200 /new").route(&request).unwrap();
        let forward = output.as_forward().unwrap();
        assert_eq!(forward.uri(), "/new");
        assert_eq!(forward.origin(), Some(&override_origin));
    }

    #[test]
    fn test_trailing_slash_preserved_for_captures() {
        let r = router("/old/(.*) 200 /new/$1");
        assert_eq!(route(&r, "/old/").as_forward().unwrap().uri(), "/new/");
    }

    #[test]
    fn test_cross_origin_rewrite() {
        let r = router("/old/(.*) 200 https://Example.com/new/$1");
        let output = route(&r, "/old/foo");
        let forward = output.as_forward().unwrap();
        assert_eq!(forward.uri(), "/new/foo");
        let origin = forward.origin().unwrap();
        assert_eq!(origin.hostname, "example.com");
        assert_eq!(origin.protocol, Protocol::Https);
        assert_eq!(origin.port, 443);
        assert_eq!(forward.request.host, "example.com");
        assert_eq!(forward.host_header.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_invalid_rewrite_target() {
        let r = router("/old 200 http://");
        let request = RequestDescriptor::new("/old", "example.com");
        assert!(matches!(r.route(&request), Err(RouteError::InvalidRewriteTarget { .. })));

        let fallback = r.route_or_passthrough(&RequestDescriptor::new("/OLD", "example.com"));
        assert_eq!(fallback.as_forward().unwrap().uri(), "/old");
    }

    #[test]
    fn test_malformed_request() {
        let r = router("/old 301 /new");
        let err = r.route(&RequestDescriptor::new("/old", "")).unwrap_err();
        assert!(matches!(err, RouteError::Malformed(_)));
    }

    #[test]
    fn test_origin_template_joins_path() {
        let records = vec![serde_json::json!({
            "test": {"path_pattern": "^/api/(?P<rest>.*)$", "host_exact": "www.example.com"},
            "rewrite": {"path": "v2/${rest}", "origin": "https://api.example.com/"}
        })];
        let outcome = RuleCompiler::new().compile_records(&records);
        let r = Router::new(outcome.rules);

        let output = r.route(&RequestDescriptor::new("/api/users", "WWW.example.com")).unwrap();
        let forward = output.as_forward().unwrap();
        assert_eq!(forward.uri(), "/v2/users");
        assert_eq!(forward.origin().unwrap().hostname, "api.example.com");

        let other_host = r.route(&RequestDescriptor::new("/api/users", "example.org")).unwrap();
        assert_eq!(other_host.as_forward().unwrap().uri(), "/api/users");
        assert!(other_host.as_forward().unwrap().origin().is_none());
    }
}
