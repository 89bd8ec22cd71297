//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the configured rules file and compile it
//! - Report every dropped rule
//! - Assemble the router and the hot-swappable rule table
//!
//! # Design Decisions
//! - A rules file that cannot be read or parsed is fatal at startup,
//!   but only logged on reload (the current rules stay in place)
//! - Individual bad rules are never fatal

use crate::config::{EdgeConfig, RulesConfig};
use crate::observability::metrics;
use crate::routing::{Router, RuleTable};
use crate::rules::source::load_rules;
use crate::rules::{CompileOutcome, LoadError, RuleCompiler, RuleSet};

/// Build the compiler described by the rules configuration.
pub fn build_compiler(rules: &RulesConfig) -> RuleCompiler {
    RuleCompiler::new().with_localized_prefixes(rules.localized_prefixes.clone())
}

/// Read and compile the rules file, returning compilation errors alongside.
pub fn compile_rules(
    rules: &RulesConfig,
    compiler: &RuleCompiler,
) -> Result<CompileOutcome, LoadError> {
    let source = load_rules(&rules.path, rules.format)?;
    let outcome = compiler.compile(&source);

    for error in &outcome.errors {
        tracing::warn!(
            path = %rules.path.display(),
            location = %error.location,
            error = %error.reason,
            "Dropping rule"
        );
    }
    metrics::record_rule_errors(outcome.errors.len());
    metrics::record_rule_count(outcome.rules.len());

    tracing::info!(
        path = %rules.path.display(),
        rules = outcome.rules.len(),
        dropped = outcome.errors.len(),
        "Rules compiled"
    );
    Ok(outcome)
}

/// Read and compile the rules file, keeping only the usable rules.
pub fn load_rule_set(rules: &RulesConfig, compiler: &RuleCompiler) -> Result<RuleSet, LoadError> {
    compile_rules(rules, compiler).map(|outcome| outcome.rules)
}

/// Build a router from configuration.
pub fn build_router(config: &EdgeConfig, compiler: &RuleCompiler) -> Result<Router, LoadError> {
    let rules = load_rule_set(&config.rules, compiler)?;
    Ok(Router::new(rules).with_origin_defaults(config.origin.clone()))
}

/// Build the shared rule table from configuration.
pub fn build_table(config: &EdgeConfig, compiler: &RuleCompiler) -> Result<RuleTable, LoadError> {
    build_router(config, compiler).map(RuleTable::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RequestDescriptor;
    use std::fs;

    #[test]
    fn test_build_router_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let rules_path = dir.path().join("rules.txt");
        fs::write(&rules_path, "/old 301 /new\n/broken( 301 /x\n").unwrap();

        let mut config = EdgeConfig::default();
        config.rules.path = rules_path;
        config.rules.localized_prefixes = vec!["zh".into()];
        let compiler = build_compiler(&config.rules);

        let outcome = compile_rules(&config.rules, &compiler).unwrap();
        assert_eq!(outcome.rules.len(), 2);
        assert_eq!(outcome.errors.len(), 1);

        let router = build_router(&config, &compiler).unwrap();
        let output = router.route(&RequestDescriptor::new("/zh/old", "example.com")).unwrap();
        assert_eq!(output.as_redirect().unwrap().location, "/zh/new");
    }

    #[test]
    fn test_missing_rules_file() {
        let mut config = EdgeConfig::default();
        config.rules.path = "/nonexistent/rules.txt".into();
        let compiler = build_compiler(&config.rules);
        assert!(build_table(&config, &compiler).is_err());
    }
}
