//! Rule cases: example requests paired with the expected outcome.
//!
//! A case file is a YAML (or JSON) list:
//!
//! ```text
//! - uri: /old/page
//!   expected: /new/page
//! - uri: /api/users
//!   host: www.example.com
//!   expected: /v2/users
//! ```
//!
//! A redirect is compared by its location, a forward by its new URI.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::routing::{RequestDescriptor, Router, RouterOutput};
use crate::rules::LoadError;

/// Host used when a case does not name one.
pub const DEFAULT_CASE_HOST: &str = "localhost";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCase {
    pub uri: String,
    pub expected: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// A case whose outcome differed from the expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFailure {
    pub case: RuleCase,
    /// Location or URI actually produced, or the routing error.
    pub actual: String,
}

/// Parse cases from YAML or JSON text (JSON is valid YAML).
pub fn parse_cases(contents: &str) -> Result<Vec<RuleCase>, LoadError> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(contents)?)
}

pub fn load_cases(path: &Path) -> Result<Vec<RuleCase>, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cases(&contents)
}

/// Run every case and return the failures.
pub fn run_cases(router: &Router, cases: &[RuleCase]) -> Vec<CaseFailure> {
    cases
        .iter()
        .filter_map(|case| {
            let host = case.host.as_deref().unwrap_or(DEFAULT_CASE_HOST);
            let request = RequestDescriptor::new(case.uri.as_str(), host);

            let actual = match router.route(&request) {
                Ok(RouterOutput::Redirect(redirect)) => redirect.location,
                Ok(RouterOutput::Forward(forward)) => forward.request.path,
                Err(e) => e.to_string(),
            };

            (actual != case.expected).then(|| CaseFailure {
                case: case.clone(),
                actual,
            })
        })
        .collect()
}
