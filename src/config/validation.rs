//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, non-empty TLS list)
//! - Check localized prefixes are single path segments
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::EdgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail =
        |field: &'static str, message: String| errors.push(ValidationError { field, message });

    if config.rules.path.as_os_str().is_empty() {
        fail("rules.path", "must not be empty".into());
    }

    for prefix in &config.rules.localized_prefixes {
        let segment = prefix.trim_matches('/');
        if segment.is_empty() || segment.contains('/') || segment.chars().any(char::is_whitespace) {
            fail("rules.localized_prefixes", format!("`{}` is not a single path segment", prefix));
        }
    }

    if config.origin.tls_protocols.is_empty() {
        fail("origin.tls_protocols", "must list at least one protocol".into());
    }
    if config.origin.read_timeout_secs == 0 {
        fail("origin.read_timeout_secs", "must be greater than 0".into());
    }
    if config.origin.keep_alive_timeout_secs == 0 {
        fail("origin.keep_alive_timeout_secs", "must be greater than 0".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
