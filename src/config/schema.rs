//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::rules::SourceFormat;

/// Root configuration for the edge router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Where the routing rules come from.
    pub rules: RulesConfig,

    /// Defaults applied to origins created by cross-origin rewrites.
    pub origin: OriginConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Rule source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Path to the rules file (relative paths resolve against the config file).
    pub path: PathBuf,

    /// Rules file format.
    pub format: SourceFormat,

    /// Language prefixes to duplicate every rule under (e.g. `["zh", "es"]`).
    pub localized_prefixes: Vec<String>,

    /// Reload the rules file when it changes.
    pub watch: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rules.txt"),
            format: SourceFormat::Auto,
            localized_prefixes: Vec::new(),
            watch: false,
        }
    }
}

/// Origin defaults for cross-origin rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// TLS protocol versions offered to the origin.
    pub tls_protocols: Vec<String>,

    /// Origin read timeout in seconds.
    pub read_timeout_secs: u64,

    /// Origin keep-alive timeout in seconds.
    pub keep_alive_timeout_secs: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            tls_protocols: vec!["TLSv1.2".to_string(), "TLSv1.1".to_string()],
            read_timeout_secs: 5,
            keep_alive_timeout_secs: 5,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
