//! Rule source files.
//!
//! Line-oriented files are kept as text; JSON and YAML files are parsed into
//! a list of untyped records so that a single bad record surfaces as a
//! per-rule schema error rather than failing the whole file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::error::LoadError;

/// Format of a rules file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Pick by file extension: `.json`, `.yml`/`.yaml`, anything else is text.
    #[default]
    Auto,
    Text,
    Json,
    Yaml,
}

impl SourceFormat {
    /// Resolve `Auto` against the file name.
    pub fn resolve(self, path: &Path) -> SourceFormat {
        if self != SourceFormat::Auto {
            return self;
        }
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => SourceFormat::Json,
            Some("yml") | Some("yaml") => SourceFormat::Yaml,
            _ => SourceFormat::Text,
        }
    }
}

/// Raw, not yet compiled, rule definitions.
#[derive(Debug, Clone)]
pub enum RuleSource {
    /// `<pattern> <status> <replacement>` lines.
    Text(String),
    /// Structured records, see [`RuleRecord`].
    Records(Vec<Value>),
}

/// A structured rule record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleRecord {
    pub test: RuleTest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<RewriteSpec>,
}

/// The matching half of a record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_exact: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectSpec {
    pub location: String,
    #[serde(
        rename = "statusCode",
        alias = "status_code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteSpec {
    pub path: String,
    /// Absolute `http(s)://host` URL of the new origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// Parse file contents in an already resolved format.
pub fn parse_source(contents: &str, format: SourceFormat) -> Result<RuleSource, LoadError> {
    let source = match format {
        SourceFormat::Auto | SourceFormat::Text => RuleSource::Text(contents.to_string()),
        SourceFormat::Json => RuleSource::Records(serde_json::from_str(contents)?),
        SourceFormat::Yaml => {
            // An empty YAML document is an empty rule list.
            if contents.trim().is_empty() {
                RuleSource::Records(Vec::new())
            } else {
                RuleSource::Records(serde_yaml::from_str(contents)?)
            }
        }
    };
    Ok(source)
}

/// Read and parse a rules file.
pub fn load_rules(path: &Path, format: SourceFormat) -> Result<RuleSource, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&contents, format.resolve(path))
}
