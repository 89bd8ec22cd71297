//! Router output artifacts.
//!
//! # Responsibilities
//! - Represent the two possible outcomes: redirect or forwarded request
//! - Build origin descriptors for cross-origin rewrites
//! - Serialize into the edge artifact shape
//!
//! # Wire Shape
//! ```text
//! redirect: { status: "301", statusDescription, headers.location: [{key, value}] }
//! forward:  { uri, origin?: {...}, headers.host?: [{key, value}] }
//! ```

use std::collections::BTreeMap;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::config::OriginConfig;
use crate::routing::request::RequestDescriptor;

/// Upstream protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            _ => None,
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

/// Upstream origin a rewritten request is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub hostname: String,
    pub protocol: Protocol,
    pub port: u16,
    pub base_path: String,
    pub tls_protocols: Vec<String>,
    #[serde(rename = "readTimeoutSeconds")]
    pub read_timeout_secs: u64,
    #[serde(rename = "keepAliveTimeoutSeconds")]
    pub keep_alive_timeout_secs: u64,
    #[serde(default)]
    pub custom_headers: BTreeMap<String, String>,
}

impl Origin {
    /// A custom origin on the protocol's default port, with the configured
    /// TLS and timeout defaults.
    pub fn custom(
        hostname: impl Into<String>,
        protocol: Protocol,
        defaults: &OriginConfig,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            protocol,
            port: protocol.default_port(),
            base_path: String::new(),
            tls_protocols: defaults.tls_protocols.clone(),
            read_timeout_secs: defaults.read_timeout_secs,
            keep_alive_timeout_secs: defaults.keep_alive_timeout_secs,
            custom_headers: BTreeMap::new(),
        }
    }
}

/// A single `{key, value}` header entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Reason phrase for a redirect status.
pub fn status_text(status: u16) -> &'static str {
    match status {
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        _ => "Redirect",
    }
}

/// Short-circuit response sent straight back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectResponse {
    pub status: u16,
    pub status_text: &'static str,
    pub location: String,
}

impl RedirectResponse {
    pub fn new(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text(status),
            location: location.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RedirectWire<'a> {
    status: String,
    status_description: &'a str,
    headers: LocationHeaders,
}

#[derive(Serialize)]
struct LocationHeaders {
    location: Vec<HeaderEntry>,
}

impl Serialize for RedirectResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RedirectWire {
            status: self.status.to_string(),
            status_description: self.status_text,
            headers: LocationHeaders {
                location: vec![HeaderEntry::new("Location", self.location.as_str())],
            },
        }
        .serialize(serializer)
    }
}

/// The request to forward upstream after routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    /// The rewritten request; `path` is the new URI.
    pub request: RequestDescriptor,

    /// New `host` header value, set for cross-origin rewrites.
    pub host_header: Option<String>,
}

impl ForwardRequest {
    /// Forward unchanged except for a lower-cased path.
    pub fn passthrough(request: &RequestDescriptor) -> Self {
        let mut request = request.clone();
        request.path = request.path.to_lowercase();
        Self {
            request,
            host_header: None,
        }
    }

    /// Forward to the same origin under a new path.
    pub fn same_origin(request: &RequestDescriptor, path: &str) -> Self {
        let mut request = request.clone();
        request.path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self {
            request,
            host_header: None,
        }
    }

    /// Forward to a different origin.
    pub fn cross_origin(request: &RequestDescriptor, path: &str, origin: Origin) -> Self {
        let mut forwarded = Self::same_origin(request, path);
        forwarded.request.host = origin.hostname.clone();
        forwarded.host_header = Some(origin.hostname.clone());
        forwarded.request.origin = Some(origin);
        forwarded
    }

    pub fn uri(&self) -> &str {
        &self.request.path
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.request.origin.as_ref()
    }
}

#[derive(Serialize)]
struct ForwardWire<'a> {
    uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'a Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<HostHeaders>,
}

#[derive(Serialize)]
struct HostHeaders {
    host: Vec<HeaderEntry>,
}

impl Serialize for ForwardRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ForwardWire {
            uri: self.uri(),
            origin: self.origin(),
            headers: self.host_header.as_ref().map(|host| HostHeaders {
                host: vec![HeaderEntry::new("host", host.as_str())],
            }),
        }
        .serialize(serializer)
    }
}

/// Exactly one of these is produced per routed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RouterOutput {
    Redirect(RedirectResponse),
    Forward(ForwardRequest),
}

impl RouterOutput {
    pub fn as_redirect(&self) -> Option<&RedirectResponse> {
        match self {
            RouterOutput::Redirect(r) => Some(r),
            RouterOutput::Forward(_) => None,
        }
    }

    pub fn as_forward(&self) -> Option<&ForwardRequest> {
        match self {
            RouterOutput::Forward(f) => Some(f),
            RouterOutput::Redirect(_) => None,
        }
    }
}
