//! CDN viewer-request event adapter.
//!
//! # Responsibilities
//! - Deserialize `Records[0].cf.request` events
//! - Extract the request descriptor (host header matched case-insensitively)
//! - Render the router output in the event's native shape
//!
//! # Design Decisions
//! - Unknown request fields are kept verbatim and echoed back on forward
//! - The incoming event is never mutated; output is built from a copy
//! - Rewrite targets that fail to parse fall back to a pass-through

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::observability::metrics;
use crate::routing::{
    ForwardRequest, HeaderEntry, MalformedRequestError, Origin, RequestDescriptor, RouteError,
    Router, RouterOutput,
};

/// A viewer-request event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewerRequestEvent {
    #[serde(rename = "Records")]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventRecord {
    pub cf: CfPayload,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CfPayload {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
    pub request: CfRequest,
}

/// The request part of the event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CfRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Header lists keyed by lower-case header name.
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<HeaderEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Value>,

    /// Everything else (method, querystring, clientIp, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Errors handling an edge event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event has no records")]
    NoRecords,

    #[error("malformed request: {0}")]
    Malformed(#[from] MalformedRequestError),

    #[error("invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ViewerRequestEvent {
    /// Parse an event from JSON text.
    pub fn from_json(text: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The request of the first record.
    pub fn request(&self) -> Result<&CfRequest, EventError> {
        self.records
            .first()
            .map(|record| &record.cf.request)
            .ok_or(EventError::NoRecords)
    }
}

impl CfRequest {
    /// Build the router's view of this request.
    pub fn descriptor(&self) -> Result<RequestDescriptor, MalformedRequestError> {
        let headers = self.headers.iter().filter_map(|(name, entries)| {
            entries.first().map(|entry| (name.as_str(), entry.value.as_str()))
        });
        RequestDescriptor::from_headers(self.uri.as_deref(), headers)
    }

    /// Render `output` in the event's shape.
    pub fn render(&self, output: &RouterOutput) -> Result<Value, EventError> {
        let forward = match output {
            RouterOutput::Redirect(redirect) => return Ok(serde_json::to_value(redirect)?),
            RouterOutput::Forward(forward) => forward,
        };

        let mut request = self.clone();
        request.uri = Some(forward.uri().to_string());

        if let Some(origin) = forward.origin() {
            request.origin = Some(custom_origin(origin));
        }
        if let Some(host) = &forward.host_header {
            request.headers.retain(|name, _| !name.eq_ignore_ascii_case("host"));
            request
                .headers
                .insert("host".to_string(), vec![HeaderEntry::new("host", host.as_str())]);
        }

        Ok(serde_json::to_value(request)?)
    }
}

/// `origin.custom` block for a cross-origin rewrite.
fn custom_origin(origin: &Origin) -> Value {
    let custom_headers: Map<String, Value> = origin
        .custom_headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_lowercase(),
                json!([{ "key": name, "value": value }]),
            )
        })
        .collect();

    json!({
        "custom": {
            "domainName": origin.hostname,
            "protocol": origin.protocol.as_str(),
            "port": origin.port,
            "path": origin.base_path,
            "sslProtocols": origin.tls_protocols,
            "readTimeout": origin.read_timeout_secs,
            "keepaliveTimeout": origin.keep_alive_timeout_secs,
            "customHeaders": custom_headers,
        }
    })
}

/// Route one event and render the result.
///
/// A rewrite target that cannot be parsed is logged and the request is
/// passed through lower-cased.
pub fn handle_event(router: &Router, event: &ViewerRequestEvent) -> Result<Value, EventError> {
    let request = event.request()?;
    let descriptor = request.descriptor()?;

    let output = match router.route(&descriptor) {
        Ok(output) => output,
        Err(RouteError::Malformed(e)) => return Err(e.into()),
        Err(e @ RouteError::InvalidRewriteTarget { .. }) => {
            tracing::warn!(path = %descriptor.path, error = %e, "Passing request through");
            metrics::record_decision("fallback");
            RouterOutput::Forward(ForwardRequest::passthrough(&descriptor))
        }
    };

    request.render(&output)
}
