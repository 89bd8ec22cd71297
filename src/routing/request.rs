//! Request descriptor consumed by the router.
//!
//! # Responsibilities
//! - Carry the routing-relevant parts of a request (path, host, origin)
//! - Validate that the calling layer supplied them
//! - Extract the host from a header map keyed case-insensitively

use serde::{Deserialize, Serialize};

use crate::routing::error::MalformedRequestError;
use crate::routing::response::Origin;

/// What the router sees of an incoming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Request path, starting with `/`.
    pub path: String,

    /// Target hostname.
    pub host: String,

    /// Upstream origin override, if one is already set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl RequestDescriptor {
    pub fn new(path: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            host: host.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Build a descriptor from a path and `(name, value)` header pairs.
    ///
    /// The host header is looked up case-insensitively; the first value wins.
    pub fn from_headers<'a, I>(
        path: Option<&str>,
        headers: I,
    ) -> Result<Self, MalformedRequestError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let path = path.ok_or(MalformedRequestError::MissingPath)?;
        let host = headers
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("host"))
            .map(|(_, value)| value)
            .ok_or(MalformedRequestError::MissingHost)?;

        let descriptor = Self::new(path, host);
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check the fields the router depends on.
    pub fn validate(&self) -> Result<(), MalformedRequestError> {
        if self.path.is_empty() {
            return Err(MalformedRequestError::MissingPath);
        }
        if !self.path.starts_with('/') {
            return Err(MalformedRequestError::RelativePath(self.path.clone()));
        }
        if self.host.trim().is_empty() {
            return Err(MalformedRequestError::MissingHost);
        }
        Ok(())
    }
}
