//! Routing errors.

use thiserror::Error;

/// The request descriptor handed to the router is incomplete.
///
/// This is an integration error in the calling layer; the router does not guess.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRequestError {
    #[error("request has no path")]
    MissingPath,

    #[error("request path `{0}` does not start with '/'")]
    RelativePath(String),

    #[error("request has no host")]
    MissingHost,
}

/// Errors returned by [`Router::route`](crate::routing::Router::route).
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("malformed request: {0}")]
    Malformed(#[from] MalformedRequestError),

    /// A rewrite produced an absolute location that is not a usable URL.
    #[error("rewrite target `{location}` is not a valid URL: {source}")]
    InvalidRewriteTarget {
        location: String,
        #[source]
        source: url::ParseError,
    },
}
