//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, host)
//!     → request.rs (validate descriptor)
//!     → router.rs (ordered scan, first match wins)
//!     → matcher.rs (exact / host+path / pattern match, captures)
//!     → response.rs (redirect or forwarded request)
//!
//! Rule refresh:
//!     new RuleSet
//!     → table.rs (atomic swap of Arc<Router>)
//!     → next request observes the new rules
//! ```
//!
//! # Design Decisions
//! - Rules compiled once, immutable at runtime
//! - Deterministic: same input always produces the same output
//! - First match wins (declaration order)
//! - No match means lower-case and forward, never an error

pub mod error;
pub mod matcher;
pub mod request;
pub mod response;
pub mod router;
pub mod table;

pub use error::{MalformedRequestError, RouteError};
pub use matcher::Matcher;
pub use request::RequestDescriptor;
pub use response::{ForwardRequest, HeaderEntry, Origin, Protocol, RedirectResponse, RouterOutput};
pub use router::{Router, RuleMatch};
pub use table::RuleTable;
