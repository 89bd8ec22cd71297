//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Compiler, router, watcher produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (decision and rule counters)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - Metrics are cheap (atomic increments, no-op without a recorder)

pub mod logging;
pub mod metrics;
