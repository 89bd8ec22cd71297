//! Edge integration subsystem.
//!
//! # Data Flow
//! ```text
//! NDJSON viewer-request events (stdin)
//!     → worker.rs (one event per line)
//!     → event.rs (extract descriptor, route, render)
//!     → NDJSON outputs (stdout)
//! ```
//!
//! # Design Decisions
//! - The router knows nothing about the event format; this module adapts it
//! - Output lines match input lines one to one

pub mod event;
pub mod worker;

pub use event::{handle_event, CfRequest, EventError, ViewerRequestEvent};
pub use worker::EdgeWorker;
