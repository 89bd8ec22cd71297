//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Compile rules → Build router → Wrap in RuleTable
//!
//! Reload (config::watcher):
//!     File change → Compile rules → Swap RuleTable contents
//! ```
//!
//! # Design Decisions
//! - Fail fast at startup: an unreadable rules file is fatal
//! - Reload failures keep the previous rules

pub mod startup;
