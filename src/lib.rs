//! Edge request router library.
//!
//! Compiles redirect/rewrite rules and routes CDN viewer requests with them.

// Core subsystems
pub mod config;
pub mod routing;
pub mod rules;

// Edge integration
pub mod edge;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::EdgeConfig;
pub use edge::EdgeWorker;
pub use routing::{RequestDescriptor, Router, RouterOutput, RuleTable};
pub use rules::{RuleCompiler, RuleSet};
