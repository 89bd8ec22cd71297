//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! edge.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!
//! Rules file changes (when rules.watch = true):
//!     watcher.rs detects change
//!     → rules are loaded and recompiled
//!     → new RuleSet sent to the owner of the RuleTable
//!     → atomic swap, in-flight requests keep their snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the rule set is hot-reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{EdgeConfig, LoggingConfig, OriginConfig, RulesConfig};
pub use watcher::RuleWatcher;
