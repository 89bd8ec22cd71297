//! Metrics collection.
//!
//! # Metrics
//! - `edge_router_decisions_total` (counter): routed requests by `kind`
//!   (redirect, rewrite, origin_rewrite, no_match, fallback)
//! - `edge_router_rule_errors_total` (counter): rules dropped at compile time
//! - `edge_router_rules` (gauge): rules in the most recently compiled set
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Labels are static strings only

/// Count one routing decision.
pub fn record_decision(kind: &'static str) {
    metrics::counter!("edge_router_decisions_total", "kind" => kind).increment(1);
}

/// Count rules dropped by the compiler.
pub fn record_rule_errors(count: usize) {
    metrics::counter!("edge_router_rule_errors_total").increment(count as u64);
}

/// Record the size of the current rule set.
pub fn record_rule_count(count: usize) {
    metrics::gauge!("edge_router_rules").set(count as f64);
}
