//! Hot-swappable router.
//!
//! In-flight requests keep the `Arc<Router>` they loaded; a reload stores a
//! fully compiled replacement in one atomic pointer swap, so no request ever
//! sees a partially updated rule list.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::error::RouteError;
use crate::routing::request::RequestDescriptor;
use crate::routing::response::RouterOutput;
use crate::routing::router::Router;
use crate::rules::RuleSet;

/// Process-wide handle to the current router.
#[derive(Debug)]
pub struct RuleTable {
    current: ArcSwap<Router>,
}

impl RuleTable {
    pub fn new(router: Router) -> Self {
        Self {
            current: ArcSwap::from_pointee(router),
        }
    }

    /// Snapshot of the current router.
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Install a new rule set, keeping the current origin defaults.
    ///
    /// Returns the router that was replaced.
    pub fn replace_rules(&self, rules: RuleSet) -> Arc<Router> {
        let defaults = self.current.load().origin_defaults().clone();
        let count = rules.len();
        let previous = self
            .current
            .swap(Arc::new(Router::new(rules).with_origin_defaults(defaults)));
        tracing::info!(rules = count, previous = previous.rules().len(), "Rule table swapped");
        previous
    }

    /// Route against the current snapshot.
    pub fn route(&self, request: &RequestDescriptor) -> Result<RouterOutput, RouteError> {
        self.current.load().route(request)
    }
}
