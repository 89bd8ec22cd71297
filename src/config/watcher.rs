//! Rules file watcher for hot reload.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::schema::RulesConfig;
use crate::lifecycle::startup::load_rule_set;
use crate::rules::{RuleCompiler, RuleSet};

/// A watcher that recompiles the rules file whenever it changes.
pub struct RuleWatcher {
    rules: RulesConfig,
    compiler: RuleCompiler,
    update_tx: mpsc::UnboundedSender<RuleSet>,
}

impl RuleWatcher {
    /// Create a new RuleWatcher.
    ///
    /// Returns the watcher and a receiver for freshly compiled rule sets.
    pub fn new(
        rules: &RulesConfig,
        compiler: RuleCompiler,
    ) -> (Self, mpsc::UnboundedReceiver<RuleSet>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                rules: rules.clone(),
                compiler,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the rules file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let rules = self.rules;
        let compiler = self.compiler;
        let path: PathBuf = rules.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Rules file change detected, reloading...");
                        match load_rule_set(&rules, &compiler) {
                            Ok(rule_set) => {
                                let _ = tx.send(rule_set);
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Failed to reload rules: {}. Keeping current rules.",
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Rules watcher started");
        Ok(watcher)
    }
}
