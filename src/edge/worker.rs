//! Line-oriented event worker.
//!
//! # Responsibilities
//! - Read one JSON event per line
//! - Route it against the current rule table
//! - Write one JSON result per line, in input order
//!
//! # Design Decisions
//! - The rule table is loaded per event, so a reload takes effect on the
//!   next line without restarting
//! - A bad event produces an `{"error": ...}` line; the worker keeps going
//! - Shutdown is a future; the worker stops between events

use std::future::Future;
use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::edge::event::{handle_event, EventError, ViewerRequestEvent};
use crate::routing::RuleTable;

/// Routes newline-delimited events.
pub struct EdgeWorker {
    table: Arc<RuleTable>,
}

impl EdgeWorker {
    /// Create a new worker over a shared rule table.
    pub fn new(table: Arc<RuleTable>) -> Self {
        Self { table }
    }

    /// Handle one event line and return the output line (without newline).
    pub fn handle_line(&self, line: &str) -> String {
        let router = self.table.load();
        let result =
            ViewerRequestEvent::from_json(line).and_then(|event| handle_event(&router, &event));

        match result {
            Ok(value) => value.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected event");
                error_line(&e)
            }
        }
    }

    /// Process lines from `input` until EOF or `shutdown` resolves.
    ///
    /// Returns the number of events handled.
    pub async fn run<R, W, F>(&self, input: R, mut output: W, shutdown: F) -> std::io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        let mut lines = input.lines();
        let mut handled = 0;
        tokio::pin!(shutdown);

        loop {
            let line = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(handled, "Shutdown signal received");
                    break;
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                tracing::debug!(handled, "Input closed");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let mut out = self.handle_line(&line);
            out.push('\n');
            output.write_all(out.as_bytes()).await?;
            output.flush().await?;
            handled += 1;
        }

        Ok(handled)
    }
}

fn error_line(error: &EventError) -> String {
    json!({ "error": error.to_string() }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Router;
    use crate::rules::RuleCompiler;

    fn worker(text: &str) -> EdgeWorker {
        let rules = RuleCompiler::new().compile_text(text).rules;
        EdgeWorker::new(Arc::new(RuleTable::new(Router::new(rules))))
    }

    const EVENT: &str = r#"{"Records":[{"cf":{"request":{"uri":"/old",
        "headers":{"host":[{"key":"Host","value":"example.com"}]}}}}]}"#;

    #[test]
    fn test_handle_line() {
        let out = worker("/old 301 /new").handle_line(EVENT);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "301");
    }

    #[test]
    fn test_handle_bad_line() {
        let out = worker("/old 301 /new").handle_line("not json");
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value["error"].as_str().unwrap().contains("invalid event JSON"));
    }

    #[tokio::test]
    async fn test_run_until_eof() {
        let input = format!("{}\n\n{}\n", EVENT, EVENT);
        let mut output = Vec::new();

        let handled = worker("/old 200 /new")
            .run(input.as_bytes(), &mut output, std::future::pending())
            .await
            .unwrap();

        assert_eq!(handled, 2);
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l.contains(r#""uri":"/new""#)));
    }
}
