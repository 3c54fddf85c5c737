//! Event consumers that turn a run into human- or machine-readable output.
//!
//! Reporters sit entirely on top of the event stream; the engine does not
//! know they exist.

pub mod console;
pub mod json;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

use crate::config::{Config, ReporterKind};
use crate::error::BlockError;
use crate::events::EventEmitter;
use crate::metrics::RunMetrics;
use std::io::Write;
use std::sync::Arc;

/// Destination for reporter output.
pub type Output = Box<dyn Write + Send>;

/// Maximum number of error detail lines printed per failure.
pub const MAX_ERROR_LINES: usize = 4;

/// A subscriber that renders a run and decides its exit status.
pub trait Reporter: Send + Sync {
    /// Subscribe to `emitter`. Call before the run starts.
    fn attach(self: Arc<Self>, emitter: &EventEmitter);

    /// Counters collected so far.
    fn metrics(&self) -> &RunMetrics;

    /// True once an `Error` event (walker fault) was seen.
    fn aborted(&self) -> bool;

    /// Process exit status: 0 when nothing failed, 1 otherwise.
    fn exit_code(&self) -> i32 {
        if self.aborted() || self.metrics().errors_total() > 0 {
            1
        } else {
            0
        }
    }
}

/// Build the reporter selected by `config`, writing to stdout.
pub fn from_config(config: &Config) -> Arc<dyn Reporter> {
    match config.reporter {
        ReporterKind::Console => Arc::new(ConsoleReporter::new(
            Box::new(std::io::stdout()),
            config.color,
        )),
        ReporterKind::Json => Arc::new(JsonReporter::new(Box::new(std::io::stdout()))),
    }
}

/// Error text limited to [`MAX_ERROR_LINES`] lines, including the cause chain.
pub(crate) fn error_detail(error: &BlockError) -> Vec<String> {
    let text = match error {
        BlockError::Failed(source) => format!("{:#}", source),
        other => other.to_string(),
    };

    text.lines()
        .map(|line| line.trim_end().to_string())
        .take(MAX_ERROR_LINES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_includes_context_chain() {
        let error = BlockError::Failed(
            anyhow::anyhow!("connection refused").context("fixture database unavailable"),
        );
        let lines = error_detail(&error);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("fixture database unavailable"));
        assert!(lines[0].contains("connection refused"));
    }

    #[test]
    fn test_error_detail_is_truncated() {
        let error = BlockError::Panicked("1\n2\n3\n4\n5\n6".to_string());
        let lines = error_detail(&error);
        assert_eq!(lines.len(), MAX_ERROR_LINES);
        assert_eq!(lines[0], "panicked: 1");
    }
}
