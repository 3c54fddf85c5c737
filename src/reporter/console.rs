//! Line-oriented, optionally colorized console output.

use super::{error_detail, Output, Reporter};
use crate::events::{BlockCompletion, Event, EventEmitter, EventKind};
use crate::metrics::RunMetrics;
use anyhow::anyhow;
use colored::Colorize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

const NAME_DELIMITER: &str = " - ";

/// Writes one line per completion plus a final summary.
pub struct ConsoleReporter {
    out: Mutex<Output>,
    metrics: RunMetrics,
    started: Instant,
    aborted: AtomicBool,
}

impl ConsoleReporter {
    /// Colors are forced on or off for the whole process, regardless of
    /// whether the output is a terminal.
    pub fn new(out: Output, color: bool) -> Self {
        colored::control::set_override(color);

        Self {
            out: Mutex::new(out),
            metrics: RunMetrics::new(),
            started: Instant::now(),
            aborted: AtomicBool::new(false),
        }
    }

    fn handle(&self, event: &Event) -> anyhow::Result<()> {
        match event {
            Event::DescribeBlockStart { .. } => Ok(()),
            Event::BlockComplete(completion) => self.block_complete(completion),
            Event::MultipleResolves { block } => self.write_lines(&[format!(
                "Error: Block [{}] had multiple resolves",
                block.concat_name(NAME_DELIMITER)
            )
            .red()
            .to_string()]),
            Event::MultipleRejections { block, error } => {
                let mut lines = vec![format!(
                    "Error: Block [{}] had multiple rejections",
                    block.concat_name(NAME_DELIMITER)
                )
                .red()
                .to_string()];
                lines.extend(error_detail(error));
                self.write_lines(&lines)
            }
            Event::Complete => self.complete(),
            Event::Error { message } => {
                self.aborted.store(true, Ordering::Relaxed);
                self.write_lines(&[
                    "Error event while running tests:".to_string(),
                    message.clone(),
                ])
            }
        }
    }

    fn block_complete(&self, completion: &BlockCompletion) -> anyhow::Result<()> {
        let name = completion.block.concat_name(NAME_DELIMITER);

        if completion.block.disabled {
            return self.write_lines(&[format!("Disabled Block: [{}]", name).yellow().to_string()]);
        }

        let elapsed = completion.elapsed_ms();
        let time_delta = if elapsed > 1 {
            format!(" ({}ms)", elapsed)
        } else {
            String::new()
        };
        let suffix = format!("Block [{}] completed{}", name, time_delta);

        match &completion.error {
            Some(error) => {
                let mut lines = vec![format!("Test failed: {}", suffix).red().to_string()];
                lines.extend(error_detail(error));
                self.write_lines(&lines)
            }
            None => self.write_lines(&[format!("Test passed: {}", suffix).green().to_string()]),
        }
    }

    fn complete(&self) -> anyhow::Result<()> {
        let summary = self.metrics.summary();
        let prefix = format!(
            "Test run is complete. Ran {} tests in {}ms.",
            summary.tests_total,
            self.started.elapsed().as_millis()
        );

        let status = if summary.errors_total > 0 {
            format!("Failed with {} errors", summary.errors_total).red()
        } else {
            "Passed with no errors".green()
        };

        self.write_lines(&[String::new(), prefix, status.to_string()])
    }

    fn write_lines(&self, lines: &[String]) -> anyhow::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("Console reporter output lock poisoned"))?;
        for line in lines {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Reporter for ConsoleReporter {
    fn attach(self: Arc<Self>, emitter: &EventEmitter) {
        // Counters first so the summary sees the final completion.
        self.metrics.attach(emitter);

        for kind in EventKind::ALL {
            let reporter = self.clone();
            emitter.subscribe(kind, move |event| reporter.handle(event));
        }
    }

    fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    fn aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }
}
