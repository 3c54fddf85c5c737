//! Newline-delimited JSON output, one object per event.

use super::{Output, Reporter};
use crate::blocks::{BlockDescriptor, DescribeDescriptor};
use crate::error::BlockError;
use crate::events::{Event, EventEmitter, EventKind};
use crate::metrics::{MetricsSummary, RunMetrics};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorRecord {
    message: String,
    timed_out: bool,
}

impl From<&BlockError> for ErrorRecord {
    fn from(error: &BlockError) -> Self {
        Self {
            message: error.to_string(),
            timed_out: error.is_timeout(),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum Record<'a> {
    DescribeBlockStart {
        block: &'a DescribeDescriptor,
    },
    BlockComplete {
        block: &'a BlockDescriptor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        error: Option<ErrorRecord>,
    },
    MultipleResolves {
        block: &'a BlockDescriptor,
    },
    MultipleRejections {
        block: &'a BlockDescriptor,
        error: ErrorRecord,
    },
    Complete {
        summary: MetricsSummary,
    },
    Error {
        message: &'a str,
    },
}

/// Streams every event as a JSON line; `complete` carries the metrics summary.
pub struct JsonReporter {
    out: Mutex<Output>,
    metrics: RunMetrics,
    aborted: AtomicBool,
}

impl JsonReporter {
    pub fn new(out: Output) -> Self {
        Self {
            out: Mutex::new(out),
            metrics: RunMetrics::new(),
            aborted: AtomicBool::new(false),
        }
    }

    fn handle(&self, event: &Event) -> anyhow::Result<()> {
        let record = match event {
            Event::DescribeBlockStart { block } => Record::DescribeBlockStart { block },
            Event::BlockComplete(completion) => Record::BlockComplete {
                block: &completion.block,
                start: completion.start,
                end: completion.end,
                error: completion.error.as_ref().map(ErrorRecord::from),
            },
            Event::MultipleResolves { block } => Record::MultipleResolves { block },
            Event::MultipleRejections { block, error } => Record::MultipleRejections {
                block,
                error: error.into(),
            },
            Event::Complete => Record::Complete {
                summary: self.metrics.summary(),
            },
            Event::Error { message } => {
                self.aborted.store(true, Ordering::Relaxed);
                Record::Error { message }
            }
        };

        let line = serde_json::to_string(&record)?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("JSON reporter output lock poisoned"))?;
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }
}

impl Reporter for JsonReporter {
    fn attach(self: Arc<Self>, emitter: &EventEmitter) {
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
