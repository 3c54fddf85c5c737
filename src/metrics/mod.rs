//! Run metrics derived from lifecycle events.
//!
//! Provides counters for test outcomes, hook failures, timeouts and late
//! settlements, plus total block duration.

use crate::blocks::BlockKind;
use crate::events::{BlockCompletion, Event, EventEmitter, EventKind};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for one or more runs.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    /// Test blocks completed (including disabled ones)
    tests_total: Arc<AtomicU64>,

    /// Test blocks that completed without error
    tests_passed: Arc<AtomicU64>,

    /// Test blocks that completed with an error
    tests_failed: Arc<AtomicU64>,

    /// Disabled or pending test blocks
    tests_disabled: Arc<AtomicU64>,

    /// Before/after hooks that completed with an error
    hooks_failed: Arc<AtomicU64>,

    /// Completions whose error was a timeout
    timeouts_total: Arc<AtomicU64>,

    /// MultipleResolves and MultipleRejections events
    stragglers_total: Arc<AtomicU64>,

    /// Sum of wall-clock block durations in milliseconds
    block_duration_total_ms: Arc<AtomicU64>,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            tests_total: Arc::new(AtomicU64::new(0)),
            tests_passed: Arc::new(AtomicU64::new(0)),
            tests_failed: Arc::new(AtomicU64::new(0)),
            tests_disabled: Arc::new(AtomicU64::new(0)),
            hooks_failed: Arc::new(AtomicU64::new(0)),
            timeouts_total: Arc::new(AtomicU64::new(0)),
            stragglers_total: Arc::new(AtomicU64::new(0)),
            block_duration_total_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to the events this collector counts.
    pub fn attach(&self, emitter: &EventEmitter) {
        let metrics = self.clone();
        emitter.subscribe(EventKind::BlockComplete, move |event| {
            if let Event::BlockComplete(completion) = event {
                metrics.record_completion(completion);
            }
            Ok(())
        });

        for kind in [EventKind::MultipleResolves, EventKind::MultipleRejections] {
            let metrics = self.clone();
            emitter.subscribe(kind, move |_| {
                metrics.record_straggler();
                Ok(())
            });
        }
    }

    /// Record a before, after or test completion.
    pub fn record_completion(&self, completion: &BlockCompletion) {
        let elapsed = completion.elapsed_ms().max(0) as u64;
        self.block_duration_total_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        if let Some(error) = &completion.error {
            if error.is_timeout() {
                self.timeouts_total.fetch_add(1, Ordering::Relaxed);
            }
        }

        match completion.block.kind {
            BlockKind::Test => {
                self.tests_total.fetch_add(1, Ordering::Relaxed);
                if completion.block.disabled {
                    self.tests_disabled.fetch_add(1, Ordering::Relaxed);
                } else if completion.is_success() {
                    self.tests_passed.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.tests_failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            BlockKind::Before | BlockKind::After => {
                if !completion.is_success() {
                    self.hooks_failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        tracing::trace!(
            block = %completion.block,
            elapsed_ms = elapsed,
            "Completion recorded"
        );
    }

    /// Record a late settlement.
    pub fn record_straggler(&self) {
        self.stragglers_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tests_total(&self) -> u64 {
        self.tests_total.load(Ordering::Relaxed)
    }

    pub fn tests_passed(&self) -> u64 {
        self.tests_passed.load(Ordering::Relaxed)
    }

    pub fn tests_failed(&self) -> u64 {
        self.tests_failed.load(Ordering::Relaxed)
    }

    pub fn tests_disabled(&self) -> u64 {
        self.tests_disabled.load(Ordering::Relaxed)
    }

    pub fn hooks_failed(&self) -> u64 {
        self.hooks_failed.load(Ordering::Relaxed)
    }

    pub fn timeouts_total(&self) -> u64 {
        self.timeouts_total.load(Ordering::Relaxed)
    }

    pub fn stragglers_total(&self) -> u64 {
        self.stragglers_total.load(Ordering::Relaxed)
    }

    pub fn block_duration_total_ms(&self) -> u64 {
        self.block_duration_total_ms.load(Ordering::Relaxed)
    }

    /// Every reported error: failed tests, failed hooks and late settlements.
    pub fn errors_total(&self) -> u64 {
        self.tests_failed() + self.hooks_failed() + self.stragglers_total()
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.tests_total.store(0, Ordering::Relaxed);
        self.tests_passed.store(0, Ordering::Relaxed);
        self.tests_failed.store(0, Ordering::Relaxed);
        self.tests_disabled.store(0, Ordering::Relaxed);
        self.hooks_failed.store(0, Ordering::Relaxed);
        self.timeouts_total.store(0, Ordering::Relaxed);
        self.stragglers_total.store(0, Ordering::Relaxed);
        self.block_duration_total_ms.store(0, Ordering::Relaxed);
    }

    /// Get a summary of all metrics.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            tests_total: self.tests_total(),
            tests_passed: self.tests_passed(),
            tests_failed: self.tests_failed(),
            tests_disabled: self.tests_disabled(),
            hooks_failed: self.hooks_failed(),
            timeouts_total: self.timeouts_total(),
            stragglers_total: self.stragglers_total(),
            errors_total: self.errors_total(),
            block_duration_total_ms: self.block_duration_total_ms(),
        }
    }
}

/// A snapshot of metrics values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub tests_total: u64,
    pub tests_passed: u64,
    pub tests_failed: u64,
    pub tests_disabled: u64,
    pub hooks_failed: u64,
    pub timeouts_total: u64,
    pub stragglers_total: u64,
    pub errors_total: u64,
    pub block_duration_total_ms: u64,
}

impl MetricsSummary {
    pub fn is_success(&self) -> bool {
        self.errors_total == 0
    }
}
