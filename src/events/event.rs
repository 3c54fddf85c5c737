//! Lifecycle events emitted while walking a suite.

use crate::blocks::{BlockDescriptor, DescribeDescriptor};
use crate::error::{BlockError, ProgrammerError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Tag identifying an [`Event`] variant; the key handlers are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    DescribeBlockStart,
    BlockComplete,
    MultipleResolves,
    MultipleRejections,
    Complete,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::DescribeBlockStart,
        EventKind::BlockComplete,
        EventKind::MultipleResolves,
        EventKind::MultipleRejections,
        EventKind::Complete,
        EventKind::Error,
    ];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DescribeBlockStart => "describeBlockStart",
            Self::BlockComplete => "blockComplete",
            Self::MultipleResolves => "multipleResolves",
            Self::MultipleRejections => "multipleRejections",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ProgrammerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProgrammerError::UnknownEvent(s.to_string()))
    }
}

/// Outcome of one before, after or test execution.
#[derive(Debug)]
pub struct BlockCompletion {
    pub block: BlockDescriptor,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub error: Option<BlockError>,
}

impl BlockCompletion {
    /// Wall-clock milliseconds between start and end.
    pub fn elapsed_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Every payload the walker can emit.
///
/// Handlers receive a shared reference; all handlers for one emit see the
/// same value.
#[derive(Debug)]
pub enum Event {
    /// A describe block is about to run its hooks, tests and children.
    DescribeBlockStart { block: DescribeDescriptor },

    /// A before, after or test block finished (successfully or not).
    BlockComplete(BlockCompletion),

    /// A block resolved again after its outcome was already delivered.
    MultipleResolves { block: BlockDescriptor },

    /// A block rejected again after its outcome was already delivered.
    MultipleRejections {
        block: BlockDescriptor,
        error: BlockError,
    },

    /// The whole tree has been walked.
    Complete,

    /// The walker hit a fault and stopped.
    Error { message: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DescribeBlockStart { .. } => EventKind::DescribeBlockStart,
            Self::BlockComplete(_) => EventKind::BlockComplete,
            Self::MultipleResolves { .. } => EventKind::MultipleResolves,
            Self::MultipleRejections { .. } => EventKind::MultipleRejections,
            Self::Complete => EventKind::Complete,
            Self::Error { .. } => EventKind::Error,
        }
    }
}
