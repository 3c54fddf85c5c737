//! Error types for the suitewalk engine.
//!
//! This module defines custom error types using `thiserror` for precise error handling.

use crate::blocks::BlockKind;
use crate::events::EventKind;
use std::fmt;
use thiserror::Error;

/// Which positional argument of a registration call was invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPosition {
    First,
}

impl fmt::Display for ArgPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "First"),
        }
    }
}

/// Caller misuse of the registration or subscription API.
///
/// These are returned synchronously at the call site and are never
/// captured or retried by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgrammerError {
    /// A registration argument had the wrong shape
    #[error("{position} argument to {function}() must be {expected}")]
    InvalidArgument {
        function: &'static str,
        position: ArgPosition,
        expected: &'static str,
    },

    /// An event name did not match any known event
    #[error("Unknown event name: {0:?}")]
    UnknownEvent(String),

    /// `run()` was called a second time on the same suite
    #[error("run() has already been called on this suite")]
    AlreadyRun,
}

impl ProgrammerError {
    pub(crate) fn invalid_argument(
        function: &'static str,
        position: ArgPosition,
        expected: &'static str,
    ) -> Self {
        Self::InvalidArgument {
            function,
            position,
            expected,
        }
    }
}

/// Failure of a single before, after or test block.
#[derive(Error, Debug)]
pub enum BlockError {
    /// The body returned or reported an error
    #[error("{0}")]
    Failed(anyhow::Error),

    /// The body panicked (typically a failed assertion)
    #[error("panicked: {0}")]
    Panicked(String),

    /// The body did not settle within its time limit
    #[error("The {kind}() block timed out in {timeout_ms}ms")]
    TimedOut { kind: BlockKind, timeout_ms: u64 },
}

impl BlockError {
    /// True when the block failed because it ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

impl From<anyhow::Error> for BlockError {
    fn from(error: anyhow::Error) -> Self {
        Self::Failed(error)
    }
}

/// Faults that escape the per-block scaffolding and terminate a run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An event handler failed while the walker was emitting
    #[error("Handler for {event} event failed: {source}")]
    Handler {
        event: EventKind,
        source: anyhow::Error,
    },
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Convenience type alias for Results with ProgrammerError
pub type RegistrationResult<T> = Result<T, ProgrammerError>;

/// Convenience type alias for Results with BlockError
pub type BlockResult<T> = Result<T, BlockError>;

/// Convenience type alias for Results with EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
