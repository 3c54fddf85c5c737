//! suitewalk - a describe/it test engine with hooks, timeouts and an event stream.
//!
//! Tests are registered into a tree of describe blocks, each owning before,
//! after and test blocks. A run walks the tree depth-first, guards every body
//! with a timeout, and reports progress as events that reporters subscribe to.
//!
//! # Architecture
//!
//! - **blocks**: describe blocks, runnable blocks and the registration interface
//! - **suite**: the registry of root blocks and the walker that executes them
//! - **events**: event payloads and the emitter that delivers them
//! - **error**: programmer, block and engine error types
//! - **config**: run options and environment-driven configuration
//! - **metrics**: counters derived from the event stream
//! - **reporter**: console and JSON output built on the event stream

pub mod blocks;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod reporter;
pub mod suite;

pub use blocks::{
    BlockDescriptor, BlockInterface, BlockKind, Body, BodyKind, DescribeBlock, DescribeDescriptor,
    DescribeOptions, Done, RunnableBlock, TestResult,
};
pub use config::{Config, ReporterKind, RunOptions, DEFAULT_TIMEOUT};
pub use error::{
    ArgPosition, BlockError, BlockResult, ConfigError, EngineError, EngineResult, ProgrammerError,
    RegistrationResult,
};
pub use events::{handler, BlockCompletion, Event, EventEmitter, EventKind, Handler};
pub use metrics::{MetricsSummary, RunMetrics};
pub use reporter::{ConsoleReporter, JsonReporter, Reporter};
pub use suite::{Run, Suite};
