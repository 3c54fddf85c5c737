//! Suite registry and run lifecycle.
//!
//! A [`Suite`] owns the root describe blocks registered against it. Calling
//! [`Suite::run`] hands those blocks to a [`Run`], which walks them and
//! reports through an [`EventEmitter`].
//!
//! # Example
//!
//! ```
//! use suitewalk::{Body, Event, EventKind, RunOptions, Suite};
//!
//! # tokio_test::block_on(async {
//! let mut suite = Suite::new();
//! suite
//!     .describe("math", |t| {
//!         t.it("adds", Body::sync(|| {
//!             assert_eq!(1 + 1, 2);
//!             Ok(())
//!         }))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let run = suite.run(RunOptions::default()).unwrap();
//! run.emitter().subscribe(EventKind::BlockComplete, |event| {
//!     if let Event::BlockComplete(completion) = event {
//!         assert!(completion.is_success());
//!     }
//!     Ok(())
//! });
//! run.execute().await.unwrap();
//! # });
//! ```

mod walker;

use crate::blocks::{BlockInterface, DescribeBlock, DescribeOptions};
use crate::config::RunOptions;
use crate::error::{EngineResult, ProgrammerError, RegistrationResult};
use crate::events::EventEmitter;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Caller-owned registry of root describe blocks.
#[derive(Debug, Default)]
pub struct Suite {
    root: DescribeBlock,
    run_called: bool,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root describe block and run `f` against it right away.
    pub fn describe<F>(&mut self, name: &str, f: F) -> RegistrationResult<()>
    where
        F: FnOnce(&mut BlockInterface<'_>) -> RegistrationResult<()>,
    {
        self.root.interface().describe(name, f)
    }

    pub fn describe_with<F>(&mut self, name: &str, opts: DescribeOptions, f: F) -> RegistrationResult<()>
    where
        F: FnOnce(&mut BlockInterface<'_>) -> RegistrationResult<()>,
    {
        self.root.interface().describe_with(name, opts, f)
    }

    pub fn describe_pending(&mut self, name: &str) -> RegistrationResult<()> {
        self.root.interface().describe_pending(name)
    }

    /// Register an always-disabled root block. Use [`Suite::describe_pending`]
    /// for the body-less form.
    pub fn xdescribe<F>(&mut self, name: &str, f: F) -> RegistrationResult<()>
    where
        F: FnOnce(&mut BlockInterface<'_>) -> RegistrationResult<()>,
    {
        self.root.interface().xdescribe(name, f)
    }

    pub fn root_blocks(&self) -> &[DescribeBlock] {
        self.root.child_blocks()
    }

    /// Total before, after and test blocks registered so far.
    pub fn runnable_count(&self) -> usize {
        self.root.runnable_count()
    }

    pub fn has_run(&self) -> bool {
        self.run_called
    }

    /// Hand the registered blocks to a new [`Run`].
    ///
    /// # Errors
    ///
    /// Returns `ProgrammerError::AlreadyRun` if called again before [`Suite::reset`].
    pub fn run(&mut self, options: RunOptions) -> Result<Run, ProgrammerError> {
        if self.run_called {
            return Err(ProgrammerError::AlreadyRun);
        }
        self.run_called = true;

        let roots = std::mem::take(&mut self.root.child_blocks);
        Ok(Run::new(roots, options))
    }

    /// Drop all registrations and allow another run.
    pub fn reset(&mut self) {
        self.root = DescribeBlock::default();
        self.run_called = false;
    }
}

/// A pending execution of a suite's blocks.
///
/// Subscribe to [`Run::emitter`] before calling [`Run::execute`] or
/// [`Run::spawn`]; events are delivered synchronously as the walk proceeds.
#[derive(Debug)]
pub struct Run {
    roots: Vec<DescribeBlock>,
    emitter: Arc<EventEmitter>,
    options: RunOptions,
}

impl Run {
    fn new(roots: Vec<DescribeBlock>, options: RunOptions) -> Self {
        let emitter = options
            .emitter
            .clone()
            .unwrap_or_else(|| Arc::new(EventEmitter::new()));

        Self {
            roots,
            emitter,
            options,
        }
    }

    pub fn emitter(&self) -> Arc<EventEmitter> {
        self.emitter.clone()
    }

    pub fn roots(&self) -> &[DescribeBlock] {
        &self.roots
    }

    /// Walk the tree to completion.
    ///
    /// Block failures are reported through events, never returned. An `Err`
    /// here means the walk itself was aborted (an event handler failed); the
    /// `Error` event has already been emitted.
    pub async fn execute(self) -> EngineResult<()> {
        walker::walk(self.roots, &self.emitter, &self.options).await
    }

    /// Execute on a new tokio task.
    pub fn spawn(self) -> JoinHandle<EngineResult<()>> {
        tokio::spawn(self.execute())
    }
}
