//! A single executable unit: one before, after or test body.
//!
//! Execution is guarded by a timer and a settlement gate so that exactly one
//! outcome reaches the walker. Anything that settles after that (a callback
//! calling `done` twice, or a slow body finishing after its timeout) is
//! reported as a straggler event instead.

use super::descriptor::{duration_ms, BlockDescriptor, BlockKind};
use crate::config::RunOptions;
use crate::error::{BlockError, BlockResult};
use crate::events::{Event, EventEmitter};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What a block body returns. Any error type convertible to `anyhow::Error` works.
pub type TestResult = anyhow::Result<()>;

/// Calling convention of a [`Body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Runs to completion inline and returns its result.
    Sync,
    /// Produces a future that is driven on its own task.
    Awaitable,
    /// Receives a [`Done`] handle and settles by calling it.
    Callback,
}

enum BodyFn {
    Sync(Box<dyn FnOnce() -> TestResult + Send>),
    Awaitable(Box<dyn FnOnce() -> BoxFuture<'static, TestResult> + Send>),
    Callback(Box<dyn FnOnce(Done) + Send>),
}

impl BodyFn {
    fn kind(&self) -> BodyKind {
        match self {
            Self::Sync(_) => BodyKind::Sync,
            Self::Awaitable(_) => BodyKind::Awaitable,
            Self::Callback(_) => BodyKind::Callback,
        }
    }
}

/// The function registered for a before, after or test block.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use suitewalk::Body;
///
/// let sync = Body::sync(|| {
///     assert_eq!(2 + 2, 4);
///     Ok(())
/// });
/// let future = Body::future(|| async { Ok(()) });
/// let callback = Body::callback(|done| done.resolve()).with_timeout(Duration::from_millis(50));
/// # let _ = (sync, future, callback);
/// ```
pub struct Body {
    call: BodyFn,
    timeout: Option<Duration>,
}

impl Body {
    pub fn sync<F>(f: F) -> Self
    where
        F: FnOnce() -> TestResult + Send + 'static,
    {
        Self::from_fn(BodyFn::Sync(Box::new(f)))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        Self::from_fn(BodyFn::Awaitable(Box::new(move || f().boxed())))
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(Done) + Send + 'static,
    {
        Self::from_fn(BodyFn::Callback(Box::new(f)))
    }

    /// Override the timeout for this block only.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn kind(&self) -> BodyKind {
        self.call.kind()
    }

    fn from_fn(call: BodyFn) -> Self {
        Self {
            call,
            timeout: None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("kind", &self.kind())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Completion handle passed to callback-style bodies.
///
/// Cloneable and `Send`, so it can be moved into spawned tasks or threads.
/// Only the first call is delivered as the block's outcome.
#[derive(Clone)]
pub struct Done {
    gate: Arc<SettlementGate>,
}

impl Done {
    pub fn resolve(&self) {
        self.gate.settle(Ok(()));
    }

    pub fn reject(&self, error: impl Into<anyhow::Error>) {
        self.gate.settle(Err(BlockError::Failed(error.into())));
    }

    /// Resolve on `None`, reject on `Some(error)`.
    pub fn complete(&self, error: Option<anyhow::Error>) {
        match error {
            Some(error) => self.reject(error),
            None => self.resolve(),
        }
    }

    /// Settle from a `Result`, e.g. the output of an operation the body awaited.
    pub fn finish(&self, result: TestResult) {
        self.complete(result.err());
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("block", &self.gate.block)
            .finish()
    }
}

/// First-settlement-wins gate shared by the body, its `Done` handles and the timer.
struct SettlementGate {
    sender: Mutex<Option<oneshot::Sender<BlockResult<()>>>>,
    block: BlockDescriptor,
    emitter: Arc<EventEmitter>,
}

impl SettlementGate {
    fn new(
        sender: oneshot::Sender<BlockResult<()>>,
        block: BlockDescriptor,
        emitter: Arc<EventEmitter>,
    ) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
            block,
            emitter,
        }
    }

    fn settle(&self, outcome: BlockResult<()>) {
        match self.take_sender() {
            // A closed receiver means the run was abandoned; nobody is listening.
            Some(sender) => {
                let _ = sender.send(outcome);
            }
            None => self.report_straggler(outcome),
        }
    }

    /// Timer expiry. Silent when the block already settled.
    fn expire(&self, timeout: Duration) {
        if let Some(sender) = self.take_sender() {
            debug!(
                block = %self.block,
                timeout_ms = timeout.as_millis() as u64,
                "Block timed out"
            );
            let _ = sender.send(Err(BlockError::TimedOut {
                kind: self.block.kind,
                timeout_ms: timeout.as_millis() as u64,
            }));
        }
    }

    fn take_sender(&self) -> Option<oneshot::Sender<BlockResult<()>>> {
        self.sender.lock().ok().and_then(|mut sender| sender.take())
    }

    fn report_straggler(&self, outcome: BlockResult<()>) {
        let block = self.block.clone();
        let event = match outcome {
            Ok(()) => Event::MultipleResolves { block },
            Err(error) => Event::MultipleRejections { block, error },
        };

        debug!(block = %self.block, event = %event.kind(), "Late settlement");

        // Stragglers arrive outside the walker, so there is no caller to propagate to.
        if let Err(e) = self.emitter.emit(&event) {
            warn!(block = %self.block, error = %e, "Straggler event handler failed");
        }
    }
}

/// An executable before, after or test block owned by one describe block.
pub struct RunnableBlock {
    kind: BlockKind,
    name_path: Vec<String>,
    body: Option<BodyFn>,
    disabled: bool,
    timeout: Option<Duration>,
}

impl RunnableBlock {
    /// Create a block. A missing body makes the block disabled (pending).
    pub fn new(kind: BlockKind, name_path: Vec<String>, body: Option<Body>) -> Self {
        let (body, timeout) = match body {
            Some(body) => (Some(body.call), body.timeout),
            None => (None, None),
        };

        Self {
            kind,
            disabled: body.is_none(),
            name_path,
            body,
            timeout,
        }
    }

    /// Mark the block disabled and drop its body; it can never be re-enabled.
    pub fn disable(mut self) -> Self {
        self.disabled = true;
        self.body = None;
        self
    }

    /// Fall back to `inherited` when the body declared no timeout of its own.
    pub fn inherit_timeout(mut self, inherited: Option<Duration>) -> Self {
        self.timeout = self.timeout.or(inherited);
        self
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn name_path(&self) -> &[String] {
        &self.name_path
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Declared timeout (own override or inherited), before run options apply.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn body_kind(&self) -> Option<BodyKind> {
        self.body.as_ref().map(BodyFn::kind)
    }

    pub fn concat_name(&self, delimiter: &str) -> String {
        self.name_path.join(delimiter)
    }

    pub fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            kind: self.kind,
            name_path: self.name_path.clone(),
            disabled: self.disabled,
            timeout_ms: duration_ms(self.timeout),
        }
    }

    /// Timeout the block will actually run with under `options`.
    pub fn effective_timeout(&self, options: &RunOptions) -> Duration {
        options.resolve_timeout(self.timeout)
    }

    /// Execute the body once, returning its first settlement.
    ///
    /// Disabled blocks return `Ok(())` without starting a timer or touching
    /// the body. Later settlements are reported through `emitter` as
    /// `MultipleResolves` / `MultipleRejections`.
    pub async fn run(self, emitter: &Arc<EventEmitter>, options: &RunOptions) -> BlockResult<()> {
        if self.disabled {
            return Ok(());
        }

        let timeout = self.effective_timeout(options);
        let descriptor = self.descriptor();
        let Some(body) = self.body else {
            return Ok(());
        };

        let (sender, mut receiver) = oneshot::channel();
        let gate = Arc::new(SettlementGate::new(sender, descriptor, emitter.clone()));

        let timer = tokio::time::sleep(timeout);
        tokio::pin!(timer);

        invoke(body, &gate);

        let outcome = tokio::select! {
            biased;
            outcome = &mut receiver => outcome,
            _ = &mut timer => {
                gate.expire(timeout);
                receiver.await
            }
        };

        outcome.unwrap_or_else(|_| {
            Err(BlockError::Failed(anyhow::anyhow!(
                "Block settlement channel closed"
            )))
        })
    }
}

impl fmt::Debug for RunnableBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableBlock")
            .field("kind", &self.kind)
            .field("name_path", &self.name_path)
            .field("body", &self.body_kind())
            .field("disabled", &self.disabled)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn invoke(body: BodyFn, gate: &Arc<SettlementGate>) {
    match body {
        BodyFn::Sync(f) => {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(result) => result.map_err(BlockError::Failed),
                Err(payload) => Err(BlockError::Panicked(panic_message(payload))),
            };
            gate.settle(outcome);
        }
        BodyFn::Awaitable(f) => match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(future) => {
                let gate = gate.clone();
                tokio::spawn(async move {
                    let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                        Ok(result) => result.map_err(BlockError::Failed),
                        Err(payload) => Err(BlockError::Panicked(panic_message(payload))),
                    };
                    gate.settle(outcome);
                });
            }
            Err(payload) => gate.settle(Err(BlockError::Panicked(panic_message(payload)))),
        },
        BodyFn::Callback(f) => {
            let done = Done { gate: gate.clone() };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || f(done))) {
                gate.settle(Err(BlockError::Panicked(panic_message(payload))));
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_body_is_pending() {
        let block = RunnableBlock::new(BlockKind::Test, path(&["A", "todo"]), None);
        assert!(block.is_disabled());
        assert!(!block.has_body());
        assert_eq!(block.body_kind(), None);
    }

    #[test]
    fn test_disable_drops_body() {
        let block = RunnableBlock::new(
            BlockKind::Before,
            path(&["A", "before[0]"]),
            Some(Body::sync(|| Ok(()))),
        )
        .disable();
        assert!(block.is_disabled());
        assert!(!block.has_body());
    }

    #[test]
    fn test_body_timeout_wins_over_inherited() {
        let body = Body::callback(|done| done.resolve()).with_timeout(Duration::from_millis(20));
        let block = RunnableBlock::new(BlockKind::Test, path(&["A", "x"]), Some(body))
            .inherit_timeout(Some(Duration::from_millis(500)));
        assert_eq!(block.timeout(), Some(Duration::from_millis(20)));
        assert_eq!(block.body_kind(), Some(BodyKind::Callback));

        let block = RunnableBlock::new(BlockKind::Test, path(&["A", "y"]), Some(Body::sync(|| Ok(()))))
            .inherit_timeout(Some(Duration::from_millis(500)));
        assert_eq!(block.timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_effective_timeout_precedence() {
        let declared = RunnableBlock::new(BlockKind::Test, path(&["x"]), Some(Body::sync(|| Ok(()))))
            .inherit_timeout(Some(Duration::from_millis(40)));
        let undeclared = RunnableBlock::new(BlockKind::Test, path(&["y"]), Some(Body::sync(|| Ok(()))));

        let global = RunOptions::new().with_timeout(Duration::from_millis(900));
        assert_eq!(declared.effective_timeout(&global), Duration::from_millis(40));
        assert_eq!(undeclared.effective_timeout(&global), Duration::from_millis(900));
        assert_eq!(
            undeclared.effective_timeout(&RunOptions::default()),
            crate::config::DEFAULT_TIMEOUT
        );
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload = panic::catch_unwind(|| panic!("assertion failed: left == right")).unwrap_err();
        assert_eq!(panic_message(payload), "assertion failed: left == right");

        let payload = panic::catch_unwind(|| panic!("{} != {}", 1, 2)).unwrap_err();
        assert_eq!(panic_message(payload), "1 != 2");
    }
}
