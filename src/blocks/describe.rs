//! Describe blocks and the registration interface handed to user code.

use super::descriptor::{duration_ms, BlockKind, DescribeDescriptor};
use super::runnable::{Body, RunnableBlock};
use crate::error::{ArgPosition, ProgrammerError, RegistrationResult};
use std::time::Duration;

/// Options accepted by `describe_with`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescribeOptions {
    pub timeout: Option<Duration>,
    pub disabled: bool,
}

impl DescribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default timeout for every block registered under this one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable this block and everything under it.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Signature used where a describe block is declared without a body.
type NoBody = fn(&mut BlockInterface<'_>) -> RegistrationResult<()>;

/// A named node in the suite tree.
#[derive(Debug, Default)]
pub struct DescribeBlock {
    pub(crate) name_path: Vec<String>,
    pub(crate) disabled: bool,
    pub(crate) timeout: Option<Duration>,
    pub(crate) before_blocks: Vec<RunnableBlock>,
    pub(crate) after_blocks: Vec<RunnableBlock>,
    pub(crate) test_blocks: Vec<RunnableBlock>,
    pub(crate) child_blocks: Vec<DescribeBlock>,
}

impl DescribeBlock {
    pub fn new(name_path: Vec<String>) -> Self {
        Self {
            name_path,
            ..Self::default()
        }
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name_path(&self) -> &[String] {
        &self.name_path
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn before_blocks(&self) -> &[RunnableBlock] {
        &self.before_blocks
    }

    pub fn after_blocks(&self) -> &[RunnableBlock] {
        &self.after_blocks
    }

    pub fn test_blocks(&self) -> &[RunnableBlock] {
        &self.test_blocks
    }

    pub fn child_blocks(&self) -> &[DescribeBlock] {
        &self.child_blocks
    }

    pub fn descriptor(&self) -> DescribeDescriptor {
        DescribeDescriptor {
            name_path: self.name_path.clone(),
            disabled: self.disabled,
            timeout_ms: duration_ms(self.timeout),
        }
    }

    /// Number of before, after and test blocks in this subtree.
    pub fn runnable_count(&self) -> usize {
        self.before_blocks.len()
            + self.after_blocks.len()
            + self.test_blocks.len()
            + self
                .child_blocks
                .iter()
                .map(DescribeBlock::runnable_count)
                .sum::<usize>()
    }

    /// Registration functions bound to this block.
    pub fn interface(&mut self) -> BlockInterface<'_> {
        BlockInterface { block: self }
    }

    fn child_path(&self, label: &str) -> Vec<String> {
        let mut path = self.name_path.clone();
        path.push(label.to_string());
        path
    }
}

/// Registration calls available inside a describe body.
///
/// Every call is applied to the bound block immediately; nested `describe`
/// bodies run before the call returns.
#[derive(Debug)]
pub struct BlockInterface<'a> {
    block: &'a mut DescribeBlock,
}

impl BlockInterface<'_> {
    /// Register a setup hook, labelled `before[i]`.
    pub fn before(&mut self, body: Body) {
        let runnable = self.hook(BlockKind::Before, self.block.before_blocks.len(), body);
        self.block.before_blocks.push(runnable);
    }

    /// Register a teardown hook, labelled `after[i]`.
    pub fn after(&mut self, body: Body) {
        let runnable = self.hook(BlockKind::After, self.block.after_blocks.len(), body);
        self.block.after_blocks.push(runnable);
    }

    /// Register a test. Passing `None` declares a pending (disabled) test.
    pub fn it(&mut self, name: &str, body: impl Into<Option<Body>>) -> RegistrationResult<()> {
        self.add_test("it", name, body.into(), false)
    }

    /// Register an always-disabled test. The body, if any, is discarded.
    pub fn xit(&mut self, name: &str, body: impl Into<Option<Body>>) -> RegistrationResult<()> {
        self.add_test("xit", name, body.into(), true)
    }

    /// Register a nested describe block and run `f` against it right away.
    pub fn describe<F>(&mut self, name: &str, f: F) -> RegistrationResult<()>
    where
        F: FnOnce(&mut BlockInterface<'_>) -> RegistrationResult<()>,
    {
        self.add_child("describe", name, DescribeOptions::default(), Some(f), false)
    }

    pub fn describe_with<F>(&mut self, name: &str, opts: DescribeOptions, f: F) -> RegistrationResult<()>
    where
        F: FnOnce(&mut BlockInterface<'_>) -> RegistrationResult<()>,
    {
        self.add_child("describe", name, opts, Some(f), false)
    }

    /// Declare a pending describe block with no body.
    pub fn describe_pending(&mut self, name: &str) -> RegistrationResult<()> {
        self.add_child::<NoBody>("describe", name, DescribeOptions::default(), None, false)
    }

    /// Register an always-disabled describe block.
    ///
    /// `f` still runs so nested declarations show up (disabled) in the tree.
    /// A disabled describe without a body is [`BlockInterface::describe_pending`].
    pub fn xdescribe<F>(&mut self, name: &str, f: F) -> RegistrationResult<()>
    where
        F: FnOnce(&mut BlockInterface<'_>) -> RegistrationResult<()>,
    {
        self.add_child("xdescribe", name, DescribeOptions::default(), Some(f), true)
    }

    pub(crate) fn add_child<F>(
        &mut self,
        function: &'static str,
        name: &str,
        opts: DescribeOptions,
        body: Option<F>,
        force_disabled: bool,
    ) -> RegistrationResult<()>
    where
        F: FnOnce(&mut BlockInterface<'_>) -> RegistrationResult<()>,
    {
        validate_name(function, name)?;

        let disabled = self.block.disabled || opts.disabled || force_disabled || body.is_none();
        let mut child = DescribeBlock::new(self.block.child_path(name))
            .with_disabled(disabled)
            .with_timeout(opts.timeout.or(self.block.timeout));

        if let Some(f) = body {
            f(&mut child.interface())?;
        }

        self.block.child_blocks.push(child);
        Ok(())
    }

    fn add_test(
        &mut self,
        function: &'static str,
        name: &str,
        body: Option<Body>,
        force_disabled: bool,
    ) -> RegistrationResult<()> {
        validate_name(function, name)?;

        let runnable = RunnableBlock::new(BlockKind::Test, self.block.child_path(name), body)
            .inherit_timeout(self.block.timeout);
        let runnable = if self.block.disabled || force_disabled {
            runnable.disable()
        } else {
            runnable
        };

        self.block.test_blocks.push(runnable);
        Ok(())
    }

    fn hook(&self, kind: BlockKind, index: usize, body: Body) -> RunnableBlock {
        let label = format!("{}[{}]", kind, index);
        let runnable = RunnableBlock::new(kind, self.block.child_path(&label), Some(body))
            .inherit_timeout(self.block.timeout);
        if self.block.disabled {
            runnable.disable()
        } else {
            runnable
        }
    }
}

fn validate_name(function: &'static str, name: &str) -> RegistrationResult<()> {
    if name.is_empty() {
        return Err(ProgrammerError::invalid_argument(
            function,
            ArgPosition::First,
            "a non-empty string",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> DescribeBlock {
        DescribeBlock::new(vec!["parent".to_string()])
    }

    #[test]
    fn test_constructor_defaults() {
        let block = parent();
        assert_eq!(block.name_path(), ["parent".to_string()]);
        assert!(!block.is_disabled());
        assert_eq!(block.timeout(), None);
        assert!(block.before_blocks().is_empty());
        assert!(block.after_blocks().is_empty());
        assert!(block.test_blocks().is_empty());
        assert!(block.child_blocks().is_empty());
    }

    #[test]
    fn test_hooks_are_indexed_per_kind() {
        let mut block = parent();
        let mut t = block.interface();
        t.before(Body::sync(|| Ok(())));
        t.before(Body::sync(|| Ok(())));
        t.after(Body::sync(|| Ok(())));

        assert_eq!(block.before_blocks()[0].concat_name(":"), "parent:before[0]");
        assert_eq!(block.before_blocks()[1].concat_name(":"), "parent:before[1]");
        assert_eq!(block.after_blocks()[0].concat_name(":"), "parent:after[0]");
        assert_eq!(block.runnable_count(), 3);
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let mut block = parent();
        let mut t = block.interface();

        let err = t.it("", Body::sync(|| Ok(()))).unwrap_err();
        assert_eq!(err.to_string(), "First argument to it() must be a non-empty string");

        let err = t.xit("", None).unwrap_err();
        assert_eq!(err.to_string(), "First argument to xit() must be a non-empty string");

        let err = t.describe("", |_| Ok(())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "First argument to describe() must be a non-empty string"
        );

        let err = t.xdescribe("", |_| Ok(())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "First argument to xdescribe() must be a non-empty string"
        );

        assert!(block.test_blocks().is_empty());
        assert!(block.child_blocks().is_empty());
    }

    #[test]
    fn test_nested_error_propagates_out_of_describe() {
        let mut block = parent();
        let result = block.interface().describe("child", |t| {
            t.it("ok", Body::sync(|| Ok(())))?;
            t.it("", Body::sync(|| Ok(())))?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(ProgrammerError::InvalidArgument { function: "it", .. })
        ));
    }
}
