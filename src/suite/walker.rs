//! Depth-first executor for a tree of describe blocks.
//!
//! Per block: start event, before hooks (halting on the first failure),
//! tests, children, then after hooks unconditionally. Every runnable is
//! awaited to full settlement before the next one starts.

use crate::blocks::{DescribeBlock, RunnableBlock};
use crate::config::RunOptions;
use crate::error::EngineResult;
use crate::events::{BlockCompletion, Event, EventEmitter};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Walk every root in order, then emit `Complete`.
///
/// Any walker fault, including a failing `Complete` handler, is followed by
/// an `Error` event before it is returned.
pub(crate) async fn walk(
    roots: Vec<DescribeBlock>,
    emitter: &Arc<EventEmitter>,
    options: &RunOptions,
) -> EngineResult<()> {
    let started = Instant::now();
    info!(root_blocks = roots.len(), "Starting test run");

    let mut outcome = Ok(());
    for root in roots {
        outcome = walk_block(root, emitter, options).await;
        if outcome.is_err() {
            break;
        }
    }

    let outcome = outcome.and_then(|()| {
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Test run complete"
        );
        emitter.emit(&Event::Complete)
    });

    if let Err(error) = &outcome {
        warn!(error = %error, "Test run aborted");
        let event = Event::Error {
            message: error.to_string(),
        };
        if let Err(e) = emitter.emit(&event) {
            warn!(error = %e, "Error event handler failed");
        }
    }

    outcome
}

fn walk_block<'a>(
    block: DescribeBlock,
    emitter: &'a Arc<EventEmitter>,
    options: &'a RunOptions,
) -> BoxFuture<'a, EngineResult<()>> {
    async move {
        let descriptor = block.descriptor();
        let DescribeBlock {
            before_blocks,
            after_blocks,
            test_blocks,
            child_blocks,
            ..
        } = block;

        debug!(
            block = %descriptor.concat_name(":"),
            disabled = descriptor.disabled,
            "Entering describe block"
        );
        emitter.emit(&Event::DescribeBlockStart {
            block: descriptor.clone(),
        })?;

        let mut halted = false;
        for hook in before_blocks {
            if !run_block(hook, emitter, options).await? {
                warn!(
                    block = %descriptor.concat_name(":"),
                    "Before hook failed, skipping tests and nested blocks"
                );
                halted = true;
                break;
            }
        }

        if !halted {
            for test in test_blocks {
                run_block(test, emitter, options).await?;
            }

            for child in child_blocks {
                walk_block(child, emitter, options).await?;
            }
        }

        for hook in after_blocks {
            run_block(hook, emitter, options).await?;
        }

        Ok(())
    }
    .boxed()
}

/// Run one block and emit its completion. Returns whether it succeeded.
async fn run_block(
    block: RunnableBlock,
    emitter: &Arc<EventEmitter>,
    options: &RunOptions,
) -> EngineResult<bool> {
    let descriptor = block.descriptor();
    let start = Utc::now();
    let result = block.run(emitter, options).await;
    let end = Utc::now();

    let completion = BlockCompletion {
        block: descriptor,
        start,
        end,
        error: result.err(),
    };
    let passed = completion.is_success();

    debug!(
        block = %completion.block,
        kind = %completion.block.kind,
        disabled = completion.block.disabled,
        passed = passed,
        elapsed_ms = completion.elapsed_ms(),
        "Block complete"
    );

    emitter.emit(&Event::BlockComplete(completion))?;
    Ok(passed)
}
