//! The block hierarchy: describe blocks and the runnable blocks they own.
//!
//! - **describe**: suite tree nodes and the registration interface
//! - **runnable**: timeout-guarded execution of before/after/test bodies
//! - **descriptor**: cloneable block identities carried in events

pub mod describe;
pub mod descriptor;
pub mod runnable;

pub use describe::{BlockInterface, DescribeBlock, DescribeOptions};
pub use descriptor::{BlockDescriptor, BlockKind, DescribeDescriptor};
pub use runnable::{Body, BodyKind, Done, RunnableBlock, TestResult};
