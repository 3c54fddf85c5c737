//! Lightweight, cloneable views of blocks carried in event payloads.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// The role a runnable block plays inside its describe block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Before,
    After,
    Test,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a before, after or test block as seen by event consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDescriptor {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub name_path: Vec<String>,
    pub disabled: bool,
    pub timeout_ms: Option<u64>,
}

impl BlockDescriptor {
    /// Join the name path with `delimiter`.
    pub fn concat_name(&self, delimiter: &str) -> String {
        self.name_path.join(delimiter)
    }

    /// The block's own label (last element of the name path).
    pub fn name(&self) -> &str {
        self.name_path.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for BlockDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.concat_name(":"))
    }
}

/// Identity of a describe block as seen by event consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeDescriptor {
    pub name_path: Vec<String>,
    pub disabled: bool,
    pub timeout_ms: Option<u64>,
}

impl DescribeDescriptor {
    pub fn concat_name(&self, delimiter: &str) -> String {
        self.name_path.join(delimiter)
    }
}

pub(crate) fn duration_ms(timeout: Option<Duration>) -> Option<u64> {
    timeout.map(|t| t.as_millis() as u64)
}
