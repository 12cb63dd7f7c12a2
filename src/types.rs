//! Core identifier and classification types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inspector-facing node identity. Allocated from 1; 0 encodes "none" on the wire.
pub type VNodeId = u32;

/// String table identity. 0 encodes a null string on the wire.
pub type StringId = u32;

/// Runtime-side identity of a live node.
///
/// The runtime guarantees a handle stays stable for as long as the node it
/// names is mounted. Handles may be recycled by the runtime after unmount;
/// the registry never recycles the [`VNodeId`]s it hands out for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub u64);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element classification as understood by the inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Class,
    Context,
    Function,
    ForwardRef,
    Fragment,
    Host,
    Memo,
    Other,
    Profiler,
    Root,
    Suspense,
    Text,
}

impl ElementType {
    /// Numeric code used on the wire.
    pub fn code(self) -> u32 {
        match self {
            ElementType::Class => 1,
            ElementType::Context => 2,
            ElementType::Function => 5,
            ElementType::ForwardRef => 6,
            ElementType::Fragment => 7,
            ElementType::Host => 8,
            ElementType::Memo => 9,
            ElementType::Other => 10,
            ElementType::Profiler => 11,
            ElementType::Root => 12,
            ElementType::Suspense => 13,
            ElementType::Text => 14,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            1 => ElementType::Class,
            2 => ElementType::Context,
            5 => ElementType::Function,
            6 => ElementType::ForwardRef,
            7 => ElementType::Fragment,
            8 => ElementType::Host,
            9 => ElementType::Memo,
            10 => ElementType::Other,
            11 => ElementType::Profiler,
            12 => ElementType::Root,
            13 => ElementType::Suspense,
            14 => ElementType::Text,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Class => "class",
            ElementType::Context => "context",
            ElementType::Function => "function",
            ElementType::ForwardRef => "forward_ref",
            ElementType::Fragment => "fragment",
            ElementType::Host => "host",
            ElementType::Memo => "memo",
            ElementType::Other => "other",
            ElementType::Profiler => "profiler",
            ElementType::Root => "root",
            ElementType::Suspense => "suspense",
            ElementType::Text => "text",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
