//! vtree-bridge: commit-processing bridge for component-tree inspectors
//!
//! Sits between a component-tree runtime and an out-of-process inspector.
//! Every committed render is diffed against what the inspector already
//! knows and turned into a compact, incrementally decodable operations
//! stream, with optional filtering, profiling and selection tracking.

pub mod bridge;
pub mod cli;
pub mod commit;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod profiler;
pub mod protocol;
pub mod registry;
pub mod selection;
pub mod state;
pub mod strings;
pub mod tree;
pub mod types;

pub use bridge::{Bridge, BridgeHandle, HookEvent, InspectorHook, RecordingHook};
pub use error::{BridgeError, ProtocolError};
pub use tree::VNode;
pub use types::{ElementType, NodeHandle, VNodeId};
