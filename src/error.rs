//! Error types for the inspector bridge.

use crate::types::VNodeId;
use thiserror::Error;

/// Errors raised while decoding or replaying an operations message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Message truncated")]
    Truncated,

    #[error("Unknown opcode: {0}")]
    UnknownOpcode(u32),

    #[error("Unknown element type code: {0}")]
    UnknownElementType(u32),

    #[error("Unknown string id: {0}")]
    UnknownString(u32),

    #[error("Invalid code point in string table: {0}")]
    InvalidCodePoint(u32),

    #[error("Node {0} added twice")]
    DuplicateId(VNodeId),

    #[error("Node {id} references missing parent {parent}")]
    DanglingParent { id: VNodeId, parent: VNodeId },

    #[error("Node {0} removed while it still has children")]
    RemovedWithChildren(VNodeId),

    #[error("Unknown node: {0}")]
    UnknownNode(VNodeId),

    #[error("Reorder of node {0} does not list its current children")]
    ChildMismatch(VNodeId),
}

/// Bridge-level errors
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Commit notification received while a commit is being processed")]
    Reentrant,

    #[error("Bridge is not attached to a host hook")]
    NotAttached,

    #[error("Invalid filter rule: {0}")]
    InvalidFilter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for BridgeError {
    fn from(err: config::ConfigError) -> Self {
        BridgeError::ConfigError(err.to_string())
    }
}
