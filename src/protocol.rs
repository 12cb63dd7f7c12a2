//! Wire Protocol
//!
//! Operations describing tree changes, their compact word encoding, and a
//! consumer-side replayer that rebuilds the tree from a message stream.
//!
//! Message layout:
//!
//! ```text
//! [renderer_id, root_id, string_words, (len, code points...)*, ops...]
//! ```
//!
//! Removals are grouped into a single `REMOVE` batch ahead of the other
//! operations, with the unmounted root (if any) listed last.

pub mod decode;
pub mod encode;
pub mod ops;

pub use decode::{decode_message, DecodedMessage, Outline, ReplayNode, TreeReplayer};
pub use encode::{encode_commit, EncodedCommit};
pub use ops::{Commit, Operation};

pub const TREE_OPERATION_ADD: u32 = 1;
pub const TREE_OPERATION_REMOVE: u32 = 2;
pub const TREE_OPERATION_REORDER_CHILDREN: u32 = 3;
pub const TREE_OPERATION_UPDATE_TREE_BASE_DURATION: u32 = 4;
pub const TREE_OPERATION_UPDATE_OWNER: u32 = 5;
