//! Commit encoder

use crate::protocol::ops::{Commit, Operation};
use crate::protocol::{
    TREE_OPERATION_ADD, TREE_OPERATION_REMOVE, TREE_OPERATION_REORDER_CHILDREN,
    TREE_OPERATION_UPDATE_OWNER, TREE_OPERATION_UPDATE_TREE_BASE_DURATION,
};
use crate::strings::StringTable;
use crate::types::{ElementType, VNodeId};
use serde::Serialize;

/// A commit together with its wire payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedCommit {
    pub commit: Commit,
    pub payload: Vec<u32>,
}

fn id_or_zero(id: Option<VNodeId>) -> u32 {
    id.unwrap_or(0)
}

/// Encode `commit` into a message.
///
/// Strings referenced by the commit are interned first so the message's
/// string section carries everything its operations point at.
pub fn encode_commit(renderer_id: u32, commit: &Commit, strings: &mut StringTable) -> Vec<u32> {
    let mut ops = Vec::new();

    let mut removed: Vec<u32> = commit.unmount_ids.clone();
    removed.extend(commit.unmount_root_id);
    if !removed.is_empty() {
        ops.push(TREE_OPERATION_REMOVE);
        ops.push(removed.len() as u32);
        ops.extend(removed);
    }

    for op in &commit.operations {
        match op {
            Operation::Add {
                id,
                parent_id,
                element_type,
                owner_id,
                display_name,
                key,
            } => {
                ops.push(TREE_OPERATION_ADD);
                ops.push(*id);
                ops.push(element_type.code());
                if *element_type == ElementType::Root {
                    // profiling supported, owner metadata present
                    ops.push(1);
                    ops.push(1);
                } else {
                    ops.push(id_or_zero(*parent_id));
                    ops.push(id_or_zero(*owner_id));
                    ops.push(strings.get_id(display_name.as_deref()));
                    ops.push(strings.get_id(key.as_deref()));
                }
            }
            Operation::Remove { id } => {
                ops.extend([TREE_OPERATION_REMOVE, 1, *id]);
            }
            Operation::ReorderChildren { id, children } => {
                ops.push(TREE_OPERATION_REORDER_CHILDREN);
                ops.push(*id);
                ops.push(children.len() as u32);
                ops.extend(children.iter().copied());
            }
            Operation::UpdateTreeBaseDuration {
                id,
                duration_micros,
            } => {
                ops.push(TREE_OPERATION_UPDATE_TREE_BASE_DURATION);
                ops.push(*id);
                ops.push(u32::try_from(*duration_micros).unwrap_or(u32::MAX));
            }
            Operation::UpdateOwner { id, owner_id } => {
                ops.push(TREE_OPERATION_UPDATE_OWNER);
                ops.push(*id);
                ops.push(id_or_zero(*owner_id));
            }
        }
    }

    let mut message = vec![renderer_id, commit.root_id];
    message.extend(strings.take_section());
    message.extend(ops);
    message
}
