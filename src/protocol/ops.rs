//! Operation and commit types

use crate::types::{ElementType, VNodeId};
use serde::Serialize;
use std::fmt;

/// One unit of the diff protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Add {
        id: VNodeId,
        parent_id: Option<VNodeId>,
        element_type: ElementType,
        owner_id: Option<VNodeId>,
        display_name: Option<String>,
        key: Option<String>,
    },
    Remove {
        id: VNodeId,
    },
    ReorderChildren {
        id: VNodeId,
        children: Vec<VNodeId>,
    },
    UpdateTreeBaseDuration {
        id: VNodeId,
        duration_micros: u64,
    },
    UpdateOwner {
        id: VNodeId,
        owner_id: Option<VNodeId>,
    },
}

impl Operation {
    /// Node the operation applies to
    pub fn id(&self) -> VNodeId {
        match self {
            Operation::Add { id, .. }
            | Operation::Remove { id }
            | Operation::ReorderChildren { id, .. }
            | Operation::UpdateTreeBaseDuration { id, .. }
            | Operation::UpdateOwner { id, .. } => *id,
        }
    }
}

fn opt(id: &Option<VNodeId>) -> String {
    id.map_or_else(|| "null".to_string(), |id| id.to_string())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add {
                id,
                parent_id,
                element_type,
                display_name,
                key,
                ..
            } => {
                write!(f, "ADD({}, {}, {}", id, opt(parent_id), element_type)?;
                if let Some(name) = display_name {
                    write!(f, " {}", name)?;
                }
                if let Some(key) = key {
                    write!(f, " key={}", key)?;
                }
                write!(f, ")")
            }
            Operation::Remove { id } => write!(f, "REMOVE({})", id),
            Operation::ReorderChildren { id, children } => {
                write!(f, "REORDER_CHILDREN({}, {:?})", id, children)
            }
            Operation::UpdateTreeBaseDuration {
                id,
                duration_micros,
            } => write!(f, "UPDATE_TREE_BASE_DURATION({}, {})", id, duration_micros),
            Operation::UpdateOwner { id, owner_id } => {
                write!(f, "UPDATE_OWNER({}, {})", id, opt(owner_id))
            }
        }
    }
}

/// One atomic, root-scoped batch of changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub root_id: VNodeId,
    pub operations: Vec<Operation>,
    /// Removed nodes, descendants before ancestors
    pub unmount_ids: Vec<VNodeId>,
    pub unmount_root_id: Option<VNodeId>,
}

impl Commit {
    pub fn new(root_id: VNodeId) -> Self {
        Self {
            root_id,
            operations: Vec::new(),
            unmount_ids: Vec::new(),
            unmount_root_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.unmount_ids.is_empty() && self.unmount_root_id.is_none()
    }

    /// Ids added by this commit, in emission order
    pub fn added_ids(&self) -> Vec<VNodeId> {
        self.operations
            .iter()
            .filter_map(|op| match op {
                Operation::Add { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }
}
