//! VNode Registry
//!
//! Owns node identity. Maps runtime handles to inspector ids and keeps one
//! entry per mounted node with its raw (unfiltered) structure. Relationships
//! are stored as ids, never as references into the runtime tree.

use crate::tree::VNode;
use crate::types::{ElementType, NodeHandle, VNodeId};
use std::collections::HashMap;
use tracing::trace;

/// Registry record for one mounted node
#[derive(Debug, Clone, PartialEq)]
pub struct VNodeEntry {
    pub id: VNodeId,
    pub handle: NodeHandle,
    pub element_type: ElementType,
    pub display_name: Option<String>,
    pub key: Option<String>,
    pub source: Option<String>,
    pub owner: Option<VNodeId>,
    /// Raw parent, including hidden nodes
    pub parent: Option<VNodeId>,
    /// Raw children in runtime order
    pub children: Vec<VNodeId>,
    /// Hidden from the inspector by the active filters
    pub filtered: bool,
    pub root: VNodeId,
}

#[derive(Debug)]
pub struct VNodeRegistry {
    by_handle: HashMap<NodeHandle, VNodeId>,
    entries: HashMap<VNodeId, VNodeEntry>,
    next_id: VNodeId,
}

impl Default for VNodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VNodeRegistry {
    pub fn new() -> Self {
        Self {
            by_handle: HashMap::new(),
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    /// Return the id for `node`, allocating one on first sight.
    ///
    /// Ids are never handed out twice, even after release.
    pub fn assign_id(&mut self, node: &VNode) -> VNodeId {
        if let Some(id) = self.by_handle.get(&node.handle) {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.by_handle.insert(node.handle, id);
        self.entries.insert(
            id,
            VNodeEntry {
                id,
                handle: node.handle,
                element_type: node.element_type,
                display_name: node.display_name().map(str::to_string),
                key: node.key.clone(),
                source: node.source.clone(),
                owner: None,
                parent: None,
                children: Vec::new(),
                filtered: false,
                root: id,
            },
        );
        trace!(id, handle = %node.handle, "Assigned node id");
        id
    }

    pub fn id_of(&self, handle: NodeHandle) -> Option<VNodeId> {
        self.by_handle.get(&handle).copied()
    }

    /// Look up a live entry. Unknown or released ids yield `None`.
    pub fn resolve(&self, id: VNodeId) -> Option<&VNodeEntry> {
        self.entries.get(&id)
    }

    pub fn resolve_mut(&mut self, id: VNodeId) -> Option<&mut VNodeEntry> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: VNodeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Drop the entry for `id`. The id itself stays retired.
    pub fn release(&mut self, id: VNodeId) -> Option<VNodeEntry> {
        let entry = self.entries.remove(&id)?;
        if self.by_handle.get(&entry.handle) == Some(&id) {
            self.by_handle.remove(&entry.handle);
        }
        trace!(id, "Released node id");
        Some(entry)
    }

    /// Live ids in the subtree rooted at `id`, descendants before ancestors.
    pub fn post_order(&self, id: VNodeId) -> Vec<VNodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        // (node, children expanded)
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current);
                continue;
            }
            stack.push((current, true));
            if let Some(entry) = self.entries.get(&current) {
                for child in entry.children.iter().rev() {
                    if self.contains(*child) {
                        stack.push((*child, false));
                    }
                }
            }
        }
        out
    }

    /// Live ids in the subtree rooted at `id`, parents before children.
    pub fn pre_order(&self, id: VNodeId) -> Vec<VNodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(entry) = self.entries.get(&current) {
                stack.extend(
                    entry
                        .children
                        .iter()
                        .rev()
                        .filter(|child| self.contains(**child)),
                );
            }
        }
        out
    }

    /// First unfiltered node along the owner chain starting at `owner`.
    pub fn visible_owner(&self, owner: Option<VNodeId>) -> Option<VNodeId> {
        let mut current = owner;
        let mut hops = 0;
        while let Some(id) = current {
            let entry = self.entries.get(&id)?;
            if !entry.filtered {
                return Some(id);
            }
            hops += 1;
            if hops > self.entries.len() {
                return None;
            }
            current = entry.owner;
        }
        None
    }

    /// Visible owners of `id`, nearest first.
    pub fn owners_of(&self, id: VNodeId) -> Vec<VNodeId> {
        let mut owners = Vec::new();
        let Some(entry) = self.entries.get(&id) else {
            return owners;
        };
        let mut next = self.visible_owner(entry.owner);
        while let Some(owner) = next {
            // owner chains are acyclic in a well-formed tree
            if owners.contains(&owner) || owner == id {
                break;
            }
            owners.push(owner);
            next = self
                .entries
                .get(&owner)
                .and_then(|entry| self.visible_owner(entry.owner));
        }
        owners
    }

    /// Highest id allocated so far (0 when none).
    pub fn last_id(&self) -> VNodeId {
        self.next_id - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
