//! Message decoder and tree replayer
//!
//! The replayer is the inspector's side of the protocol: it never sees the
//! runtime tree, only the message stream, and rejects any sequence that would
//! leave a dangling parent reference.

use crate::error::ProtocolError;
use crate::filter::FilterSet;
use crate::protocol::ops::Operation;
use crate::protocol::{
    TREE_OPERATION_ADD, TREE_OPERATION_REMOVE, TREE_OPERATION_REORDER_CHILDREN,
    TREE_OPERATION_UPDATE_OWNER, TREE_OPERATION_UPDATE_TREE_BASE_DURATION,
};
use crate::strings::StringTable;
use crate::tree::VNode;
use crate::types::{ElementType, VNodeId};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

/// Decoded form of one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub renderer_id: u32,
    pub root_id: VNodeId,
    pub operations: Vec<Operation>,
}

struct Cursor<'a> {
    words: &'a [u32],
    pos: usize,
}

impl Cursor<'_> {
    fn next(&mut self) -> Result<u32, ProtocolError> {
        let word = *self.words.get(self.pos).ok_or(ProtocolError::Truncated)?;
        self.pos += 1;
        Ok(word)
    }

    fn take(&mut self, n: usize) -> Result<&[u32], ProtocolError> {
        let slice = self
            .words
            .get(self.pos..self.pos + n)
            .ok_or(ProtocolError::Truncated)?;
        self.pos += n;
        Ok(slice)
    }

    fn done(&self) -> bool {
        self.pos >= self.words.len()
    }
}

fn non_zero(word: u32) -> Option<VNodeId> {
    (word != 0).then_some(word)
}

fn string_at(strings: &StringTable, id: u32) -> Result<Option<String>, ProtocolError> {
    if id == 0 {
        return Ok(None);
    }
    strings
        .lookup(id)
        .map(|s| Some(s.to_string()))
        .ok_or(ProtocolError::UnknownString(id))
}

/// Decode one message, appending its string section to `strings`.
pub fn decode_message(
    words: &[u32],
    strings: &mut StringTable,
) -> Result<DecodedMessage, ProtocolError> {
    let mut cursor = Cursor { words, pos: 0 };
    let renderer_id = cursor.next()?;
    let root_id = cursor.next()?;
    let consumed = strings.extend_from_section(&words[cursor.pos..])?;
    cursor.pos += consumed;

    let mut operations = Vec::new();
    while !cursor.done() {
        match cursor.next()? {
            TREE_OPERATION_ADD => {
                let id = cursor.next()?;
                let code = cursor.next()?;
                let element_type =
                    ElementType::from_code(code).ok_or(ProtocolError::UnknownElementType(code))?;
                if element_type == ElementType::Root {
                    cursor.take(2)?;
                    operations.push(Operation::Add {
                        id,
                        parent_id: None,
                        element_type,
                        owner_id: None,
                        display_name: None,
                        key: None,
                    });
                } else {
                    let parent = cursor.next()?;
                    let owner = cursor.next()?;
                    let name = cursor.next()?;
                    let key = cursor.next()?;
                    operations.push(Operation::Add {
                        id,
                        parent_id: non_zero(parent),
                        element_type,
                        owner_id: non_zero(owner),
                        display_name: string_at(strings, name)?,
                        key: string_at(strings, key)?,
                    });
                }
            }
            TREE_OPERATION_REMOVE => {
                let count = cursor.next()? as usize;
                for id in cursor.take(count)? {
                    operations.push(Operation::Remove { id: *id });
                }
            }
            TREE_OPERATION_REORDER_CHILDREN => {
                let id = cursor.next()?;
                let count = cursor.next()? as usize;
                let children = cursor.take(count)?.to_vec();
                operations.push(Operation::ReorderChildren { id, children });
            }
            TREE_OPERATION_UPDATE_TREE_BASE_DURATION => {
                let id = cursor.next()?;
                let duration = cursor.next()?;
                operations.push(Operation::UpdateTreeBaseDuration {
                    id,
                    duration_micros: u64::from(duration),
                });
            }
            TREE_OPERATION_UPDATE_OWNER => {
                let id = cursor.next()?;
                let owner = cursor.next()?;
                operations.push(Operation::UpdateOwner {
                    id,
                    owner_id: non_zero(owner),
                });
            }
            other => return Err(ProtocolError::UnknownOpcode(other)),
        }
    }

    Ok(DecodedMessage {
        renderer_id,
        root_id,
        operations,
    })
}

/// A node as the inspector knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayNode {
    pub id: VNodeId,
    pub element_type: ElementType,
    pub parent: Option<VNodeId>,
    pub owner: Option<VNodeId>,
    pub display_name: Option<String>,
    pub key: Option<String>,
    pub children: Vec<VNodeId>,
    pub tree_base_duration: u64,
}

/// Structural outline of a subtree, used to compare trees independent of ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    pub element_type: ElementType,
    pub display_name: Option<String>,
    pub key: Option<String>,
    pub children: Vec<Outline>,
}

impl Outline {
    /// The view an inspector should end up with for `root` under `filters`.
    pub fn expected(root: &VNode, filters: &FilterSet) -> Outline {
        fn visible_children(node: &VNode, filters: &FilterSet, out: &mut Vec<Outline>) {
            for child in &node.children {
                if filters.allows(
                    child.element_type,
                    child.display_name(),
                    child.source.as_deref(),
                ) {
                    let mut grand = Vec::new();
                    visible_children(child, filters, &mut grand);
                    out.push(Outline {
                        element_type: child.element_type,
                        display_name: child.display_name().map(str::to_string),
                        key: child.key.clone(),
                        children: grand,
                    });
                } else {
                    visible_children(child, filters, out);
                }
            }
        }

        let mut children = Vec::new();
        visible_children(root, filters, &mut children);
        Outline {
            element_type: root.element_type,
            display_name: root.display_name().map(str::to_string),
            key: if root.is_root() { None } else { root.key.clone() },
            children,
        }
    }

    /// Total number of nodes in the outline
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Outline::size).sum::<usize>()
    }
}

/// Consumer-side tree rebuilt purely from messages
#[derive(Debug, Default)]
pub struct TreeReplayer {
    strings: StringTable,
    nodes: HashMap<VNodeId, ReplayNode>,
    roots: Vec<VNodeId>,
    /// Every id ever added, to detect reuse
    seen: HashSet<VNodeId>,
}

impl TreeReplayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and apply one message.
    pub fn apply(&mut self, words: &[u32]) -> Result<DecodedMessage, ProtocolError> {
        let message = decode_message(words, &mut self.strings)?;
        for op in &message.operations {
            self.apply_operation(op)?;
        }
        Ok(message)
    }

    /// Apply a single operation, validating structure.
    pub fn apply_operation(&mut self, op: &Operation) -> Result<(), ProtocolError> {
        match op {
            Operation::Add {
                id,
                parent_id,
                element_type,
                owner_id,
                display_name,
                key,
            } => {
                if self.nodes.contains_key(id) {
                    return Err(ProtocolError::DuplicateId(*id));
                }
                match parent_id {
                    Some(parent) => {
                        let parent_node =
                            self.nodes
                                .get_mut(parent)
                                .ok_or(ProtocolError::DanglingParent {
                                    id: *id,
                                    parent: *parent,
                                })?;
                        parent_node.children.push(*id);
                    }
                    None => self.roots.push(*id),
                }
                self.seen.insert(*id);
                self.nodes.insert(
                    *id,
                    ReplayNode {
                        id: *id,
                        element_type: *element_type,
                        parent: *parent_id,
                        owner: *owner_id,
                        display_name: display_name.clone(),
                        key: key.clone(),
                        children: Vec::new(),
                        tree_base_duration: 0,
                    },
                );
            }
            Operation::Remove { id } => {
                let node = self.nodes.get(id).ok_or(ProtocolError::UnknownNode(*id))?;
                if !node.children.is_empty() {
                    return Err(ProtocolError::RemovedWithChildren(*id));
                }
                let parent = node.parent;
                self.nodes.remove(id);
                match parent {
                    Some(parent) => {
                        if let Some(parent_node) = self.nodes.get_mut(&parent) {
                            parent_node.children.retain(|child| child != id);
                        }
                    }
                    None => self.roots.retain(|root| root != id),
                }
            }
            Operation::ReorderChildren { id, children } => {
                let node = self
                    .nodes
                    .get_mut(id)
                    .ok_or(ProtocolError::UnknownNode(*id))?;
                let mut current = node.children.clone();
                let mut proposed = children.clone();
                current.sort_unstable();
                proposed.sort_unstable();
                if current != proposed {
                    return Err(ProtocolError::ChildMismatch(*id));
                }
                node.children = children.clone();
            }
            Operation::UpdateTreeBaseDuration {
                id,
                duration_micros,
            } => {
                let node = self
                    .nodes
                    .get_mut(id)
                    .ok_or(ProtocolError::UnknownNode(*id))?;
                node.tree_base_duration = *duration_micros;
            }
            Operation::UpdateOwner { id, owner_id } => {
                let node = self
                    .nodes
                    .get_mut(id)
                    .ok_or(ProtocolError::UnknownNode(*id))?;
                node.owner = *owner_id;
            }
        }
        Ok(())
    }

    pub fn node(&self, id: VNodeId) -> Option<&ReplayNode> {
        self.nodes.get(&id)
    }

    pub fn children(&self, id: VNodeId) -> &[VNodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn roots(&self) -> &[VNodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` was ever added during this replay
    pub fn has_seen(&self, id: VNodeId) -> bool {
        self.seen.contains(&id)
    }

    pub fn outline(&self, id: VNodeId) -> Option<Outline> {
        let node = self.nodes.get(&id)?;
        Some(Outline {
            element_type: node.element_type,
            display_name: node.display_name.clone(),
            key: node.key.clone(),
            children: node
                .children
                .iter()
                .filter_map(|child| self.outline(*child))
                .collect(),
        })
    }

    /// Indented text rendering of every root
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.render_node(*root, 0, &mut out);
        }
        out
    }

    fn render_node(&self, id: VNodeId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let name = node
            .display_name
            .clone()
            .unwrap_or_else(|| node.element_type.to_string());
        let _ = write!(out, "{}{} [{}]", "  ".repeat(depth), name, id);
        if let Some(key) = &node.key {
            let _ = write!(out, " key={}", key);
        }
        out.push('\n');
        for child in &node.children {
            self.render_node(*child, depth + 1, out);
        }
    }
}
