//! Selection Tracker
//!
//! Keeps the host's selection attached to the right node while the tree
//! reshapes. A tracked path is resolved against the filtered tree after each
//! commit; when the exact node is gone the deepest node still reachable along
//! the path is reported instead.

use crate::commit::ShadowTree;
use crate::registry::VNodeRegistry;
use crate::types::VNodeId;
use serde::{Deserialize, Serialize};

/// One step of a tracked path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Position among visible siblings
    Index(usize),
    /// Display name and key, falling back to `index` when nothing matches
    Element {
        name: Option<String>,
        key: Option<String>,
        index: usize,
    },
}

/// Root-relative path: the first selector picks among the roots
pub type SelectionPath = Vec<Selector>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestMatch {
    pub id: VNodeId,
    /// Every selector matched exactly
    pub is_full_match: bool,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    path: Option<SelectionPath>,
    last_match: Option<BestMatch>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the path to follow; `None` stops tracking.
    pub fn set_tracked_path(&mut self, path: Option<SelectionPath>) {
        self.path = path.filter(|p| !p.is_empty());
        self.last_match = None;
    }

    pub fn tracked_path(&self) -> Option<&SelectionPath> {
        self.path.as_ref()
    }

    pub fn last_match(&self) -> Option<BestMatch> {
        self.last_match
    }

    /// Re-resolve the tracked path and remember the result.
    pub fn refresh(
        &mut self,
        roots: &[VNodeId],
        shadow: &ShadowTree,
        registry: &VNodeRegistry,
    ) -> Option<BestMatch> {
        self.last_match = self.get_best_match(roots, shadow, registry);
        self.last_match
    }

    /// Walk the tracked path down the visible tree.
    ///
    /// Returns `None` only when nothing is tracked or there is no root to
    /// start from; otherwise the deepest matched node.
    pub fn get_best_match(
        &self,
        roots: &[VNodeId],
        shadow: &ShadowTree,
        registry: &VNodeRegistry,
    ) -> Option<BestMatch> {
        let path = self.path.as_ref()?;
        let mut candidates: &[VNodeId] = roots;
        let mut current = None;
        let mut exact = true;

        for selector in path {
            let picked = match selector {
                Selector::Index(index) => candidates.get(*index).copied(),
                Selector::Element { name, key, index } => {
                    let by_identity = candidates.iter().copied().find(|id| {
                        registry.resolve(*id).is_some_and(|entry| {
                            entry.display_name == *name && entry.key == *key
                        })
                    });
                    match by_identity {
                        Some(id) => Some(id),
                        None => {
                            exact = false;
                            candidates.get(*index).copied()
                        }
                    }
                }
            };
            let Some(id) = picked else {
                exact = false;
                break;
            };
            current = Some(id);
            candidates = shadow.visible_children(id);
        }

        current.map(|id| BestMatch {
            id,
            is_full_match: exact,
        })
    }
}

/// Path from the roots down to visible node `id`.
pub fn path_for(
    id: VNodeId,
    roots: &[VNodeId],
    shadow: &ShadowTree,
    registry: &VNodeRegistry,
) -> Option<SelectionPath> {
    let mut path = Vec::new();
    let mut current = id;
    loop {
        let entry = registry.resolve(current)?;
        if entry.filtered {
            return None;
        }
        let (siblings, parent) = match shadow.visible_parent(current) {
            Some(parent) => (shadow.visible_children(parent), Some(parent)),
            None => (roots, None),
        };
        let index = siblings.iter().position(|sibling| *sibling == current)?;
        path.push(Selector::Element {
            name: entry.display_name.clone(),
            key: entry.key.clone(),
            index,
        });
        match parent {
            Some(parent) => current = parent,
            None => break,
        }
    }
    path.reverse();
    Some(path)
}
