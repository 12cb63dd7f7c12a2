//! Pre-order walker over a runtime tree snapshot

use crate::tree::node::VNode;
use crate::types::NodeHandle;
use std::collections::HashSet;

/// Snapshot walker
pub struct Walker<'a> {
    root: &'a VNode,
}

impl<'a> Walker<'a> {
    pub fn new(root: &'a VNode) -> Self {
        Self { root }
    }

    /// Every node in pre-order, the root first.
    ///
    /// Iterative so that deeply nested trees cannot overflow the stack.
    pub fn walk(&self) -> Vec<&'a VNode> {
        let mut nodes = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children.iter().rev());
        }
        nodes
    }

    /// Collect every handle in the tree.
    ///
    /// Returns the set along with any handles that occur more than once,
    /// which is a runtime contract violation.
    pub fn handles(&self) -> (HashSet<NodeHandle>, Vec<NodeHandle>) {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for node in self.walk() {
            if !seen.insert(node.handle) {
                duplicates.push(node.handle);
            }
        }
        (seen, duplicates)
    }
}
