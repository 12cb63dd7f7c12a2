//! Snapshot of a runtime node as seen at commit time

use crate::types::{ElementType, NodeHandle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One node of the runtime tree at commit time.
///
/// `render_duration` is the node's own render cost in microseconds for the
/// commit being reported, excluding its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VNode {
    pub handle: NodeHandle,
    pub element_type: ElementType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    /// Source file the component was declared in, if the runtime knows it
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub owner: Option<NodeHandle>,
    #[serde(default)]
    pub render_duration: u64,
    #[serde(default)]
    pub props: BTreeMap<String, Value>,
    #[serde(default)]
    pub state: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: Vec<VNode>,
}

impl VNode {
    pub fn new(handle: u64, element_type: ElementType) -> Self {
        Self {
            handle: NodeHandle(handle),
            element_type,
            name: None,
            key: None,
            source: None,
            owner: None,
            render_duration: 0,
            props: BTreeMap::new(),
            state: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// A root container node
    pub fn root(handle: u64) -> Self {
        Self::new(handle, ElementType::Root)
    }

    /// A function component with the given display name
    pub fn component(handle: u64, name: &str) -> Self {
        Self::new(handle, ElementType::Function).named(name)
    }

    /// A host element (e.g. `div`)
    pub fn host(handle: u64, tag: &str) -> Self {
        Self::new(handle, ElementType::Host).named(tag)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_owner(mut self, owner: u64) -> Self {
        self.owner = Some(NodeHandle(owner));
        self
    }

    pub fn with_duration(mut self, micros: u64) -> Self {
        self.render_duration = micros;
        self
    }

    pub fn with_prop(mut self, key: &str, value: Value) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }

    pub fn with_state(mut self, key: &str, value: Value) -> Self {
        self.state.insert(key.to_string(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children = children;
        self
    }

    pub fn push_child(&mut self, child: VNode) {
        self.children.push(child);
    }

    /// Name shown by the inspector.
    pub fn display_name(&self) -> Option<&str> {
        match self.element_type {
            ElementType::Root => None,
            _ => self.name.as_deref(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.element_type == ElementType::Root
    }

    /// Find a descendant (or self) by handle
    pub fn find(&self, handle: NodeHandle) -> Option<&VNode> {
        if self.handle == handle {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(handle))
    }

    /// Mutable variant of [`VNode::find`], used by runtimes and tests to
    /// mutate their tree between commits.
    pub fn find_mut(&mut self, handle: NodeHandle) -> Option<&mut VNode> {
        if self.handle == handle {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(handle))
    }

    /// Detach and return the child subtree with the given handle.
    pub fn remove_descendant(&mut self, handle: NodeHandle) -> Option<VNode> {
        if let Some(pos) = self.children.iter().position(|c| c.handle == handle) {
            return Some(self.children.remove(pos));
        }
        self.children
            .iter_mut()
            .find_map(|child| child.remove_descendant(handle))
    }
}
