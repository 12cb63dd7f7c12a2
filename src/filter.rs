//! Filter Engine
//!
//! Component filters hide nodes from the inspector's view without touching
//! the underlying tree. The raw rule list is the single source of truth; the
//! per-kind sets are caches rebuilt every time the raw list is replaced.
//!
//! Evaluation order is by-path, then by-type, then by-name. Rules only ever
//! exclude; the first match hides the node. Roots are never hidden.

use crate::error::BridgeError;
use crate::registry::{VNodeEntry, VNodeRegistry};
use crate::tree::VNode;
use crate::types::{ElementType, VNodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// What a rule matches on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RuleKind {
    ElementType(ElementType),
    DisplayName(String),
    /// Source file path of the component
    Location(String),
}

/// One raw rule descriptor as supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub rule: RuleKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl FilterRule {
    pub fn hide_type(element_type: ElementType) -> Self {
        Self {
            rule: RuleKind::ElementType(element_type),
            enabled: true,
        }
    }

    pub fn hide_name(name: &str) -> Self {
        Self {
            rule: RuleKind::DisplayName(name.to_string()),
            enabled: true,
        }
    }

    pub fn hide_location(path: &str) -> Self {
        Self {
            rule: RuleKind::Location(path.to_string()),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        match &self.rule {
            RuleKind::ElementType(ElementType::Root) => {
                Err("root nodes cannot be filtered".to_string())
            }
            RuleKind::ElementType(_) => Ok(()),
            RuleKind::DisplayName(name) if name.trim().is_empty() => {
                Err("display name rule has an empty value".to_string())
            }
            RuleKind::Location(path) if path.trim().is_empty() => {
                Err("location rule has an empty value".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Compiled membership indices derived from the enabled raw rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub by_type: HashSet<ElementType>,
    pub by_name: HashSet<String>,
    pub by_path: HashSet<String>,
}

impl FilterSet {
    fn compile(raw: &[FilterRule]) -> Self {
        let mut set = FilterSet::default();
        for rule in raw.iter().filter(|r| r.enabled) {
            match &rule.rule {
                RuleKind::ElementType(ty) => {
                    set.by_type.insert(*ty);
                }
                RuleKind::DisplayName(name) => {
                    set.by_name.insert(name.clone());
                }
                RuleKind::Location(path) => {
                    set.by_path.insert(path.clone());
                }
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.by_name.is_empty() && self.by_path.is_empty()
    }

    /// Whether a node with these attributes is shown
    pub fn allows(
        &self,
        element_type: ElementType,
        display_name: Option<&str>,
        source: Option<&str>,
    ) -> bool {
        if element_type == ElementType::Root {
            return true;
        }
        if source.is_some_and(|path| self.by_path.contains(path)) {
            return false;
        }
        if self.by_type.contains(&element_type) {
            return false;
        }
        if display_name.is_some_and(|name| self.by_name.contains(name)) {
            return false;
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct FilterEngine {
    raw: Vec<FilterRule>,
    compiled: FilterSet,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rule set and rebuild the indices.
    ///
    /// Returns the compiled set that decides visibility for later commits.
    /// On validation failure the previous rules stay in force.
    pub fn apply_filters(&mut self, raw: Vec<FilterRule>) -> Result<&FilterSet, BridgeError> {
        for rule in &raw {
            rule.validate().map_err(BridgeError::InvalidFilter)?;
        }
        self.compiled = FilterSet::compile(&raw);
        self.raw = raw;
        info!(
            rules = self.raw.len(),
            by_type = self.compiled.by_type.len(),
            by_name = self.compiled.by_name.len(),
            by_path = self.compiled.by_path.len(),
            "Applied component filters"
        );
        Ok(&self.compiled)
    }

    pub fn raw(&self) -> &[FilterRule] {
        &self.raw
    }

    pub fn compiled(&self) -> &FilterSet {
        &self.compiled
    }

    pub fn is_visible(&self, node: &VNode) -> bool {
        self.compiled
            .allows(node.element_type, node.display_name(), node.source.as_deref())
    }

    pub fn is_entry_visible(&self, entry: &VNodeEntry) -> bool {
        self.compiled.allows(
            entry.element_type,
            entry.display_name.as_deref(),
            entry.source.as_deref(),
        )
    }
}

/// Nearest visible ancestor of `id`, following raw parent links.
///
/// Returns `None` for roots and for ids the registry no longer knows.
pub fn reparent_for_filter(registry: &VNodeRegistry, id: VNodeId) -> Option<VNodeId> {
    let mut current = registry.resolve(id)?.parent;
    while let Some(parent_id) = current {
        let parent = registry.resolve(parent_id)?;
        if !parent.filtered {
            return Some(parent_id);
        }
        current = parent.parent;
    }
    None
}
