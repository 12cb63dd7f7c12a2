//! Commit Processor
//!
//! Turns runtime commit notifications into root-scoped [`Commit`]s. Every
//! commit is diffed against the shadow tree: the visible structure exactly as
//! the inspector has been told about it. Additions are emitted in pre-order,
//! removals in post-order, and child order is corrected with a single
//! `REORDER_CHILDREN` per parent once all of its children exist on the
//! inspector side.

use crate::error::BridgeError;
use crate::filter::reparent_for_filter;
use crate::profiler::{changed_keys, Timing};
use crate::protocol::{Commit, Operation};
use crate::state::BridgeState;
use crate::tree::{VNode, Walker};
use crate::types::{NodeHandle, VNodeId};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    Idle,
    Processing,
}

/// Phase tracking plus unmounts waiting for their root's next commit
#[derive(Debug)]
pub struct CommitProcessor {
    phase: CommitPhase,
    /// (root, removed id) in notification order
    pending_unmounts: Vec<(VNodeId, VNodeId)>,
}

impl Default for CommitProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitProcessor {
    pub fn new() -> Self {
        Self {
            phase: CommitPhase::Idle,
            pending_unmounts: Vec::new(),
        }
    }

    pub fn phase(&self) -> CommitPhase {
        self.phase
    }

    fn ensure_idle(&self) -> Result<(), BridgeError> {
        match self.phase {
            CommitPhase::Idle => Ok(()),
            CommitPhase::Processing => Err(BridgeError::Reentrant),
        }
    }

    fn begin(&mut self) -> Result<(), BridgeError> {
        self.ensure_idle()?;
        self.phase = CommitPhase::Processing;
        Ok(())
    }

    fn finish(&mut self) {
        self.phase = CommitPhase::Idle;
    }

    fn defer_unmounts(&mut self, root: VNodeId, ids: Vec<VNodeId>) {
        self.pending_unmounts
            .extend(ids.into_iter().map(|id| (root, id)));
    }

    /// Drop every deferred removal; used when the consumer starts over.
    pub fn clear_pending_unmounts(&mut self) {
        self.pending_unmounts.clear();
    }

    fn take_unmounts(&mut self, root: VNodeId) -> Vec<VNodeId> {
        let (mine, rest): (Vec<_>, Vec<_>) = self
            .pending_unmounts
            .drain(..)
            .partition(|(r, _)| *r == root);
        self.pending_unmounts = rest;
        mine.into_iter().map(|(_, id)| id).collect()
    }

    /// Number of removals not yet attached to a commit
    pub fn pending_unmount_count(&self) -> usize {
        self.pending_unmounts.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Memo {
    props: BTreeMap<String, Value>,
    state: BTreeMap<String, Value>,
}

/// The visible tree as last described to the inspector
#[derive(Debug, Default)]
pub struct ShadowTree {
    children: HashMap<VNodeId, Vec<VNodeId>>,
    parents: HashMap<VNodeId, VNodeId>,
    owners: HashMap<VNodeId, Option<VNodeId>>,
    base_durations: HashMap<VNodeId, u64>,
    emitted_base: HashMap<VNodeId, u64>,
    memo: HashMap<VNodeId, Memo>,
}

impl ShadowTree {
    /// Record `id` as visible, appended under `parent`.
    pub fn link(&mut self, id: VNodeId, parent: Option<VNodeId>) {
        self.children.entry(id).or_default();
        if let Some(parent) = parent {
            self.parents.insert(id, parent);
            self.children.entry(parent).or_default().push(id);
        }
    }

    pub fn contains(&self, id: VNodeId) -> bool {
        self.children.contains_key(&id)
    }

    pub fn visible_children(&self, id: VNodeId) -> &[VNodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn visible_parent(&self, id: VNodeId) -> Option<VNodeId> {
        self.parents.get(&id).copied()
    }

    pub fn owner(&self, id: VNodeId) -> Option<VNodeId> {
        self.owners.get(&id).copied().flatten()
    }

    /// Tree base duration per visible node from the latest commit
    pub fn base_durations(&self) -> &HashMap<VNodeId, u64> {
        &self.base_durations
    }

    /// Forget which base durations the inspector has seen.
    pub fn clear_emitted_durations(&mut self) {
        self.emitted_base.clear();
    }

    /// Visible ids under `root`, parents first.
    pub fn pre_order(&self, root: VNodeId) -> Vec<VNodeId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.visible_children(id).iter().rev());
        }
        out
    }

    /// Visible ids under `root`, children first.
    pub fn post_order(&self, root: VNodeId) -> Vec<VNodeId> {
        let mut out = self.pre_order_mirrored(root);
        out.reverse();
        out
    }

    // Root, then children right to left: reversing it yields a post-order
    // that keeps left-to-right sibling order.
    fn pre_order_mirrored(&self, root: VNodeId) -> Vec<VNodeId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.visible_children(id).iter());
        }
        out
    }

    fn set_children(&mut self, id: VNodeId, children: Vec<VNodeId>) {
        self.children.insert(id, children);
    }

    fn unlink(&mut self, id: VNodeId) {
        if let Some(parent) = self.parents.remove(&id) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|sibling| *sibling != id);
            }
        }
        self.children.remove(&id);
    }

    fn forget(&mut self, id: VNodeId) {
        self.unlink(id);
        self.owners.remove(&id);
        self.base_durations.remove(&id);
        self.emitted_base.remove(&id);
        self.memo.remove(&id);
    }
}

/// Release the subtree at `id`, returning the ids the inspector knew about,
/// descendants first.
fn unmount_subtree(state: &mut BridgeState, id: VNodeId) -> Vec<VNodeId> {
    let mut visible = Vec::new();
    for node in state.registry.post_order(id) {
        let Some(entry) = state.registry.release(node) else {
            continue;
        };
        state.shadow.forget(node);
        if !entry.filtered {
            visible.push(node);
        }
    }
    visible
}

#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    /// Render time of the whole subtree
    total: u64,
    /// Portion of `total` already attributed to visible nodes
    claimed: u64,
}

/// State of one `on_commit_root` pass
struct Pass<'a> {
    state: &'a mut BridgeState,
    root_id: VNodeId,
    /// The root's id was allocated by this pass
    root_is_new: bool,
    live_handles: HashSet<NodeHandle>,
    seen_handles: HashSet<NodeHandle>,
    commit: Commit,
    desired: HashMap<VNodeId, Vec<VNodeId>>,
    visited: Vec<VNodeId>,
    timings: Vec<Timing>,
    changed: BTreeMap<VNodeId, BTreeSet<String>>,
    profiling: bool,
    record_changes: bool,
}

impl Pass<'_> {
    fn visit(
        &mut self,
        node: &VNode,
        raw_parent: Option<VNodeId>,
        visible_parent: Option<VNodeId>,
    ) -> Sums {
        if !self.seen_handles.insert(node.handle) {
            return Sums::default();
        }

        let mut existing = if raw_parent.is_none() && self.root_is_new {
            None
        } else {
            self.state.registry.id_of(node.handle)
        };
        if let Some(id) = existing {
            let moved = self
                .state
                .registry
                .resolve(id)
                .is_some_and(|entry| entry.parent != raw_parent);
            if moved {
                debug!(id, handle = %node.handle, "Node changed parent, remounting");
                let removed = unmount_subtree(self.state, id);
                self.commit.unmount_ids.extend(removed);
                existing = None;
            }
        }

        let id = self.state.registry.assign_id(node);
        let is_new = existing.is_none();
        let visible = match self.state.registry.resolve(id) {
            _ if raw_parent.is_none() => true,
            Some(entry) if !is_new => !entry.filtered,
            _ => self.state.filters.is_visible(node),
        };
        let owner = node.owner.and_then(|h| self.state.registry.id_of(h));
        if let Some(entry) = self.state.registry.resolve_mut(id) {
            entry.parent = raw_parent;
            entry.root = self.root_id;
            entry.owner = owner;
            entry.filtered = !visible;
        }

        let mut timing_slot = None;
        let child_visible_parent = if visible {
            self.record_visible(node, id, is_new, visible_parent);
            if self.profiling {
                timing_slot = Some(self.timings.len());
                self.timings.push(Timing {
                    id,
                    self_duration: 0,
                    total_duration: 0,
                });
            }
            Some(id)
        } else {
            visible_parent
        };

        let previous_children = self
            .state
            .registry
            .resolve(id)
            .map(|entry| entry.children.clone())
            .unwrap_or_default();

        let mut sums = Sums {
            total: node.render_duration,
            claimed: 0,
        };
        let mut child_ids = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let child_sums = self.visit(child, Some(id), child_visible_parent);
            sums.total += child_sums.total;
            sums.claimed += child_sums.claimed;
            if let Some(child_id) = self.state.registry.id_of(child.handle) {
                child_ids.push(child_id);
            }
        }

        let current: HashSet<VNodeId> = child_ids.iter().copied().collect();
        for old in previous_children {
            if current.contains(&old) {
                continue;
            }
            let gone = self
                .state
                .registry
                .resolve(old)
                .is_some_and(|entry| !self.live_handles.contains(&entry.handle));
            if gone {
                trace!(id = old, "Node disappeared without unmount notification");
                let removed = unmount_subtree(self.state, old);
                self.commit.unmount_ids.extend(removed);
            }
        }

        if let Some(entry) = self.state.registry.resolve_mut(id) {
            entry.children = child_ids;
        }

        if !visible {
            return sums;
        }

        let below = sums.claimed;
        sums.claimed = sums.total;
        self.state.shadow.base_durations.insert(id, sums.total);
        if let Some(slot) = timing_slot {
            self.timings[slot] = Timing {
                id,
                self_duration: sums.total.saturating_sub(below),
                total_duration: sums.total,
            };
        }
        if self.profiling && self.state.shadow.emitted_base.get(&id) != Some(&sums.total) {
            self.state.shadow.emitted_base.insert(id, sums.total);
            self.commit
                .operations
                .push(Operation::UpdateTreeBaseDuration {
                    id,
                    duration_micros: sums.total,
                });
        }
        sums
    }

    fn record_visible(
        &mut self,
        node: &VNode,
        id: VNodeId,
        is_new: bool,
        visible_parent: Option<VNodeId>,
    ) {
        let owner = self
            .state
            .registry
            .resolve(id)
            .and_then(|entry| self.state.registry.visible_owner(entry.owner));

        if is_new {
            self.commit.operations.push(Operation::Add {
                id,
                parent_id: visible_parent,
                element_type: node.element_type,
                owner_id: owner,
                display_name: node.display_name().map(str::to_string),
                key: visible_parent.and(node.key.clone()),
            });
            self.state.shadow.link(id, visible_parent);
            self.state.shadow.owners.insert(id, owner);
        } else if self.state.shadow.owner(id) != owner {
            self.commit.operations.push(Operation::UpdateOwner {
                id,
                owner_id: owner,
            });
            self.state.shadow.owners.insert(id, owner);
        }

        if let Some(parent) = visible_parent {
            self.desired.entry(parent).or_default().push(id);
        }
        self.visited.push(id);

        let memo = Memo {
            props: node.props.clone(),
            state: node.state.clone(),
        };
        if !is_new && self.record_changes {
            if let Some(previous) = self.state.shadow.memo.get(&id) {
                let mut keys = BTreeSet::new();
                changed_keys(&previous.props, &memo.props, &mut keys);
                changed_keys(&previous.state, &memo.state, &mut keys);
                if !keys.is_empty() {
                    self.changed.insert(id, keys);
                }
            }
        }
        self.state.shadow.memo.insert(id, memo);
    }

    fn reorder(&mut self) {
        for id in std::mem::take(&mut self.visited) {
            let desired = self.desired.remove(&id).unwrap_or_default();
            if self.state.shadow.visible_children(id) != desired.as_slice() {
                self.commit.operations.push(Operation::ReorderChildren {
                    id,
                    children: desired.clone(),
                });
                self.state.shadow.set_children(id, desired);
            }
        }
    }
}

/// Process a committed root and produce its commit.
///
/// Fails only with [`BridgeError::Reentrant`]; the caller decides how loudly
/// to drop the notification.
#[instrument(skip_all, fields(root = %root.handle))]
pub fn on_commit_root(state: &mut BridgeState, root: &VNode) -> Result<Commit, BridgeError> {
    state.processor.begin()?;

    let (live_handles, duplicates) = Walker::new(root).handles();
    if !duplicates.is_empty() {
        warn!(count = duplicates.len(), "Commit contains duplicate node handles");
    }

    let is_new_root = state.registry.id_of(root.handle).is_none();
    let root_id = state.registry.assign_id(root);
    if is_new_root {
        state.roots.push(root_id);
    }

    let mut commit = Commit::new(root_id);
    commit.unmount_ids = state.processor.take_unmounts(root_id);

    let profiling = state.profiler.is_running();
    let record_changes = state.profiler.records_changes();
    let mut pass = Pass {
        state,
        root_id,
        root_is_new: is_new_root,
        live_handles,
        seen_handles: HashSet::new(),
        commit,
        desired: HashMap::new(),
        visited: Vec::new(),
        timings: Vec::new(),
        changed: BTreeMap::new(),
        profiling,
        record_changes,
    };
    pass.visit(root, None, None);
    pass.reorder();

    let Pass {
        state,
        commit,
        timings,
        changed,
        ..
    } = pass;

    if profiling {
        state.profiler.record_commit(root_id, changed, timings);
    }
    state.processor.finish();

    debug!(
        root_id,
        operations = commit.operations.len(),
        unmounts = commit.unmount_ids.len(),
        "Processed commit"
    );
    Ok(commit)
}

/// Handle an unmount notification.
///
/// Removals of ordinary nodes wait for their root's next commit; unmounting
/// a root finalizes a commit immediately, since no further commit will come
/// for it.
pub fn on_commit_unmount(
    state: &mut BridgeState,
    handle: NodeHandle,
) -> Result<Option<Commit>, BridgeError> {
    state.processor.ensure_idle()?;

    let Some(id) = state.registry.id_of(handle) else {
        trace!(%handle, "Unmount for unknown node");
        return Ok(None);
    };
    let Some(entry) = state.registry.resolve(id) else {
        return Ok(None);
    };
    let root = entry.root;
    let is_root = entry.parent.is_none();

    let removed = unmount_subtree(state, id);
    if !is_root {
        state.processor.defer_unmounts(root, removed);
        return Ok(None);
    }

    let mut commit = Commit::new(id);
    commit.unmount_ids = state.processor.take_unmounts(id);
    commit
        .unmount_ids
        .extend(removed.into_iter().filter(|removed| *removed != id));
    commit.unmount_root_id = Some(id);
    state.roots.retain(|r| *r != id);
    debug!(root_id = id, unmounts = commit.unmount_ids.len(), "Root unmounted");
    Ok(Some(commit))
}

/// Full `ADD` sequence describing the current visible tree of `root_id`.
pub fn initial_tree_commit(state: &mut BridgeState, root_id: VNodeId) -> Commit {
    let mut commit = Commit::new(root_id);
    let profiling = state.profiler.is_running();
    for id in state.shadow.pre_order(root_id) {
        let Some(entry) = state.registry.resolve(id) else {
            continue;
        };
        let parent_id = state.shadow.visible_parent(id);
        commit.operations.push(Operation::Add {
            id,
            parent_id,
            element_type: entry.element_type,
            owner_id: state.shadow.owner(id),
            display_name: entry.display_name.clone(),
            key: parent_id.and(entry.key.clone()),
        });
        if profiling {
            if let Some(duration) = state.shadow.base_durations.get(&id).copied() {
                state.shadow.emitted_base.insert(id, duration);
                commit.operations.push(Operation::UpdateTreeBaseDuration {
                    id,
                    duration_micros: duration,
                });
            }
        }
    }
    commit
}

/// Re-evaluate visibility for every node under `root_id` with the current
/// filters: every visible descendant is removed and the tree re-added.
pub fn refilter_root(state: &mut BridgeState, root_id: VNodeId) -> Commit {
    let mut commit = Commit::new(root_id);
    commit.unmount_ids = state.processor.take_unmounts(root_id);
    commit.unmount_ids.extend(
        state
            .shadow
            .post_order(root_id)
            .into_iter()
            .filter(|id| *id != root_id),
    );

    let raw = state.registry.pre_order(root_id);
    for id in &raw {
        let visible = match state.registry.resolve(*id) {
            Some(entry) => entry.parent.is_none() || state.filters.is_entry_visible(entry),
            None => continue,
        };
        if let Some(entry) = state.registry.resolve_mut(*id) {
            entry.filtered = !visible;
        }
        state.shadow.unlink(*id);
        state.shadow.emitted_base.remove(id);
        if !visible {
            state.shadow.owners.remove(id);
            state.shadow.memo.remove(id);
            state.shadow.base_durations.remove(id);
        }
    }

    state.shadow.link(root_id, None);
    for id in raw.into_iter().filter(|id| *id != root_id) {
        let Some(entry) = state.registry.resolve(id) else {
            continue;
        };
        if entry.filtered {
            continue;
        }
        let parent_id = reparent_for_filter(&state.registry, id);
        let owner = state.registry.visible_owner(entry.owner);
        commit.operations.push(Operation::Add {
            id,
            parent_id,
            element_type: entry.element_type,
            owner_id: owner,
            display_name: entry.display_name.clone(),
            key: entry.key.clone(),
        });
        state.shadow.link(id, parent_id);
        state.shadow.owners.insert(id, owner);
    }
    commit
}
