//! Shared test utilities for integration tests
//!
//! `Harness` wires a bridge to a recording hook and feeds every emitted
//! message into an independent replayer, so tests can assert on exactly
//! what an inspector would see.

use vtree_bridge::filter::FilterRule;
use vtree_bridge::protocol::{Operation, Outline, TreeReplayer};
use vtree_bridge::{Bridge, HookEvent, NodeHandle, RecordingHook, VNode, VNodeId};

pub struct Harness {
    pub bridge: Bridge,
    pub hook: RecordingHook,
    pub replayer: TreeReplayer,
}

impl Harness {
    /// Attached and connected bridge with an empty consumer.
    pub fn connected() -> Self {
        let mut harness = Self::attached(Bridge::new());
        harness.bridge.connect().unwrap();
        harness.sync();
        harness
    }

    /// Attached but not yet connected.
    pub fn attached(mut bridge: Bridge) -> Self {
        let hook = RecordingHook::new();
        bridge.attach(1, Box::new(hook.clone()));
        Self {
            bridge,
            hook,
            replayer: TreeReplayer::new(),
        }
    }

    /// Apply everything the hook received since the last sync.
    pub fn sync(&mut self) -> Vec<Operation> {
        let mut ops = Vec::new();
        for event in self.hook.drain() {
            if let HookEvent::Operations(message) = event {
                let decoded = self.replayer.apply(&message.payload).unwrap();
                ops.extend(decoded.operations);
            }
        }
        ops
    }

    pub fn commit(&mut self, root: &VNode) -> Vec<Operation> {
        self.bridge.on_commit_root(root).unwrap();
        self.sync()
    }

    pub fn unmount(&mut self, handle: u64) -> Vec<Operation> {
        self.bridge.on_commit_unmount(NodeHandle(handle)).unwrap();
        self.sync()
    }

    pub fn filters(&mut self, rules: Vec<FilterRule>) -> Vec<Operation> {
        self.bridge.apply_filters(rules).unwrap();
        self.sync()
    }

    pub fn id_of(&self, handle: u64) -> VNodeId {
        self.bridge
            .state()
            .registry
            .id_of(NodeHandle(handle))
            .unwrap()
    }

    /// The consumer's view of `root` matches the filtered live tree.
    pub fn assert_mirrors(&self, root: &VNode) {
        let root_id = self.id_of(root.handle.0);
        let expected = Outline::expected(root, self.bridge.state().filters.compiled());
        let actual = self.replayer.outline(root_id).unwrap();
        assert_eq!(actual, expected);
    }
}

pub fn added(ops: &[Operation]) -> Vec<(VNodeId, Option<VNodeId>)> {
    ops.iter()
        .filter_map(|op| match op {
            Operation::Add { id, parent_id, .. } => Some((*id, *parent_id)),
            _ => None,
        })
        .collect()
}

pub fn removed(ops: &[Operation]) -> Vec<VNodeId> {
    ops.iter()
        .filter_map(|op| match op {
            Operation::Remove { id } => Some(*id),
            _ => None,
        })
        .collect()
}

/// root(1) -> App(2) -> [div(3) -> [Item a(4), Item b(5)], Footer(6)]
pub fn sample_tree() -> VNode {
    VNode::root(1).with_children(vec![VNode::component(2, "App")
        .with_duration(4)
        .with_children(vec![
            VNode::host(3, "div").with_duration(1).with_children(vec![
                VNode::component(4, "Item").with_key("a").with_duration(2),
                VNode::component(5, "Item").with_key("b").with_duration(3),
            ]),
            VNode::component(6, "Footer").with_duration(5),
        ])])
}
