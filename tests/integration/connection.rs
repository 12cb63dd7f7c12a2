//! Integration tests for host attach, connect and disconnect

use super::test_utils::{added, sample_tree, Harness};
use std::cell::RefCell;
use std::rc::Rc;
use vtree_bridge::bridge::ConnectionState;
use vtree_bridge::config::BridgeConfig;
use vtree_bridge::protocol::TreeReplayer;
use vtree_bridge::{
    Bridge, BridgeError, BridgeHandle, HookEvent, InspectorHook, NodeHandle, RecordingHook, VNode,
};

#[test]
fn test_queued_commits_flush_once_in_order() {
    let mut h = Harness::attached(Bridge::new());
    let mut tree = sample_tree();
    h.bridge.on_commit_root(&tree).unwrap();
    tree.find_mut(NodeHandle(3)).unwrap().children.reverse();
    h.bridge.on_commit_root(&tree).unwrap();

    assert!(h.hook.is_empty());
    assert_eq!(h.bridge.pending_len(), 2);

    assert_eq!(h.bridge.connect().unwrap(), 2);
    assert_eq!(h.bridge.connection(), ConnectionState::Connected);
    h.sync();
    h.assert_mirrors(&tree);
    assert_eq!(h.replayer.children(3), &[5, 4]);

    assert_eq!(h.bridge.connect().unwrap(), 0);
    assert!(h.hook.is_empty());
}

#[test]
fn test_commits_before_attach_are_kept() {
    let mut bridge = Bridge::new();
    let tree = sample_tree();
    bridge.on_commit_root(&tree).unwrap();
    assert!(!bridge.is_attached());
    assert_eq!(bridge.pending_len(), 1);

    let mut h = Harness::attached(bridge);
    assert_eq!(h.bridge.connect().unwrap(), 1);
    h.sync();
    h.assert_mirrors(&tree);
}

#[test]
fn test_reconnect_describes_current_tree() {
    let mut h = Harness::connected();
    let mut tree = sample_tree();
    h.commit(&tree);

    h.bridge.disconnect();
    assert_eq!(h.bridge.connection(), ConnectionState::Disconnected);
    tree.find_mut(NodeHandle(2)).unwrap().children.pop();
    tree.find_mut(NodeHandle(3))
        .unwrap()
        .push_child(VNode::component(7, "Item").with_key("c"));
    h.bridge.on_commit_root(&tree).unwrap();
    h.bridge.on_commit_unmount(NodeHandle(4)).unwrap();
    tree.find_mut(NodeHandle(3)).unwrap().children.remove(0);
    assert!(h.hook.is_empty());

    // a new inspector starts from nothing
    h.replayer = TreeReplayer::new();
    assert_eq!(h.bridge.connect().unwrap(), 1);
    let ops = h.sync();
    assert_eq!(added(&ops)[0], (1, None));
    h.assert_mirrors(&tree);
    assert!(h.replayer.node(6).is_none());

    // deltas resume after the initial tree
    h.bridge.on_commit_root(&tree).unwrap();
    h.sync();
    assert!(h.replayer.node(4).is_none());
    h.assert_mirrors(&tree);
}

#[test]
fn test_slow_connect_never_drops_messages() {
    let mut config = BridgeConfig::default();
    config.queue.warn_after = 2;
    let mut h = Harness::attached(Bridge::from_config(&config).unwrap());

    let mut tree = VNode::root(1);
    for handle in 2..7 {
        tree.push_child(VNode::component(handle, "Row"));
        h.bridge.on_commit_root(&tree).unwrap();
    }
    assert_eq!(h.bridge.pending_len(), 5);
    assert_eq!(h.bridge.connect().unwrap(), 5);
    h.sync();
    assert_eq!(h.replayer.children(1).len(), 5);
}

#[test]
fn test_connect_requires_attached_host() {
    let mut bridge = Bridge::new();
    assert!(matches!(bridge.connect(), Err(BridgeError::NotAttached)));
    assert_eq!(bridge.connection(), ConnectionState::Waiting);
}

struct CommitFromHook {
    handle: Rc<RefCell<Option<BridgeHandle>>>,
    outcomes: Rc<RefCell<Vec<bool>>>,
    inner: RecordingHook,
}

impl InspectorHook for CommitFromHook {
    fn emit(&mut self, event: HookEvent) {
        if let Some(handle) = self.handle.borrow().as_ref() {
            let result = handle.on_commit_root(&VNode::root(99));
            self.outcomes
                .borrow_mut()
                .push(matches!(result, Err(BridgeError::Reentrant)));
        }
        self.inner.emit(event);
    }
}

#[test]
fn test_handle_rejects_calls_made_from_hook() {
    let slot = Rc::new(RefCell::new(None));
    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let recording = RecordingHook::new();
    let handle = BridgeHandle::new(Bridge::new());
    handle
        .attach(
            1,
            Box::new(CommitFromHook {
                handle: slot.clone(),
                outcomes: outcomes.clone(),
                inner: recording.clone(),
            }),
        )
        .unwrap();
    handle.connect().unwrap();
    *slot.borrow_mut() = Some(handle.clone());

    handle.on_commit_root(&sample_tree()).unwrap();

    assert_eq!(*outcomes.borrow(), vec![true]);
    assert_eq!(recording.len(), 1);
    assert_eq!(handle.read(|bridge| bridge.roots().len()).unwrap(), 1);

    // break the Rc cycle between the hook and the bridge
    slot.borrow_mut().take();
}
