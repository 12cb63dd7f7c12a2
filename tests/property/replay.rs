//! Property-based tests: a consumer fed only the emitted messages always
//! mirrors the filtered live tree.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use vtree_bridge::filter::FilterRule;
use vtree_bridge::profiler::{ProfilerStatus, Timing};
use vtree_bridge::protocol::{Operation, Outline, TreeReplayer};
use vtree_bridge::tree::Walker;
use vtree_bridge::{Bridge, ElementType, HookEvent, NodeHandle, RecordingHook, VNode, VNodeId};

/// (handle, parent pick, render duration)
type Placement = (u64, usize, u64);

fn node_for(handle: u64, duration: u64) -> VNode {
    let node = if handle % 3 == 0 {
        VNode::host(handle, "div")
    } else {
        VNode::component(handle, &format!("N{}", handle % 5))
    };
    let node = node.with_duration(duration);
    if handle % 2 == 0 {
        node.with_key(&format!("k{}", handle))
    } else {
        node
    }
}

/// Build a tree under root handle 1; each placement attaches to one of the
/// nodes placed before it. Repeated handles keep their first placement.
fn build_tree(placements: &[Placement]) -> VNode {
    let mut order = vec![1u64];
    let mut parents: HashMap<u64, u64> = HashMap::new();
    let mut durations: HashMap<u64, u64> = HashMap::new();
    for (handle, pick, duration) in placements {
        if *handle == 1 || parents.contains_key(handle) {
            continue;
        }
        let parent = order[pick % order.len()];
        parents.insert(*handle, parent);
        durations.insert(*handle, *duration);
        order.push(*handle);
    }

    fn build(
        handle: u64,
        order: &[u64],
        parents: &HashMap<u64, u64>,
        durations: &HashMap<u64, u64>,
    ) -> VNode {
        let mut node = if handle == 1 {
            VNode::root(1)
        } else {
            node_for(handle, durations[&handle])
        };
        for child in order.iter().filter(|h| parents.get(h) == Some(&handle)) {
            node.push_child(build(*child, order, parents, durations));
        }
        node
    }
    build(1, &order, &parents, &durations)
}

fn drain_into(hook: &RecordingHook, replayer: &mut TreeReplayer) -> Vec<Operation> {
    let mut ops = Vec::new();
    for event in hook.drain() {
        if let HookEvent::Operations(message) = event {
            ops.extend(replayer.apply(&message.payload).unwrap().operations);
        }
    }
    ops
}

fn snapshots() -> impl Strategy<Value = Vec<Vec<Placement>>> {
    prop::collection::vec(
        prop::collection::vec((2u64..40, any::<usize>(), 0u64..10), 0..30),
        1..8,
    )
}

/// Replayed tree matches the filtered runtime tree after every commit
#[test]
fn test_replayer_mirrors_live_tree() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(snapshots(), any::<bool>()), |(steps, hide_hosts)| {
            let hook = RecordingHook::new();
            let mut bridge = Bridge::new();
            bridge.attach(1, Box::new(hook.clone()));
            bridge.connect().unwrap();
            if hide_hosts {
                bridge
                    .apply_filters(vec![FilterRule::hide_type(ElementType::Host)])
                    .unwrap();
            }

            let mut replayer = TreeReplayer::new();
            let mut added: HashSet<VNodeId> = HashSet::new();
            for placements in &steps {
                let tree = build_tree(placements);
                bridge.on_commit_root(&tree).unwrap();
                for op in drain_into(&hook, &mut replayer) {
                    if let Operation::Add { id, .. } = op {
                        // ids are never handed out twice
                        assert!(added.insert(id), "id {} added twice", id);
                    }
                }

                let root_id = bridge.state().registry.id_of(NodeHandle(1)).unwrap();
                let expected = Outline::expected(&tree, bridge.state().filters.compiled());
                assert_eq!(replayer.outline(root_id), Some(expected));
            }
            Ok(())
        })
        .unwrap();
}

/// Self duration plus the visible children's totals adds up to the total
#[test]
fn test_profiled_durations_are_consistent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(snapshots(), any::<bool>()), |(steps, hide_hosts)| {
            let hook = RecordingHook::new();
            let mut bridge = Bridge::new();
            bridge.attach(1, Box::new(hook.clone()));
            bridge.connect().unwrap();
            if hide_hosts {
                bridge
                    .apply_filters(vec![FilterRule::hide_type(ElementType::Host)])
                    .unwrap();
            }
            bridge.start_profiling();

            let mut replayer = TreeReplayer::new();
            for placements in &steps {
                let tree = build_tree(placements);
                bridge.on_commit_root(&tree).unwrap();
                drain_into(&hook, &mut replayer);

                let data = bridge.get_profiling_data();
                let commit = data.roots[0].commits.last().unwrap();
                let by_id: HashMap<VNodeId, Timing> =
                    commit.timings.iter().map(|t| (t.id, *t)).collect();
                assert_eq!(by_id.len(), replayer.len());

                for timing in commit.timings.iter() {
                    let children: u64 = replayer
                        .children(timing.id)
                        .iter()
                        .map(|child| by_id[child].total_duration)
                        .sum();
                    assert_eq!(timing.self_duration + children, timing.total_duration);
                    assert_eq!(
                        replayer.node(timing.id).unwrap().tree_base_duration,
                        timing.total_duration
                    );
                }
            }
            Ok(())
        })
        .unwrap();
}

/// One host or runtime event in a generated session
#[derive(Debug, Clone)]
enum Action {
    Commit(Vec<Placement>),
    /// Unmount the picked non-root node, then commit its root
    UnmountAndCommit(usize),
    ToggleHostFilter,
    Reconnect,
    StartProfiling,
    StopProfiling,
}

fn actions() -> impl Strategy<Value = Vec<Action>> {
    let placements = prop::collection::vec((2u64..40, any::<usize>(), 0u64..10), 0..30);
    prop::collection::vec(
        prop_oneof![
            4 => placements.prop_map(Action::Commit),
            2 => any::<usize>().prop_map(Action::UnmountAndCommit),
            1 => Just(Action::ToggleHostFilter),
            1 => Just(Action::Reconnect),
            1 => Just(Action::StartProfiling),
            1 => Just(Action::StopProfiling),
        ],
        1..16,
    )
}

/// Mirroring holds across unmounts, filter changes, reconnects and
/// profiling sessions, not just plain commits
#[test]
fn test_replayer_mirrors_mixed_sessions() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&actions(), |actions| {
            let hook = RecordingHook::new();
            let mut bridge = Bridge::new();
            bridge.attach(1, Box::new(hook.clone()));
            bridge.connect().unwrap();

            let mut replayer = TreeReplayer::new();
            let mut tree: Option<VNode> = None;
            let mut hide_hosts = false;

            for action in actions {
                let mut committed = false;
                match action {
                    Action::Commit(placements) => {
                        let next = build_tree(&placements);
                        bridge.on_commit_root(&next).unwrap();
                        tree = Some(next);
                        committed = true;
                    }
                    Action::UnmountAndCommit(pick) => {
                        let Some(current) = tree.as_mut() else {
                            continue;
                        };
                        let handles: Vec<NodeHandle> = Walker::new(current)
                            .walk()
                            .into_iter()
                            .skip(1)
                            .map(|node| node.handle)
                            .collect();
                        if let Some(handle) = handles.get(pick % handles.len().max(1)) {
                            bridge.on_commit_unmount(*handle).unwrap();
                            current.remove_descendant(*handle);
                        }
                        bridge.on_commit_root(current).unwrap();
                        committed = true;
                    }
                    Action::ToggleHostFilter => {
                        hide_hosts = !hide_hosts;
                        let rules = if hide_hosts {
                            vec![FilterRule::hide_type(ElementType::Host)]
                        } else {
                            Vec::new()
                        };
                        bridge.apply_filters(rules).unwrap();
                    }
                    Action::Reconnect => {
                        bridge.disconnect();
                        drain_into(&hook, &mut replayer);
                        replayer = TreeReplayer::new();
                        bridge.connect().unwrap();
                    }
                    Action::StartProfiling => {
                        bridge.start_profiling();
                    }
                    Action::StopProfiling => bridge.stop_profiling(),
                }
                drain_into(&hook, &mut replayer);

                let Some(current) = tree.as_ref() else {
                    assert!(replayer.is_empty());
                    continue;
                };
                let root_id = bridge.state().registry.id_of(NodeHandle(1)).unwrap();
                let expected = Outline::expected(current, bridge.state().filters.compiled());
                assert_eq!(replayer.outline(root_id), Some(expected));

                if committed && bridge.profiler_status() == ProfilerStatus::Running {
                    let durations = bridge.state().shadow.base_durations();
                    for id in bridge.state().shadow.pre_order(root_id) {
                        assert_eq!(
                            replayer.node(id).unwrap().tree_base_duration,
                            durations[&id]
                        );
                    }
                }
            }
            Ok(())
        })
        .unwrap();
}
