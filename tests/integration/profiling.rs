//! Integration tests for the profiler and tree base durations

use super::test_utils::{sample_tree, Harness};
use serde_json::json;
use vtree_bridge::filter::FilterRule;
use vtree_bridge::profiler::{ProfilerStatus, Timing};
use vtree_bridge::protocol::Operation;
use vtree_bridge::{ElementType, NodeHandle, VNodeId};

fn base_updates(ops: &[Operation]) -> Vec<(VNodeId, u64)> {
    ops.iter()
        .filter_map(|op| match op {
            Operation::UpdateTreeBaseDuration {
                id,
                duration_micros,
            } => Some((*id, *duration_micros)),
            _ => None,
        })
        .collect()
}

fn timing(timings: &[Timing], id: VNodeId) -> Timing {
    *timings.iter().find(|t| t.id == id).unwrap()
}

#[test]
fn test_unchanged_commit_after_start() {
    let mut h = Harness::connected();
    let tree = sample_tree();
    h.commit(&tree);
    assert!(h.bridge.start_profiling());
    h.commit(&tree);

    let data = h.bridge.get_profiling_data();
    assert_eq!(data.status, ProfilerStatus::Running);
    let commit = &data.roots[0].commits[0];
    assert!(commit.changed.is_empty());

    let leaf = timing(&commit.timings, 4);
    assert_eq!(leaf.self_duration, leaf.total_duration);
    assert_eq!(leaf.total_duration, 2);
    assert_eq!(timing(&commit.timings, 3).total_duration, 6);
    assert_eq!(timing(&commit.timings, 2).total_duration, 15);
    assert_eq!(timing(&commit.timings, 2).self_duration, 4);
    assert_eq!(timing(&commit.timings, 1).self_duration, 0);
}

#[test]
fn test_hidden_node_time_is_folded_into_visible_parent() {
    let mut h = Harness::connected();
    h.filters(vec![FilterRule::hide_type(ElementType::Host)]);
    h.bridge.start_profiling();
    h.commit(&sample_tree());

    let data = h.bridge.get_profiling_data();
    let timings = &data.roots[0].commits[0].timings;
    assert!(timings.iter().all(|t| t.id != 3));

    // App renders in 4us and owns the hidden div's 1us
    let app = timing(timings, 2);
    assert_eq!(app.total_duration, 15);
    assert_eq!(app.self_duration, 5);

    let descendants: u64 = [4, 5, 6]
        .iter()
        .map(|id| timing(timings, *id).self_duration)
        .sum();
    assert_eq!(app.self_duration + descendants, app.total_duration);
}

#[test]
fn test_changed_keys_are_recorded() {
    let mut h = Harness::connected();
    let mut tree = sample_tree();
    tree.find_mut(NodeHandle(2)).unwrap().props.insert("count".into(), json!(1));
    h.commit(&tree);
    h.bridge.start_profiling();

    let app = tree.find_mut(NodeHandle(2)).unwrap();
    app.props.insert("count".into(), json!(2));
    app.state.insert("open".into(), json!(true));
    h.commit(&tree);

    let data = h.bridge.get_profiling_data();
    let changed = &data.roots[0].commits[0].changed;
    assert_eq!(changed.len(), 1);
    let keys: Vec<&str> = changed[&2].iter().map(String::as_str).collect();
    assert_eq!(keys, vec!["count", "open"]);
}

#[test]
fn test_base_durations_only_sent_while_profiling() {
    let mut h = Harness::connected();
    let mut tree = sample_tree();
    let ops = h.commit(&tree);
    assert!(base_updates(&ops).is_empty());

    h.bridge.start_profiling();
    let ops = h.commit(&tree);
    assert_eq!(base_updates(&ops).len(), 6);
    assert_eq!(h.replayer.node(2).unwrap().tree_base_duration, 15);

    assert!(h.commit(&tree).is_empty());

    tree.find_mut(NodeHandle(4)).unwrap().render_duration = 7;
    let ops = h.commit(&tree);
    assert_eq!(base_updates(&ops), vec![(4, 7), (3, 11), (2, 20), (1, 20)]);

    h.bridge.stop_profiling();
    tree.find_mut(NodeHandle(4)).unwrap().render_duration = 1;
    let ops = h.commit(&tree);
    assert!(base_updates(&ops).is_empty());
}

#[test]
fn test_session_lifecycle() {
    let mut h = Harness::connected();
    let tree = sample_tree();
    h.bridge.start_profiling();
    assert!(!h.bridge.start_profiling());
    h.commit(&tree);
    assert_eq!(h.bridge.get_profiling_data().roots[0].commits.len(), 1);

    h.bridge.stop_profiling();
    h.commit(&tree);
    let data = h.bridge.get_profiling_data();
    assert_eq!(data.status, ProfilerStatus::Stopped);
    assert_eq!(data.roots[0].commits.len(), 1, "history survives a stop");

    h.bridge.start_profiling();
    let data = h.bridge.get_profiling_data();
    assert!(data.roots.iter().all(|root| root.commits.is_empty()));
}

#[test]
fn test_start_seeds_initial_base_durations() {
    let mut h = Harness::connected();
    h.commit(&sample_tree());
    h.bridge.start_profiling();

    let data = h.bridge.get_profiling_data();
    assert_eq!(data.roots.len(), 1);
    assert_eq!(
        data.roots[0].initial_tree_base_durations,
        vec![(1, 15), (2, 15), (3, 6), (4, 2), (5, 3), (6, 5)]
    );
}
