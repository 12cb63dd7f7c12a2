//! Integration tests for selection tracking

use super::test_utils::{sample_tree, Harness};
use vtree_bridge::filter::FilterRule;
use vtree_bridge::selection::{BestMatch, Selector};
use vtree_bridge::{ElementType, HookEvent, NodeHandle};

fn best_matches(events: &[HookEvent]) -> Vec<Option<BestMatch>> {
    events
        .iter()
        .filter_map(|event| match event {
            HookEvent::BestMatch(best) => Some(*best),
            HookEvent::Operations(_) => None,
        })
        .collect()
}

#[test]
fn test_exact_path_then_nearest_ancestor() {
    let mut h = Harness::connected();
    let mut tree = sample_tree();
    h.commit(&tree);

    let path = h.bridge.path_for(5).unwrap();
    assert_eq!(path.len(), 4);
    h.bridge.set_tracked_path(Some(path));
    assert_eq!(
        h.bridge.get_best_match(),
        Some(BestMatch {
            id: 5,
            is_full_match: true
        })
    );

    tree.find_mut(NodeHandle(3)).unwrap().children.pop();
    h.commit(&tree);
    assert_eq!(
        h.bridge.get_best_match(),
        Some(BestMatch {
            id: 3,
            is_full_match: false
        })
    );
}

#[test]
fn test_keyed_selection_survives_reorder() {
    let mut h = Harness::connected();
    let mut tree = sample_tree();
    h.commit(&tree);
    let path = h.bridge.path_for(5).unwrap();
    h.bridge.set_tracked_path(Some(path));

    tree.find_mut(NodeHandle(3)).unwrap().children.reverse();
    h.commit(&tree);
    assert_eq!(h.replayer.children(3), &[5, 4]);
    assert_eq!(
        h.bridge.get_best_match(),
        Some(BestMatch {
            id: 5,
            is_full_match: true
        })
    );
}

#[test]
fn test_hidden_step_gives_partial_match() {
    let mut h = Harness::connected();
    h.commit(&sample_tree());
    let path = h.bridge.path_for(5).unwrap();
    h.bridge.set_tracked_path(Some(path));

    h.filters(vec![FilterRule::hide_type(ElementType::Host)]);
    let best = h.bridge.get_best_match().unwrap();
    assert!(!best.is_full_match);
    assert!(h.bridge.path_for(3).is_none(), "hidden nodes have no path");
}

#[test]
fn test_best_match_is_pushed_to_host() {
    let mut h = Harness::connected();
    let mut tree = sample_tree();
    h.commit(&tree);

    h.bridge.set_tracked_path(Some(vec![
        Selector::Index(0),
        Selector::Element {
            name: Some("App".to_string()),
            key: None,
            index: 0,
        },
    ]));
    let events = h.hook.drain();
    assert_eq!(
        best_matches(&events),
        vec![Some(BestMatch {
            id: 2,
            is_full_match: true
        })]
    );

    tree.find_mut(NodeHandle(6)).unwrap().render_duration = 9;
    h.bridge.on_commit_root(&tree).unwrap();
    let events = h.hook.drain();
    assert_eq!(best_matches(&events).len(), 1);
    assert!(matches!(events.last(), Some(HookEvent::BestMatch(_))));

    h.bridge.set_tracked_path(None);
    h.bridge.on_commit_root(&tree).unwrap();
    assert!(best_matches(&h.hook.drain()).is_empty());
}
