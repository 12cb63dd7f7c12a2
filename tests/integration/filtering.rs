//! Integration tests for component filters

use super::test_utils::{added, removed, sample_tree, Harness};
use vtree_bridge::filter::FilterRule;
use vtree_bridge::{BridgeError, ElementType, VNode};

#[test]
fn test_hidden_host_children_attach_to_grandparent() {
    let mut h = Harness::connected();
    h.filters(vec![FilterRule::hide_type(ElementType::Host)]);
    let tree = sample_tree();
    let ops = h.commit(&tree);

    assert_eq!(
        added(&ops),
        vec![(1, None), (2, Some(1)), (4, Some(2)), (5, Some(2)), (6, Some(2))]
    );
    assert_eq!(h.replayer.children(2).len(), 3);
    assert!(h.bridge.inspect(3).unwrap().filtered);
    h.assert_mirrors(&tree);
}

#[test]
fn test_hide_by_name_and_location() {
    let mut h = Harness::connected();
    h.filters(vec![
        FilterRule::hide_name("Footer"),
        FilterRule::hide_location("src/Item.js"),
    ]);
    let tree = VNode::root(1).with_children(vec![VNode::component(2, "App").with_children(vec![
        VNode::component(3, "Item").with_source("src/Item.js"),
        VNode::component(4, "Item").with_source("src/Other.js"),
        VNode::component(5, "Footer"),
    ])]);
    let ops = h.commit(&tree);

    assert_eq!(added(&ops), vec![(1, None), (2, Some(1)), (4, Some(2))]);
    h.assert_mirrors(&tree);
}

#[test]
fn test_disabled_rule_hides_nothing() {
    let mut h = Harness::connected();
    h.filters(vec![FilterRule::hide_type(ElementType::Host).disabled()]);
    let tree = sample_tree();
    let ops = h.commit(&tree);

    assert_eq!(added(&ops).len(), 6);
    assert_eq!(h.bridge.filters().len(), 1);
}

#[test]
fn test_refilter_keeps_ids_and_mirrors() {
    let mut h = Harness::connected();
    let tree = sample_tree();
    h.commit(&tree);

    let ops = h.filters(vec![FilterRule::hide_type(ElementType::Host)]);
    assert_eq!(removed(&ops), vec![4, 5, 3, 6, 2]);
    assert_eq!(
        added(&ops),
        vec![(2, Some(1)), (4, Some(2)), (5, Some(2)), (6, Some(2))]
    );
    h.assert_mirrors(&tree);

    // later commits diff against the refiltered view
    assert!(h.commit(&tree).is_empty());
}

#[test]
fn test_clearing_filters_restores_hidden_node_with_its_id() {
    let mut h = Harness::connected();
    h.filters(vec![FilterRule::hide_type(ElementType::Host)]);
    let tree = sample_tree();
    h.commit(&tree);
    assert!(h.replayer.node(3).is_none());

    let ops = h.filters(Vec::new());
    assert!(added(&ops).contains(&(3, Some(2))));
    assert_eq!(h.replayer.children(3), &[4, 5]);
    h.assert_mirrors(&tree);
}

#[test]
fn test_owner_chain_skips_hidden_owners() {
    let mut h = Harness::connected();
    h.filters(vec![FilterRule::hide_name("Wrapper")]);
    let tree = VNode::root(1).with_children(vec![VNode::component(2, "App").with_children(vec![
        VNode::component(3, "Wrapper").with_owner(2).with_children(vec![
            VNode::component(4, "Item").with_owner(3),
        ]),
    ])]);
    h.commit(&tree);

    assert_eq!(h.bridge.owners_of(4), vec![2]);
    assert_eq!(h.replayer.node(4).unwrap().owner, Some(2));
    assert_eq!(h.replayer.node(4).unwrap().parent, Some(2));
}

#[test]
fn test_invalid_rules_are_rejected_whole() {
    let mut h = Harness::connected();
    h.filters(vec![FilterRule::hide_name("Footer")]);
    h.commit(&sample_tree());

    let err = h
        .bridge
        .apply_filters(vec![
            FilterRule::hide_type(ElementType::Host),
            FilterRule::hide_name("  "),
        ])
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidFilter(_)));
    assert!(h.sync().is_empty());
    assert_eq!(h.bridge.filters(), &[FilterRule::hide_name("Footer")]);
}
