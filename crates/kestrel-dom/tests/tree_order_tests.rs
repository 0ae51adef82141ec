//! Tests for tree order, boundary point comparison, leaf traversal and editability.

use std::cmp::Ordering;

use kestrel_dom::{DomTree, NodeId};

/// Builds `<div><p>one</p><p>two<b>three</b></p></div>` and returns
/// `(div, p1, t1, p2, t2, b, t3)`.
fn sample() -> (DomTree, [NodeId; 7]) {
    let mut tree = DomTree::new();
    let div = tree.create_element("div");
    tree.append_child(NodeId::ROOT, div);
    let p1 = tree.create_element("p");
    tree.append_child(div, p1);
    let t1 = tree.create_text("one");
    tree.append_child(p1, t1);
    let p2 = tree.create_element("p");
    tree.append_child(div, p2);
    let t2 = tree.create_text("two");
    tree.append_child(p2, t2);
    let b = tree.create_element("b");
    tree.append_child(p2, b);
    let t3 = tree.create_text("three");
    tree.append_child(b, t3);
    (tree, [div, p1, t1, p2, t2, b, t3])
}

// ========== tree order ==========

#[test]
fn test_is_before_follows_preorder() {
    let (tree, [div, p1, t1, p2, t2, b, t3]) = sample();
    let order = [div, p1, t1, p2, t2, b, t3];
    for (i, a) in order.iter().enumerate() {
        for (j, c) in order.iter().enumerate() {
            assert_eq!(tree.is_before(*a, *c), i < j, "{a:?} vs {c:?}");
        }
    }
}

#[test]
fn test_compare_points_parent_offset_against_child() {
    let (tree, [div, p1, _, p2, _, _, _]) = sample();
    // (div, 1) sits between p1 and p2.
    assert_eq!(tree.compare_points((div, 1), (p1, 0)), Ordering::Greater);
    assert_eq!(tree.compare_points((div, 1), (p2, 0)), Ordering::Less);
    assert_eq!(tree.compare_points((p2, 0), (div, 1)), Ordering::Greater);
}

#[test]
fn test_compare_points_same_node_uses_offsets() {
    let (tree, [_, _, t1, _, _, _, _]) = sample();
    assert_eq!(tree.compare_points((t1, 1), (t1, 2)), Ordering::Less);
    assert_eq!(tree.compare_points((t1, 2), (t1, 2)), Ordering::Equal);
}

// ========== leaf traversal ==========

#[test]
fn test_next_and_previous_leaf_nodes() {
    let (tree, [div, _, t1, _, t2, _, t3]) = sample();
    assert_eq!(tree.next_leaf_node(div), Some(t1));
    assert_eq!(tree.next_leaf_node(t1), Some(t2));
    assert_eq!(tree.next_leaf_node(t2), Some(t3));
    assert_eq!(tree.next_leaf_node(t3), None);
    assert_eq!(tree.previous_leaf_node(t3), Some(t2));
    assert_eq!(tree.previous_leaf_node(t1), None);
}

#[test]
fn test_node_index() {
    let (tree, [_, p1, _, p2, t2, b, _]) = sample();
    assert_eq!(tree.node_index(p1), 0);
    assert_eq!(tree.node_index(p2), 1);
    assert_eq!(tree.node_index(t2), 0);
    assert_eq!(tree.node_index(b), 1);
}

// ========== editability ==========

#[test]
fn test_content_editable_inherits_and_can_be_disabled() {
    let (mut tree, [div, p1, t1, p2, t2, b, t3]) = sample();
    tree.set_attribute(div, "contenteditable", "").unwrap();
    tree.set_attribute(b, "contenteditable", "false").unwrap();

    assert!(tree.is_content_editable(t1));
    assert!(tree.is_content_editable(t2));
    assert!(!tree.is_content_editable(t3));
    assert_eq!(tree.root_editable_element(t1), Some(div));
    assert_eq!(tree.root_editable_element(p2), Some(div));
    assert_eq!(tree.root_editable_element(p1), Some(div));
    assert_eq!(tree.root_editable_element(t3), None);
}

#[test]
fn test_element_by_id() {
    let (mut tree, [_, _, _, p2, _, _, _]) = sample();
    tree.set_attribute(p2, "id", "second").unwrap();
    assert_eq!(tree.element_by_id("second"), Some(p2));
    assert_eq!(tree.element_by_id("missing"), None);
}
