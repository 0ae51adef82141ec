//! Tests for DOM tree mutation methods: remove_child, insert_before, move_children, set_text.

use kestrel_dom::{DomError, DomTree, NodeId};

/// Helper to create an element node attached under `parent`.
fn element_under(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.create_element(tag);
    tree.append_child(parent, id);
    id
}

// ========== remove_child ==========

#[test]
fn test_remove_child_single_child() {
    let mut tree = DomTree::new();
    let parent = element_under(&mut tree, NodeId::ROOT, "div");
    let child = element_under(&mut tree, parent, "p");

    assert_eq!(tree.children(parent).len(), 1);

    tree.remove_child(parent, child).unwrap();

    assert_eq!(tree.children(parent).len(), 0);
    assert_eq!(tree.parent(child), None);
    assert_eq!(tree.prev_sibling(child), None);
    assert_eq!(tree.next_sibling(child), None);
}

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let parent = element_under(&mut tree, NodeId::ROOT, "div");
    let a = element_under(&mut tree, parent, "a");
    let b = element_under(&mut tree, parent, "b");
    let c = element_under(&mut tree, parent, "c");

    tree.remove_child(parent, b).unwrap();

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
}

#[test]
fn test_remove_child_wrong_parent_is_not_found() {
    let mut tree = DomTree::new();
    let parent = element_under(&mut tree, NodeId::ROOT, "div");
    let other = element_under(&mut tree, NodeId::ROOT, "div");
    let child = element_under(&mut tree, parent, "p");

    assert_eq!(tree.remove_child(other, child), Err(DomError::NotFound));
    assert_eq!(tree.parent(child), Some(parent));
}

// ========== insert_before ==========

#[test]
fn test_insert_before_first_child() {
    let mut tree = DomTree::new();
    let parent = element_under(&mut tree, NodeId::ROOT, "div");
    let b = element_under(&mut tree, parent, "b");
    let a = tree.create_element("a");

    tree.insert_before(parent, a, Some(b)).unwrap();

    assert_eq!(tree.children(parent), &[a, b]);
    assert_eq!(tree.prev_sibling(a), None);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(b), Some(a));
}

#[test]
fn test_insert_before_middle() {
    let mut tree = DomTree::new();
    let parent = element_under(&mut tree, NodeId::ROOT, "div");
    let a = element_under(&mut tree, parent, "a");
    let c = element_under(&mut tree, parent, "c");
    let b = tree.create_element("b");

    tree.insert_before(parent, b, Some(c)).unwrap();

    assert_eq!(tree.children(parent), &[a, b, c]);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(c), Some(b));
}

#[test]
fn test_insert_ancestor_is_hierarchy_error() {
    let mut tree = DomTree::new();
    let outer = element_under(&mut tree, NodeId::ROOT, "div");
    let inner = element_under(&mut tree, outer, "div");

    assert_eq!(
        tree.insert_before(inner, outer, None),
        Err(DomError::HierarchyRequest)
    );
}

// ========== move_children ==========

#[test]
fn test_move_children_appends_to_existing() {
    let mut tree = DomTree::new();
    let from = element_under(&mut tree, NodeId::ROOT, "div");
    let to = element_under(&mut tree, NodeId::ROOT, "div");
    let existing = element_under(&mut tree, to, "span");
    let a = element_under(&mut tree, from, "a");
    let b = element_under(&mut tree, from, "b");

    tree.move_children(from, to);

    assert!(tree.children(from).is_empty());
    assert_eq!(tree.children(to), &[existing, a, b]);
    assert_eq!(tree.parent(a), Some(to));
}

// ========== character data ==========

#[test]
fn test_set_text_on_element_fails() {
    let mut tree = DomTree::new();
    let div = element_under(&mut tree, NodeId::ROOT, "div");
    assert_eq!(tree.set_text(div, "x"), Err(DomError::NotFound));
}

#[test]
fn test_max_offset_counts_characters() {
    let mut tree = DomTree::new();
    let div = element_under(&mut tree, NodeId::ROOT, "div");
    let text = tree.create_text("héllo");
    tree.append_child(div, text);

    assert_eq!(tree.max_offset(text), 5);
    assert_eq!(tree.max_offset(div), 1);
}
