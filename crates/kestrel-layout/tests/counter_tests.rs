//! Tests for CSS counters: the counter forest on its own and list numbering
//! through the document.

use std::rc::Rc;

use kestrel_dom::{DomTree, NodeId};
use kestrel_layout::counter::{CounterForest, CounterId, CounterNode, LIST_ITEM_COUNTER};
use kestrel_layout::style::{CounterDirective, Display};
use kestrel_layout::{Document, LayoutSettings, RenderStyle, StyleMap};

fn element_under(dom: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = dom.create_element(tag);
    dom.append_child(parent, id);
    id
}

fn list_item(dom: &mut DomTree, list: NodeId, text: &str) -> NodeId {
    let li = element_under(dom, list, "li");
    let t = dom.create_text(text);
    dom.append_child(li, t);
    li
}

fn count(forest: &CounterForest, id: CounterId) -> i32 {
    forest.get(id).map_or(i32::MIN, CounterNode::count)
}

/// Append `node` as the last child of reset `parent`.
fn push(forest: &mut CounterForest, parent: CounterId, node: CounterId) {
    let last = forest.children(parent).last();
    forest.insert_after(parent, node, last);
}

fn directive(name: &str, value: i32) -> Vec<CounterDirective> {
    vec![CounterDirective {
        name: name.to_string(),
        value,
    }]
}

// ========== Counter forest ==========

#[test]
fn test_reset_chain_counts_running_sum() {
    let mut forest = CounterForest::default();
    let root = forest.create(None, true, 3);
    forest.recount(root, true);
    let nodes: Vec<CounterId> = [1, 2, 3].iter().map(|&v| forest.create(None, false, v)).collect();
    for &n in &nodes {
        push(&mut forest, root, n);
    }
    forest.recount(nodes[0], true);

    let counts: Vec<i32> = nodes.iter().map(|&n| count(&forest, n)).collect();
    assert_eq!(counts, vec![4, 6, 9]);
}

#[test]
fn test_nested_reset_starts_new_instance() {
    let mut forest = CounterForest::default();
    let root = forest.create(None, true, 0);
    let a = forest.create(None, false, 1);
    let nested = forest.create(None, true, 7);
    let inner = forest.create(None, false, 1);
    push(&mut forest, root, a);
    push(&mut forest, root, nested);
    push(&mut forest, nested, inner);

    // A reset carries the running count of its predecessor.
    assert_eq!(count(&forest, nested), 1);
    assert_eq!(forest.get(nested).map(CounterNode::displayed), Some(7));
    assert_eq!(count(&forest, inner), 8);
}

#[test]
fn test_removed_reset_children_are_adopted_in_place() {
    let mut forest = CounterForest::default();
    let root = forest.create(None, true, 0);
    let a = forest.create(None, false, 1);
    let removed = forest.create(None, true, 5);
    let b = forest.create(None, false, 1);
    push(&mut forest, root, a);
    push(&mut forest, root, removed);
    push(&mut forest, root, b);
    let x1 = forest.create(None, false, 1);
    let x2 = forest.create(None, false, 2);
    push(&mut forest, removed, x1);
    push(&mut forest, removed, x2);

    forest.remove_child(root, removed);

    assert_eq!(forest.children(root).collect::<Vec<_>>(), vec![a, x1, x2, b]);
    assert_eq!(forest.get(x1).and_then(CounterNode::parent), Some(root));
    assert_eq!(forest.get(x2).and_then(CounterNode::parent), Some(root));
    assert_eq!(forest.children(removed).count(), 0);
    assert_eq!(forest.get(removed).and_then(CounterNode::parent), None);
    let counts: Vec<i32> = [a, x1, x2, b].iter().map(|&n| count(&forest, n)).collect();
    assert_eq!(counts, vec![1, 2, 4, 5]);
}

#[test]
fn test_sibling_after_adopted_chain_is_recounted() {
    let mut forest = CounterForest::default();
    let root = forest.create(None, true, 0);
    let a = forest.create(None, false, 1);
    let removed = forest.create(None, true, 1);
    let b = forest.create(None, false, 1);
    push(&mut forest, root, a);
    push(&mut forest, root, removed);
    push(&mut forest, root, b);
    let c1 = forest.create(None, false, 1);
    let c2 = forest.create(None, false, 1);
    push(&mut forest, removed, c1);
    push(&mut forest, removed, c2);
    assert_eq!(count(&forest, c2), 3);

    // The adopted counts happen to stay put; the node after them does not.
    forest.remove_child(root, removed);

    assert_eq!(forest.children(root).collect::<Vec<_>>(), vec![a, c1, c2, b]);
    let counts: Vec<i32> = [a, c1, c2, b].iter().map(|&n| count(&forest, n)).collect();
    assert_eq!(counts, vec![1, 2, 3, 4]);
}

#[test]
fn test_removing_from_wrong_parent_is_ignored() {
    let mut forest = CounterForest::default();
    let root = forest.create(None, true, 0);
    let other = forest.create(None, true, 0);
    let a = forest.create(None, false, 1);
    push(&mut forest, root, a);

    forest.remove_child(other, a);
    assert_eq!(forest.children(root).collect::<Vec<_>>(), vec![a]);
}

#[test]
fn test_destroy_frees_node() {
    let mut forest = CounterForest::default();
    let root = forest.create(None, true, 0);
    let a = forest.create(None, false, 1);
    let b = forest.create(None, false, 1);
    push(&mut forest, root, a);
    push(&mut forest, root, b);
    assert_eq!(forest.len(), 3);

    forest.destroy(a);
    assert_eq!(forest.len(), 2);
    assert!(forest.get(a).is_none());
    assert_eq!(count(&forest, b), 1);
}

// ========== List items ==========

#[test]
fn test_list_items_number_from_one() {
    let mut dom = DomTree::new();
    let ol = element_under(&mut dom, NodeId::ROOT, "ol");
    let items: Vec<NodeId> = ["a", "b", "c"].iter().map(|t| list_item(&mut dom, ol, t)).collect();
    let mut doc = Document::new(dom, LayoutSettings::default());
    doc.layout();

    let values: Vec<Option<i32>> = items
        .iter()
        .map(|&li| doc.counter_value(li, LIST_ITEM_COUNTER).unwrap())
        .collect();
    assert_eq!(values, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_ordered_list_start_attribute() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let ol = element_under(&mut dom, div, "ol");
    dom.set_attribute(ol, "start", "5").unwrap();
    let first = list_item(&mut dom, ol, "a");
    let second = list_item(&mut dom, ol, "b");
    let mut doc = Document::new(dom, LayoutSettings::default());
    doc.layout();

    assert_eq!(doc.counter_value(first, LIST_ITEM_COUNTER).unwrap(), Some(5));
    assert_eq!(doc.counter_value(second, LIST_ITEM_COUNTER).unwrap(), Some(6));
}

#[test]
fn test_list_item_value_attribute_restarts_numbering() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let ol = element_under(&mut dom, div, "ol");
    let first = list_item(&mut dom, ol, "a");
    let jump = list_item(&mut dom, ol, "b");
    dom.set_attribute(jump, "value", "10").unwrap();
    let after = list_item(&mut dom, ol, "c");
    let mut doc = Document::new(dom, LayoutSettings::default());
    doc.layout();

    assert_eq!(doc.counter_value(first, LIST_ITEM_COUNTER).unwrap(), Some(1));
    assert_eq!(doc.counter_value(jump, LIST_ITEM_COUNTER).unwrap(), Some(10));
    assert_eq!(doc.counter_value(after, LIST_ITEM_COUNTER).unwrap(), Some(11));
}

#[test]
fn test_non_participating_element_has_no_counter() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let p = element_under(&mut dom, div, "p");
    let t = dom.create_text("x");
    dom.append_child(p, t);
    let mut doc = Document::new(dom, LayoutSettings::default());
    doc.layout();

    // Text never carries counters.
    assert_eq!(doc.counter_value(t, LIST_ITEM_COUNTER).unwrap(), None);
}

// ========== Author counters ==========

#[test]
fn test_counter_reset_and_increment() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let sections: Vec<NodeId> = (0..3).map(|_| element_under(&mut dom, div, "section")).collect();

    let mut styles = StyleMap::new();
    let mut reset = RenderStyle::default().with_display(Display::Block);
    reset.counter_reset = directive("chapter", 0);
    let _ = styles.insert(div, Rc::new(reset));
    for &s in &sections {
        let mut style = RenderStyle::default().with_display(Display::Block);
        style.counter_increment = directive("chapter", 2);
        let _ = styles.insert(s, Rc::new(style));
    }
    let mut doc = Document::with_styles(dom, styles, LayoutSettings::default());
    doc.layout();

    let values: Vec<Option<i32>> = sections
        .iter()
        .map(|&s| doc.counter_value(s, "chapter").unwrap())
        .collect();
    assert_eq!(values, vec![Some(2), Some(4), Some(6)]);
}
