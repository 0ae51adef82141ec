//! Tests for DOM positions against the rendering: offset mapping, leaf
//! snapping, character, word and line movement, and equivalent positions.

use std::rc::Rc;

use kestrel_dom::{DomTree, NodeId};
use kestrel_layout::style::{Display, Length};
use kestrel_layout::{Document, LayoutSettings, Position, RenderPosition, RenderStyle, StyleMap};

fn element_under(dom: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = dom.create_element(tag);
    dom.append_child(parent, id);
    id
}

fn text_under(dom: &mut DomTree, parent: NodeId, data: &str) -> NodeId {
    let id = dom.create_text(data);
    dom.append_child(parent, id);
    id
}

/// An editable `<p>` under the document.
fn editable_paragraph(dom: &mut DomTree) -> NodeId {
    let p = element_under(dom, NodeId::ROOT, "p");
    dom.set_attribute(p, "contenteditable", "true").unwrap();
    p
}

fn laid_out(dom: DomTree) -> Document {
    let mut doc = Document::new(dom, LayoutSettings::default());
    doc.layout();
    doc
}

/// `<p contenteditable>abc<b>def</b></p>`
fn text_and_bold() -> (Document, NodeId, NodeId, NodeId) {
    let mut dom = DomTree::new();
    let p = editable_paragraph(&mut dom);
    let t1 = text_under(&mut dom, p, "abc");
    let b = element_under(&mut dom, p, "b");
    let t2 = text_under(&mut dom, b, "def");
    (laid_out(dom), p, t1, t2)
}

// ========== Offset mapping ==========

#[test]
fn test_round_trip_without_collapsed_whitespace() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "Hello world");
    let doc = laid_out(dom);
    let view = doc.view();

    for offset in 0..=11 {
        let pos = Position::new(t, offset);
        assert_eq!(RenderPosition::from_dom_position(view, pos).position(), pos);
        assert_eq!(pos.rendered_offset(view), offset);
    }
}

#[test]
fn test_offsets_in_collapsed_whitespace_normalize() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "a   b");
    let doc = laid_out(dom);
    let view = doc.view();

    let resolve = |offset| RenderPosition::from_dom_position(view, Position::new(t, offset)).position();
    assert_eq!(resolve(1), Position::new(t, 1));
    assert_eq!(resolve(2), Position::new(t, 2));
    assert_eq!(resolve(3), Position::new(t, 2));
    assert_eq!(resolve(4), Position::new(t, 2));
    assert_eq!(Position::new(t, 4).rendered_offset(view), 2);
    assert_eq!(Position::new(t, 5).rendered_offset(view), 3);
}

#[test]
fn test_unrendered_node_resolves_to_empty() {
    let mut dom = DomTree::new();
    let head = element_under(&mut dom, NodeId::ROOT, "head");
    let t = text_under(&mut dom, head, "title");
    let doc = laid_out(dom);
    let view = doc.view();

    assert!(RenderPosition::from_dom_position(view, Position::new(t, 0)).is_empty());
    assert!(!Position::new(t, 0).in_rendered_content(view));
}

// ========== Leaf and range-compliant positions ==========

#[test]
fn test_container_position_snaps_to_leaf() {
    let (doc, p, t1, t2) = text_and_bold();
    let view = doc.view();

    assert_eq!(Position::new(p, 0).equivalent_leaf_position(view), Position::new(t1, 0));
    assert_eq!(Position::new(p, 1).equivalent_leaf_position(view), Position::new(t2, 0));
    assert_eq!(Position::new(p, 2).equivalent_leaf_position(view), Position::new(t2, 3));
    assert_eq!(Position::new(t1, 2).equivalent_leaf_position(view), Position::new(t1, 2));
}

#[test]
fn test_line_break_position_becomes_range_compliant() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "first");
    let br = element_under(&mut dom, p, "br");
    let doc = laid_out(dom);
    let view = doc.view();

    assert_eq!(Position::new(br, 0).equivalent_range_compliant_position(view), Position::new(p, 1));
    assert_eq!(Position::new(t, 3).equivalent_range_compliant_position(view), Position::new(t, 3));
}

#[test]
fn test_shallow_position_climbs_first_children() {
    let (doc, p, t1, t2) = text_and_bold();
    let view = doc.view();

    assert_eq!(Position::new(t1, 0).equivalent_shallow_position(view), Position::new(NodeId::ROOT, 0));
    // Not at the start: stays put.
    assert_eq!(Position::new(t1, 1).equivalent_shallow_position(view), Position::new(t1, 1));
    // At the start, but not of a first child.
    let b = doc.dom().parent(t2).unwrap();
    assert_eq!(Position::new(t2, 0).equivalent_shallow_position(view), Position::new(b, 0));
    assert_eq!(doc.dom().parent(b), Some(p));
}

// ========== Character movement ==========

#[test]
fn test_next_character_inside_text() {
    let (doc, _, t1, _) = text_and_bold();
    let view = doc.view();

    assert_eq!(Position::new(t1, 1).next_character_position(view), Position::new(t1, 2));
    assert_eq!(Position::new(t1, 2).previous_character_position(view), Position::new(t1, 1));
}

#[test]
fn test_next_character_skips_equivalent_boundary() {
    let (doc, _, t1, t2) = text_and_bold();
    let view = doc.view();

    // (t1, 3) and (t2, 0) draw the caret in the same place.
    assert!(!Position::new(t1, 3).renders_in_different_position(view, &Position::new(t2, 0)));
    assert_eq!(Position::new(t1, 3).next_character_position(view), Position::new(t2, 1));
    assert_eq!(Position::new(t2, 0).previous_character_position(view), Position::new(t1, 2));
}

#[test]
fn test_character_movement_stops_at_document_edges() {
    let (doc, _, t1, t2) = text_and_bold();
    let view = doc.view();

    assert_eq!(Position::new(t1, 0).previous_character_position(view), Position::new(t1, 0));
    assert_eq!(Position::new(t2, 3).next_character_position(view), Position::new(t2, 3));
}

#[test]
fn test_character_movement_stays_in_editable_root() {
    let mut dom = DomTree::new();
    let p1 = editable_paragraph(&mut dom);
    let t1 = text_under(&mut dom, p1, "one");
    let p2 = editable_paragraph(&mut dom);
    let t2 = text_under(&mut dom, p2, "two");
    let doc = laid_out(dom);
    let view = doc.view();

    assert_eq!(Position::new(t1, 3).next_character_position(view), Position::new(t1, 3));
    assert_eq!(Position::new(t2, 0).previous_character_position(view), Position::new(t2, 0));
}

#[test]
fn test_rendered_editable_position_skips_unrendered_leaves() {
    let mut dom = DomTree::new();
    let p = editable_paragraph(&mut dom);
    let t1 = text_under(&mut dom, p, "one");
    let hidden = element_under(&mut dom, p, "script");
    let _ = text_under(&mut dom, hidden, "code");
    let t2 = text_under(&mut dom, p, "two");
    let doc = laid_out(dom);
    let view = doc.view();

    assert_eq!(Position::new(t1, 1).next_rendered_editable_position(view), Position::new(t1, 1));
    let script_text = doc.dom().first_child(hidden).unwrap();
    assert_eq!(
        Position::new(script_text, 0).next_rendered_editable_position(view),
        Position::new(t2, 0)
    );
    assert_eq!(
        Position::new(script_text, 0).previous_rendered_editable_position(view),
        Position::new(t1, 0)
    );
}

// ========== Word movement ==========

#[test]
fn test_next_word_stops_at_each_run_end() {
    let mut dom = DomTree::new();
    let p = editable_paragraph(&mut dom);
    let t = text_under(&mut dom, p, "Hello world");
    let doc = laid_out(dom);
    let view = doc.view();

    let first = Position::new(t, 0).next_word_position(view);
    assert_eq!(first, Position::new(t, 5));
    let second = first.next_word_position(view);
    assert_eq!(second, Position::new(t, 6));
    let third = second.next_word_position(view);
    assert_eq!(third, Position::new(t, 11));
    assert_eq!(third.next_word_position(view), third);
}

#[test]
fn test_previous_word_stops_at_each_run_start() {
    let mut dom = DomTree::new();
    let p = editable_paragraph(&mut dom);
    let t = text_under(&mut dom, p, "Hello world");
    let doc = laid_out(dom);
    let view = doc.view();

    let first = Position::new(t, 11).previous_word_position(view);
    assert_eq!(first, Position::new(t, 6));
    let second = first.previous_word_position(view);
    assert_eq!(second, Position::new(t, 5));
    assert_eq!(second.previous_word_position(view), Position::new(t, 0));
}

// ========== Upstream and downstream ==========

#[test]
fn test_upstream_moves_to_end_of_previous_text() {
    let (doc, _, t1, t2) = text_and_bold();
    let view = doc.view();

    assert_eq!(Position::new(t2, 0).equivalent_upstream_position(view), Position::new(t1, 3));
    assert_eq!(Position::new(t2, 2).equivalent_upstream_position(view), Position::new(t2, 2));
}

#[test]
fn test_downstream_keeps_rendered_position() {
    let (doc, _, t1, _) = text_and_bold();
    let view = doc.view();

    assert_eq!(Position::new(t1, 1).equivalent_downstream_position(view), Position::new(t1, 1));
}

// ========== Lines ==========

fn wrapped_paragraph() -> (Document, NodeId) {
    let mut dom = DomTree::new();
    let p = editable_paragraph(&mut dom);
    let t = text_under(&mut dom, p, "aaaa bbbb cccc");
    let mut style = RenderStyle::default().with_display(Display::Block);
    style.width = Length::Px(50);
    let mut styles = StyleMap::new();
    let _ = styles.insert(p, Rc::new(style));
    let mut doc = Document::with_styles(dom, styles, LayoutSettings::default());
    doc.layout();
    (doc, t)
}

#[test]
fn test_next_line_keeps_x() {
    let (doc, t) = wrapped_paragraph();
    let view = doc.view();

    let down = Position::new(t, 1).next_line_position(view, 10);
    assert_eq!(down, Position::new(t, 6));
    let down = down.next_line_position(view, 10);
    assert_eq!(down, Position::new(t, 11));
    // No line below the last one.
    assert_eq!(down.next_line_position(view, 10), down);
}

#[test]
fn test_previous_line_keeps_x() {
    let (doc, t) = wrapped_paragraph();
    let view = doc.view();

    let up = Position::new(t, 12).previous_line_position(view, 20);
    assert_eq!(up, Position::new(t, 7));
    assert_eq!(Position::new(t, 2).previous_line_position(view, 20), Position::new(t, 2));
}

#[test]
fn test_same_line_detection() {
    let (doc, t) = wrapped_paragraph();
    let view = doc.view();

    assert!(Position::new(t, 0).renders_on_same_line(view, &Position::new(t, 3)));
    assert!(!Position::new(t, 1).renders_on_same_line(view, &Position::new(t, 7)));
}

#[test]
fn test_first_and_last_rendered_position_on_line() {
    let mut dom = DomTree::new();
    let p = editable_paragraph(&mut dom);
    let _ = text_under(&mut dom, p, "first");
    let br = element_under(&mut dom, p, "br");
    let t2 = text_under(&mut dom, p, "second");
    let doc = laid_out(dom);
    let view = doc.view();

    assert!(Position::new(t2, 0).is_first_rendered_position_on_line(view));
    assert!(!Position::new(t2, 1).is_first_rendered_position_on_line(view));
    assert!(Position::new(br, 0).is_last_rendered_position_on_line(view));
    assert!(Position::new(t2, 6).is_last_rendered_position_on_line(view));
}

// ========== Block and root edges ==========

#[test]
fn test_edges_of_containing_block() {
    let (doc, _, t1, t2) = text_and_bold();
    let view = doc.view();

    assert!(Position::new(t1, 0).in_first_editable_in_containing_editable_block(view));
    assert!(Position::new(t1, 0).at_start_of_containing_editable_block(view));
    assert!(!Position::new(t1, 1).in_first_editable_in_containing_editable_block(view));
    assert!(Position::new(t2, 3).in_last_editable_in_containing_editable_block(view));
    assert!(Position::new(t2, 3).is_last_rendered_position_in_editable_block(view));
    assert!(!Position::new(t1, 3).is_last_rendered_position_in_editable_block(view));
}

#[test]
fn test_edges_of_root_editable_element() {
    let (doc, _, t1, t2) = text_and_bold();
    let view = doc.view();

    assert!(Position::new(t1, 0).at_start_of_root_editable_element(view));
    assert!(Position::new(t2, 3).in_last_editable_in_root_editable_element(view));
    assert!(!Position::new(t2, 1).in_last_editable_in_root_editable_element(view));
}
