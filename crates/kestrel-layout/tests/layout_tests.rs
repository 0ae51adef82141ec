//! Tests for render tree construction and the layout pass: block stacking,
//! box model edges, line breaking, positioned objects and ellipsis.

use std::rc::Rc;

use kestrel_dom::{DomTree, NodeId};
use kestrel_layout::line::Truncation;
use kestrel_layout::style::{Display, Length, Overflow, PositionType, TextOverflow, WhiteSpace};
use kestrel_layout::{Document, Edges, LayoutSettings, Rect, RenderStyle, StyleMap};

/// Create an element under `parent`.
fn element_under(dom: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = dom.create_element(tag);
    dom.append_child(parent, id);
    id
}

/// Create a text node under `parent`.
fn text_under(dom: &mut DomTree, parent: NodeId, data: &str) -> NodeId {
    let id = dom.create_text(data);
    dom.append_child(parent, id);
    id
}

/// A block style customized by `f`.
fn block_style(f: impl FnOnce(&mut RenderStyle)) -> Rc<RenderStyle> {
    let mut style = RenderStyle::default().with_display(Display::Block);
    f(&mut style);
    Rc::new(style)
}

fn laid_out(dom: DomTree, styles: StyleMap) -> Document {
    let mut doc = Document::with_styles(dom, styles, LayoutSettings::default());
    doc.layout();
    doc
}

fn frame_of(doc: &Document, node: NodeId) -> Rect {
    let id = doc.renderer(node).unwrap();
    doc.tree()[id].frame()
}

// ========== Block stacking ==========

#[test]
fn test_paragraphs_stack_vertically() {
    let mut dom = DomTree::new();
    let p1 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p1, "one");
    let p2 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p2, "two");

    let doc = laid_out(dom, StyleMap::new());

    assert_eq!(frame_of(&doc, p1), Rect::new(0, 0, 800, 19));
    assert_eq!(frame_of(&doc, p2), Rect::new(0, 19, 800, 19));
}

#[test]
fn test_adjacent_vertical_margins_collapse() {
    let mut dom = DomTree::new();
    let p1 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p1, "one");
    let p2 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p2, "two");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        p1,
        block_style(|s| {
            s.margin.top = Length::Px(10);
            s.margin.bottom = Length::Px(10);
        }),
    );
    let _ = styles.insert(p2, block_style(|s| s.margin.top = Length::Px(20)));

    let doc = laid_out(dom, styles);

    assert_eq!(frame_of(&doc, p1).y, 10);
    // max(10, 20) between the two, not the sum.
    assert_eq!(frame_of(&doc, p2).y, 49);
}

#[test]
fn test_auto_margins_center_fixed_width_block() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let _ = text_under(&mut dom, div, "centered");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        div,
        block_style(|s| {
            s.width = Length::Px(200);
            s.margin.left = Length::Auto;
            s.margin.right = Length::Auto;
        }),
    );

    let doc = laid_out(dom, styles);

    assert_eq!(frame_of(&doc, div), Rect::new(300, 0, 200, 19));
}

#[test]
fn test_border_and_padding_surround_content() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "abc");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        p,
        block_style(|s| {
            s.padding = Edges::all(Length::Px(5));
            s.border = Edges::all(2);
        }),
    );

    let doc = laid_out(dom, styles);

    assert_eq!(frame_of(&doc, p), Rect::new(0, 0, 800, 33));
    assert_eq!(doc.caret_rect(t, 0).unwrap(), Rect::new(7, 8, 1, 16));
}

#[test]
fn test_fixed_height_overrides_content() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let _ = text_under(&mut dom, div, "short");

    let mut styles = StyleMap::new();
    let _ = styles.insert(div, block_style(|s| s.height = Length::Px(100)));

    let doc = laid_out(dom, styles);

    assert_eq!(frame_of(&doc, div).height, 100);
}

// ========== Anonymous blocks ==========

#[test]
fn test_mixed_content_is_wrapped_in_anonymous_blocks() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let _ = text_under(&mut dom, div, "before");
    let p = element_under(&mut dom, div, "p");
    let _ = text_under(&mut dom, p, "inside");
    let _ = text_under(&mut dom, div, "after");

    let doc = laid_out(dom, StyleMap::new());
    let tree = doc.tree();
    let div_id = doc.renderer(div).unwrap();

    let children: Vec<_> = tree.children(div_id).collect();
    assert_eq!(children.len(), 3);
    assert!(tree[children[0]].is_anonymous());
    assert_eq!(tree[children[1]].element(), Some(p));
    assert!(tree[children[2]].is_anonymous());
    assert!(!tree[div_id].children_inline());

    let ys: Vec<i32> = children.iter().map(|&c| tree[c].frame().y).collect();
    assert_eq!(ys, vec![0, 19, 38]);
    assert_eq!(frame_of(&doc, div).height, 57);
}

#[test]
fn test_anonymous_blocks_dissolve_when_block_child_leaves() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let before = text_under(&mut dom, div, "before");
    let p = element_under(&mut dom, div, "p");
    let _ = text_under(&mut dom, p, "inside");
    let after = text_under(&mut dom, div, "after");
    let mut doc = laid_out(dom, StyleMap::new());

    doc.remove_child(div, p).unwrap();
    doc.layout();

    let tree = doc.tree();
    let div_id = doc.renderer(div).unwrap();
    let children: Vec<_> = tree.children(div_id).collect();
    assert_eq!(children, vec![doc.renderer(before).unwrap(), doc.renderer(after).unwrap()]);
    assert!(children.iter().all(|&c| !tree[c].is_anonymous()));
    assert!(tree[div_id].children_inline());
    assert_eq!(frame_of(&doc, div).height, 19);
}

#[test]
fn test_hidden_elements_generate_nothing() {
    let mut dom = DomTree::new();
    let head = element_under(&mut dom, NodeId::ROOT, "head");
    let _ = text_under(&mut dom, head, "title");
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p, "body");

    let doc = laid_out(dom, StyleMap::new());

    assert!(doc.tree().renderer(head).is_none());
    assert_eq!(frame_of(&doc, p).y, 0);
}

// ========== Line breaking ==========

#[test]
fn test_text_wraps_at_spaces() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "aaaa bbbb cccc");

    let mut styles = StyleMap::new();
    let _ = styles.insert(p, block_style(|s| s.width = Length::Px(50)));

    let doc = laid_out(dom, styles);
    let p_id = doc.renderer(p).unwrap();

    assert_eq!(doc.tree().line_boxes(p_id).count(), 3);
    assert_eq!(frame_of(&doc, p).height, 57);
    // Each word starts its own line at the left edge.
    assert_eq!(doc.caret_rect(t, 6).unwrap(), Rect::new(10, 20, 1, 16));
    assert_eq!(doc.caret_rect(t, 11).unwrap(), Rect::new(10, 39, 1, 16));
}

#[test]
fn test_ideographs_wrap_without_spaces() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "日本語日本語");

    let mut styles = StyleMap::new();
    let _ = styles.insert(p, block_style(|s| s.width = Length::Px(30)));

    let doc = laid_out(dom, styles);
    let p_id = doc.renderer(p).unwrap();

    assert_eq!(doc.tree().line_boxes(p_id).count(), 2);
    assert_eq!(doc.caret_rect(t, 4).unwrap(), Rect::new(10, 20, 1, 16));
}

#[test]
fn test_text_wraps_after_hyphen() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "well-known");

    let mut styles = StyleMap::new();
    let _ = styles.insert(p, block_style(|s| s.width = Length::Px(60)));

    let doc = laid_out(dom, styles);
    let p_id = doc.renderer(p).unwrap();

    // "well-" keeps its hyphen on the first line.
    assert_eq!(doc.tree().line_boxes(p_id).count(), 2);
    assert_eq!(doc.caret_rect(t, 4).unwrap(), Rect::new(40, 1, 1, 16));
    assert_eq!(doc.caret_rect(t, 6).unwrap(), Rect::new(10, 20, 1, 16));
}

#[test]
fn test_nowrap_ignores_ideograph_breaks() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p, "日本語日本語");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        p,
        block_style(|s| {
            s.width = Length::Px(30);
            s.white_space = WhiteSpace::Nowrap;
        }),
    );

    let doc = laid_out(dom, styles);
    assert_eq!(doc.tree().line_boxes(doc.renderer(p).unwrap()).count(), 1);
}

#[test]
fn test_nowrap_keeps_one_line() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p, "aaaa bbbb cccc");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        p,
        block_style(|s| {
            s.width = Length::Px(50);
            s.white_space = WhiteSpace::Nowrap;
        }),
    );

    let doc = laid_out(dom, styles);
    let p_id = doc.renderer(p).unwrap();

    assert_eq!(doc.tree().line_boxes(p_id).count(), 1);
    assert_eq!(frame_of(&doc, p).height, 19);
}

#[test]
fn test_line_break_element_forces_new_line() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p, "first");
    let _ = element_under(&mut dom, p, "br");
    let second = text_under(&mut dom, p, "second");

    let doc = laid_out(dom, StyleMap::new());
    let p_id = doc.renderer(p).unwrap();

    assert_eq!(doc.tree().line_boxes(p_id).count(), 2);
    assert_eq!(doc.caret_rect(second, 0).unwrap(), Rect::new(0, 20, 1, 16));
}

// ========== Positioned objects ==========

#[test]
fn test_absolute_box_is_placed_by_offsets() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p, "flow");
    let div = element_under(&mut dom, NodeId::ROOT, "div");
    let _ = text_under(&mut dom, div, "abs");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        div,
        block_style(|s| {
            s.position = PositionType::Absolute;
            s.offsets.left = Length::Px(100);
            s.offsets.top = Length::Px(50);
            s.width = Length::Px(200);
        }),
    );

    let doc = laid_out(dom, styles);

    assert_eq!(frame_of(&doc, div), Rect::new(100, 50, 200, 19));
    // Out of flow: the paragraph is not pushed down.
    assert_eq!(frame_of(&doc, p).y, 0);
}

#[test]
fn test_absolute_box_between_offsets_takes_remaining_width() {
    let mut dom = DomTree::new();
    let div = element_under(&mut dom, NodeId::ROOT, "div");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        div,
        block_style(|s| {
            s.position = PositionType::Absolute;
            s.offsets.left = Length::Px(50);
            s.offsets.right = Length::Px(150);
        }),
    );

    let doc = laid_out(dom, styles);

    let frame = frame_of(&doc, div);
    assert_eq!(frame.x, 50);
    assert_eq!(frame.width, 600);
}

#[test]
fn test_relative_offset_shifts_without_affecting_siblings() {
    let mut dom = DomTree::new();
    let p1 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p1, "moved");
    let p2 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p2, "stays");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        p1,
        block_style(|s| {
            s.position = PositionType::Relative;
            s.offsets.left = Length::Px(10);
            s.offsets.top = Length::Px(5);
        }),
    );

    let doc = laid_out(dom, styles);

    assert_eq!(frame_of(&doc, p1).x, 10);
    assert_eq!(frame_of(&doc, p1).y, 5);
    assert_eq!(frame_of(&doc, p2).y, 19);
}

// ========== Ellipsis ==========

#[test]
fn test_ellipsis_truncates_overflowing_line() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "abcdefghij");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        p,
        block_style(|s| {
            s.width = Length::Px(50);
            s.overflow = Overflow::Hidden;
            s.white_space = WhiteSpace::Nowrap;
            s.text_overflow = TextOverflow::Ellipsis;
        }),
    );

    let doc = laid_out(dom, styles);
    let tree = doc.tree();
    let p_id = doc.renderer(p).unwrap();
    let root = tree.line_boxes(p_id).next().unwrap();

    let ellipsis = tree[root].line_info().unwrap().ellipsis.as_ref().unwrap();
    assert_eq!(ellipsis.text, "...");
    assert_eq!(ellipsis.x, 20);
    assert_eq!(ellipsis.width, 30);

    let t_id = doc.renderer(t).unwrap();
    let text_box = tree.line_boxes(t_id).next().unwrap();
    assert_eq!(tree[text_box].text_run().unwrap().truncation, Truncation::At(2));
}

#[test]
fn test_no_ellipsis_without_overflow_clip() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p, "abcdefghij");

    let mut styles = StyleMap::new();
    let _ = styles.insert(
        p,
        block_style(|s| {
            s.width = Length::Px(50);
            s.white_space = WhiteSpace::Nowrap;
            s.text_overflow = TextOverflow::Ellipsis;
        }),
    );

    let doc = laid_out(dom, styles);
    let p_id = doc.renderer(p).unwrap();
    let root = doc.tree().line_boxes(p_id).next().unwrap();

    assert!(doc.tree()[root].line_info().unwrap().ellipsis.is_none());
}

// ========== Incremental relayout ==========

#[test]
fn test_set_text_relayouts_only_after_layout() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, "aaaa");

    let mut styles = StyleMap::new();
    let _ = styles.insert(p, block_style(|s| s.width = Length::Px(50)));

    let mut doc = laid_out(dom, styles);
    assert_eq!(frame_of(&doc, p).height, 19);

    doc.set_text(t, "aaaa bbbb").unwrap();
    let p_id = doc.renderer(p).unwrap();
    assert!(doc.tree()[p_id].needs_layout());
    assert_eq!(frame_of(&doc, p).height, 19);

    doc.layout();
    assert!(!doc.tree()[p_id].needs_layout());
    assert_eq!(frame_of(&doc, p).height, 38);
    assert_eq!(doc.tree().line_boxes(p_id).count(), 2);
}

#[test]
fn test_appended_paragraph_is_laid_out_below() {
    let mut dom = DomTree::new();
    let p1 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p1, "one");

    let mut doc = laid_out(dom, StyleMap::new());

    let p2 = doc.create_element("p");
    let t2 = doc.create_text("two");
    doc.append_child(p2, t2).unwrap();
    doc.append_child(NodeId::ROOT, p2).unwrap();
    doc.layout();

    assert_eq!(frame_of(&doc, p1).y, 0);
    assert_eq!(frame_of(&doc, p2).y, 19);
}
