//! Tests for bidirectional text through the document: run splitting and
//! visual box order, carets and hit testing inside reversed boxes, and
//! alignment of right-to-left blocks.

use std::rc::Rc;

use kestrel_dom::{DomTree, NodeId};
use kestrel_layout::line::BoxId;
use kestrel_layout::style::{Direction, Display, TextAlign, UnicodeBidi};
use kestrel_layout::{Document, HitTestAction, LayoutSettings, Position, Rect, RenderStyle, StyleMap};

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

/// `<p>` holding `data`, its style customized by `f`.
fn paragraph(data: &str, f: impl FnOnce(&mut RenderStyle)) -> (Document, NodeId, NodeId) {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, data);
    let mut style = RenderStyle::default().with_display(Display::Block);
    f(&mut style);
    let mut styles = StyleMap::new();
    let _ = styles.insert(p, Rc::new(style));
    let mut doc = Document::with_styles(dom, styles, LayoutSettings::default());
    doc.layout();
    (doc, p, t)
}

/// Boxes on the first line of `block`, left to right.
fn first_line(doc: &Document, block: NodeId) -> Vec<BoxId> {
    let tree = doc.tree();
    let root = tree.line_boxes(doc.renderer(block).unwrap()).next().unwrap();
    tree.line_children(root).collect()
}

/// Rendered (start, len) of a text box.
fn run_of(doc: &Document, b: BoxId) -> (usize, usize) {
    let run = doc.tree()[b].text_run().unwrap();
    (run.start, run.len)
}

// ========== Runs ==========

#[test]
fn test_hebrew_in_ltr_text_gets_its_own_reversed_box() {
    let (doc, p, _) = paragraph("abc אבג def", |_| {});
    let boxes = first_line(&doc, p);
    let tree = doc.tree();

    assert_eq!(boxes.len(), 3);
    assert_eq!(boxes.iter().map(|&b| run_of(&doc, b)).collect::<Vec<_>>(), vec![(0, 4), (4, 3), (7, 4)]);
    assert_eq!(boxes.iter().map(|&b| tree[b].x).collect::<Vec<_>>(), vec![0, 40, 70]);
    assert_eq!(boxes.iter().map(|&b| tree[b].bidi_level).collect::<Vec<_>>(), vec![0, 1, 0]);

    assert!(!tree[boxes[0]].is_reversed());
    assert!(tree[boxes[1]].is_reversed());
    assert!(!tree[boxes[2]].is_reversed());
}

#[test]
fn test_pure_ltr_text_stays_in_one_box() {
    let (doc, p, _) = paragraph("abc def", |_| {});
    let boxes = first_line(&doc, p);

    assert_eq!(boxes.len(), 1);
    assert_eq!(doc.tree()[boxes[0]].bidi_level, 0);
}

#[test]
fn test_rtl_block_puts_latin_run_after_hebrew() {
    let (doc, p, _) = paragraph("abc אבג", |s| s.direction = Direction::Rtl);
    let boxes = first_line(&doc, p);
    let tree = doc.tree();

    // The space sides with the right-to-left run; "abc" nests one level up.
    assert_eq!(boxes.len(), 2);
    assert_eq!(run_of(&doc, boxes[0]), (3, 4));
    assert_eq!(run_of(&doc, boxes[1]), (0, 3));
    assert_eq!(tree[boxes[0]].bidi_level, 1);
    assert_eq!(tree[boxes[1]].bidi_level, 2);
    assert!(tree[boxes[0]].is_reversed());
    assert!(!tree[boxes[1]].is_reversed());
    assert!(tree[boxes[0]].x < tree[boxes[1]].x);
}

#[test]
fn test_bidi_override_reverses_latin_text() {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p, "ab");
    let span = element_under(&mut dom, p, "span");
    let t = text_under(&mut dom, span, "cde");
    let _ = text_under(&mut dom, p, "fg");
    let mut style = RenderStyle::default().with_display(Display::Inline);
    style.direction = Direction::Rtl;
    style.unicode_bidi = UnicodeBidi::BidiOverride;
    let mut styles = StyleMap::new();
    let _ = styles.insert(span, Rc::new(style));
    let mut doc = Document::with_styles(dom, styles, LayoutSettings::default());
    doc.layout();

    let tree = doc.tree();
    let text_box = tree.line_boxes(doc.renderer(t).unwrap()).next().unwrap();
    assert!(tree[text_box].is_reversed());
    assert_eq!(tree[text_box].bidi_level, 1);
    assert_eq!(tree[text_box].x, 20);

    // Logical start sits on the right edge of the box.
    assert_eq!(doc.caret_rect(t, 0).unwrap(), Rect::new(50, 1, 1, 16));
    assert_eq!(doc.caret_rect(t, 1).unwrap(), Rect::new(40, 1, 1, 16));
}

// ========== Carets ==========

#[test]
fn test_caret_moves_leftward_in_reversed_box() {
    let (doc, _, t) = paragraph("abc אבג def", |_| {});

    // The Hebrew box spans [40, 70) and starts at offset 4.
    assert_eq!(doc.caret_rect(t, 5).unwrap(), Rect::new(60, 1, 1, 16));
    assert_eq!(doc.caret_rect(t, 6).unwrap(), Rect::new(50, 1, 1, 16));
    // Latin on either side runs rightward as usual.
    assert_eq!(doc.caret_rect(t, 2).unwrap(), Rect::new(20, 1, 1, 16));
    assert_eq!(doc.caret_rect(t, 9).unwrap(), Rect::new(90, 1, 1, 16));
}

#[test]
fn test_offset_for_position_counts_from_right_edge() {
    let (doc, p, _) = paragraph("abc אבג def", |_| {});
    let boxes = first_line(&doc, p);
    let tree = doc.tree();
    let hebrew = boxes[1];

    assert_eq!(tree.offset_for_position(hebrew, 69), 0);
    assert_eq!(tree.offset_for_position(hebrew, 62), 1);
    assert_eq!(tree.offset_for_position(hebrew, 52), 2);
    assert_eq!(tree.offset_for_position(hebrew, 41), 3);
}

#[test]
fn test_hit_in_reversed_box_maps_back_to_logical_offset() {
    let (doc, _, t) = paragraph("abc אבג def", |_| {});

    let hit = doc.hit_test(62, 9, 0, 0, HitTestAction::All).unwrap();
    assert_eq!(hit.node, Some(t));
    assert_eq!(hit.position, Position::new(t, 5));

    let hit = doc.hit_test(43, 9, 0, 0, HitTestAction::All).unwrap();
    assert_eq!(hit.position, Position::new(t, 7));
}

#[test]
fn test_caret_in_rtl_block_follows_visual_runs() {
    let (doc, _, t) = paragraph("abc אבג", |s| s.direction = Direction::Rtl);

    // " אבג" spans [730, 770) reversed, "abc" spans [770, 800).
    assert_eq!(doc.caret_rect(t, 0).unwrap(), Rect::new(770, 1, 1, 16));
    assert_eq!(doc.caret_rect(t, 1).unwrap(), Rect::new(780, 1, 1, 16));
    assert_eq!(doc.caret_rect(t, 5).unwrap(), Rect::new(750, 1, 1, 16));
}

// ========== Alignment ==========

#[test]
fn test_rtl_block_aligns_start_to_the_right() {
    let (doc, p, _) = paragraph("abc אבג", |s| s.direction = Direction::Rtl);
    let boxes = first_line(&doc, p);
    let tree = doc.tree();

    assert_eq!(tree[boxes[0]].x, 730);
    assert_eq!(tree[boxes[1]].x + tree[boxes[1]].width, 800);
}

#[test]
fn test_rtl_block_honors_explicit_text_align() {
    let (doc, p, _) = paragraph("abc אבג", |s| {
        s.direction = Direction::Rtl;
        s.text_align = TextAlign::Left;
    });
    assert_eq!(doc.tree()[first_line(&doc, p)[0]].x, 0);

    let (doc, p, _) = paragraph("abc אבג", |s| {
        s.direction = Direction::Rtl;
        s.text_align = TextAlign::Center;
    });
    assert_eq!(doc.tree()[first_line(&doc, p)[0]].x, 365);
}

#[test]
fn test_justify_in_rtl_block_falls_back_to_right() {
    let (doc, p, _) = paragraph("abc אבג", |s| {
        s.direction = Direction::Rtl;
        s.text_align = TextAlign::Justify;
    });
    assert_eq!(doc.tree()[first_line(&doc, p)[0]].x, 730);
}
