//! Tests for the serializable render tree snapshot and the text dumps built
//! from it.

use kestrel_dom::{DomTree, NodeId};
use kestrel_layout::dump::{dump_line_boxes, dump_render_tree, snapshot};
use kestrel_layout::{Document, LayoutSettings};
use serde_json::{Value, json};

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

/// `<p>` holding `data`, laid out.
fn paragraph(data: &str) -> (Document, NodeId, NodeId) {
    let mut dom = DomTree::new();
    let p = element_under(&mut dom, NodeId::ROOT, "p");
    let t = text_under(&mut dom, p, data);
    let mut doc = Document::new(dom, LayoutSettings::default());
    doc.layout();
    (doc, p, t)
}

fn snapshot_json(doc: &Document) -> Value {
    serde_json::to_value(snapshot(doc.view())).unwrap()
}

// ========== Snapshot ==========

#[test]
fn test_snapshot_serializes_object_tree() {
    let (doc, p, t) = paragraph("Hello");
    let value = snapshot_json(&doc);

    assert_eq!(value["kind"], "RenderCanvas");
    let block = &value["children"][0];
    assert_eq!(block["kind"], "RenderBlock");
    assert_eq!(block["node"], json!(p.0));
    assert_eq!(block["tag"], "p");
    assert_eq!(block["frame"], json!({"x": 0, "y": 0, "width": 800, "height": 19}));
    assert_eq!(block["absolute"], block["frame"]);

    let text = &block["children"][0];
    assert_eq!(text["kind"], "RenderText");
    assert_eq!(text["node"], json!(t.0));
    assert_eq!(text["text"], "Hello");
}

#[test]
fn test_snapshot_omits_empty_fields() {
    let (doc, _, _) = paragraph("Hello");
    let value = snapshot_json(&doc);
    let block = value["children"][0].as_object().unwrap();
    let text = block["children"][0].as_object().unwrap();

    assert!(!block.contains_key("text"));
    assert!(!block.contains_key("list_item"));
    assert!(!text.contains_key("tag"));
    assert!(!text.contains_key("lines"));
    assert!(!text.contains_key("children"));
}

#[test]
fn test_snapshot_lists_line_boxes_of_blocks() {
    let (doc, p, t) = paragraph("Hello");
    let value = snapshot_json(&doc);
    let lines = value["children"][0]["lines"].as_array().unwrap();

    assert_eq!(lines.len(), 1);
    let root = &lines[0];
    assert_eq!(root["kind"], "root");
    assert_eq!(root["node"], json!(p.0));
    assert_eq!(root["frame"]["x"], 0);
    assert_eq!(root["frame"]["width"], 50);
    assert_eq!(root["frame"]["height"], 19);
    assert_eq!(root["bidi_level"], 0);
    assert!(root.get("ellipsis").is_none());

    let text_box = &root["children"][0];
    assert_eq!(text_box["kind"], "text");
    assert_eq!(text_box["node"], json!(t.0));
    assert_eq!(text_box["text"], "Hello");
    assert_eq!(text_box["frame"]["width"], 50);
}

#[test]
fn test_snapshot_records_bidi_levels() {
    let (doc, _, _) = paragraph("abc אבג");
    let value = snapshot_json(&doc);
    let boxes = value["children"][0]["lines"][0]["children"].as_array().unwrap();

    let levels: Vec<&Value> = boxes.iter().map(|b| &b["bidi_level"]).collect();
    assert_eq!(levels, vec![&json!(0), &json!(1)]);
    assert_eq!(boxes[1]["text"], "אבג");
}

// ========== Text dumps ==========

#[test]
fn test_render_tree_dump_outlines_objects() {
    let (doc, p, _) = paragraph("Hello");
    let dump = dump_render_tree(doc.view());
    let lines: Vec<&str> = dump.lines().collect();

    assert!(lines[0].starts_with("RenderCanvas"));
    assert_eq!(lines[1], format!("  RenderBlock <p> ({p:?}) at (0,0) size 800x19"));
    assert!(lines[2].starts_with("    line 0: root at (0,0) size 50x19"));
    assert!(lines.iter().any(|l| l.trim_start().starts_with("text at") && l.ends_with("\"Hello\"")));
    assert!(lines.iter().any(|l| l.trim_start().starts_with("RenderText") && l.ends_with("\"Hello\"")));
}

#[test]
fn test_line_box_dump_covers_each_block() {
    let mut dom = DomTree::new();
    let p1 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p1, "one");
    let p2 = element_under(&mut dom, NodeId::ROOT, "p");
    let _ = text_under(&mut dom, p2, "abc אבג");
    let mut doc = Document::new(dom, LayoutSettings::default());
    doc.layout();

    let dump = dump_line_boxes(doc.view());

    assert!(dump.contains(&format!("RenderBlock <p> ({p1:?})\n  line 0: root at (0,0) size 30x19")));
    assert!(dump.contains(&format!("RenderBlock <p> ({p2:?})\n  line 0: root at (0,0) size 70x19")));
    assert!(dump.contains("level 1 \"אבג\""));
    assert!(!dump.contains("RenderText"));
}
