//! Render tree and line box dumps.
//!
//! [`dump_render_tree`] prints an indented outline in the style of the
//! classic render tree dumps used by layout regression tests: one object
//! per line with its frame, followed by the lines it owns. [`snapshot`]
//! captures the same information as serializable data.

use std::fmt::Write as _;

use kestrel_dom::NodeId;
use serde::Serialize;

use crate::counter::LIST_ITEM_COUNTER;
use crate::geometry::Rect;
use crate::line::{BoxId, BoxKind};
use crate::position::LayoutView;
use crate::render::RenderId;

/// One render object and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSnapshot {
    /// Object kind, as in [`RenderObject::render_name`](crate::RenderObject::render_name).
    pub kind: &'static str,
    /// Originating DOM node; `None` for anonymous objects.
    pub node: Option<NodeId>,
    /// Tag of the originating element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Border box relative to the container.
    pub frame: Rect,
    /// Border box in document coordinates.
    pub absolute: Rect,
    /// Rendered string of a text object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Value of the list-item counter, when it has been computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_item: Option<i32>,
    /// Root boxes of a block with inline children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<BoxSnapshot>,
    /// Child objects.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectSnapshot>,
}

/// One inline box and the boxes it contains on its line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxSnapshot {
    /// `root`, `flow`, `text` or `leaf`.
    pub kind: &'static str,
    /// DOM node of the generating object.
    pub node: Option<NodeId>,
    /// Box rectangle relative to the block.
    pub frame: Rect,
    /// Baseline offset from the top of the box.
    pub baseline: i32,
    /// Bidi embedding level.
    pub bidi_level: u8,
    /// The rendered characters of a text box.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Ellipsis drawn on a truncated line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ellipsis: Option<String>,
    /// Boxes inside a flow or root box.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BoxSnapshot>,
}

/// Capture the render tree below the canvas.
#[must_use]
pub fn snapshot(view: LayoutView<'_>) -> ObjectSnapshot {
    snapshot_object(view, view.tree.canvas())
}

fn snapshot_object(view: LayoutView<'_>, id: RenderId) -> ObjectSnapshot {
    let tree = view.tree;
    let object = &tree[id];
    let (ax, ay) = tree.absolute_position(id);
    let list_item = tree
        .lookup_counter(id, LIST_ITEM_COUNTER)
        .filter(|_| object.is_list_item())
        .and_then(|c| tree.counters().get(c))
        .map(crate::counter::CounterNode::displayed);
    ObjectSnapshot {
        kind: object.render_name(),
        node: object.element(),
        tag: object.element().and_then(|n| view.dom.tag_name(n)).map(str::to_string),
        frame: Rect::new(object.x, object.y, object.width, object.height),
        absolute: Rect::new(ax, ay, object.width, object.height),
        text: object.text().map(|t| t.rendered.iter().collect()),
        list_item,
        lines: if object.is_block_flow() {
            tree.line_boxes(id).map(|b| snapshot_box(view, b)).collect()
        } else {
            Vec::new()
        },
        children: tree.children(id).map(|c| snapshot_object(view, c)).collect(),
    }
}

fn snapshot_box(view: LayoutView<'_>, id: BoxId) -> BoxSnapshot {
    let tree = view.tree;
    let b = &tree[id];
    let kind = match b.kind {
        BoxKind::Leaf => "leaf",
        BoxKind::Text(_) => "text",
        BoxKind::Flow(_) => "flow",
        BoxKind::Root(..) => "root",
    };
    BoxSnapshot {
        kind,
        node: tree[b.object].element(),
        frame: Rect::new(b.x, b.y, b.width, b.height),
        baseline: b.baseline,
        bidi_level: b.bidi_level,
        text: box_text(view, id),
        ellipsis: b.line_info().and_then(|i| i.ellipsis.as_ref()).map(|e| e.text.clone()),
        children: tree.line_children(id).map(|c| snapshot_box(view, c)).collect(),
    }
}

fn box_text(view: LayoutView<'_>, id: BoxId) -> Option<String> {
    let tree = view.tree;
    let run = tree[id].text_run()?;
    let text = tree[tree[id].object].text()?;
    Some(text.rendered.iter().skip(run.start).take(run.len).collect())
}

/// The render tree as an indented outline.
#[must_use]
pub fn dump_render_tree(view: LayoutView<'_>) -> String {
    let mut out = String::new();
    write_object(&mut out, &snapshot(view), 0);
    out
}

/// The lines of every block, in tree order.
#[must_use]
pub fn dump_line_boxes(view: LayoutView<'_>) -> String {
    let mut out = String::new();
    let tree = view.tree;
    let mut current = Some(tree.canvas());
    while let Some(id) = current {
        if tree[id].is_block_flow() && tree[id].first_line_box.is_some() {
            let _ = writeln!(out, "{}", describe(view, id));
            for (index, root) in tree.line_boxes(id).enumerate() {
                let _ = write!(out, "  line {index}: ");
                write_box(&mut out, &snapshot_box(view, root), 1);
            }
        }
        current = tree.next_renderer(id);
    }
    out
}

fn describe(view: LayoutView<'_>, id: RenderId) -> String {
    let object = &view.tree[id];
    let mut name = String::from(object.render_name());
    if object.is_anonymous() {
        name.push_str(" (anonymous)");
    } else if let Some(node) = object.element() {
        match view.dom.tag_name(node) {
            Some(tag) => {
                let _ = write!(name, " <{tag}> ({node:?})");
            }
            None => {
                let _ = write!(name, " ({node:?})");
            }
        }
    }
    name
}

fn write_object(out: &mut String, object: &ObjectSnapshot, depth: usize) {
    let indent = "  ".repeat(depth);
    let f = object.frame;
    let _ = write!(out, "{indent}{}", object.kind);
    match (&object.tag, object.node) {
        (Some(tag), Some(node)) => {
            let _ = write!(out, " <{tag}> ({node:?})");
        }
        (None, Some(node)) => {
            let _ = write!(out, " ({node:?})");
        }
        (_, None) if object.kind != "RenderCanvas" => out.push_str(" (anonymous)"),
        _ => {}
    }
    let _ = write!(out, " at ({},{}) size {}x{}", f.x, f.y, f.width, f.height);
    if let Some(text) = &object.text {
        let _ = write!(out, " {text:?}");
    }
    if let Some(value) = object.list_item {
        let _ = write!(out, " list-item {value}");
    }
    out.push('\n');
    for (index, line) in object.lines.iter().enumerate() {
        let _ = write!(out, "{indent}  line {index}: ");
        write_box(out, line, depth + 1);
    }
    for child in &object.children {
        write_object(out, child, depth + 1);
    }
}

fn write_box(out: &mut String, b: &BoxSnapshot, depth: usize) {
    let f = b.frame;
    let _ = write!(out, "{} at ({},{}) size {}x{} baseline {}", b.kind, f.x, f.y, f.width, f.height, b.baseline);
    if b.bidi_level > 0 {
        let _ = write!(out, " level {}", b.bidi_level);
    }
    if let Some(text) = &b.text {
        let _ = write!(out, " {text:?}");
    }
    if let Some(ellipsis) = &b.ellipsis {
        let _ = write!(out, " ellipsis {ellipsis:?}");
    }
    out.push('\n');
    let indent = "  ".repeat(depth + 1);
    for child in &b.children {
        out.push_str(&indent);
        write_box(out, child, depth + 1);
    }
}
