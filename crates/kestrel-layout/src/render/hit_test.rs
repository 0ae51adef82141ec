//! Hit testing and point-to-position mapping.
//!
//! Both queries take document coordinates. `tx`/`ty` translate the whole
//! tree, for hosts that scroll the canvas.

use kestrel_dom::NodeId;
use serde::Serialize;

use super::object::RenderId;
use super::tree::RenderTree;
use crate::geometry::Rect;
use crate::line::{BoxId, BoxKind};
use crate::position::Position;

/// Which parts of an object a hit test may accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum HitTestAction {
    /// The object and its descendants.
    #[default]
    All,
    /// The object's own box only.
    SelfOnly,
    /// Descendants only.
    ChildrenOnly,
}

/// What a hit test found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitTestResult {
    /// The innermost object under the point.
    #[serde(skip)]
    pub renderer: RenderId,
    /// The DOM node of that object, or of its nearest non-anonymous
    /// ancestor.
    pub node: Option<NodeId>,
    /// The caret position closest to the point inside `renderer`.
    pub position: Position,
}

impl RenderTree {
    /// The innermost object of `id`'s subtree under (`x`, `y`).
    ///
    /// Positioned children are tested first, then floats, then the normal
    /// flow, each in reverse order so that later content wins.
    #[must_use]
    pub fn node_at_point(&self, id: RenderId, x: i32, y: i32, tx: i32, ty: i32, action: HitTestAction) -> Option<HitTestResult> {
        let renderer = self.hit_object(id, x, y, tx, ty, action)?;
        Some(HitTestResult {
            renderer,
            node: self.hit_node(renderer),
            position: self.position_for_coordinates(renderer, x - tx, y - ty),
        })
    }

    fn hit_node(&self, id: RenderId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|o| self[o].element())
    }

    fn hit_object(&self, id: RenderId, x: i32, y: i32, tx: i32, ty: i32, action: HitTestAction) -> Option<RenderId> {
        let object = self.get(id)?;
        let (ax, ay) = self.absolute_position(id);
        let frame = Rect::new(ax + tx, ay + ty, object.width, object.height);

        if action != HitTestAction::SelfOnly {
            let clipped = object.has_overflow_clip() && !frame.contains(x, y);
            if !clipped {
                if let Some(hit) = self.hit_children(id, x, y, tx, ty) {
                    return Some(hit);
                }
            }
        }

        if action == HitTestAction::ChildrenOnly || !object.style.is_visible() {
            return None;
        }
        if object.is_inline_flow() {
            return self
                .line_boxes(id)
                .any(|b| self.box_rect(b, tx, ty).contains(x, y))
                .then_some(id);
        }
        if object.is_text() || object.is_br() {
            return None;
        }
        frame.contains(x, y).then_some(id)
    }

    fn hit_children(&self, id: RenderId, x: i32, y: i32, tx: i32, ty: i32) -> Option<RenderId> {
        let object = &self[id];
        let children: Vec<RenderId> = self.children(id).collect();

        for &child in children.iter().rev() {
            if self[child].is_positioned() {
                if let Some(hit) = self.hit_object(child, x, y, tx, ty, HitTestAction::All) {
                    return Some(hit);
                }
            }
        }
        for &child in children.iter().rev() {
            if self[child].is_floating() {
                if let Some(hit) = self.hit_object(child, x, y, tx, ty, HitTestAction::All) {
                    return Some(hit);
                }
            }
        }

        if object.is_block_flow() && object.children_inline() {
            let roots: Vec<BoxId> = self.line_boxes(id).collect();
            for &root in roots.iter().rev() {
                if let Some(hit) = self.hit_line_box(root, x, y, tx, ty) {
                    return Some(hit);
                }
            }
            return None;
        }

        for &child in children.iter().rev() {
            let c = &self[child];
            if c.is_positioned() || c.is_floating() {
                continue;
            }
            if let Some(hit) = self.hit_object(child, x, y, tx, ty, HitTestAction::All) {
                return Some(hit);
            }
        }
        None
    }

    /// Test the boxes of one line, innermost first.
    fn hit_line_box(&self, id: BoxId, x: i32, y: i32, tx: i32, ty: i32) -> Option<RenderId> {
        let b = &self[id];
        let object = b.object;
        match b.kind {
            BoxKind::Root(..) | BoxKind::Flow(_) => {
                let children: Vec<BoxId> = self.line_children(id).collect();
                for &child in children.iter().rev() {
                    if let Some(hit) = self.hit_line_box(child, x, y, tx, ty) {
                        return Some(hit);
                    }
                }
                let inline = matches!(b.kind, BoxKind::Flow(_));
                (inline && self[object].style.is_visible() && self.box_rect(id, tx, ty).contains(x, y)).then_some(object)
            }
            BoxKind::Text(_) => {
                let o = &self[object];
                (o.style.is_visible() && self.box_rect(id, tx, ty).contains(x, y)).then_some(object)
            }
            BoxKind::Leaf => {
                let o = &self[object];
                if o.is_positioned() || o.is_floating() {
                    return None;
                }
                if o.is_br() {
                    return (o.style.is_visible() && self.box_rect(id, tx, ty).contains(x, y)).then_some(object);
                }
                self.hit_object(object, x, y, tx, ty, HitTestAction::All)
            }
        }
    }

    /// Rectangle of line box `id` in document coordinates, shifted by
    /// (`tx`, `ty`).
    fn box_rect(&self, id: BoxId, tx: i32, ty: i32) -> Rect {
        let b = &self[id];
        let root = self.root_box(id);
        let (ax, ay) = self.absolute_position(self[root].object);
        Rect::new(ax + tx + b.x, ay + ty + b.y, b.width, b.height)
    }

    /// The caret position inside `id` closest to the document point
    /// (`x`, `y`).
    ///
    /// Points above the object answer its first position, points below its
    /// last.
    #[must_use]
    pub fn position_for_coordinates(&self, id: RenderId, x: i32, y: i32) -> Position {
        let Some(object) = self.get(id) else {
            return Position::empty();
        };
        if object.is_text() {
            return self.text_position_for_coordinates(id, x, y);
        }
        if object.is_br() {
            return object.element().map_or_else(Position::empty, |n| Position::new(n, 0));
        }
        if object.is_replaced() && object.placeholder_box.is_some() {
            return self.replaced_position_for_coordinates(id, x, y);
        }
        if object.is_block_flow() && !object.is_replaced() {
            return self.block_position_for_coordinates(id, x, y);
        }
        self.min_position(id)
    }

    /// The first caret position inside `id`.
    pub(crate) fn min_position(&self, id: RenderId) -> Position {
        if let Some(leaf) = self.first_leaf_object(id) {
            return self.min_position(leaf);
        }
        let object = &self[id];
        match object.element() {
            Some(node) => Position::new(node, self.convert_to_dom_position(id, self.caret_min_offset(id))),
            None => Position::empty(),
        }
    }

    /// The last caret position inside `id`.
    pub(crate) fn max_position(&self, id: RenderId) -> Position {
        if let Some(leaf) = self.last_leaf_object(id) {
            return self.max_position(leaf);
        }
        let object = &self[id];
        match object.element() {
            Some(node) => Position::new(node, self.convert_to_dom_position(id, self.caret_max_offset(id))),
            None => Position::empty(),
        }
    }

    fn block_position_for_coordinates(&self, id: RenderId, x: i32, y: i32) -> Position {
        let object = &self[id];
        let (ax, ay) = self.absolute_position(id);
        let top = ay + object.border_and_padding().top;
        let bottom = top + object.content_height;
        if y < top {
            return self.min_position(id);
        }
        if y >= bottom {
            return self.max_position(id);
        }

        if object.children_inline() {
            let Some(first) = object.first_line_box else {
                return self.min_position(id);
            };
            let first_top = self[first].line_info().map_or(0, |i| i.top_overflow);
            if y < ay + first_top {
                return self.first_leaf_child(first).map_or_else(
                    || self.min_position(id),
                    |leaf| self.position_for_coordinates(self[leaf].object, x, y),
                );
            }
            for root in self.line_boxes(id) {
                let (line_top, line_bottom) = self.line_extent(root, ay);
                if y >= line_top && y < line_bottom && self[root].first_child().is_some() {
                    let leaf = self.closest_leaf_child_for_x_pos(root, x, ax);
                    return self.position_for_coordinates(self[leaf].object, x, y);
                }
            }
            return self.max_position(id);
        }

        let in_flow: Vec<RenderId> = self
            .children(id)
            .filter(|&c| !self[c].is_floating() && !self[c].is_positioned())
            .collect();
        for (i, &child) in in_flow.iter().enumerate() {
            let child_top = self.absolute_position(child).1;
            let child_bottom = in_flow
                .get(i + 1)
                .map_or(bottom, |&next| self.absolute_position(next).1);
            if y >= child_top && y < child_bottom {
                return self.position_for_coordinates(child, x, y);
            }
        }
        self.max_position(id)
    }

    /// Top and bottom of the band a line owns for hit testing: from its top
    /// overflow to the next line's.
    fn line_extent(&self, root: BoxId, ay: i32) -> (i32, i32) {
        let info = self[root].line_info();
        let top = ay + info.map_or(0, |i| i.top_overflow);
        let bottom = match self.next_root_box(root).and_then(|n| self[n].line_info()) {
            Some(next) => ay + next.top_overflow,
            None => ay + info.map_or(0, |i| i.bottom_overflow),
        };
        (top, bottom)
    }

    fn text_position_for_coordinates(&self, id: RenderId, x: i32, y: i32) -> Position {
        let object = &self[id];
        let Some(node) = object.element() else {
            return Position::empty();
        };
        let (Some(first), Some(last)) = (object.first_line_box, object.last_line_box) else {
            return Position::new(node, 0);
        };
        if object.rendered_len() == 0 {
            return Position::new(node, 0);
        }
        let block = self[self.root_box(first)].object;
        let (ax, ay) = self.absolute_position(block);
        let at = |b: BoxId| {
            let start = self[b].caret_min_offset();
            let offset = self.offset_for_position(b, x - ax);
            Position::new(node, self.convert_to_dom_position(id, start + offset))
        };

        let first_root = self.root_box(first);
        let first_bottom = ay + self[first_root].line_info().map_or(0, |i| i.bottom_overflow);
        if y < first_bottom && x < ax + self[first].x {
            return at(first);
        }
        let last_root = self.root_box(last);
        let last_top = ay + self[last_root].line_info().map_or(0, |i| i.top_overflow);
        if y >= last_top && x >= ax + self[last].x + self[last].width {
            return at(last);
        }

        let mut on_line = None;
        for b in self.line_boxes(id) {
            let root = self.root_box(b);
            let info = self[root].line_info();
            let top = ay + info.map_or(0, |i| i.top_overflow);
            let bottom = ay + info.map_or(0, |i| i.bottom_overflow);
            if y >= top && y < bottom {
                if x < ax + self[b].x + self[b].width {
                    return at(b);
                }
                on_line = Some(b);
            }
        }
        on_line.map_or_else(|| Position::new(node, 0), at)
    }

    fn replaced_position_for_coordinates(&self, id: RenderId, x: i32, y: i32) -> Position {
        let object = &self[id];
        let Some(node) = object.element() else {
            return Position::empty();
        };
        let Some(placeholder) = object.placeholder_box else {
            return Position::new(node, 0);
        };
        let root = self.root_box(placeholder);
        let (_, ay) = self.absolute_position(self[root].object);
        let (top, bottom) = self.line_extent(root, ay);
        if y < top {
            return Position::new(node, 0);
        }
        if y >= bottom {
            return Position::new(node, 1);
        }
        let ax = self.absolute_position(id).0;
        if x <= ax + object.width / 2 {
            Position::new(node, 0)
        } else {
            Position::new(node, 1)
        }
    }
}
