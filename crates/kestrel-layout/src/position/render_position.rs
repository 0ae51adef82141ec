//! Positions resolved against the line boxes that draw them.
//!
//! DOM offsets ignore rendering: three collapsed spaces are three offsets
//! but one rendered character, and a text node wrapped over two lines has
//! one offset space but two boxes. A [`RenderPosition`] is a position that
//! has been checked against the rendered text, with its offset normalized
//! to the first DOM offset of the rendered character it lands on.

use kestrel_dom::NodeId;

use super::{LayoutView, Position};
use crate::line::BoxId;
use crate::render::RenderId;

/// A [`Position`] known to land in rendered content, or the empty value.
///
/// Resolved on demand and never cached: any layout invalidates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RenderPosition {
    position: Position,
}

impl From<Position> for RenderPosition {
    fn from(position: Position) -> Self {
        Self { position }
    }
}

impl RenderPosition {
    /// The position at rendered `offset` of `node`.
    #[must_use]
    pub fn new(view: LayoutView<'_>, node: NodeId, offset: usize) -> Self {
        let offset = match view.renderer(node) {
            Some(r) if view.tree[r].is_text() => view.tree.convert_to_dom_position(r, offset),
            _ => offset,
        };
        Self {
            position: Position::new(node, offset),
        }
    }

    /// Resolve `position` against the rendering.
    ///
    /// Returns the empty value when the node has no renderer, when a line
    /// break is addressed past its single position, or when text has no box
    /// at the offset. A text offset inside collapsed white space is moved to
    /// the first DOM offset of the surviving space.
    #[must_use]
    pub fn from_dom_position(view: LayoutView<'_>, position: Position) -> Self {
        let Some(node) = position.node else {
            return Self::default();
        };
        let Some(r) = view.renderer(node) else {
            return Self::default();
        };
        let tree = view.tree;
        let object = &tree[r];
        if object.is_br() {
            if position.offset == 0 && tree.inline_box(r, 0).is_some() {
                return Position::new(node, 0).into();
            }
            return Self::default();
        }
        if !object.is_text() {
            return position.into();
        }

        let rendered = tree.convert_to_rendered_position(r, position.offset);
        let result = Self::from(Position::new(node, tree.convert_to_dom_position(r, rendered)));
        if result.inline_box_and_offset(view).0.is_none() {
            return Self::default();
        }
        result
    }

    /// The normalized DOM position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Whether this is the empty value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// The renderer of the position's node.
    #[must_use]
    pub fn renderer(&self, view: LayoutView<'_>) -> Option<RenderId> {
        view.renderer(self.position.node?)
    }

    /// Whether the position resolved to rendered content.
    #[must_use]
    pub fn in_rendered_content(&self, view: LayoutView<'_>) -> bool {
        self.renderer(view).is_some()
    }

    /// The offset in rendered text coordinates.
    #[must_use]
    pub fn rendered_offset(&self, view: LayoutView<'_>) -> usize {
        match self.renderer(view) {
            Some(r) if view.tree[r].is_text() => view.tree.convert_to_rendered_position(r, self.position.offset),
            _ => self.position.offset,
        }
    }

    /// The box drawing this position and the rendered offset within the
    /// renderer.
    ///
    /// Text offsets before the first box clamp to that box's start and
    /// offsets past the last box clamp to its end. Non-text objects answer
    /// with their placeholder box and the offset unchanged.
    #[must_use]
    pub fn inline_box_and_offset(&self, view: LayoutView<'_>) -> (Option<BoxId>, usize) {
        let Some(r) = self.renderer(view) else {
            return (None, 0);
        };
        let tree = view.tree;
        let object = &tree[r];
        if object.is_br() {
            return (tree.inline_box(r, 0), self.position.offset);
        }
        if !object.is_text() {
            return (tree.inline_box(r, self.position.offset), self.position.offset);
        }

        let rendered = tree.convert_to_rendered_position(r, self.position.offset);
        let mut boxes = tree.line_boxes(r).peekable();
        while let Some(b) = boxes.next() {
            let Some(run) = tree[b].text_run() else {
                continue;
            };
            if rendered >= run.start && rendered <= run.end() {
                return (Some(b), rendered);
            }
            if rendered < run.start {
                return (Some(b), run.start);
            }
            if boxes.peek().is_none() {
                return (Some(b), run.end());
            }
        }
        (None, 0)
    }

    /// Whether `a` and `b` put the caret in visibly different places.
    ///
    /// Positions on the same box at the same rendered offset are the same
    /// place. Otherwise the caret rectangles decide; two identical
    /// rectangles (the end of one run and the start of the next) are the
    /// same place too. An empty side never differs.
    #[must_use]
    pub fn renders_in_different_position(view: LayoutView<'_>, a: &Self, b: &Self) -> bool {
        if a == b || a.is_empty() || b.is_empty() {
            return false;
        }
        let (Some(ra), Some(rb)) = (a.renderer(view), b.renderer(view)) else {
            return false;
        };
        let (box_a, offset_a) = a.inline_box_and_offset(view);
        let (box_b, offset_b) = b.inline_box_and_offset(view);
        if box_a.is_some() && box_a == box_b && offset_a == offset_b {
            return false;
        }
        let caret_a = view.tree.caret_pos(ra, a.rendered_offset(view), false);
        let caret_b = view.tree.caret_pos(rb, b.rendered_offset(view), false);
        caret_a != caret_b
    }

    /// Whether `a` and `b` are drawn on the same line.
    #[must_use]
    pub fn renders_on_same_line(view: LayoutView<'_>, a: &Self, b: &Self) -> bool {
        if a == b {
            return true;
        }
        if a.is_empty() || b.is_empty() {
            return false;
        }
        let (box_a, _) = a.inline_box_and_offset(view);
        let (box_b, _) = b.inline_box_and_offset(view);
        match (box_a, box_b) {
            (Some(x), Some(y)) => x == y || view.tree.root_box(x) == view.tree.root_box(y),
            _ => false,
        }
    }

    /// The position on the line above that is closest to document x
    /// coordinate `x`.
    ///
    /// At the first line of a block the search continues in the nearest
    /// preceding navigable node outside the block, within the same editable
    /// root. Returns `self` when there is nowhere to go.
    #[must_use]
    pub fn previous_line_position(&self, view: LayoutView<'_>, x: i32) -> Self {
        self.line_position(view, x, false)
    }

    /// The position on the line below that is closest to document x
    /// coordinate `x`.
    #[must_use]
    pub fn next_line_position(&self, view: LayoutView<'_>, x: i32) -> Self {
        self.line_position(view, x, true)
    }

    fn line_position(&self, view: LayoutView<'_>, x: i32, forward: bool) -> Self {
        let Some(node) = self.position.node else {
            return *self;
        };
        if self.renderer(view).is_none() {
            return *self;
        }
        let tree = view.tree;
        let (current, _) = self.inline_box_and_offset(view);
        let adjacent = current.and_then(|b| {
            let root = tree.root_box(b);
            if forward {
                tree.next_root_box(root)
            } else {
                tree.prev_root_box(root)
            }
        });
        if let Some(root) = adjacent {
            return Self::position_on_line(view, root, x);
        }

        // STEP 1: Leave the current block.
        let start_block = view.enclosing_block_flow_element(node);
        let step = |n: NodeId| {
            if forward {
                view.next_editable(n)
            } else {
                view.previous_editable(n)
            }
        };
        let mut candidate = step(node);
        while let Some(n) = candidate {
            if view.enclosing_block_flow_element(n) != start_block {
                break;
            }
            candidate = step(n);
        }

        // STEP 2: Skip nodes with nothing rendered at the entry edge.
        let entry = |n: NodeId| {
            let offset = if forward {
                view.caret_min_offset(n)
            } else {
                view.caret_max_offset(n)
            };
            Position::new(n, offset)
        };
        while let Some(n) = candidate {
            if entry(n).in_rendered_content(view) {
                break;
            }
            candidate = step(n);
        }

        // STEP 3: Land on the facing line of that node, at `x`.
        let Some(n) = candidate else {
            return *self;
        };
        if !view.in_same_root_navigable_element(n, node) {
            return *self;
        }
        let landing = Self::from_dom_position(view, entry(n));
        match landing.inline_box_and_offset(view).0 {
            Some(b) => Self::position_on_line(view, tree.root_box(b), x),
            None => landing,
        }
    }

    fn position_on_line(view: LayoutView<'_>, root: BoxId, x: i32) -> Self {
        let tree = view.tree;
        let block = tree[root].object;
        let (ax, ay) = tree.absolute_position(block);
        let top = tree[root].line_info().map_or(0, |info| info.top_overflow);
        let leaf = tree.closest_leaf_child_for_x_pos(root, x, ax);
        tree.position_for_coordinates(tree[leaf].object, x, ay + top).into()
    }
}
