//! Block layout: widths, vertical stacking of block-level children, heights
//! and overflow.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block. The vertical
//! distance between two sibling boxes is determined by the 'margin'
//! properties. Vertical margins between adjacent block-level boxes in a
//! block formatting context collapse."

use std::rc::Rc;

use super::float::{FloatContext, FloatSide};
use crate::geometry::{Edges, Rect};
use crate::render::{RenderFlags, RenderId, RenderKind, RenderTree};
use crate::style::Length;

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths. In the case of negative
/// margins, the maximum of the absolute values of the negative adjoining
/// margins is deducted from the maximum of the positive adjoining margins.
/// If there are no positive margins, the maximum of the absolute values
/// of the adjoining margins is deducted from zero."
const fn collapse_two_margins(a: i32, b: i32) -> i32 {
    if a >= 0 && b >= 0 {
        if a > b { a } else { b }
    } else if a < 0 && b < 0 {
        if a < b { a } else { b }
    } else {
        a + b
    }
}

impl RenderTree {
    /// Whether `id` establishes a new block formatting context: floats and
    /// positioned objects never interact with floats outside of it.
    ///
    /// "Floats, absolutely positioned elements, block containers (such as
    /// inline-blocks, table-cells, and table-captions) that are not block
    /// boxes, and block boxes with 'overflow' other than 'visible' [...]
    /// establish new block formatting contexts for their contents."
    fn establishes_block_formatting_context(&self, id: RenderId) -> bool {
        let o = &self[id];
        o.is_canvas() || o.is_floating() || o.is_positioned() || o.is_inline() || o.is_table_cell() || o.has_overflow_clip()
    }

    /// Lay out block `id` and everything below it that needs it.
    ///
    /// With `relayout` every child is laid out again, which callers request
    /// when the width available to `id` changed.
    pub(crate) fn layout_block(&mut self, id: RenderId, relayout: bool) {
        let mut relayout = relayout;

        // STEP 1: Calculate width.
        let old_width = self[id].width;
        self.calc_width(id);
        if self[id].width != old_width {
            relayout = true;
        }

        // STEP 2: Resolve vertical padding and margins.
        let cb_width = if self[id].is_canvas() {
            self.settings().viewport_width
        } else {
            self.containing_block_width(id)
        };
        {
            let object = &mut self[id];
            let style = Rc::clone(&object.style);
            let padding = style.padding_widths(cb_width);
            object.padding.top = padding.top;
            object.padding.bottom = padding.bottom;
            if !object.is_positioned() && !object.is_canvas() {
                object.margin.top = style.margin.top.resolve_or_zero(cb_width);
                object.margin.bottom = style.margin.bottom.resolve_or_zero(cb_width);
            }
        }

        // STEP 3: Lay out children.
        let object = &self[id];
        let children_dirty = object
            .flags
            .intersects(RenderFlags::NEEDS_LAYOUT | RenderFlags::NORMAL_CHILD_NEEDS_LAYOUT);
        let content_height = if !relayout && !children_dirty {
            object.content_height
        } else {
            let mut floats = FloatContext::new(self.content_width(id));
            let top = self[id].border_and_padding().top;
            let bottom = if self[id].children_inline() {
                self.layout_inline_children(id, relayout, &mut floats)
            } else {
                self.layout_block_children(id, relayout, &mut floats)
            };
            let mut content = bottom - top;
            // [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
            if self.establishes_block_formatting_context(id) {
                content = content.max(floats.max_float_bottom() - top);
            }
            content.max(0)
        };
        self[id].content_height = content_height;

        // STEP 4: Calculate height.
        self.calc_height(id);

        // STEP 5: Lay out positioned descendants this block contains.
        self.layout_positioned_objects(id, relayout);

        // STEP 6: Compute overflow.
        self.compute_overflow(id);

        // STEP 7: Done.
        self.set_needs_layout(id, false, false);

        #[cfg(feature = "layout-trace")]
        {
            let o = &self[id];
            log::trace!(
                "[BLOCK] {} {id:?}: ({}, {}) {}x{}, content {}",
                o.render_name(),
                o.x,
                o.y,
                o.width,
                o.height,
                o.content_height
            );
        }
    }

    /// Used width and horizontal margins of `id`.
    ///
    /// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
    ///
    /// "The following constraints must hold among the used values of the
    /// other properties: 'margin-left' + 'border-left-width' +
    /// 'padding-left' + 'width' + 'padding-right' + 'border-right-width' +
    /// 'margin-right' = width of containing block"
    pub(crate) fn calc_width(&mut self, id: RenderId) {
        if self[id].is_canvas() {
            let viewport = self.settings().viewport_width;
            let object = &mut self[id];
            let style = Rc::clone(&object.style);
            object.padding = style.padding_widths(viewport);
            object.margin = Edges::default();
            object.width = viewport;
            object.x = 0;
            object.y = 0;
            return;
        }
        if self[id].is_positioned() {
            self.calc_positioned_width(id);
            return;
        }

        let cb = self.containing_block(id);
        let cb_width = self.containing_block_width(id);
        let ltr = self[cb].style.direction.is_ltr();
        let shrink = self[id].is_floating() || self[id].is_inline();
        let intrinsic = match self[id].kind {
            RenderKind::Replaced { intrinsic_width, .. } => Some(intrinsic_width),
            _ => None,
        };
        let preferred = if shrink && intrinsic.is_none() && self[id].style.width.is_auto() {
            Some(self.min_max_widths(id))
        } else {
            None
        };

        // STEP 1: Resolve computed values to used values.
        let object = &mut self[id];
        let style = Rc::clone(&object.style);
        let padding = style.padding_widths(cb_width);
        object.padding.left = padding.left;
        object.padding.right = padding.right;
        let bp = style.border.left + style.border.right + padding.left + padding.right;
        let mut margin_left = style.margin.left.resolve(cb_width);
        let mut margin_right = style.margin.right.resolve(cb_width);
        let width = style.width.resolve(cb_width).or(intrinsic);

        // [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
        //
        // "If 'margin-left' or 'margin-right' are computed as 'auto', their
        // used value is '0'."
        if shrink {
            let ml = margin_left.unwrap_or(0);
            let mr = margin_right.unwrap_or(0);
            // "If 'width' is computed as 'auto', the used value is the
            // shrink-to-fit width." Widths from min/max are border boxes.
            let content = match (width, preferred) {
                (Some(w), _) => w,
                (None, Some((min, max))) => max.min(min.max(cb_width - ml - mr)) - bp,
                (None, None) => 0,
            };
            object.width = content.max(0) + bp;
            object.margin.left = ml;
            object.margin.right = mr;
            return;
        }

        // STEP 2: Handle the over-constrained case.
        //
        // "If 'width' is not 'auto' and 'border-left-width' + 'padding-left'
        // + 'width' + 'padding-right' + 'border-right-width' (plus any of
        // 'margin-left' or 'margin-right' that are not 'auto') is larger than
        // the width of the containing block, then any 'auto' values for
        // 'margin-left' or 'margin-right' are, for the following rules,
        // treated as zero."
        if let Some(w) = width {
            let total = w + bp + margin_left.unwrap_or(0) + margin_right.unwrap_or(0);
            if total > cb_width {
                margin_left = margin_left.or(Some(0));
                margin_right = margin_right.or(Some(0));
            }
        }

        // STEP 3: Apply the constraint rules.
        let (used_width, used_left, used_right) = match (width, margin_left, margin_right) {
            // RULE A: "If 'width' is set to 'auto', any other 'auto' values
            // become '0' and 'width' follows from the resulting equality."
            (None, ml, mr) => {
                let ml = ml.unwrap_or(0);
                let mr = mr.unwrap_or(0);
                ((cb_width - ml - mr - bp).max(0), ml, mr)
            }
            // RULE B: "If both 'margin-left' and 'margin-right' are 'auto',
            // their used values are equal."
            (Some(w), None, None) => {
                let remaining = cb_width - w - bp;
                (w, remaining / 2, remaining - remaining / 2)
            }
            // RULE C: "If there is exactly one value specified as 'auto', its
            // used value follows from the equality."
            (Some(w), None, Some(mr)) => (w, cb_width - w - bp - mr, mr),
            (Some(w), Some(ml), None) => (w, ml, cb_width - w - bp - ml),
            // RULE D: "If the 'direction' property of the containing block
            // has the value 'ltr', the specified value of 'margin-right' is
            // ignored and the value is calculated so as to make the equality
            // true. If the value of 'direction' is 'rtl', this happens to
            // 'margin-left' instead."
            (Some(w), Some(ml), Some(mr)) => {
                if ltr {
                    (w, ml, cb_width - w - bp - ml)
                } else {
                    (w, cb_width - w - bp - mr, mr)
                }
            }
        };

        let object = &mut self[id];
        object.width = used_width + bp;
        object.margin.left = used_left;
        object.margin.right = used_right;
    }

    /// Used height of `id` from its content height.
    ///
    /// [§ 10.6.3 Block-level non-replaced elements in normal flow when
    /// 'overflow' computes to 'visible'](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
    fn calc_height(&mut self, id: RenderId) {
        if self[id].is_positioned() {
            self.calc_positioned_height(id);
            return;
        }
        let bp = self[id].border_and_padding().vertical();
        let content = self[id].content_height;
        if self[id].is_canvas() {
            let viewport = self.settings().viewport_height;
            self[id].height = viewport.max(content + bp);
            return;
        }
        // "If the height of the containing block is not specified
        // explicitly, the value computes to 'auto'."
        let cb = self.containing_block(id);
        let cb_height = if self[cb].is_canvas() {
            Some(self.settings().viewport_height)
        } else {
            match self[cb].style.height {
                Length::Px(h) => Some(h),
                _ => None,
            }
        };
        let object = &self[id];
        let height = match (object.style.height, cb_height) {
            (Length::Px(h), _) => h,
            (Length::Percent(_), Some(reference)) => object.style.height.resolve_or_zero(reference),
            (_, _) => match object.kind {
                RenderKind::Replaced { intrinsic_height, .. } => intrinsic_height,
                _ => content,
            },
        };
        self[id].height = height.max(0) + bp;
    }

    /// Union of the border box and everything painted outside of it,
    /// relative to the border box.
    ///
    /// [§ 11.1 Overflow and clipping](https://www.w3.org/TR/CSS2/visufx.html#overflow-clipping)
    pub(crate) fn compute_overflow(&mut self, id: RenderId) {
        let object = &self[id];
        let mut overflow = Rect::new(0, 0, object.width, object.height);
        for child in self.children(id) {
            let c = &self[child];
            if c.is_text() || c.is_br() || c.is_inline_flow() {
                continue;
            }
            if c.is_positioned() && self.containing_block(child) != id {
                continue;
            }
            let child_overflow = if c.has_overflow_clip() {
                Rect::new(0, 0, c.width, c.height)
            } else {
                c.overflow
            };
            let (dx, dy) = if c.is_positioned() || c.is_inline() {
                self.offset_in(child, id)
            } else {
                (c.x, c.y)
            };
            overflow = overflow.unite(&child_overflow.translate(dx, dy));
        }
        for root in self.line_boxes(id) {
            let b = &self[root];
            if let Some(info) = b.line_info() {
                let band = Rect::new(b.x, info.top_overflow, b.width, info.bottom_overflow - info.top_overflow);
                overflow = overflow.unite(&band);
            }
        }
        self[id].overflow = overflow;
    }

    /// Offset of `id`'s border box from `ancestor`'s.
    fn offset_in(&self, id: RenderId, ancestor: RenderId) -> (i32, i32) {
        let (x, y) = self.absolute_position(id);
        let (ax, ay) = self.absolute_position(ancestor);
        (x - ax, y - ay)
    }

    /// Stack the block-level children of `id` and return the bottom of the
    /// last one's margin box, from the top border edge.
    ///
    /// [§ 9.4.1](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// "In a block formatting context, each box's left outer edge touches
    /// the left edge of the containing block (for right-to-left formatting,
    /// right edges touch)."
    pub(super) fn layout_block_children(&mut self, id: RenderId, relayout: bool, floats: &mut FloatContext) -> i32 {
        let bp = self[id].border_and_padding();
        let width = self[id].width;
        let ltr = self[id].style.direction.is_ltr();
        let mut height = bp.top;
        // Bottom margin of the previous in-flow child, not yet committed.
        let mut pending_margin = 0;

        let children: Vec<RenderId> = self.children(id).collect();
        for child in children {
            // STEP 1: Out-of-flow children only record where they would be.
            if self[child].is_positioned() {
                let object = &mut self[child];
                object.static_x = if ltr { bp.left } else { width - bp.right };
                object.static_y = height + pending_margin;
                continue;
            }
            if self[child].is_floating() {
                if relayout || self[child].needs_layout() {
                    self.layout_object(child, relayout);
                }
                self.position_float(id, child, floats, height + pending_margin);
                continue;
            }

            // STEP 2: Clearance.
            //
            // [§ 9.5.2 Controlling flow next to floats](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
            let clear = self[child].style.clear;
            let cleared = floats.clear(clear, height + pending_margin);
            if cleared > height + pending_margin {
                height = cleared;
                pending_margin = 0;
            }

            // STEP 3: Lay out the child.
            if relayout || self[child].needs_layout() {
                self.layout_object(child, relayout);
            }

            // STEP 4: Collapse margins between adjacent siblings.
            let (margin_top, margin_bottom, margin_left, margin_right, child_width, child_height) = {
                let c = &self[child];
                (c.margin.top, c.margin.bottom, c.margin.left, c.margin.right, c.width, c.height)
            };
            let y = height + collapse_two_margins(pending_margin, margin_top);
            let x = if ltr {
                bp.left + margin_left
            } else {
                width - bp.right - margin_right - child_width
            };

            // STEP 5: Place it, then shift by its relative offset.
            let (dx, dy) = self.relative_offset(child);
            let object = &mut self[child];
            object.static_x = x;
            object.static_y = y;
            object.x = x + dx;
            object.y = y + dy;

            // STEP 6: Advance past the border box.
            height = y + child_height;
            pending_margin = margin_bottom;
        }

        #[cfg(feature = "layout-trace")]
        log::trace!("[BLOCK] {id:?}: children end at {}", height + pending_margin);

        height + pending_margin
    }

    /// Place floated `child` of block flow `block` at or below `y`. The
    /// child must already be laid out.
    pub(super) fn position_float(&mut self, block: RenderId, child: RenderId, floats: &mut FloatContext, y: i32) {
        let Some(side) = FloatSide::from_style(self[child].style.float) else {
            return;
        };
        let left = self[block].border_and_padding().left;
        let c = &self[child];
        let margin = c.margin;
        let rect = floats.place_float(
            child,
            side,
            c.width + margin.horizontal(),
            c.height + margin.vertical(),
            y,
        );
        let x = left + rect.x + margin.left;
        let y = rect.y + margin.top;
        let (dx, dy) = self.relative_offset(child);
        let object = &mut self[child];
        object.static_x = x;
        object.static_y = y;
        object.x = x + dx;
        object.y = y + dy;

        #[cfg(feature = "layout-trace")]
        log::trace!("[FLOAT] {child:?} placed at ({x}, {y}) in {block:?}");
    }

    /// Lay out the absolutely and fixed positioned objects whose containing
    /// block is `id`, after `id`'s own size is known.
    ///
    /// [§ 10.1](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
    fn layout_positioned_objects(&mut self, id: RenderId, relayout: bool) {
        let mut positioned = Vec::new();
        self.collect_positioned(id, id, &mut positioned);
        for object in positioned {
            self.layout_object(object, relayout);
        }
    }

    fn collect_positioned(&self, cb: RenderId, parent: RenderId, out: &mut Vec<RenderId>) {
        let canvas = self[cb].is_canvas();
        for child in self.children(parent) {
            let c = &self[child];
            if c.is_text() || c.is_br() {
                continue;
            }
            if c.is_positioned() && self.containing_block(child) == cb {
                out.push(child);
            }
            // Deeper positioned objects belong to nearer containing blocks,
            // except fixed ones, which the canvas collects.
            if c.style.is_positioned() && !c.is_inline_flow() && !canvas {
                continue;
            }
            self.collect_positioned(cb, child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::collapse_two_margins;

    #[test]
    fn test_collapse_positive_margins_takes_max() {
        assert_eq!(collapse_two_margins(10, 20), 20);
        assert_eq!(collapse_two_margins(20, 0), 20);
    }

    #[test]
    fn test_collapse_negative_margins_takes_min() {
        assert_eq!(collapse_two_margins(-10, -20), -20);
    }

    #[test]
    fn test_collapse_mixed_margins_sums() {
        assert_eq!(collapse_two_margins(30, -10), 20);
        assert_eq!(collapse_two_margins(-30, 10), -20);
    }
}
