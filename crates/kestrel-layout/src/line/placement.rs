//! Horizontal and vertical placement of the boxes on a line.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "The line box height is the distance between the uppermost box top and
//! the lowermost box bottom."

use super::{BoxFlags, BoxId, BoxKind, POSITION_BOTTOM, POSITION_TOP};
use crate::render::RenderTree;

/// Running maxima collected by [`RenderTree::vertically_align_boxes`].
#[derive(Debug, Default, Clone, Copy)]
struct LineExtents {
    position_top: i32,
    position_bottom: i32,
    ascent: i32,
    descent: i32,
}

impl RenderTree {
    /// Lay out the children of `flow` left to right starting at `x`, and
    /// return the x just past the flow's right edge.
    ///
    /// Positioned placeholders take the current x but no width. In a
    /// right-to-left block their x is measured from the block's right
    /// border edge.
    pub(crate) fn place_boxes_horizontally(&mut self, flow: BoxId, x: i32) -> i32 {
        self[flow].x = x;
        let start = x;
        let mut x = x + self.box_border_padding_left(flow);

        let children: Vec<BoxId> = self.line_children(flow).collect();
        for child in children {
            let object = self[child].object;
            let o = &self[object];
            if o.is_text() {
                self[child].x = x;
                x += self[child].width;
            } else if o.is_positioned() {
                let ltr = o.parent.is_none_or(|p| self[p].style.direction.is_ltr());
                self[child].x = if ltr {
                    x
                } else {
                    let root = self.root_box(flow);
                    self[self[root].object].width - x
                };
            } else if o.is_inline_flow() {
                x += self.box_margin_left(child);
                x = self.place_boxes_horizontally(child, x);
                x += self.box_margin_right(child);
            } else {
                let (left, right) = (o.margin.left, o.margin.right);
                x += left;
                self[child].x = x;
                x += self[child].width + right;
            }
        }

        x += self.box_border_padding_right(flow);
        self[flow].width = x - start;
        x
    }

    /// Place the line rooted at `root` vertically, its top at
    /// `block_height`, and return the block height below the line.
    ///
    /// In quirks mode, flow boxes with no text inside shrink to the extent
    /// of the rest of the line.
    pub(crate) fn vertically_align_boxes(&mut self, root: BoxId, block_height: i32) -> i32 {
        let strict = self.settings().strict_mode;
        let mut extents = LineExtents::default();
        self.compute_logical_box_heights(root, &mut extents, strict);

        if extents.ascent + extents.descent < extents.position_top.max(extents.position_bottom) {
            self.adjust_max_ascent_and_descent(root, &mut extents);
        }

        let max_height = extents.ascent + extents.descent;
        let mut top = block_height;
        let mut bottom = block_height;
        self.place_boxes_vertically(root, block_height, max_height, extents.ascent, strict, &mut top, &mut bottom);

        if let Some(info) = self[root].line_info_mut() {
            info.top_overflow = top;
            info.bottom_overflow = bottom;
        }

        if !strict {
            self.shrink_boxes_with_no_text_children(root, top, bottom);
        }

        block_height + max_height
    }

    fn compute_logical_box_heights(&mut self, flow: BoxId, extents: &mut LineExtents, strict: bool) {
        if self[flow].is_root() {
            let object = self[flow].object;
            let height = self.line_height(object, true);
            let baseline = self.baseline_position(object, true);
            let b = &mut self[flow];
            b.height = height;
            b.baseline = baseline;
            if b.has_text_children() || strict {
                extents.ascent = extents.ascent.max(baseline);
                extents.descent = extents.descent.max(height - baseline);
            }
        }

        let children: Vec<BoxId> = self.line_children(flow).collect();
        for child in children {
            let object = self[child].object;
            if self[object].is_positioned() {
                continue;
            }
            let height = self.line_height(object, false);
            let baseline = self.baseline_position(object, false);
            let y = self.vertical_position_hint(object);
            let b = &mut self[child];
            b.height = height;
            b.baseline = baseline;
            b.y = y;
            if y == POSITION_TOP {
                extents.position_top = extents.position_top.max(height);
            } else if y == POSITION_BOTTOM {
                extents.position_bottom = extents.position_bottom.max(height);
            } else if b.has_text_children() || strict {
                let ascent = baseline - y;
                extents.ascent = extents.ascent.max(ascent);
                extents.descent = extents.descent.max(height - ascent);
            }
            if self[child].is_flow() {
                self.compute_logical_box_heights(child, extents, strict);
            }
        }
    }

    /// Grow the line so that `top`/`bottom` aligned boxes taller than the
    /// rest of it fit.
    fn adjust_max_ascent_and_descent(&self, flow: BoxId, extents: &mut LineExtents) {
        for child in self.line_children(flow) {
            let b = &self[child];
            if self[b.object].is_positioned() {
                continue;
            }
            if b.y == POSITION_TOP || b.y == POSITION_BOTTOM {
                if extents.ascent + extents.descent < b.height {
                    if b.y == POSITION_TOP {
                        extents.descent = b.height - extents.ascent;
                    } else {
                        extents.ascent = b.height - extents.descent;
                    }
                }
                if extents.ascent + extents.descent >= extents.position_top.max(extents.position_bottom) {
                    break;
                }
            }
            if b.is_flow() {
                self.adjust_max_ascent_and_descent(child, extents);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place_boxes_vertically(
        &mut self,
        flow: BoxId,
        y: i32,
        max_height: i32,
        max_ascent: i32,
        strict: bool,
        top: &mut i32,
        bottom: &mut i32,
    ) {
        let mut max_height = max_height;
        if self[flow].is_root() {
            let object = self[flow].object;
            let line_height = self.line_height(object, true);
            let b = &mut self[flow];
            b.y = y + max_ascent - b.baseline;
            // [§ 10.8.1] "On a block container element whose content is
            // composed of inline-level elements, 'line-height' specifies
            // the minimal height of line boxes within the element."
            if b.has_text_children() && max_height < line_height {
                max_height = line_height;
            }
        }

        let children: Vec<BoxId> = self.line_children(flow).collect();
        for child in children {
            let object = self[child].object;
            if self[object].is_positioned() {
                continue;
            }
            if self[child].is_flow() {
                self.place_boxes_vertically(child, y, max_height, max_ascent, strict, top, bottom);
            }

            let mut affects_extent = true;
            {
                let b = &mut self[child];
                if b.y == POSITION_TOP {
                    b.y = y;
                } else if b.y == POSITION_BOTTOM {
                    b.y = y + max_height - b.height;
                } else {
                    if !strict && !b.has_text_descendant() {
                        affects_extent = false;
                    }
                    b.y += y + max_ascent - b.baseline;
                }
            }

            let b = &self[child];
            let o = &self[object];
            let mut new_y = b.y;
            let mut new_height = b.height;
            let mut new_baseline = b.baseline;
            let mut overflow_top = 0;
            let mut overflow_bottom = 0;
            if b.is_text() || b.is_flow() {
                let fm = self.metrics();
                let size = o.style.font_size;
                // Only adjust when the leading exceeds the font's own.
                if (fm.ascent(size) - b.baseline).abs() > fm.leading(size) / 2 {
                    let ascent = fm.ascent(size) + fm.leading(size) / 2;
                    new_y += b.baseline - ascent;
                    new_baseline = ascent;
                    new_height = fm.line_spacing(size);
                }
                if b.is_flow() {
                    let bp = o.border_and_padding();
                    new_height += bp.vertical();
                    new_y -= bp.top;
                    new_baseline += bp.top;
                }
            } else {
                new_y += o.margin.top;
                new_height = b.height - o.margin.vertical();
                overflow_top = o.overflow.y.min(0);
                overflow_bottom = o.overflow.bottom().max(new_height) - new_height;
            }
            let b = &mut self[child];
            b.y = new_y;
            b.height = new_height;
            b.baseline = new_baseline;

            if affects_extent {
                *top = (*top).min(new_y + overflow_top);
                *bottom = (*bottom).max(new_y + new_height + overflow_bottom);
            }
        }

        if self[flow].is_root() {
            let object = self[flow].object;
            let size = self[object].style.font_size;
            let fm = self.metrics();
            let (ascent, leading, spacing) = (fm.ascent(size), fm.leading(size), fm.line_spacing(size));
            let b = &mut self[flow];
            if (ascent - b.baseline).abs() > leading / 2 {
                let ascent = ascent + leading / 2;
                b.height = spacing;
                b.y += b.baseline - ascent;
                b.baseline = ascent;
            }
            if b.has_text_descendant() || strict {
                *top = (*top).min(b.y);
                *bottom = (*bottom).max(b.y + b.height);
            }
        }
    }

    fn shrink_boxes_with_no_text_children(&mut self, flow: BoxId, top: i32, bottom: i32) {
        let children: Vec<BoxId> = self.line_children(flow).collect();
        for child in children {
            if self[self[child].object].is_positioned() {
                continue;
            }
            if self[child].is_flow() {
                self.shrink_boxes_with_no_text_children(child, top, bottom);
            }
        }
        let b = &mut self[flow];
        if !b.has_text_descendant() {
            if b.y < top {
                b.y = top;
            }
            if b.y + b.height > bottom {
                b.height = bottom - b.y;
            }
            if b.baseline > b.height {
                b.baseline = b.height;
            }
        }
    }

    /// Mark every box on a finished line constructed.
    pub(crate) fn mark_line_constructed(&mut self, flow: BoxId) {
        self[flow].flags.insert(BoxFlags::CONSTRUCTED);
        self[flow].flags.remove(BoxFlags::DIRTY);
        let children: Vec<BoxId> = self.line_children(flow).collect();
        for child in children {
            if matches!(self[child].kind, BoxKind::Flow(_)) {
                self.mark_line_constructed(child);
            } else {
                self[child].flags.insert(BoxFlags::CONSTRUCTED);
                self[child].flags.remove(BoxFlags::DIRTY);
            }
        }
    }
}
