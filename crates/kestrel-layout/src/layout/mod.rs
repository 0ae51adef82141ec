//! The layout pass.
//!
//! [§ 9 Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html)
//!
//! "In the visual formatting model, each element in the document tree
//! generates zero or more boxes according to the box model."
//!
//! Layout runs top-down from the canvas. Each object lays out the children
//! that need it and then sizes itself; clean subtrees keep their geometry.
//! Blocks with inline children go through the line builder in [`inline`],
//! everything else through [`block`].

mod bidi;
mod block;
mod float;
mod inline;
mod minmax;
mod positioned;

use std::rc::Rc;

use crate::render::{RenderId, RenderKind, RenderTree, RepaintPriority};
use crate::style::Length;

impl RenderTree {
    /// Lay out every object that needs it.
    pub fn layout(&mut self) {
        let canvas = self.canvas();
        if !self[canvas].needs_layout() {
            return;
        }
        log::debug!("layout: starting at canvas");
        self.layout_object(canvas, false);

        let c = &self[canvas];
        log::debug!("layout: canvas {}x{}, overflow {:?}", c.width, c.height, c.overflow);
        self.repaint(canvas, RepaintPriority::Normal);
    }

    /// Lay out one object of any kind. `relayout` forces its children to be
    /// laid out again.
    pub(crate) fn layout_object(&mut self, id: RenderId, relayout: bool) {
        match self[id].kind {
            RenderKind::Replaced { .. } => self.layout_replaced(id),
            RenderKind::TableColumn => {
                let object = &mut self[id];
                object.width = 0;
                object.height = 0;
                self.set_needs_layout(id, false, false);
            }
            // Laid out by the lines of their block.
            RenderKind::Text(_) | RenderKind::LineBreak | RenderKind::Inline => {
                self.set_needs_layout(id, false, false);
            }
            RenderKind::Canvas
            | RenderKind::Block
            | RenderKind::ListItem
            | RenderKind::Table
            | RenderKind::TableSection
            | RenderKind::TableRow
            | RenderKind::TableCell => self.layout_block(id, relayout),
        }
    }

    /// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
    ///
    /// "If 'height' and 'width' both have computed values of 'auto' and the
    /// element also has an intrinsic width, then that intrinsic width is
    /// the used value of 'width'."
    fn layout_replaced(&mut self, id: RenderId) {
        // STEP 1: Width and horizontal edges.
        self.calc_width(id);

        // STEP 2: Vertical edges.
        let cb_width = self.containing_block_width(id);
        {
            let object = &mut self[id];
            let style = Rc::clone(&object.style);
            let padding = style.padding_widths(cb_width);
            object.padding.top = padding.top;
            object.padding.bottom = padding.bottom;
            object.margin.top = style.margin.top.resolve_or_zero(cb_width);
            object.margin.bottom = style.margin.bottom.resolve_or_zero(cb_width);
        }

        // STEP 3: Height.
        if self[id].is_positioned() {
            self.calc_positioned_height(id);
        } else {
            let object = &mut self[id];
            let intrinsic = match object.kind {
                RenderKind::Replaced { intrinsic_height, .. } => intrinsic_height,
                _ => 0,
            };
            let height = match object.style.height {
                Length::Px(h) => h,
                Length::Auto | Length::Percent(_) => intrinsic,
            };
            let bp = object.border_and_padding().vertical();
            object.content_height = height.max(0);
            object.height = height.max(0) + bp;
        }

        self.compute_overflow(id);
        self.set_needs_layout(id, false, false);

        #[cfg(feature = "layout-trace")]
        log::trace!("[REPLACED] {id:?}: {}x{}", self[id].width, self[id].height);
    }
}
