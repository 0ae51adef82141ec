//! `text-overflow: ellipsis` on overflowing lines.
//!
//! [CSS Overflow 3 § 4.1 'text-overflow'](https://www.w3.org/TR/css-overflow-3/#text-overflow)
//!
//! "Implementations must hide characters and atomic inline-level elements
//! at the end edge of the line as necessary to fit the ellipsis."
//!
//! Every function takes the line's base direction as `ltr`; the block edge
//! is the end edge of the content box in block coordinates. Truncation
//! inside right-to-left lines is not supported: the ellipsis is placed at
//! the edge and no run is hidden.

use super::{BoxId, BoxKind, EllipsisBox, Truncation};
use crate::geometry::Rect;
use crate::render::RenderTree;

impl RenderTree {
    /// Whether the ellipsis can be drawn on the line at all: the line must
    /// be at least as wide as the ellipsis once the overflow is cut away,
    /// and no replaced content may sit where the ellipsis goes.
    #[must_use]
    pub fn can_accommodate_ellipsis(
        &self,
        root: BoxId,
        ltr: bool,
        block_edge: i32,
        line_edge: i32,
        ellipsis_width: i32,
    ) -> bool {
        let delta = if ltr {
            line_edge - block_edge
        } else {
            block_edge - line_edge
        };
        if self[root].width - delta < ellipsis_width {
            return false;
        }
        self.can_accommodate_ellipsis_box(root, ltr, block_edge, ellipsis_width)
    }

    fn can_accommodate_ellipsis_box(&self, id: BoxId, ltr: bool, block_edge: i32, ellipsis_width: i32) -> bool {
        let b = &self[id];
        if b.is_flow() {
            return self
                .line_children(id)
                .all(|c| self.can_accommodate_ellipsis_box(c, ltr, block_edge, ellipsis_width));
        }
        if !self[b.object].is_replaced() {
            return true;
        }
        let box_rect = Rect::new(b.x, 0, b.width, 10);
        let ellipsis_x = if ltr { block_edge - ellipsis_width } else { block_edge };
        let ellipsis_rect = Rect::new(ellipsis_x, 0, ellipsis_width, 10);
        !box_rect.intersects(&ellipsis_rect)
    }

    /// Attach an ellipsis to the line and truncate the runs it covers.
    ///
    /// When the whole line fits before the ellipsis it simply follows the
    /// last run.
    pub(crate) fn place_ellipsis(&mut self, root: BoxId, text: &str, ltr: bool, block_edge: i32, ellipsis_width: i32) {
        let (x, y, width, height, baseline) = {
            let b = &self[root];
            (b.x, b.y, b.width, b.height, b.baseline)
        };
        let ellipsis_x = if ltr && x + width + ellipsis_width <= block_edge {
            x + width
        } else {
            let mut found = false;
            match self.place_ellipsis_box(root, ltr, block_edge, ellipsis_width, &mut found) {
                Some(placed) => placed,
                None if ltr => block_edge - ellipsis_width,
                None => block_edge,
            }
        };
        if let Some(info) = self[root].line_info_mut() {
            info.ellipsis = Some(EllipsisBox {
                text: text.to_string(),
                x: ellipsis_x,
                y,
                width: ellipsis_width,
                height,
                baseline,
            });
        }
    }

    /// Truncate the runs of `id` against the ellipsis and return where the
    /// ellipsis goes, if this subtree decided it.
    ///
    /// Once a run has been cut (`found`), every later run is fully hidden.
    fn place_ellipsis_box(
        &mut self,
        id: BoxId,
        ltr: bool,
        block_edge: i32,
        ellipsis_width: i32,
        found: &mut bool,
    ) -> Option<i32> {
        match self[id].kind {
            BoxKind::Leaf => None,
            BoxKind::Flow(_) | BoxKind::Root(..) => {
                let children: Vec<BoxId> = self.line_children(id).collect();
                let mut result = None;
                for child in children {
                    let placed = self.place_ellipsis_box(child, ltr, block_edge, ellipsis_width, found);
                    if result.is_none() {
                        result = placed;
                    }
                }
                result
            }
            BoxKind::Text(run) => {
                if *found {
                    self.set_truncation(id, Truncation::Full);
                    return None;
                }
                if !ltr {
                    return None;
                }
                let ellipsis_x = block_edge - ellipsis_width;
                let b = &self[id];
                if ellipsis_x <= b.x {
                    self.set_truncation(id, Truncation::Full);
                    *found = true;
                    return None;
                }
                if ellipsis_x >= b.x + b.width || b.is_reversed() {
                    return None;
                }
                *found = true;

                let object = &self[b.object];
                let size = object.style.font_size;
                let Some(text) = object.text() else {
                    return None;
                };
                let fm = self.metrics();
                let mut x = b.x;
                let mut offset = run.start;
                while offset < run.end() {
                    let w = fm.char_width(text.rendered[offset], size);
                    if x + w > ellipsis_x {
                        break;
                    }
                    x += w;
                    offset += 1;
                }
                if offset <= run.start {
                    let placed = ellipsis_x.min(b.x);
                    self.set_truncation(id, Truncation::Full);
                    return Some(placed);
                }
                self.set_truncation(id, Truncation::At(offset));
                Some(x)
            }
        }
    }

    fn set_truncation(&mut self, id: BoxId, truncation: Truncation) {
        if let BoxKind::Text(run) = &mut self[id].kind {
            run.truncation = truncation;
        }
    }

    /// Remove the ellipsis from the line and make every run visible again.
    pub(crate) fn clear_truncation(&mut self, root: BoxId) {
        let had_ellipsis = self[root]
            .line_info_mut()
            .is_some_and(|info| info.ellipsis.take().is_some());
        if had_ellipsis {
            self.clear_run_truncation(root);
        }
    }

    fn clear_run_truncation(&mut self, id: BoxId) {
        let children: Vec<BoxId> = self.line_children(id).collect();
        for child in children {
            if self[child].is_flow() {
                self.clear_run_truncation(child);
            } else {
                self.set_truncation(child, Truncation::None);
            }
        }
    }
}
