//! Layout and repaint invalidation.
//!
//! Style changes are answered with the cheapest response that keeps
//! geometry correct: a repaint, an in-place translation of a positioned
//! object, or a relayout. Relayouts propagate "child needs layout" bits up
//! the container chain and stop at the first ancestor already marked, so a
//! burst of invalidations costs time linear in the depth of the tree.
//!
//! Signals for the embedder are queued on the tree and delivered through
//! [`LayoutHost`] by [`Document::flush_invalidations`](crate::Document::flush_invalidations).

use std::rc::Rc;

use super::object::{RenderFlags, RenderId};
use super::tree::RenderTree;
use crate::geometry::Rect;
use crate::style::{RenderStyle, StyleDiff, same_style};

/// Urgency of a repaint request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RepaintPriority {
    /// Coalesce with other damage.
    Normal,
    /// Paint soon; used for style changes.
    High,
    /// Paint before returning to the event loop.
    Realtime,
}

/// A pending signal for the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// The subtree rooted at this object must be laid out.
    Relayout(RenderId),
    /// This rectangle, in document coordinates, must be repainted.
    Repaint {
        /// Damaged area.
        rect: Rect,
        /// Urgency.
        priority: RepaintPriority,
    },
}

/// Receiver of layout and repaint signals.
pub trait LayoutHost {
    /// Lay out the subtree rooted at `root` before the next paint.
    fn schedule_relayout(&mut self, root: RenderId);

    /// Repaint `rect` (document coordinates).
    fn repaint_rectangle(&mut self, rect: Rect, priority: RepaintPriority);
}

/// Queue of signals not yet delivered.
#[derive(Debug, Default)]
pub(crate) struct Invalidations {
    queue: Vec<Invalidation>,
}

impl Invalidations {
    fn push(&mut self, invalidation: Invalidation) {
        if matches!(invalidation, Invalidation::Relayout(_)) && self.queue.contains(&invalidation) {
            return;
        }
        self.queue.push(invalidation);
    }

    /// Drop relayout requests rooted at a freed object.
    pub(crate) fn forget(&mut self, id: RenderId) {
        self.queue.retain(|i| *i != Invalidation::Relayout(id));
    }

    pub(crate) fn pending(&self) -> &[Invalidation] {
        &self.queue
    }

    pub(crate) fn take(&mut self) -> Vec<Invalidation> {
        std::mem::take(&mut self.queue)
    }
}

impl RenderTree {
    /// Signals queued since the last delivery.
    #[must_use]
    pub fn pending_invalidations(&self) -> &[Invalidation] {
        self.invalidations.pending()
    }

    /// Hand every queued signal to `host`, in the order it was raised.
    pub fn deliver_invalidations(&mut self, host: &mut dyn LayoutHost) {
        for invalidation in self.invalidations.take() {
            match invalidation {
                Invalidation::Relayout(root) => host.schedule_relayout(root),
                Invalidation::Repaint { rect, priority } => host.repaint_rectangle(rect, priority),
            }
        }
    }

    /// Ask the embedder for a relayout rooted at `id`.
    pub fn schedule_relayout(&mut self, id: RenderId) {
        #[cfg(feature = "layout-trace")]
        log::trace!("schedule_relayout {id:?}");
        self.invalidations.push(Invalidation::Relayout(id));
    }

    /// Ask the embedder to repaint a rectangle in document coordinates.
    pub fn repaint_rectangle(&mut self, rect: Rect, priority: RepaintPriority) {
        if rect.is_empty() {
            return;
        }
        self.invalidations.push(Invalidation::Repaint { rect, priority });
    }

    /// Repaint everything `id` paints.
    pub fn repaint(&mut self, id: RenderId, priority: RepaintPriority) {
        if !self.contains(id) {
            return;
        }
        let rect = self.absolute_bounding_box(id);
        self.repaint_rectangle(rect, priority);
    }

    /// Set or clear the object's own layout bit.
    ///
    /// Newly dirtied objects dirty their formatting context and mark their
    /// containing blocks when `mark_parents` is set. Clearing the bit also
    /// clears both child bits.
    pub fn set_needs_layout(&mut self, id: RenderId, needs: bool, mark_parents: bool) {
        let object = &mut self[id];
        let already = object.flags.contains(RenderFlags::NEEDS_LAYOUT);
        object.flags.set(RenderFlags::NEEDS_LAYOUT, needs);
        if needs {
            if !already && mark_parents && object.parent.is_some() {
                self.dirty_formatting_context(id, false);
                self.mark_containing_blocks_for_layout(id);
            }
        } else {
            object.flags.remove(
                RenderFlags::NORMAL_CHILD_NEEDS_LAYOUT
                    | RenderFlags::POS_CHILD_NEEDS_LAYOUT
                    | RenderFlags::MARKED_FOR_REPAINT,
            );
        }
    }

    /// Set or clear the in-flow child layout bit.
    pub fn set_child_needs_layout(&mut self, id: RenderId, needs: bool, mark_parents: bool) {
        let object = &mut self[id];
        let already = object.flags.contains(RenderFlags::NORMAL_CHILD_NEEDS_LAYOUT);
        object.flags.set(RenderFlags::NORMAL_CHILD_NEEDS_LAYOUT, needs);
        if needs {
            if !already && mark_parents {
                self.mark_containing_blocks_for_layout(id);
            }
        } else {
            object
                .flags
                .remove(RenderFlags::NORMAL_CHILD_NEEDS_LAYOUT | RenderFlags::POS_CHILD_NEEDS_LAYOUT);
        }
    }

    /// Mark intrinsic widths stale on `id` and every ancestor, or known on
    /// `id` alone.
    pub fn set_min_max_known(&mut self, id: RenderId, known: bool) {
        if known {
            self[id].flags.remove(RenderFlags::MIN_MAX_DIRTY);
            return;
        }
        let mut current = Some(id);
        while let Some(c) = current {
            let object = &mut self[c];
            object.flags.insert(RenderFlags::MIN_MAX_DIRTY);
            current = object.parent;
        }
    }

    /// Mark `id` for layout and its intrinsic widths as stale.
    pub fn set_needs_layout_and_min_max_recalc(&mut self, id: RenderId) {
        self.set_min_max_known(id, false);
        self.set_needs_layout(id, true, true);
    }

    /// Propagate a "child needs layout" bit up the container chain.
    ///
    /// Out-of-flow objects set the positioned-child bit on their container,
    /// everything else the normal-child bit. The walk stops at the first
    /// container whose bit is already set; otherwise the top of the chain is
    /// scheduled for relayout.
    pub fn mark_containing_blocks_for_layout(&mut self, id: RenderId) {
        let mut last = id;
        let mut current = self.container(id);
        while let Some(o) = current {
            let last_object = &self[last];
            let bit = if !last_object.is_text() && last_object.style.position.is_out_of_flow() {
                RenderFlags::POS_CHILD_NEEDS_LAYOUT
            } else {
                RenderFlags::NORMAL_CHILD_NEEDS_LAYOUT
            };
            let container = &mut self[o];
            if container.flags.contains(bit) {
                return;
            }
            container.flags.insert(bit);
            last = o;
            current = self.container(o);
        }
        self.schedule_relayout(last);
    }

    /// Mark the formatting context of `id` as needing a repaint walk.
    ///
    /// The mark climbs to the parent unless the object is out of flow or
    /// its size cannot affect the parent's content. `check_container`
    /// forces the climb even for an already marked object.
    pub fn dirty_formatting_context(&mut self, id: RenderId, check_container: bool) {
        let mut current = id;
        let mut check = check_container;
        loop {
            let object = &mut self[current];
            if object.flags.contains(RenderFlags::MARKED_FOR_REPAINT) && !check {
                return;
            }
            object.flags.insert(RenderFlags::MARKED_FOR_REPAINT);
            if object.is_positioned() {
                return;
            }
            let style = &object.style;
            let climbs = check
                || style.width.is_auto()
                || style.height.is_auto()
                || !(object.is_floating() || object.has_overflow_clip() || object.is_table_cell());
            match object.parent {
                Some(parent) if climbs => {
                    current = parent;
                    check = false;
                }
                _ => return,
            }
        }
    }

    /// Replace the style of `id`, responding to the difference with a
    /// repaint, a direct translation or a relayout.
    ///
    /// [§ 9.3 Positioning schemes](https://www.w3.org/TR/CSS2/visuren.html#positioning-scheme)
    pub fn set_style(&mut self, id: RenderId, style: Rc<RenderStyle>) {
        let Some(object) = self.get(id) else {
            return;
        };
        if same_style(&object.style, &style) {
            return;
        }
        let old = Rc::clone(&object.style);
        let mut diff = StyleDiff::between(&old, &style);
        let is_text = object.is_text();
        let has_parent = object.parent.is_some();

        // STEP 1: Damage the old geometry when the object may move away from it.
        if diff >= StyleDiff::Visible
            && !is_text
            && has_parent
            && (diff == StyleDiff::Position
                || old.outline_width > style.outline_width
                || (!old.has_overflow_clip() && style.has_overflow_clip()))
        {
            self.repaint(id, RepaintPriority::High);
        }

        // STEP 2: Install the new style.
        let white_space_changed = old.white_space != style.white_space;
        {
            let object = &mut self[id];
            object.style = style;
            object.update_style_flags();
            if white_space_changed {
                let preserve = object.style.white_space.preserves_spaces();
                if let Some(text) = object.text() {
                    let dom: String = text.dom.iter().collect();
                    object.kind = super::RenderKind::Text(super::TextData::new(&dom, preserve));
                }
            }
        }
        if diff == StyleDiff::CbLayout {
            if let Some(parent) = self[id].parent {
                self.update_children_inline(parent);
            }
        }

        // STEP 3: Respond to the difference.
        if has_parent {
            // Text shares its parent's style; offsets never move it on their own.
            if diff == StyleDiff::Position && !is_text && !self.attempt_direct_layer_translation(id) {
                diff = StyleDiff::Layout;
            }
            if diff > StyleDiff::Position {
                if !is_text && diff == StyleDiff::CbLayout {
                    self.dirty_formatting_context(id, true);
                }
                if is_text {
                    self.dirty_line_boxes(id);
                }
                self.set_needs_layout_and_min_max_recalc(id);
            } else if !is_text && diff >= StyleDiff::Visible {
                self.repaint(id, RepaintPriority::High);
            }
        }
        log::debug!("set_style {id:?}: {diff:?}");
    }

    /// Move a positioned object to its new offsets without a layout.
    ///
    /// Width and height are recomputed from the new style; if either
    /// differs from the current value the geometry is restored and `false`
    /// is returned so that a full layout runs instead.
    pub fn attempt_direct_layer_translation(&mut self, id: RenderId) -> bool {
        let object = &self[id];
        if !object.is_positioned() && !object.is_rel_positioned() {
            return false;
        }
        let old = object.frame();
        if object.is_positioned() {
            self.calc_positioned_width(id);
            self.calc_positioned_height(id);
        } else {
            let (dx, dy) = self.relative_offset(id);
            let object = &mut self[id];
            object.x = object.static_x + dx;
            object.y = object.static_y + dy;
        }
        let object = &mut self[id];
        if object.width != old.width || object.height != old.height {
            object.x = old.x;
            object.y = old.y;
            object.width = old.width;
            object.height = old.height;
            #[cfg(feature = "layout-trace")]
            log::trace!("layer translation failed for {id:?}");
            return false;
        }
        self.repaint(id, RepaintPriority::High);
        true
    }
}
