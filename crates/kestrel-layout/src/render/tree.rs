//! Ownership and structural editing of render objects.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use kestrel_dom::NodeId;

use super::invalidation::Invalidations;
use super::object::{RenderFlags, RenderId, RenderKind, RenderObject};
use crate::arena::Arena;
use crate::counter::CounterForest;
use crate::font::{ApproximateFontMetrics, FontMetrics};
use crate::line::{BoxId, InlineBox};
use crate::settings::LayoutSettings;
use crate::style::{Display, RenderStyle};

/// Owner of every render object and inline box of one document.
///
/// Objects and boxes are allocated from two generation-checked arenas and
/// linked by handle. The tree always has a canvas object at its root.
/// [`RenderTree::reset`] tears the whole tree down at once.
pub struct RenderTree {
    pub(crate) objects: Arena<RenderObject>,
    pub(crate) boxes: Arena<InlineBox>,
    node_map: HashMap<NodeId, RenderId>,
    canvas: RenderId,
    metrics: Box<dyn FontMetrics>,
    settings: LayoutSettings,
    pub(crate) counters: CounterForest,
    pub(crate) invalidations: Invalidations,
}

impl fmt::Debug for RenderTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTree")
            .field("objects", &self.objects.len())
            .field("boxes", &self.boxes.len())
            .field("canvas", &self.canvas)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RenderTree {
    /// An empty tree measuring text with [`ApproximateFontMetrics`].
    #[must_use]
    pub fn new(settings: LayoutSettings) -> Self {
        Self::with_metrics(settings, Box::new(ApproximateFontMetrics))
    }

    /// An empty tree measuring text with `metrics`.
    #[must_use]
    pub fn with_metrics(settings: LayoutSettings, metrics: Box<dyn FontMetrics>) -> Self {
        let mut objects = Arena::new();
        let canvas = objects.alloc(Self::new_canvas());
        Self {
            objects,
            boxes: Arena::new(),
            node_map: HashMap::new(),
            canvas,
            metrics,
            settings,
            counters: CounterForest::default(),
            invalidations: Invalidations::default(),
        }
    }

    fn new_canvas() -> RenderObject {
        let style = Rc::new(RenderStyle::default().with_display(Display::Block));
        RenderObject::new(RenderKind::Canvas, style, Some(NodeId::ROOT))
    }

    /// Drop every object and box at once. All outstanding handles go stale;
    /// a fresh canvas is created.
    pub fn reset(&mut self) {
        self.objects.reset();
        self.boxes.reset();
        self.node_map.clear();
        self.counters = CounterForest::default();
        self.invalidations = Invalidations::default();
        self.canvas = self.objects.alloc(Self::new_canvas());
        log::debug!("render tree reset");
    }

    /// The root object; the initial containing block.
    #[must_use]
    pub const fn canvas(&self) -> RenderId {
        self.canvas
    }

    /// Document settings.
    #[must_use]
    pub const fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Font metrics used for measuring text.
    #[must_use]
    pub fn metrics(&self) -> &dyn FontMetrics {
        self.metrics.as_ref()
    }

    /// The object behind `id`, if it is still alive.
    #[must_use]
    pub fn get(&self, id: RenderId) -> Option<&RenderObject> {
        self.objects.get(id)
    }

    /// Mutable access to the object behind `id`.
    pub fn get_mut(&mut self, id: RenderId) -> Option<&mut RenderObject> {
        self.objects.get_mut(id)
    }

    /// The inline box behind `id`, if it is still alive.
    #[must_use]
    pub fn get_box(&self, id: BoxId) -> Option<&InlineBox> {
        self.boxes.get(id)
    }

    /// Whether `id` names a live object.
    #[must_use]
    pub fn contains(&self, id: RenderId) -> bool {
        self.objects.contains(id)
    }

    /// Number of live render objects, canvas included.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of live inline boxes.
    #[must_use]
    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// The render object generated for `node`.
    #[must_use]
    pub fn renderer(&self, node: NodeId) -> Option<RenderId> {
        if node == NodeId::ROOT {
            return Some(self.canvas);
        }
        self.node_map.get(&node).copied()
    }

    /// Allocate a detached object. Non-anonymous objects become the
    /// renderer of their node.
    pub fn create_object(
        &mut self,
        kind: RenderKind,
        style: Rc<RenderStyle>,
        node: Option<NodeId>,
    ) -> RenderId {
        let id = self.objects.alloc(RenderObject::new(kind, style, node));
        if let Some(node) = node {
            let _ = self.node_map.insert(node, id);
        }
        id
    }

    /// Allocate a detached anonymous block inheriting from `parent_style`.
    pub fn create_anonymous_block(
        &mut self,
        parent_style: &RenderStyle,
        node: Option<NodeId>,
    ) -> RenderId {
        let style = Rc::new(RenderStyle::inherit(parent_style).with_display(Display::Block));
        let id = self.objects.alloc(RenderObject::new(RenderKind::Block, style, node));
        self.objects[id].flags.insert(RenderFlags::ANONYMOUS);
        id
    }

    /// Children of `id` in order.
    pub fn children(&self, id: RenderId) -> impl Iterator<Item = RenderId> + '_ {
        std::iter::successors(self.objects.get(id).and_then(|o| o.first_child), |&c| {
            self.objects.get(c).and_then(|o| o.next_sibling)
        })
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: RenderId) -> impl Iterator<Item = RenderId> + '_ {
        std::iter::successors(self.objects.get(id).and_then(|o| o.parent), |&p| {
            self.objects.get(p).and_then(|o| o.parent)
        })
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: RenderId, child: RenderId) {
        self.insert_child_before(parent, child, None);
    }

    /// Insert `child` before `before`, or last when `before` is `None`.
    ///
    /// The parent's lines around the insertion point are dirtied and the
    /// parent is marked for layout.
    pub fn insert_child_before(&mut self, parent: RenderId, child: RenderId, before: Option<RenderId>) {
        let before = before.filter(|&b| self.objects.get(b).is_some_and(|o| o.parent == Some(parent)));
        let prev = match before {
            Some(b) => self.objects[b].prev_sibling,
            None => self.objects[parent].last_child,
        };
        {
            let c = &mut self.objects[child];
            c.parent = Some(parent);
            c.prev_sibling = prev;
            c.next_sibling = before;
        }
        match prev {
            Some(p) => self.objects[p].next_sibling = Some(child),
            None => self.objects[parent].first_child = Some(child),
        }
        match before {
            Some(b) => self.objects[b].prev_sibling = Some(child),
            None => self.objects[parent].last_child = Some(child),
        }
        self.update_children_inline(parent);
        self.dirty_lines_from_changed_child(child);
        self.set_needs_layout_and_min_max_recalc(child);
    }

    /// Unlink `child` from `parent` without freeing it. Its inline boxes are
    /// deleted and the lines they sat on are dirtied.
    pub fn remove_child(&mut self, parent: RenderId, child: RenderId) {
        if self.objects.get(child).and_then(|o| o.parent) != Some(parent) {
            return;
        }
        self.dirty_lines_from_changed_child(child);
        self.delete_subtree_boxes(child);
        self.repaint(parent, super::RepaintPriority::Normal);
        let (prev, next) = {
            let c = &self.objects[child];
            (c.prev_sibling, c.next_sibling)
        };
        match prev {
            Some(p) => self.objects[p].next_sibling = next,
            None => self.objects[parent].first_child = next,
        }
        match next {
            Some(n) => self.objects[n].prev_sibling = prev,
            None => self.objects[parent].last_child = prev,
        }
        {
            let c = &mut self.objects[child];
            c.parent = None;
            c.prev_sibling = None;
            c.next_sibling = None;
        }
        self.set_needs_layout_and_min_max_recalc(parent);
    }

    /// Remove `id` from its parent and free it with its whole subtree,
    /// counters and inline boxes included.
    pub fn destroy(&mut self, id: RenderId) {
        if id == self.canvas || !self.objects.contains(id) {
            return;
        }
        if let Some(parent) = self.objects[id].parent {
            self.remove_child(parent, id);
        }
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: RenderId) {
        let children: Vec<RenderId> = self.children(id).collect();
        for child in children {
            self.free_subtree(child);
        }
        self.delete_inline_boxes(id);
        self.detach_counters(id);
        self.invalidations.forget(id);
        if let Some(object) = self.objects.free(id) {
            if let Some(node) = object.element() {
                if self.node_map.get(&node) == Some(&id) {
                    let _ = self.node_map.remove(&node);
                }
            }
        }
    }

    fn delete_subtree_boxes(&mut self, id: RenderId) {
        let children: Vec<RenderId> = self.children(id).collect();
        for child in children {
            self.delete_subtree_boxes(child);
        }
        self.delete_inline_boxes(id);
    }

    /// Recompute whether a block's children are all inline-level.
    ///
    /// Floating and out-of-flow children do not count either way.
    pub(crate) fn update_children_inline(&mut self, id: RenderId) {
        if !self.objects[id].is_block_flow() {
            return;
        }
        let mut any_block = false;
        for child in self.children(id) {
            let c = &self.objects[child];
            if !c.is_inline() && !c.is_floating() && !c.is_positioned() {
                any_block = true;
                break;
            }
        }
        self.objects[id].flags.set(RenderFlags::CHILDREN_INLINE, !any_block);
    }

    /// Replace the DOM text of a text renderer.
    ///
    /// The rendered string is rebuilt, the lines showing the text are
    /// dirtied and the renderer is marked for layout.
    pub fn set_text(&mut self, id: RenderId, text: &str) {
        let preserve = match self.objects.get(id) {
            Some(o) if o.is_text() => o.style.white_space.preserves_spaces(),
            _ => return,
        };
        self.dirty_line_boxes(id);
        self.dirty_lines_from_changed_child(id);
        self.objects[id].kind = RenderKind::Text(super::TextData::new(text, preserve));
        self.set_needs_layout_and_min_max_recalc(id);
        #[cfg(feature = "layout-trace")]
        log::trace!("set_text {id:?} len={}", self.objects[id].rendered_len());
    }
}

impl Index<RenderId> for RenderTree {
    type Output = RenderObject;

    fn index(&self, id: RenderId) -> &RenderObject {
        &self.objects[id]
    }
}

impl IndexMut<RenderId> for RenderTree {
    fn index_mut(&mut self, id: RenderId) -> &mut RenderObject {
        &mut self.objects[id]
    }
}

impl Index<BoxId> for RenderTree {
    type Output = InlineBox;

    fn index(&self, id: BoxId) -> &InlineBox {
        &self.boxes[id]
    }
}

impl IndexMut<BoxId> for RenderTree {
    fn index_mut(&mut self, id: BoxId) -> &mut InlineBox {
        &mut self.boxes[id]
    }
}
