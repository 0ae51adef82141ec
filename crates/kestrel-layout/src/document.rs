//! The document facade: one DOM, its render tree and its selection.
//!
//! This is the boundary the embedder talks to. Operations that take
//! caller-supplied nodes or offsets check them and return
//! [`LayoutError`]; everything underneath works with sentinel values.

use std::rc::Rc;

use kestrel_dom::{DomError, DomTree, NodeId};

use crate::error::LayoutError;
use crate::font::FontMetrics;
use crate::geometry::Rect;
use crate::position::{LayoutView, Position, RenderPosition};
use crate::render::{HitTestAction, HitTestResult, LayoutHost, RenderId, RenderTree, RepaintPriority, StyleMap};
use crate::selection::{Alter, Granularity, MoveDirection, Selection, SelectionRange};
use crate::settings::LayoutSettings;
use crate::style::RenderStyle;

/// A laid-out document.
///
/// Owns the DOM, the resolved styles supplied for it, the render tree
/// built from both, and the selection.
#[derive(Debug)]
pub struct Document {
    dom: DomTree,
    styles: StyleMap,
    tree: RenderTree,
    selection: Selection,
}

impl Document {
    /// Build the render tree for `dom` with user-agent default styles.
    #[must_use]
    pub fn new(dom: DomTree, settings: LayoutSettings) -> Self {
        Self::from_tree(dom, StyleMap::new(), RenderTree::new(settings))
    }

    /// Build the render tree for `dom` with the given resolved styles.
    #[must_use]
    pub fn with_styles(dom: DomTree, styles: StyleMap, settings: LayoutSettings) -> Self {
        Self::from_tree(dom, styles, RenderTree::new(settings))
    }

    /// Like [`Document::with_styles`], measuring text with `metrics`.
    #[must_use]
    pub fn with_metrics(
        dom: DomTree,
        styles: StyleMap,
        settings: LayoutSettings,
        metrics: Box<dyn FontMetrics>,
    ) -> Self {
        Self::from_tree(dom, styles, RenderTree::with_metrics(settings, metrics))
    }

    fn from_tree(dom: DomTree, styles: StyleMap, tree: RenderTree) -> Self {
        let mut document = Self {
            dom,
            styles,
            tree,
            selection: Selection::new(),
        };
        document.attach();
        document
    }

    /// The DOM.
    #[must_use]
    pub const fn dom(&self) -> &DomTree {
        &self.dom
    }

    /// The render tree.
    #[must_use]
    pub const fn tree(&self) -> &RenderTree {
        &self.tree
    }

    /// Mutable access to the render tree, for callers driving invalidation
    /// by hand.
    pub fn tree_mut(&mut self) -> &mut RenderTree {
        &mut self.tree
    }

    /// Both trees, for position and selection queries.
    #[must_use]
    pub const fn view(&self) -> LayoutView<'_> {
        LayoutView::new(&self.dom, &self.tree)
    }

    /// The current selection.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Document settings.
    #[must_use]
    pub const fn settings(&self) -> &LayoutSettings {
        self.tree.settings()
    }

    /// The render object of `node`.
    ///
    /// # Errors
    /// [`DomError::NotFound`] for an unknown node,
    /// [`LayoutError::NotRendered`] when the node generates no object.
    pub fn renderer(&self, node: NodeId) -> Result<RenderId, LayoutError> {
        if !self.dom.contains(node) {
            return Err(DomError::NotFound.into());
        }
        self.tree.renderer(node).ok_or(LayoutError::NotRendered(node))
    }

    // ----- construction -----

    /// Throw away every render object and build the tree again from the DOM.
    pub fn attach(&mut self) {
        self.tree.reset();
        let _ = self.tree.attach_node(&self.dom, NodeId::ROOT, &self.styles);
        self.selection.set_needs_layout(true);
        log::debug!("attached {} render objects", self.tree.object_count());
    }

    /// Build (or rebuild) the render objects of `node`'s subtree.
    ///
    /// # Errors
    /// [`DomError::NotFound`] for an unknown node,
    /// [`LayoutError::NotRendered`] when nothing was generated, because the
    /// node or its parent is not rendered.
    pub fn attach_node(&mut self, node: NodeId) -> Result<RenderId, LayoutError> {
        if !self.dom.contains(node) {
            return Err(DomError::NotFound.into());
        }
        let id = self
            .tree
            .attach_node(&self.dom, node, &self.styles)
            .ok_or(LayoutError::NotRendered(node))?;
        self.selection.set_needs_layout(true);
        Ok(id)
    }

    /// Destroy the render objects of `node`'s subtree. The DOM is left
    /// alone.
    ///
    /// # Errors
    /// [`DomError::NotFound`] for an unknown node.
    pub fn detach_node(&mut self, node: NodeId) -> Result<(), LayoutError> {
        if !self.dom.contains(node) {
            return Err(DomError::NotFound.into());
        }
        self.tree.detach_node(&self.dom, node);
        self.selection.set_needs_layout(true);
        Ok(())
    }

    /// Replace the resolved style of element `node`.
    ///
    /// A change of display rebuilds the node's render objects; any other
    /// change goes through style-difference invalidation.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when `node` is not an element.
    pub fn set_style(&mut self, node: NodeId, style: RenderStyle) -> Result<(), LayoutError> {
        if self.dom.as_element(node).is_none() {
            return Err(DomError::NotFound.into());
        }
        let style = Rc::new(style);
        let _ = self.styles.insert(node, Rc::clone(&style));
        let Some(id) = self.tree.renderer(node) else {
            // Newly visible content needs objects.
            if self.dom.parent(node).and_then(|p| self.tree.renderer(p)).is_some() {
                let _ = self.tree.attach_node(&self.dom, node, &self.styles);
            }
            return Ok(());
        };
        if self.tree[id].style.display != style.display {
            self.tree.detach_node(&self.dom, node);
            let _ = self.tree.attach_node(&self.dom, node, &self.styles);
        } else {
            self.tree.set_style(id, Rc::clone(&style));
            // Text renderers share their parent's style.
            let text_children: Vec<RenderId> = self.tree.children(id).filter(|&c| self.tree[c].is_text()).collect();
            for child in text_children {
                self.tree.set_style(child, Rc::clone(&style));
            }
        }
        self.selection.set_needs_layout(true);
        Ok(())
    }

    // ----- DOM mutation -----

    /// A new detached element. It is rendered once inserted.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.dom.create_element(tag)
    }

    /// A new detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.dom.create_text(data)
    }

    /// Set an attribute on element `node`. Only `contenteditable` and the
    /// list attributes affect layout; the render tree is not rebuilt.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when `node` is not an element.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), LayoutError> {
        self.dom.set_attribute(node, name, value)?;
        Ok(())
    }

    /// Insert `child` into `parent` before `reference` and render it.
    ///
    /// # Errors
    /// Whatever [`DomTree::insert_before`] rejects.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), LayoutError> {
        if self.tree.renderer(child).is_some() {
            self.tree.detach_node(&self.dom, child);
        }
        self.dom.insert_before(parent, child, reference)?;
        let _ = self.tree.attach_node(&self.dom, child, &self.styles);
        self.selection.set_needs_layout(true);
        Ok(())
    }

    /// Append `child` to `parent` and render it.
    ///
    /// # Errors
    /// Whatever [`DomTree::insert_before`] rejects.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LayoutError> {
        self.insert_before(parent, child, None)
    }

    /// Remove `child` from `parent`.
    ///
    /// Selection ends inside the removed subtree move to where it was.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LayoutError> {
        if self.dom.parent(child) != Some(parent) {
            return Err(DomError::NotFound.into());
        }
        let index = self.dom.node_index(child);
        self.tree.detach_node(&self.dom, child);

        let inside = |p: Position| p.node.is_some_and(|n| n == child || self.dom.is_descendant_of(n, child));
        let fallback = Position::new(parent, index);
        let base = self.selection.base();
        let extent = self.selection.extent();
        let moved = (inside(base), inside(extent));

        self.dom.remove_child(parent, child)?;
        if moved != (false, false) {
            let base = if moved.0 { fallback } else { base };
            let extent = if moved.1 { fallback } else { extent };
            let view = LayoutView::new(&self.dom, &self.tree);
            self.selection.move_to_range(view, base, extent);
        }
        self.selection.set_needs_layout(true);
        Ok(())
    }

    /// Replace the data of text node `node`.
    ///
    /// Selection ends inside the node are clamped to the new length.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when `node` is not a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), LayoutError> {
        self.dom.set_text(node, text)?;
        if let Some(id) = self.tree.renderer(node) {
            self.tree.set_text(id, text);
        }
        let len = text.chars().count();
        let clamp = |p: Position| {
            if p.node == Some(node) {
                Position::new(node, p.offset.min(len))
            } else {
                p
            }
        };
        let (base, extent) = (self.selection.base(), self.selection.extent());
        if clamp(base) != base || clamp(extent) != extent {
            let view = LayoutView::new(&self.dom, &self.tree);
            self.selection.move_to_range(view, clamp(base), clamp(extent));
        }
        self.selection.set_needs_layout(true);
        Ok(())
    }

    // ----- layout and host signals -----

    /// Lay out everything that needs it.
    pub fn layout(&mut self) {
        self.tree.layout();
        self.selection.set_needs_layout(true);
    }

    /// Deliver queued relayout and repaint signals to `host`.
    pub fn flush_invalidations(&mut self, host: &mut dyn LayoutHost) {
        self.tree.deliver_invalidations(host);
    }

    // ----- queries -----

    /// The node and caret position under document point (`x`, `y`), with
    /// the whole tree translated by (`tx`, `ty`).
    #[must_use]
    pub fn hit_test(&self, x: i32, y: i32, tx: i32, ty: i32, action: HitTestAction) -> Option<HitTestResult> {
        self.tree.node_at_point(self.tree.canvas(), x, y, tx, ty, action)
    }

    /// The caret position closest to document point (`x`, `y`).
    #[must_use]
    pub fn position_for_point(&self, x: i32, y: i32) -> Position {
        self.hit_test(x, y, 0, 0, HitTestAction::All)
            .map_or_else(Position::empty, |hit| hit.position)
    }

    /// Caret rectangle at DOM position (`node`, `offset`), in document
    /// coordinates. Zero when there is no box to place it on.
    ///
    /// # Errors
    /// [`DomError::NotFound`] for an unknown node,
    /// [`DomError::IndexSize`] when `offset` is past the node's end,
    /// [`LayoutError::NotRendered`] when the node has no renderer.
    pub fn caret_rect(&self, node: NodeId, offset: usize) -> Result<Rect, LayoutError> {
        let id = self.renderer(node)?;
        let view = self.view();
        self.check_offset(node, offset)?;
        let rendered = RenderPosition::from_dom_position(view, Position::new(node, offset)).rendered_offset(view);
        Ok(self.tree.caret_pos(id, rendered, false).unwrap_or(Rect::ZERO))
    }

    /// The selected range, or `None` without a selection.
    #[must_use]
    pub fn selection_range(&self) -> Option<SelectionRange> {
        self.selection.selection_range(self.view())
    }

    /// Value of counter `name` at element `node`.
    ///
    /// # Errors
    /// [`DomError::NotFound`] for an unknown node,
    /// [`LayoutError::NotRendered`] when the node has no renderer.
    pub fn counter_value(&mut self, node: NodeId, name: &str) -> Result<Option<i32>, LayoutError> {
        let id = self.renderer(node)?;
        Ok(self.tree.counter_value(&self.dom, id, name))
    }

    // ----- selection -----

    fn check_offset(&self, node: NodeId, offset: usize) -> Result<(), LayoutError> {
        if !self.dom.contains(node) {
            return Err(DomError::NotFound.into());
        }
        let max = self.view().max_offset(node);
        if offset > max {
            return Err(DomError::IndexSize { offset, max }.into());
        }
        Ok(())
    }

    fn check_position(&self, position: Position) -> Result<(), LayoutError> {
        let node = position.node.ok_or(DomError::NotFound)?;
        self.check_offset(node, position.offset)
    }

    /// Repaint the caret before and after `change`.
    fn with_caret_repaint<R>(&mut self, change: impl FnOnce(&mut Selection, LayoutView<'_>) -> R) -> R {
        let view = LayoutView::new(&self.dom, &self.tree);
        let before = self.selection.repaint_rect(view);
        let result = change(&mut self.selection, view);
        let after = self.selection.repaint_rect(view);
        self.tree.repaint_rectangle(before, RepaintPriority::Realtime);
        if after != before {
            self.tree.repaint_rectangle(after, RepaintPriority::Realtime);
        }
        result
    }

    /// Place a collapsed caret at (`node`, `offset`).
    ///
    /// # Errors
    /// [`DomError::NotFound`] for an unknown node,
    /// [`DomError::IndexSize`] for an offset past the node's end.
    pub fn set_caret(&mut self, node: NodeId, offset: usize) -> Result<(), LayoutError> {
        self.check_offset(node, offset)?;
        self.with_caret_repaint(|selection, view| selection.move_to(view, Position::new(node, offset)));
        Ok(())
    }

    /// Select from `base` to `extent`.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when either side is empty or unknown,
    /// [`DomError::IndexSize`] for an offset past its node's end.
    pub fn set_selection(&mut self, base: Position, extent: Position) -> Result<(), LayoutError> {
        self.check_position(base)?;
        self.check_position(extent)?;
        self.with_caret_repaint(|selection, view| selection.move_to_range(view, base, extent));
        Ok(())
    }

    /// Move or extend the selection. Returns whether it changed.
    pub fn modify_selection(&mut self, alter: Alter, direction: MoveDirection, granularity: Granularity) -> bool {
        self.with_caret_repaint(|selection, view| selection.modify(view, alter, direction, granularity))
    }

    /// Grow the selection to whole words or lines.
    pub fn expand_selection(&mut self, granularity: Granularity) -> bool {
        self.with_caret_repaint(|selection, view| selection.expand_using_granularity(view, granularity))
    }

    /// Collapse the selection to its caret position.
    pub fn collapse_selection(&mut self) {
        self.with_caret_repaint(Selection::collapse);
    }

    /// Remove the selection.
    pub fn clear_selection(&mut self) {
        self.with_caret_repaint(Selection::clear);
    }

    /// The caret rectangle of the selection.
    pub fn selection_caret_rect(&mut self) -> Rect {
        let view = LayoutView::new(&self.dom, &self.tree);
        self.selection.caret_rect(view)
    }
}
