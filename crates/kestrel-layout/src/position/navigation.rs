//! Caret navigation over positions.
//!
//! Every method here answers with a position, never an error: when there
//! is nowhere to go the input comes back unchanged (or empty, for methods
//! that search for something that may not exist). Callers compare against
//! the input to detect failure.

use kestrel_dom::NodeId;

use super::iterator::PositionIterator;
use super::{LayoutView, Position, RenderPosition};

impl Position {
    /// The resolved form of this position.
    #[must_use]
    pub fn render_position(&self, view: LayoutView<'_>) -> RenderPosition {
        RenderPosition::from_dom_position(view, *self)
    }

    /// The offset in rendered text coordinates.
    #[must_use]
    pub fn rendered_offset(&self, view: LayoutView<'_>) -> usize {
        self.render_position(view).rendered_offset(view)
    }

    /// The node itself when it is an element, otherwise its nearest element
    /// ancestor.
    #[must_use]
    pub fn element(&self, view: LayoutView<'_>) -> Option<NodeId> {
        let node = self.node?;
        std::iter::once(node)
            .chain(view.dom.ancestors(node))
            .find(|&n| view.dom.as_element(n).is_some())
    }

    fn is_visible(&self, view: LayoutView<'_>) -> bool {
        self.node
            .and_then(|n| view.renderer(n))
            .is_some_and(|r| view.tree[r].style.is_visible())
    }

    /// Whether the position resolves to rendered content.
    #[must_use]
    pub fn in_rendered_content(&self, view: LayoutView<'_>) -> bool {
        self.render_position(view).in_rendered_content(view)
    }

    /// Whether the position resolves to rendered text.
    #[must_use]
    pub fn in_rendered_text(&self, view: LayoutView<'_>) -> bool {
        self.in_rendered_content(view)
            && self
                .node
                .and_then(|n| view.renderer(n))
                .is_some_and(|r| view.tree[r].is_text())
    }

    /// The same point expressed on a leaf node.
    ///
    /// A position between the children of a rendered container moves to the
    /// start of the first leaf of the child after it, or to the end of the
    /// last leaf when it is past the last child.
    #[must_use]
    pub fn equivalent_leaf_position(&self, view: LayoutView<'_>) -> Self {
        let Some(node) = self.node else {
            return Self::empty();
        };
        let has_rendered_children = view
            .renderer(node)
            .is_some_and(|r| view.tree[r].first_child.is_some());
        if !has_rendered_children {
            return *self;
        }
        let children = view.dom.children(node);
        if let Some(&child) = children.get(self.offset) {
            return Self::new(view.dom.deepest_first_descendant(child), 0);
        }
        match children.last() {
            Some(&last) => {
                let leaf = view.dom.deepest_last_descendant(last);
                Self::new(leaf, view.max_offset(leaf))
            }
            None => *self,
        }
    }

    /// This position if the caret may rest here, otherwise the start of the
    /// nearest visible navigable leaf before it.
    #[must_use]
    pub fn previous_rendered_editable_position(&self, view: LayoutView<'_>) -> Self {
        self.rendered_editable_position(view, false)
    }

    /// This position if the caret may rest here, otherwise the start of the
    /// nearest visible navigable leaf after it.
    #[must_use]
    pub fn next_rendered_editable_position(&self, view: LayoutView<'_>) -> Self {
        self.rendered_editable_position(view, true)
    }

    fn rendered_editable_position(&self, view: LayoutView<'_>, forward: bool) -> Self {
        let Some(node) = self.node else {
            return Self::empty();
        };
        if view.is_navigable(node) && !view.dom.has_children(node) && self.in_rendered_content(view) {
            return *self;
        }
        let mut current = node;
        loop {
            let next = if forward {
                view.next_editable(current)
            } else {
                view.previous_editable(current)
            };
            let Some(n) = next else {
                return Self::empty();
            };
            if Self::new(n, 0).is_visible(view) {
                return Self::new(n, 0);
            }
            current = n;
        }
    }

    /// The nearest position before this one that puts the caret somewhere
    /// else, without leaving the editable root.
    #[must_use]
    pub fn previous_character_position(&self, view: LayoutView<'_>) -> Self {
        self.character_position(view, false)
    }

    /// The nearest position after this one that puts the caret somewhere
    /// else, without leaving the editable root.
    #[must_use]
    pub fn next_character_position(&self, view: LayoutView<'_>) -> Self {
        self.character_position(view, true)
    }

    fn character_position(&self, view: LayoutView<'_>, forward: bool) -> Self {
        let Some(node) = self.node else {
            return Self::empty();
        };
        let root = view.root_navigable_element(node);
        let original = self.render_position(view);
        let mut it = PositionIterator::new(view, *self);
        loop {
            let done = if forward { it.at_end() } else { it.at_start() };
            if done {
                return *self;
            }
            let pos = if forward { it.next() } else { it.previous() };
            let Some(n) = pos.node else {
                return *self;
            };
            if view.root_navigable_element(n) != root {
                return *self;
            }
            let current = pos.render_position(view);
            if RenderPosition::renders_in_different_position(view, &original, &current) {
                return current.position();
            }
        }
    }

    /// The position on the line above, closest to document x coordinate
    /// `x`.
    #[must_use]
    pub fn previous_line_position(&self, view: LayoutView<'_>, x: i32) -> Self {
        self.render_position(view).previous_line_position(view, x).position()
    }

    /// The position on the line below, closest to document x coordinate
    /// `x`.
    #[must_use]
    pub fn next_line_position(&self, view: LayoutView<'_>, x: i32) -> Self {
        self.render_position(view).next_line_position(view, x).position()
    }

    /// The earliest position in the same block that draws the caret where
    /// this one does.
    ///
    /// Walks back over collapsed white space and inline boundaries; the
    /// result sits right after the last rendered character before the
    /// caret.
    #[must_use]
    pub fn equivalent_upstream_position(&self, view: LayoutView<'_>) -> Self {
        let Some(node) = self.node else {
            return Self::empty();
        };
        let block = view.enclosing_block_flow_element(node);
        let mut it = PositionIterator::new(view, *self);
        while !it.at_start() {
            let current = it.current();
            let Some(n) = current.node else {
                break;
            };
            if view.enclosing_block_flow_element(n) != block {
                return it.next();
            }
            if let Some(r) = view.renderer(n).filter(|&r| view.tree[r].style.is_visible()) {
                let object = &view.tree[r];
                if object.is_block_flow() || object.is_replaced() || object.is_br() {
                    let max = view.caret_max_offset(n);
                    if current.offset >= max {
                        return Self::new(n, max);
                    }
                } else if object.is_text() && object.first_line_box.is_some() {
                    if n != node {
                        let result = Self::new(n, view.caret_max_offset(n));
                        if self.renders_in_different_position(view, &result) {
                            return it.next();
                        }
                        return result;
                    }
                    let rendered = view.tree.convert_to_rendered_position(r, current.offset);
                    let drawn = view.tree.line_boxes(r).any(|b| {
                        view.tree[b]
                            .text_run()
                            .is_some_and(|run| rendered > run.start && rendered <= run.end())
                    });
                    if drawn {
                        return current;
                    }
                }
            }
            let _ = it.previous();
        }
        let current = it.current();
        if current.node.map(|n| view.enclosing_block_flow_element(n)) != Some(block) {
            return it.next();
        }
        current
    }

    /// The latest position in the same block that draws the caret where
    /// this one does: right before the first rendered character after the
    /// caret.
    #[must_use]
    pub fn equivalent_downstream_position(&self, view: LayoutView<'_>) -> Self {
        let Some(node) = self.node else {
            return Self::empty();
        };
        let block = view.enclosing_block_flow_element(node);
        let mut it = PositionIterator::new(view, *self);
        while !it.at_end() {
            let current = it.current();
            let Some(n) = current.node else {
                break;
            };
            if view.enclosing_block_flow_element(n) != block {
                return it.previous();
            }
            if let Some(r) = view.renderer(n).filter(|&r| view.tree[r].style.is_visible()) {
                let object = &view.tree[r];
                if object.is_block_flow() || object.is_replaced() || object.is_br() {
                    let min = view.caret_min_offset(n);
                    if current.offset <= min {
                        return Self::new(n, min);
                    }
                } else if object.is_text() && object.first_line_box.is_some() {
                    if n != node {
                        let result = Self::new(n, view.caret_min_offset(n));
                        if self.renders_in_different_position(view, &result) {
                            return it.previous();
                        }
                        return result;
                    }
                    let rendered = view.tree.convert_to_rendered_position(r, current.offset);
                    let drawn = view.tree.line_boxes(r).any(|b| {
                        view.tree[b]
                            .text_run()
                            .is_some_and(|run| rendered >= run.start && rendered <= run.end())
                    });
                    if drawn {
                        return current;
                    }
                }
            }
            let _ = it.next();
        }
        let current = it.current();
        if current.node.map(|n| view.enclosing_block_flow_element(n)) != Some(block) {
            return it.previous();
        }
        current
    }

    /// The same point expressed the way a DOM range would: positions on
    /// atomic content (images, line breaks) move to the parent, at the
    /// child's index plus the offset.
    #[must_use]
    pub fn equivalent_range_compliant_position(&self, view: LayoutView<'_>) -> Self {
        let Some(node) = self.node else {
            return *self;
        };
        let Some(parent) = view.dom.parent(node) else {
            return *self;
        };
        let atomic = view
            .renderer(node)
            .is_some_and(|r| view.tree[r].is_replaced() || view.tree[r].is_br());
        if !atomic {
            return *self;
        }
        Self::new(parent, view.dom.node_index(node) + self.offset)
    }

    /// The shallowest equivalent position: a position at the start of a
    /// first child climbs to the start of its parent.
    #[must_use]
    pub fn equivalent_shallow_position(&self, view: LayoutView<'_>) -> Self {
        let mut pos = *self;
        while let Some(node) = pos.node {
            if pos.offset != view.caret_min_offset(node) {
                break;
            }
            match view.dom.parent(node) {
                Some(parent) if view.dom.first_child(parent) == Some(node) => pos = Self::new(parent, 0),
                _ => break,
            }
        }
        pos
    }

    /// Whether `self` and `other` put the caret in visibly different
    /// places.
    #[must_use]
    pub fn renders_in_different_position(&self, view: LayoutView<'_>, other: &Self) -> bool {
        RenderPosition::renders_in_different_position(view, &self.render_position(view), &other.render_position(view))
    }

    /// Whether `self` and `other` are drawn on the same line of the same
    /// block.
    #[must_use]
    pub fn renders_on_same_line(&self, view: LayoutView<'_>, other: &Self) -> bool {
        let (Some(a), Some(b)) = (self.node, other.node) else {
            return false;
        };
        if self == other {
            return true;
        }
        if !view.in_same_containing_block_flow_element(a, b) {
            return false;
        }
        RenderPosition::renders_on_same_line(view, &self.render_position(view), &other.render_position(view))
    }

    /// Whether no rendered position before this one shares its line.
    #[must_use]
    pub fn is_first_rendered_position_on_line(&self, view: LayoutView<'_>) -> bool {
        if !self.is_visible(view) {
            return false;
        }
        let mut it = PositionIterator::new(view, *self);
        while !it.at_start() {
            let current = it.previous();
            if current.in_rendered_content(view) {
                return !self.renders_on_same_line(view, &current);
            }
        }
        true
    }

    /// Whether no rendered position after this one shares its line.
    #[must_use]
    pub fn is_last_rendered_position_on_line(&self, view: LayoutView<'_>) -> bool {
        if !self.is_visible(view) {
            return false;
        }
        let is_br = self
            .node
            .and_then(|n| view.renderer(n))
            .is_some_and(|r| view.tree[r].is_br());
        if is_br {
            return true;
        }
        let mut it = PositionIterator::new(view, *self);
        while !it.at_end() {
            let current = it.next();
            if current.in_rendered_content(view) {
                return !self.renders_on_same_line(view, &current);
            }
        }
        true
    }

    /// Whether this is the last rendered position of its block.
    #[must_use]
    pub fn is_last_rendered_position_in_editable_block(&self, view: LayoutView<'_>) -> bool {
        let Some(node) = self.node else {
            return false;
        };
        if !self.is_visible(view) {
            return false;
        }
        let max = view.renderer(node).map_or(0, |r| view.tree.caret_max_offset(r));
        if self.rendered_offset(view) != max {
            return false;
        }
        let mut it = PositionIterator::new(view, *self);
        while !it.at_end() {
            let current = it.next();
            let Some(n) = current.node else {
                break;
            };
            if !view.in_same_containing_block_flow_element(n, node) {
                return true;
            }
            if current.in_rendered_content(view) {
                return false;
            }
        }
        true
    }

    /// Whether no rendered position precedes this one inside its editable
    /// root.
    #[must_use]
    pub fn in_first_editable_in_root_editable_element(&self, view: LayoutView<'_>) -> bool {
        self.in_outer_editable_in_root(view, false)
    }

    /// Whether no rendered position follows this one inside its editable
    /// root.
    #[must_use]
    pub fn in_last_editable_in_root_editable_element(&self, view: LayoutView<'_>) -> bool {
        self.in_outer_editable_in_root(view, true)
    }

    fn in_outer_editable_in_root(&self, view: LayoutView<'_>, forward: bool) -> bool {
        let Some(node) = self.node else {
            return false;
        };
        if !self.in_rendered_content(view) {
            return false;
        }
        let root = view.root_navigable_element(node);
        let mut it = PositionIterator::new(view, *self);
        loop {
            let done = if forward { it.at_end() } else { it.at_start() };
            if done {
                return true;
            }
            let current = if forward { it.next() } else { it.previous() };
            if current.node.and_then(|n| view.root_navigable_element(n)) != root {
                return true;
            }
            if current.in_rendered_content(view) {
                return false;
            }
        }
    }

    /// Whether no rendered position precedes this one inside its block.
    #[must_use]
    pub fn in_first_editable_in_containing_editable_block(&self, view: LayoutView<'_>) -> bool {
        self.in_outer_editable_in_block(view, false)
    }

    /// Whether no rendered position follows this one inside its block.
    #[must_use]
    pub fn in_last_editable_in_containing_editable_block(&self, view: LayoutView<'_>) -> bool {
        self.in_outer_editable_in_block(view, true)
    }

    fn in_outer_editable_in_block(&self, view: LayoutView<'_>, forward: bool) -> bool {
        let Some(node) = self.node else {
            return false;
        };
        if !self.in_rendered_content(view) {
            return false;
        }
        let block = view.enclosing_block_flow_element(node);
        let mut it = PositionIterator::new(view, *self);
        loop {
            let done = if forward { it.at_end() } else { it.at_start() };
            if done {
                return true;
            }
            let current = if forward { it.next() } else { it.previous() };
            if !current.in_rendered_content(view) {
                continue;
            }
            return current.node.and_then(|n| view.enclosing_block_flow_element(n)) != block;
        }
    }

    /// Whether the caret sits at the very start of its block.
    #[must_use]
    pub fn at_start_of_containing_editable_block(&self, view: LayoutView<'_>) -> bool {
        self.rendered_offset(view) == 0 && self.in_first_editable_in_containing_editable_block(view)
    }

    /// Whether the caret sits at the very start of its editable root.
    #[must_use]
    pub fn at_start_of_root_editable_element(&self, view: LayoutView<'_>) -> bool {
        self.rendered_offset(view) == 0 && self.in_first_editable_in_root_editable_element(view)
    }
}
