//! Traversal of the render tree: containers, containing blocks, preorder
//! walks and editable leaves.
//!
//! [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)

use kestrel_dom::DomTree;

use super::object::RenderId;
use super::tree::RenderTree;
use crate::style::PositionType;

impl RenderTree {
    /// The object `id`'s `x`/`y` are relative to.
    ///
    /// Fixed objects are placed on the canvas, absolute ones on their
    /// nearest positioned ancestor, floats on the block flow that holds
    /// their float context, everything else on its parent.
    #[must_use]
    pub fn container(&self, id: RenderId) -> Option<RenderId> {
        let object = self.get(id)?;
        let parent = object.parent?;
        if object.is_text() || object.is_br() {
            return Some(parent);
        }
        match object.style.position {
            PositionType::Fixed => Some(self.canvas()),
            PositionType::Absolute => {
                let mut o = parent;
                loop {
                    let p = &self[o];
                    if p.is_canvas() || p.style.position != PositionType::Static {
                        return Some(o);
                    }
                    match p.parent {
                        Some(next) => o = next,
                        None => return Some(o),
                    }
                }
            }
            PositionType::Static | PositionType::Relative if object.is_floating() => {
                let mut o = parent;
                while !self[o].is_block_flow() {
                    match self[o].parent {
                        Some(next) => o = next,
                        None => break,
                    }
                }
                Some(o)
            }
            PositionType::Static | PositionType::Relative => Some(parent),
        }
    }

    /// The block whose content box (or padding box, for positioned
    /// objects) sizes and places `id`.
    ///
    /// "The position and size of an element's box(es) are sometimes
    /// calculated relative to a certain rectangle, called the containing
    /// block of the element."
    ///
    /// Unresolvable cases fall back to the canvas.
    #[must_use]
    pub fn containing_block(&self, id: RenderId) -> RenderId {
        let canvas = self.canvas();
        let Some(object) = self.get(id) else {
            return canvas;
        };
        if object.is_canvas() {
            return id;
        }
        if object.is_table_cell() {
            if let Some(table) = self.ancestors(id).find(|&a| matches!(self[a].kind, super::RenderKind::Table)) {
                return table;
            }
        }
        let Some(mut o) = object.parent else {
            return canvas;
        };
        let position = if object.is_text() || object.is_br() {
            PositionType::Static
        } else {
            object.style.position
        };
        match position {
            // "If the element has 'position: fixed', the containing block is
            // established by the viewport."
            PositionType::Fixed => return canvas,
            // "If the element has 'position: absolute', the containing block
            // is established by the nearest ancestor with a 'position' of
            // 'absolute', 'relative' or 'fixed'."
            PositionType::Absolute => loop {
                let p = &self[o];
                if p.is_canvas() {
                    break;
                }
                let inline_flow = p.is_inline() && !p.is_replaced();
                if inline_flow && p.style.position == PositionType::Relative {
                    // The inline's own block hosts the positioned objects.
                    return self.containing_block(o);
                }
                if p.style.position != PositionType::Static && !inline_flow {
                    break;
                }
                match p.parent {
                    Some(next) => o = next,
                    None => return canvas,
                }
            },
            // "For other elements, if the element's position is 'relative'
            // or 'static', the containing block is formed by the content
            // edge of the nearest block container ancestor box."
            PositionType::Static | PositionType::Relative => loop {
                let p = &self[o];
                let skip = (p.is_inline() && !p.is_replaced()) || p.is_table_part() || !p.is_block_flow();
                if !skip {
                    break;
                }
                match p.parent {
                    Some(next) => o = next,
                    None => return canvas,
                }
            },
        }
        if self[o].is_block_flow() { o } else { canvas }
    }

    /// Width of the content box of `id`.
    #[must_use]
    pub fn content_width(&self, id: RenderId) -> i32 {
        let object = &self[id];
        (object.width - object.border_and_padding().horizontal()).max(0)
    }

    /// Width of the containing block of `id`: the content box for flow
    /// content, the padding box for positioned objects.
    #[must_use]
    pub fn containing_block_width(&self, id: RenderId) -> i32 {
        let cb = self.containing_block(id);
        if self[id].is_positioned() {
            let o = &self[cb];
            return (o.width - o.border().horizontal()).max(0);
        }
        self.content_width(cb)
    }

    /// The nearest block flow at or above `id`.
    #[must_use]
    pub fn enclosing_block_flow(&self, id: RenderId) -> RenderId {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&o| self[o].is_block_flow() && !self[o].is_inline())
            .unwrap_or_else(|| self.canvas())
    }

    /// The object after `id` in preorder.
    #[must_use]
    pub fn next_renderer(&self, id: RenderId) -> Option<RenderId> {
        let object = self.get(id)?;
        if let Some(first) = object.first_child {
            return Some(first);
        }
        let mut current = id;
        loop {
            let o = &self[current];
            if let Some(next) = o.next_sibling {
                return Some(next);
            }
            current = o.parent?;
        }
    }

    /// The object before `id` in preorder.
    #[must_use]
    pub fn previous_renderer(&self, id: RenderId) -> Option<RenderId> {
        let object = self.get(id)?;
        match object.prev_sibling {
            Some(prev) => Some(self.last_leaf_object(prev).unwrap_or(prev)),
            None => object.parent,
        }
    }

    /// The object painted just below `id` in document order.
    #[must_use]
    pub fn object_below(&self, id: RenderId) -> Option<RenderId> {
        self.next_renderer(id)
    }

    /// The object painted just above `id` in document order.
    #[must_use]
    pub fn object_above(&self, id: RenderId) -> Option<RenderId> {
        self.previous_renderer(id)
    }

    /// The deepest first descendant of `id`, or `None` for a leaf.
    #[must_use]
    pub fn first_leaf_object(&self, id: RenderId) -> Option<RenderId> {
        let mut r = self.get(id)?.first_child?;
        while let Some(n) = self[r].first_child {
            r = n;
        }
        Some(r)
    }

    /// The deepest last descendant of `id`, or `None` for a leaf.
    #[must_use]
    pub fn last_leaf_object(&self, id: RenderId) -> Option<RenderId> {
        let mut r = self.get(id)?.last_child?;
        while let Some(n) = self[r].last_child {
            r = n;
        }
        Some(r)
    }

    /// Whether the caret may rest in `id`.
    ///
    /// Only visible leaves qualify: empty blocks, atomic content, line
    /// breaks, and text that produced at least one box. Outside caret
    /// browsing the originating node must also be content-editable.
    #[must_use]
    pub fn is_editable(&self, dom: &DomTree, id: RenderId) -> bool {
        let Some(object) = self.get(id) else {
            return false;
        };
        if !object.style.is_visible() {
            return false;
        }
        let Some(node) = object.element() else {
            return false;
        };
        if !self.settings().caret_browsing && !dom.is_content_editable(node) {
            return false;
        }
        (object.is_block_flow() && object.first_child.is_none())
            || object.is_replaced()
            || object.is_br()
            || (object.is_text() && object.first_line_box.is_some())
    }

    /// The next editable leaf after `id` in preorder.
    #[must_use]
    pub fn next_editable(&self, dom: &DomTree, id: RenderId) -> Option<RenderId> {
        let mut current = self.next_renderer(id);
        while let Some(c) = current {
            if self[c].first_child.is_none() && self.is_editable(dom, c) {
                return Some(c);
            }
            current = self.next_renderer(c);
        }
        None
    }

    /// The previous editable leaf before `id` in preorder.
    #[must_use]
    pub fn previous_editable(&self, dom: &DomTree, id: RenderId) -> Option<RenderId> {
        let mut current = self.previous_renderer(id);
        while let Some(c) = current {
            if self[c].first_child.is_none() && self.is_editable(dom, c) {
                return Some(c);
            }
            current = self.previous_renderer(c);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::render::{RenderKind, RenderTree, TextData};
    use crate::settings::LayoutSettings;
    use crate::style::{Display, PositionType, RenderStyle};

    fn block(tree: &mut RenderTree, position: PositionType) -> crate::render::RenderId {
        let mut style = RenderStyle::default().with_display(Display::Block);
        style.position = position;
        tree.create_object(RenderKind::Block, Rc::new(style), None)
    }

    #[test]
    fn test_absolute_skips_static_ancestors() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let canvas = tree.canvas();
        let outer = block(&mut tree, PositionType::Relative);
        let middle = block(&mut tree, PositionType::Static);
        let abs = block(&mut tree, PositionType::Absolute);
        tree.append_child(canvas, outer);
        tree.append_child(outer, middle);
        tree.append_child(middle, abs);
        assert_eq!(tree.container(abs), Some(outer));
        assert_eq!(tree.containing_block(abs), outer);
        assert_eq!(tree.containing_block(middle), outer);
    }

    #[test]
    fn test_fixed_is_placed_on_the_canvas() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let canvas = tree.canvas();
        let outer = block(&mut tree, PositionType::Relative);
        let fixed = block(&mut tree, PositionType::Fixed);
        tree.append_child(canvas, outer);
        tree.append_child(outer, fixed);
        assert_eq!(tree.container(fixed), Some(canvas));
        assert_eq!(tree.containing_block(fixed), canvas);
    }

    #[test]
    fn test_text_in_relative_inline_uses_block() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let canvas = tree.canvas();
        let outer = block(&mut tree, PositionType::Static);
        let mut span_style = RenderStyle::default();
        span_style.position = PositionType::Relative;
        let span = tree.create_object(RenderKind::Inline, Rc::new(span_style), None);
        let abs = block(&mut tree, PositionType::Absolute);
        let text = tree.create_object(
            RenderKind::Text(TextData::new("x", false)),
            Rc::new(RenderStyle::default()),
            None,
        );
        tree.append_child(canvas, outer);
        tree.append_child(outer, span);
        tree.append_child(span, text);
        tree.append_child(span, abs);
        assert_eq!(tree.containing_block(text), outer);
        assert_eq!(tree.container(abs), Some(span));
        assert_eq!(tree.containing_block(abs), outer);
    }

    #[test]
    fn test_preorder_walks_are_inverse() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let canvas = tree.canvas();
        let a = block(&mut tree, PositionType::Static);
        let b = block(&mut tree, PositionType::Static);
        let c = block(&mut tree, PositionType::Static);
        tree.append_child(canvas, a);
        tree.append_child(a, b);
        tree.append_child(canvas, c);
        let mut order = vec![canvas];
        let mut current = canvas;
        while let Some(next) = tree.next_renderer(current) {
            order.push(next);
            current = next;
        }
        assert_eq!(order, vec![canvas, a, b, c]);
        assert_eq!(tree.previous_renderer(c), Some(b));
        assert_eq!(tree.previous_renderer(b), Some(a));
        assert_eq!(tree.object_above(a), Some(canvas));
    }
}
