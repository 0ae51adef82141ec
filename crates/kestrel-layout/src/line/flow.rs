//! Structural operations on line boxes: building lines, the dirty/extract/
//! attach/delete lifecycle, and same-line navigation.

use std::rc::Rc;

use super::{BidiContext, BidiStatus, BoxFlags, BoxId, BoxKind, InlineBox};
use crate::render::{RenderId, RenderKind, RenderTree};

impl RenderTree {
    /// Allocate a box for `object` and append it to the object's line box
    /// chain. Leaf boxes replace the object's placeholder instead.
    pub(crate) fn create_inline_box(&mut self, object: RenderId, kind: BoxKind) -> BoxId {
        let leaf = matches!(kind, BoxKind::Leaf);
        if leaf {
            if let Some(old) = self[object].placeholder_box {
                self.remove_from_line(old);
                self.delete_line(old);
            }
        }
        let id = self.boxes.alloc(InlineBox::new(object, kind));
        if leaf {
            self[object].placeholder_box = Some(id);
        } else {
            self.append_line_box(object, id);
        }
        id
    }

    fn append_line_box(&mut self, object: RenderId, id: BoxId) {
        match self[object].last_line_box {
            Some(last) => {
                self[last].next_line_box = Some(id);
                self[id].prev_line_box = Some(last);
            }
            None => self[object].first_line_box = Some(id),
        }
        self[object].last_line_box = Some(id);
    }

    fn remove_line_box(&mut self, object: RenderId, id: BoxId) {
        let (prev, next) = (self[id].prev_line_box, self[id].next_line_box);
        let o = &mut self[object];
        if o.first_line_box == Some(id) {
            o.first_line_box = next;
        }
        if o.last_line_box == Some(id) {
            o.last_line_box = prev;
        }
        if let Some(n) = next {
            self[n].prev_line_box = prev;
        }
        if let Some(p) = prev {
            self[p].next_line_box = next;
        }
        let b = &mut self[id];
        b.prev_line_box = None;
        b.next_line_box = None;
    }

    /// Cut the chain of `object` before `id`; `id` and every later box are
    /// marked extracted.
    fn extract_line_box(&mut self, object: RenderId, id: BoxId) {
        let prev = self[id].prev_line_box;
        let o = &mut self[object];
        o.last_line_box = prev;
        if o.first_line_box == Some(id) {
            o.first_line_box = None;
        }
        if let Some(p) = prev {
            self[p].next_line_box = None;
        }
        self[id].prev_line_box = None;
        let mut current = Some(id);
        while let Some(c) = current {
            self[c].flags.insert(BoxFlags::EXTRACTED);
            current = self[c].next_line_box;
        }
    }

    /// Append the extracted chain starting at `id` back onto `object`.
    fn attach_line_box(&mut self, object: RenderId, id: BoxId) {
        match self[object].last_line_box {
            Some(last) => {
                self[last].next_line_box = Some(id);
                self[id].prev_line_box = Some(last);
            }
            None => self[object].first_line_box = Some(id),
        }
        let mut last = id;
        let mut current = Some(id);
        while let Some(c) = current {
            self[c].flags.remove(BoxFlags::EXTRACTED);
            last = c;
            current = self[c].next_line_box;
        }
        self[object].last_line_box = Some(last);
    }

    /// The root box of the line `id` lies on.
    #[must_use]
    pub fn root_box(&self, id: BoxId) -> BoxId {
        let mut current = id;
        while let Some(parent) = self[current].parent {
            current = parent;
        }
        current
    }

    /// Children of a flow or root box in visual order.
    pub fn line_children(&self, flow: BoxId) -> impl Iterator<Item = BoxId> + '_ {
        std::iter::successors(self.boxes.get(flow).and_then(InlineBox::first_child), |&c| {
            self.boxes.get(c).and_then(|b| b.next_on_line)
        })
    }

    /// Boxes `object` produced, one per line, in line order.
    pub fn line_boxes(&self, object: RenderId) -> impl Iterator<Item = BoxId> + '_ {
        std::iter::successors(self.objects.get(object).and_then(|o| o.first_line_box), |&b| {
            self.boxes.get(b).and_then(|b| b.next_line_box)
        })
    }

    /// The line after `root` in its block.
    #[must_use]
    pub fn next_root_box(&self, root: BoxId) -> Option<BoxId> {
        self.boxes.get(root)?.next_line_box
    }

    /// The line before `root` in its block.
    #[must_use]
    pub fn prev_root_box(&self, root: BoxId) -> Option<BoxId> {
        self.boxes.get(root)?.prev_line_box
    }

    /// Append `child` to the end of `flow`'s children.
    ///
    /// The text descendant bit propagates upward, stopping at the first
    /// ancestor that already has it.
    pub(crate) fn add_to_line(&mut self, flow: BoxId, child: BoxId) {
        let last = self[flow].last_child();
        {
            let c = &mut self[child];
            c.parent = Some(flow);
            c.prev_on_line = last;
            c.next_on_line = None;
        }
        match last {
            Some(l) => self[l].next_on_line = Some(child),
            None => {
                if let Some(children) = self[flow].children_mut() {
                    children.first = Some(child);
                }
            }
        }
        if let Some(children) = self[flow].children_mut() {
            children.last = Some(child);
        }
        if self[child].is_text() {
            self[flow].flags.insert(BoxFlags::HAS_TEXT_CHILDREN);
            let mut current = Some(flow);
            while let Some(c) = current {
                let b = &mut self[c];
                if b.has_text_descendant() {
                    break;
                }
                b.flags.insert(BoxFlags::HAS_TEXT_DESCENDANT);
                current = b.parent;
            }
        }
    }

    /// Unlink `child` from its line, dirtying the line.
    pub(crate) fn remove_from_line(&mut self, child: BoxId) {
        let Some(parent) = self[child].parent else {
            return;
        };
        if !self[parent].is_dirty() {
            self.dirty_inline_boxes(parent);
        }
        let root = self.root_box(parent);
        self.child_removed(root, child);

        let (prev, next) = (self[child].prev_on_line, self[child].next_on_line);
        if let Some(children) = self[parent].children_mut() {
            if children.first == Some(child) {
                children.first = next;
            }
            if children.last == Some(child) {
                children.last = prev;
            }
        }
        if let Some(n) = next {
            self[n].prev_on_line = prev;
        }
        if let Some(p) = prev {
            self[p].next_on_line = next;
        }
        let c = &mut self[child];
        c.parent = None;
        c.prev_on_line = None;
        c.next_on_line = None;
    }

    /// Mark `id` dirty along with its ancestors, up to the first one that
    /// is already dirty.
    pub(crate) fn dirty_inline_boxes(&mut self, id: BoxId) {
        self[id].flags.insert(BoxFlags::DIRTY);
        let mut current = self[id].parent;
        while let Some(c) = current {
            let b = &mut self[c];
            if b.is_dirty() {
                break;
            }
            b.flags.insert(BoxFlags::DIRTY);
            current = b.parent;
        }
    }

    /// Free the line rooted at `id` and everything on it, unlinking each
    /// box from its object's chain.
    pub(crate) fn delete_line(&mut self, id: BoxId) {
        let object = self[id].object;
        if self[id].is_flow() {
            let children: Vec<BoxId> = self.line_children(id).collect();
            for child in children {
                self.delete_line(child);
            }
            self.remove_line_box(object, id);
        } else if self[id].is_text() {
            self.remove_line_box(object, id);
        } else if !self[id].flags.contains(BoxFlags::EXTRACTED)
            && self[object].placeholder_box == Some(id)
        {
            self[object].placeholder_box = None;
        }
        let _ = self.boxes.free(id);
    }

    /// Detach every box on the line from its object's chain, keeping the
    /// line itself intact for reuse.
    pub(crate) fn extract_line(&mut self, id: BoxId) {
        let object = self[id].object;
        let extracted = self[id].flags.contains(BoxFlags::EXTRACTED);
        match self[id].kind {
            BoxKind::Leaf => {
                self[id].flags.insert(BoxFlags::EXTRACTED);
                if self[object].placeholder_box == Some(id) {
                    self[object].placeholder_box = None;
                }
            }
            BoxKind::Text(_) => {
                if !extracted {
                    self.extract_line_box(object, id);
                }
            }
            BoxKind::Flow(_) | BoxKind::Root(..) => {
                if !extracted {
                    self.extract_line_box(object, id);
                }
                let children: Vec<BoxId> = self.line_children(id).collect();
                for child in children {
                    self.extract_line(child);
                }
            }
        }
    }

    /// Reverse of [`extract_line`](Self::extract_line).
    pub(crate) fn attach_line(&mut self, id: BoxId) {
        let object = self[id].object;
        let extracted = self[id].flags.contains(BoxFlags::EXTRACTED);
        match self[id].kind {
            BoxKind::Leaf => {
                self[id].flags.remove(BoxFlags::EXTRACTED);
                self[object].placeholder_box = Some(id);
            }
            BoxKind::Text(_) => {
                if extracted {
                    self.attach_line_box(object, id);
                }
            }
            BoxKind::Flow(_) | BoxKind::Root(..) => {
                if extracted {
                    self.attach_line_box(object, id);
                }
                let children: Vec<BoxId> = self.line_children(id).collect();
                for child in children {
                    self.attach_line(child);
                }
            }
        }
    }

    /// Delete every inline box generated by `object`: its placeholder, its
    /// text or flow boxes, and for a block its lines.
    pub(crate) fn delete_inline_boxes(&mut self, object: RenderId) {
        if !self.contains(object) {
            return;
        }
        if let Some(placeholder) = self[object].placeholder_box {
            self.remove_from_line(placeholder);
            self.delete_line(placeholder);
        }
        let boxes: Vec<BoxId> = self.line_boxes(object).collect();
        let block = self[object].is_block_flow();
        for b in boxes {
            if !block {
                self.remove_from_line(b);
            }
            self.delete_line(b);
        }
        let o = &mut self[object];
        o.first_line_box = None;
        o.last_line_box = None;
    }

    /// Mark every line showing `object` dirty.
    pub(crate) fn dirty_line_boxes(&mut self, object: RenderId) {
        if !self.contains(object) {
            return;
        }
        if let Some(placeholder) = self[object].placeholder_box {
            self.dirty_inline_boxes(placeholder);
        }
        let boxes: Vec<BoxId> = self.line_boxes(object).collect();
        let block = self[object].is_block_flow();
        for b in boxes {
            if block {
                self[b].flags.insert(BoxFlags::DIRTY);
            } else {
                self.dirty_inline_boxes(b);
            }
        }
    }

    /// Dirty the lines of `child`'s parent around the place `child` was
    /// inserted at or removed from.
    ///
    /// The line holding the nearest earlier in-flow sibling is dirtied with
    /// the line before it, since a word may now fit there. A line break on
    /// either side also dirties the following line.
    pub(crate) fn dirty_lines_from_changed_child(&mut self, child: RenderId) {
        let Some(container) = self.get(child).and_then(|c| c.parent) else {
            return;
        };
        let c = &self[container];
        if (c.self_needs_layout() && !c.is_inline_flow()) || matches!(c.kind, RenderKind::Table) {
            return;
        }
        let Some(first) = c.first_line_box else {
            if c.is_inline_flow() {
                self.dirty_lines_from_changed_child(container);
            }
            return;
        };

        let mut found = None;
        let mut sibling = self[child].prev_sibling;
        while let Some(s) = sibling {
            let o = &self[s];
            if !o.is_floating() && !o.is_positioned() {
                let last = if o.is_text() || o.is_inline_flow() {
                    o.last_line_box
                } else {
                    o.placeholder_box
                };
                if let Some(b) = last {
                    found = Some((self.root_box(b), s));
                    break;
                }
            }
            sibling = o.prev_sibling;
        }
        let root = found.map_or_else(|| self.root_box(first), |(root, _)| root);
        self[root].flags.insert(BoxFlags::DIRTY);
        if let Some(prev) = self.prev_root_box(root) {
            self[prev].flags.insert(BoxFlags::DIRTY);
        }
        let sibling_is_br = found.is_some_and(|(_, s)| self[s].is_br());
        if self[child].is_br() || sibling_is_br {
            if let Some(next) = self.next_root_box(root) {
                self[next].flags.insert(BoxFlags::DIRTY);
            }
        }
    }

    /// Move a box and everything on it by `(dx, dy)`. Replaced content
    /// moves with its box.
    pub(crate) fn adjust_position(&mut self, id: BoxId, dx: i32, dy: i32) {
        {
            let b = &mut self[id];
            b.x += dx;
            b.y += dy;
        }
        match self[id].kind {
            BoxKind::Leaf => {
                let object = self[id].object;
                let o = &mut self[object];
                if o.is_positioned() {
                    o.static_x += dx;
                    o.static_y += dy;
                } else if o.is_replaced() {
                    o.x += dx;
                    o.y += dy;
                }
            }
            BoxKind::Text(_) => {}
            BoxKind::Flow(_) | BoxKind::Root(..) => {
                let children: Vec<BoxId> = self.line_children(id).collect();
                for child in children {
                    self.adjust_position(child, dx, dy);
                }
                if let Some(info) = self[id].line_info_mut() {
                    info.top_overflow += dy;
                    info.bottom_overflow += dy;
                    info.block_height += dy;
                    if let Some(ellipsis) = info.ellipsis.as_mut() {
                        ellipsis.x += dx;
                        ellipsis.y += dy;
                    }
                }
            }
        }
    }

    /// Whether some box follows `id` on its line, at any nesting level.
    #[must_use]
    pub fn next_on_line_exists(&self, id: BoxId) -> bool {
        let mut current = id;
        while let Some(parent) = self[current].parent {
            if self[current].next_on_line.is_some() {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Whether some box precedes `id` on its line, at any nesting level.
    #[must_use]
    pub fn prev_on_line_exists(&self, id: BoxId) -> bool {
        let mut current = id;
        while let Some(parent) = self[current].parent {
            if self[current].prev_on_line.is_some() {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Whether the line ends inside `flow`'s object: `end` is the object
    /// itself, or the last descendant along a chain of last children.
    #[must_use]
    pub(crate) fn on_end_chain(&self, flow: BoxId, end: Option<RenderId>) -> bool {
        let Some(end) = end else {
            return false;
        };
        let object = self[flow].object;
        if end == object {
            return true;
        }
        let mut current = end;
        let mut parent = self[current].parent;
        while let Some(p) = parent {
            if self[p].is_block_flow() {
                break;
            }
            if self[p].last_child != Some(current) || p == object {
                return false;
            }
            current = p;
            parent = self[p].parent;
        }
        true
    }

    /// Decide which flow boxes on a freshly built line carry the left and
    /// right margin, border and padding of their inline element.
    ///
    /// An element opens on the line holding its first box and closes on the
    /// line where nothing of it remains to be laid out.
    pub(crate) fn determine_spacing_for_flow_boxes(
        &mut self,
        flow: BoxId,
        last_line: bool,
        end_object: Option<RenderId>,
    ) {
        if self[flow].parent.is_some() {
            let object = self[flow].object;
            let o = &self[object];
            let ltr = o.style.direction.is_ltr();
            let constructed = |b: Option<BoxId>| b.is_some_and(|b| self[b].flags.contains(BoxFlags::CONSTRUCTED));
            let mut include_left = false;
            let mut include_right = false;

            if !constructed(o.first_line_box) {
                if ltr && o.first_line_box == Some(flow) {
                    include_left = true;
                } else if !ltr && o.last_line_box == Some(flow) {
                    include_right = true;
                }
            }
            if !constructed(o.last_line_box) {
                let b = &self[flow];
                if ltr {
                    if b.next_line_box.is_none()
                        && (last_line || self.next_on_line_exists(flow) || self.on_end_chain(flow, end_object))
                    {
                        include_right = true;
                    }
                } else if (b.prev_line_box.is_none() || constructed(b.prev_line_box))
                    && (last_line || self.prev_on_line_exists(flow) || self.on_end_chain(flow, end_object))
                {
                    include_left = true;
                }
            }
            let b = &mut self[flow];
            b.flags.set(BoxFlags::INCLUDE_LEFT_EDGE, include_left);
            b.flags.set(BoxFlags::INCLUDE_RIGHT_EDGE, include_right);
        }
        let children: Vec<BoxId> = self.line_children(flow).collect();
        for child in children {
            if self[child].is_flow() {
                self.determine_spacing_for_flow_boxes(child, last_line, end_object);
            }
        }
    }

    fn includes_edge(&self, id: BoxId, edge: BoxFlags) -> bool {
        let b = &self[id];
        matches!(b.kind, BoxKind::Flow(_)) && b.flags.contains(edge)
    }

    /// Left margin of a flow box, when the box includes its left edge.
    #[must_use]
    pub fn box_margin_left(&self, id: BoxId) -> i32 {
        if self.includes_edge(id, BoxFlags::INCLUDE_LEFT_EDGE) {
            self[self[id].object].margin.left
        } else {
            0
        }
    }

    /// Right margin of a flow box, when the box includes its right edge.
    #[must_use]
    pub fn box_margin_right(&self, id: BoxId) -> i32 {
        if self.includes_edge(id, BoxFlags::INCLUDE_RIGHT_EDGE) {
            self[self[id].object].margin.right
        } else {
            0
        }
    }

    /// Left border plus padding, when the box includes its left edge.
    #[must_use]
    pub fn box_border_padding_left(&self, id: BoxId) -> i32 {
        if self.includes_edge(id, BoxFlags::INCLUDE_LEFT_EDGE) {
            self[self[id].object].border_and_padding().left
        } else {
            0
        }
    }

    /// Right border plus padding, when the box includes its right edge.
    #[must_use]
    pub fn box_border_padding_right(&self, id: BoxId) -> i32 {
        if self.includes_edge(id, BoxFlags::INCLUDE_RIGHT_EDGE) {
            self[self[id].object].border_and_padding().right
        } else {
            0
        }
    }

    /// Horizontal margin, border and padding contributed by `flow` and the
    /// flow boxes nested in it.
    #[must_use]
    pub fn flow_spacing_width(&self, flow: BoxId) -> i32 {
        let own = self.box_margin_left(flow)
            + self.box_border_padding_left(flow)
            + self.box_margin_right(flow)
            + self.box_border_padding_right(flow);
        own + self
            .line_children(flow)
            .filter(|&c| self[c].is_flow())
            .map(|c| self.flow_spacing_width(c))
            .sum::<i32>()
    }

    /// The first non-flow descendant of `id`, or the deepest empty flow box
    /// on the way there.
    #[must_use]
    pub fn first_leaf_child(&self, id: BoxId) -> Option<BoxId> {
        let mut current = self[id].first_child()?;
        while let Some(next) = self[current].first_child() {
            current = next;
        }
        Some(current)
    }

    /// Mirror of [`first_leaf_child`](Self::first_leaf_child).
    #[must_use]
    pub fn last_leaf_child(&self, id: BoxId) -> Option<BoxId> {
        let mut current = self[id].last_child()?;
        while let Some(next) = self[current].last_child() {
            current = next;
        }
        Some(current)
    }

    /// The child of `flow` under the x coordinate `x`, with `tx` the
    /// horizontal offset of the line's block.
    ///
    /// A point left of the first child answers the first child, right of
    /// the last the last child. A point on a boundary belongs to the run
    /// starting there. A point in a gap between runs answers the run whose
    /// facing edge is nearer, the later run on a tie. Zero-width runs are
    /// never chosen in between.
    #[must_use]
    pub fn closest_child_for_x_pos(&self, flow: BoxId, x: i32, tx: i32) -> Option<BoxId> {
        let b = &self[flow];
        let (first, last) = (b.first_child()?, b.last_child()?);
        if x < tx + self[first].x {
            return Some(first);
        }
        if x >= tx + self[last].x + self[last].width {
            return Some(last);
        }

        let mut previous: Option<(BoxId, i32)> = None;
        for c in self.line_children(flow) {
            let left = tx + self[c].x;
            let right = left + self[c].width;
            if x >= right {
                if self[c].width > 0 {
                    previous = Some((c, right));
                }
                continue;
            }
            if x >= left {
                return Some(c);
            }
            if self[c].width == 0 {
                continue;
            }
            return match previous {
                Some((p, edge)) if x - edge < left - x => Some(p),
                _ => Some(c),
            };
        }
        previous.map(|(p, _)| p).or(Some(last))
    }

    /// The leaf under `x`, descending through nested flow boxes.
    #[must_use]
    pub fn closest_leaf_child_for_x_pos(&self, id: BoxId, x: i32, tx: i32) -> BoxId {
        if !self[id].is_flow() {
            return id;
        }
        match self.closest_child_for_x_pos(id, x, tx) {
            Some(child) => self.closest_leaf_child_for_x_pos(child, x, tx),
            None => id,
        }
    }

    /// Record where the line after `root` resumes.
    pub(crate) fn set_line_break_info(
        &mut self,
        root: BoxId,
        object: Option<RenderId>,
        pos: usize,
        status: BidiStatus,
        context: Option<Rc<BidiContext>>,
    ) {
        if let Some(info) = self[root].line_info_mut() {
            info.line_break_obj = object;
            info.line_break_pos = pos;
            info.bidi_status = status;
            info.context = context;
        }
    }

    /// Forget break positions that pointed into a box leaving `root`. Earlier
    /// lines that broke inside the same object are dirtied.
    pub(crate) fn child_removed(&mut self, root: BoxId, child: BoxId) {
        let object = self[child].object;
        let breaks_here = |tree: &Self, r: BoxId| {
            tree[r]
                .line_info()
                .is_some_and(|info| info.line_break_obj == Some(object))
        };
        if breaks_here(self, root) {
            self.set_line_break_info(root, None, 0, BidiStatus::default(), None);
        }
        let mut prev = self.prev_root_box(root);
        while let Some(p) = prev {
            if !breaks_here(self, p) {
                break;
            }
            self.set_line_break_info(p, None, 0, BidiStatus::default(), None);
            self[p].flags.insert(BoxFlags::DIRTY);
            prev = self.prev_root_box(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{FlowChildren, LineInfo, TextRun};
    use crate::render::TextData;
    use crate::settings::LayoutSettings;
    use crate::style::{Display, RenderStyle};

    fn block_with_text(tree: &mut RenderTree, s: &str) -> (RenderId, RenderId) {
        let canvas = tree.canvas();
        let block = tree.create_object(
            RenderKind::Block,
            Rc::new(RenderStyle::default().with_display(Display::Block)),
            None,
        );
        let text = tree.create_object(
            RenderKind::Text(TextData::new(s, false)),
            Rc::new(RenderStyle::default()),
            None,
        );
        tree.append_child(canvas, block);
        tree.append_child(block, text);
        (block, text)
    }

    fn line(tree: &mut RenderTree, block: RenderId, text: RenderId, start: usize, len: usize) -> (BoxId, BoxId) {
        let root = tree.create_inline_box(
            block,
            BoxKind::Root(FlowChildren::default(), Box::default()),
        );
        let run = tree.create_inline_box(
            text,
            BoxKind::Text(TextRun {
                start,
                len,
                ..TextRun::default()
            }),
        );
        tree.add_to_line(root, run);
        (root, run)
    }

    #[test]
    fn test_add_to_line_propagates_text_descendant() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let (block, text) = block_with_text(&mut tree, "ab");
        let (root, run) = line(&mut tree, block, text, 0, 2);
        assert!(tree[root].has_text_children());
        assert!(tree[root].has_text_descendant());
        assert_eq!(tree.root_box(run), root);
        assert_eq!(tree.first_leaf_child(root), Some(run));
    }

    #[test]
    fn test_extract_then_attach_restores_chains() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let (block, text) = block_with_text(&mut tree, "aa bb");
        let (first, run1) = line(&mut tree, block, text, 0, 3);
        let (second, run2) = line(&mut tree, block, text, 3, 2);

        tree.extract_line(second);
        assert_eq!(tree[block].last_line_box, Some(first));
        assert_eq!(tree[text].last_line_box, Some(run1));
        assert!(tree[run2].flags.contains(BoxFlags::EXTRACTED));

        tree.attach_line(second);
        assert_eq!(tree.line_boxes(block).collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(tree.line_boxes(text).collect::<Vec<_>>(), vec![run1, run2]);
        assert!(!tree[run2].flags.contains(BoxFlags::EXTRACTED));
    }

    #[test]
    fn test_delete_line_unlinks_from_object_chains() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let (block, text) = block_with_text(&mut tree, "aa bb");
        let (first, _) = line(&mut tree, block, text, 0, 3);
        let (second, run2) = line(&mut tree, block, text, 3, 2);
        tree.delete_line(first);
        assert_eq!(tree[block].first_line_box, Some(second));
        assert_eq!(tree[text].first_line_box, Some(run2));
        assert_eq!(tree.box_count(), 2);
    }

    #[test]
    fn test_remove_from_line_clears_break_into_object() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let (block, text) = block_with_text(&mut tree, "aa bb");
        let (first, _) = line(&mut tree, block, text, 0, 3);
        let (second, run2) = line(&mut tree, block, text, 3, 2);
        tree.set_line_break_info(first, Some(text), 3, BidiStatus::default(), None);
        tree.remove_from_line(run2);
        assert!(tree[second].is_dirty());
        assert!(tree[first].is_dirty());
        assert_eq!(tree[first].line_info().and_then(|i| i.line_break_obj), None);
    }

    #[test]
    fn test_closest_child_prefers_run_starting_at_boundary() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let (block, text) = block_with_text(&mut tree, "aaaa");
        let (root, left) = line(&mut tree, block, text, 0, 2);
        let right = tree.create_inline_box(
            text,
            BoxKind::Text(TextRun {
                start: 2,
                len: 2,
                ..TextRun::default()
            }),
        );
        tree.add_to_line(root, right);
        tree[left].width = 20;
        tree[right].x = 20;
        tree[right].width = 20;
        assert_eq!(tree.closest_child_for_x_pos(root, 19, 0), Some(left));
        assert_eq!(tree.closest_child_for_x_pos(root, 20, 0), Some(right));
        assert_eq!(tree.closest_child_for_x_pos(root, -5, 0), Some(left));
        assert_eq!(tree.closest_child_for_x_pos(root, 500, 0), Some(right));
    }

    #[test]
    fn test_adjust_position_shifts_line_bookkeeping() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let (block, text) = block_with_text(&mut tree, "a");
        let (root, run) = line(&mut tree, block, text, 0, 1);
        if let Some(info) = tree[root].line_info_mut() {
            *info = LineInfo {
                block_height: 19,
                bottom_overflow: 19,
                ..LineInfo::default()
            };
        }
        tree.adjust_position(root, 0, 10);
        assert_eq!(tree[run].y, 10);
        assert_eq!(tree[root].line_info().map(|i| i.block_height), Some(29));
    }
}
