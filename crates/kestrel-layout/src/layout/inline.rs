//! Inline layout: breaking a block's inline content into lines and building
//! the box tree of each line.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. Horizontal
//! margins, borders, and padding are respected between these boxes."
//!
//! The inline content of a block is flattened into a list of items. A line
//! is found by a greedy scan over the items, resolved for bidi, built into
//! boxes in visual order and placed. Lines that stayed clean since the last
//! layout are kept: relayout starts at the first dirty line and stops as
//! soon as it reaches the start of a clean line.

use std::rc::Rc;

use unicode_linebreak::{BreakOpportunity, linebreaks};

use super::bidi::{self, OBJECT_REPLACEMENT, PDF};
use super::float::FloatContext;
use crate::line::{BidiContext, BidiStatus, BoxFlags, BoxId, BoxKind, FlowChildren, TextRun, Truncation};
use crate::render::{RenderId, RenderTree};
use crate::style::{Direction, RenderStyle, TextAlign, TextOverflow};

/// One step of a block's inline content, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    /// Start of an inline flow.
    Enter(RenderId),
    /// End of an inline flow.
    Exit(RenderId),
    Text(RenderId),
    /// A line break or atomic inline.
    Leaf(RenderId),
    Float(RenderId),
    Positioned(RenderId),
}

impl Item {
    const fn object(self) -> RenderId {
        match self {
            Self::Enter(o) | Self::Exit(o) | Self::Text(o) | Self::Leaf(o) | Self::Float(o) | Self::Positioned(o) => o,
        }
    }

    /// Whether a line can start at this item.
    const fn is_content(self) -> bool {
        !matches!(self, Self::Enter(_) | Self::Exit(_))
    }
}

/// A position in the item list: an item and, inside text, a rendered
/// offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Cursor {
    index: usize,
    offset: usize,
}

impl Cursor {
    const fn at(index: usize) -> Self {
        Self { index, offset: 0 }
    }
}

/// Where a line ends and the next one begins.
#[derive(Debug)]
struct LineBreak {
    /// End of the line's content, exclusive.
    end: Cursor,
    /// Start of the next line, past collapsed white space.
    next: Cursor,
    /// Ended by a `<br>` or a preserved newline.
    forced: bool,
    /// Floats met on the line that did not fit beside it.
    deferred: Vec<RenderId>,
}

/// A piece of one line, in logical order.
#[derive(Debug, Clone, Copy)]
enum Segment {
    Enter(RenderId),
    Exit(RenderId),
    Text { object: RenderId, start: usize, end: usize },
    Leaf(RenderId),
    Positioned(RenderId),
}

impl Segment {
    const fn object(self) -> RenderId {
        match self {
            Self::Enter(o) | Self::Exit(o) | Self::Leaf(o) | Self::Positioned(o) | Self::Text { object: o, .. } => o,
        }
    }
}

/// Content of one run of uniform embedding level; each becomes one box.
#[derive(Debug, Clone, Copy)]
enum RunKind {
    Text { object: RenderId, start: usize, end: usize },
    Leaf(RenderId),
    /// An inline flow with no children, which still gets a box.
    EmptyFlow(RenderId),
}

#[derive(Debug, Clone, Copy)]
struct Run {
    kind: RunKind,
    level: u8,
}

impl RenderTree {
    /// Lay out the inline children of block `id` into lines, and return the
    /// block height below the last line, from the top border edge.
    pub(super) fn layout_inline_children(&mut self, id: RenderId, relayout: bool, floats: &mut FloatContext) -> i32 {
        let mut items = Vec::new();
        self.collect_inline_items(id, &mut items);
        self.prepare_inline_flows(id, &items);

        // STEP 1: Dirty the lines of content that changed.
        for &item in &items {
            let dirty = match item {
                Item::Leaf(o) => self[o].needs_layout(),
                Item::Enter(o) | Item::Text(o) => self[o].self_needs_layout(),
                Item::Exit(_) | Item::Float(_) | Item::Positioned(_) => false,
            };
            if dirty {
                self.dirty_line_boxes(item.object());
            }
        }

        // STEP 2: Rebuild what is dirty, or everything.
        let top = self[id].border_and_padding().top;
        let has_floats = !floats.is_empty() || items.iter().any(|i| matches!(i, Item::Float(_)));
        let full = relayout || has_floats || self[id].self_needs_layout() || self[id].first_line_box.is_none();
        let incremental = if full {
            None
        } else {
            self.relayout_dirty_lines(id, &items, top, floats)
        };
        let height = match incremental {
            Some(height) => height,
            None => {
                self.delete_lines(id);
                let start = self.skip_leading(&items, Cursor::default());
                self.build_lines(id, &items, start, top, floats, None)
            }
        };

        // STEP 3: Clear the flags of content laid out by the lines.
        for &item in &items {
            match item {
                Item::Enter(o) | Item::Text(o) => self.set_needs_layout(o, false, false),
                Item::Leaf(o) if self[o].is_br() => self.set_needs_layout(o, false, false),
                _ => {}
            }
        }

        #[cfg(feature = "layout-trace")]
        log::trace!(
            "[INLINE] {id:?}: {} lines, {} items, full={full}",
            self.line_boxes(id).count(),
            items.len()
        );

        height
    }

    fn collect_inline_items(&self, parent: RenderId, items: &mut Vec<Item>) {
        for child in self.children(parent) {
            let o = &self[child];
            let item = if o.is_positioned() {
                Item::Positioned(child)
            } else if o.is_floating() {
                Item::Float(child)
            } else if o.is_text() {
                Item::Text(child)
            } else if o.is_inline_flow() {
                items.push(Item::Enter(child));
                self.collect_inline_items(child, items);
                Item::Exit(child)
            } else {
                Item::Leaf(child)
            };
            items.push(item);
        }
    }

    /// Resolve the edges of inline flows against the block's content width.
    ///
    /// [§ 10.3.1 Inline, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-width)
    ///
    /// "A computed value of 'auto' for 'margin-left' or 'margin-right'
    /// becomes a used value of '0'."
    fn prepare_inline_flows(&mut self, block: RenderId, items: &[Item]) {
        let cb_width = self.content_width(block);
        for &item in items {
            match item {
                Item::Enter(o) => {
                    let style = Rc::clone(&self[o].style);
                    let (dx, dy) = self.relative_offset(o);
                    let object = &mut self[o];
                    object.padding = style.padding_widths(cb_width);
                    object.margin.left = style.margin.left.resolve_or_zero(cb_width);
                    object.margin.right = style.margin.right.resolve_or_zero(cb_width);
                    object.margin.top = 0;
                    object.margin.bottom = 0;
                    object.x = dx;
                    object.y = dy;
                }
                Item::Text(o) => {
                    let object = &mut self[o];
                    object.x = 0;
                    object.y = 0;
                }
                _ => {}
            }
        }
    }

    fn rendered_chars(&self, id: RenderId) -> &[char] {
        self[id].text().map_or(&[][..], |t| &t.rendered[..])
    }

    /// Margin, border and padding one side of inline flow `id` adds.
    fn inline_edge(&self, id: RenderId, start: bool) -> i32 {
        let o = &self[id];
        let bp = o.border_and_padding();
        let ltr = o.style.direction.is_ltr();
        if start == ltr {
            o.margin.left + bp.left
        } else {
            o.margin.right + bp.right
        }
    }

    /// Move `from` past collapsible white space and element boundaries to
    /// where a line can start.
    ///
    /// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
    ///
    /// "If a space (U+0020) at the beginning of a line has 'white-space'
    /// set to 'normal', 'nowrap', or 'pre-line', it is removed."
    fn skip_leading(&self, items: &[Item], from: Cursor) -> Cursor {
        let mut cursor = from;
        while let Some(&item) = items.get(cursor.index) {
            match item {
                Item::Enter(_) | Item::Exit(_) => {}
                Item::Text(o) => {
                    let chars = self.rendered_chars(o);
                    if !self[o].style.white_space.preserves_spaces() {
                        while chars.get(cursor.offset) == Some(&' ') {
                            cursor.offset += 1;
                        }
                    }
                    if cursor.offset < chars.len() {
                        return cursor;
                    }
                }
                Item::Leaf(_) | Item::Float(_) | Item::Positioned(_) => return cursor,
            }
            cursor = Cursor::at(cursor.index + 1);
        }
        cursor
    }

    fn soft_break(&self, items: &[Item], at: Cursor, deferred: Vec<RenderId>) -> LineBreak {
        LineBreak {
            end: at,
            next: self.skip_leading(items, at),
            forced: false,
            deferred,
        }
    }

    /// Find where the line starting at `start` ends.
    ///
    /// Content is added up to the last break opportunity that still fits.
    /// A line always takes at least one unbreakable piece, so content wider
    /// than the line overflows it instead of looping.
    fn find_line_end(
        &mut self,
        block: RenderId,
        items: &[Item],
        start: Cursor,
        line_top: i32,
        floats: &mut FloatContext,
    ) -> LineBreak {
        let line_height = self.line_height(block, true);
        let mut available = floats.available_width_at(line_top, line_height).1;
        // Committed width, up to the last break opportunity.
        let mut width = 0;
        // Width since the last break opportunity.
        let mut pending = 0;
        let mut last_break: Option<Cursor> = None;
        let mut deferred = Vec::new();

        let mut offset = start.offset;
        for (index, &item) in items.iter().enumerate().skip(start.index) {
            match item {
                Item::Enter(o) => pending += self.inline_edge(o, true),
                Item::Exit(o) => pending += self.inline_edge(o, false),
                Item::Positioned(_) => {}
                Item::Float(o) => {
                    if !floats.contains(o) {
                        self.layout_object(o, false);
                        let float_width = self[o].width + self[o].margin.horizontal();
                        if width + pending == 0 || width + pending + float_width <= available {
                            self.position_float(block, o, floats, line_top);
                            available = floats.available_width_at(line_top, line_height).1;
                        } else {
                            deferred.push(o);
                        }
                    }
                }
                Item::Leaf(o) if self[o].is_br() => {
                    if width + pending > available {
                        if let Some(at) = last_break {
                            return self.soft_break(items, at, deferred);
                        }
                    }
                    let end = Cursor::at(index + 1);
                    return LineBreak {
                        end,
                        next: self.skip_leading(items, end),
                        forced: true,
                        deferred,
                    };
                }
                Item::Leaf(o) => {
                    // Atomic inlines are break opportunities on both sides
                    // where wrapping is allowed.
                    let wraps = self[o].style.white_space.allows_wrap();
                    if wraps && width + pending > 0 {
                        if width + pending > available {
                            if let Some(at) = last_break {
                                return self.soft_break(items, at, deferred);
                            }
                        }
                        width += pending;
                        pending = 0;
                        last_break = Some(Cursor::at(index));
                    }
                    self.layout_object(o, false);
                    pending += self[o].width + self[o].margin.horizontal();
                    if wraps {
                        if width + pending > available {
                            if let Some(at) = last_break {
                                return self.soft_break(items, at, deferred);
                            }
                        }
                        width += pending;
                        pending = 0;
                        last_break = Some(Cursor::at(index + 1));
                    }
                }
                Item::Text(o) => {
                    let object = &self[o];
                    let white_space = object.style.white_space;
                    let size = object.style.font_size;
                    let chars = self.rendered_chars(o);
                    let breaks = if white_space.allows_wrap() {
                        soft_break_offsets(chars)
                    } else {
                        Vec::new()
                    };
                    let fm = self.metrics();
                    for (i, &c) in chars.iter().enumerate().skip(offset) {
                        if c == '\n' && white_space.preserves_spaces() {
                            if width + pending > available {
                                if let Some(at) = last_break {
                                    return self.soft_break(items, at, deferred);
                                }
                            }
                            return LineBreak {
                                end: Cursor { index, offset: i },
                                next: self.skip_leading(items, Cursor { index, offset: i + 1 }),
                                forced: true,
                                deferred,
                            };
                        }
                        let advance = fm.char_width(c, size);
                        if c == ' ' && white_space.allows_wrap() {
                            if width + pending > available {
                                if let Some(at) = last_break {
                                    return self.soft_break(items, at, deferred);
                                }
                            }
                            width += pending + advance;
                            pending = 0;
                            last_break = Some(Cursor { index, offset: i + 1 });
                        } else if breaks.binary_search(&(i + 1)).is_ok() {
                            // Unlike a space, the character before the
                            // opportunity has to fit on the line itself.
                            if width + pending + advance > available {
                                if let Some(at) = last_break {
                                    return self.soft_break(items, at, deferred);
                                }
                            }
                            width += pending + advance;
                            pending = 0;
                            last_break = Some(Cursor { index, offset: i + 1 });
                        } else {
                            pending += advance;
                        }
                    }
                }
            }
            offset = 0;
        }

        if width + pending > available {
            if let Some(at) = last_break {
                return self.soft_break(items, at, deferred);
            }
        }
        let end = Cursor::at(items.len());
        LineBreak {
            end,
            next: end,
            forced: false,
            deferred,
        }
    }

    /// The pieces of the line from `start` to `end`, with trailing
    /// collapsible spaces removed.
    ///
    /// "If a space (U+0020) at the end of a line has 'white-space' set to
    /// 'normal', 'nowrap', or 'pre-line', it is also removed."
    fn line_segments(&self, items: &[Item], start: Cursor, end: Cursor) -> Vec<Segment> {
        let mut segments = Vec::new();
        for (index, &item) in items.iter().enumerate().skip(start.index) {
            if index > end.index || (index == end.index && !matches!(item, Item::Text(_))) {
                break;
            }
            let from = if index == start.index { start.offset } else { 0 };
            match item {
                Item::Text(object) => {
                    let to = if index == end.index {
                        end.offset
                    } else {
                        self[object].rendered_len()
                    };
                    if to > from {
                        segments.push(Segment::Text { object, start: from, end: to });
                    }
                }
                Item::Enter(o) => segments.push(Segment::Enter(o)),
                Item::Exit(o) => segments.push(Segment::Exit(o)),
                Item::Leaf(o) => segments.push(Segment::Leaf(o)),
                Item::Positioned(o) => segments.push(Segment::Positioned(o)),
                Item::Float(_) => {}
            }
        }

        // Trim backwards through element boundaries.
        for segment in segments.iter_mut().rev() {
            match segment {
                Segment::Enter(_) | Segment::Exit(_) | Segment::Positioned(_) => {}
                Segment::Text { object, start, end } => {
                    if self[*object].style.white_space.preserves_spaces() {
                        break;
                    }
                    let chars = self.rendered_chars(*object);
                    while *end > *start && chars.get(*end - 1) == Some(&' ') {
                        *end -= 1;
                    }
                    if *end > *start {
                        break;
                    }
                }
                Segment::Leaf(_) => break,
            }
        }
        segments.retain(|s| !matches!(s, Segment::Text { start, end, .. } if start >= end));
        segments
    }

    /// Whether a line made of `segments` shows anything.
    fn has_content(&self, segments: &[Segment]) -> bool {
        segments.iter().any(|s| match *s {
            Segment::Text { .. } | Segment::Leaf(_) => true,
            Segment::Enter(o) => self[o].first_child.is_none(),
            Segment::Exit(_) | Segment::Positioned(_) => false,
        })
    }

    /// Bidi levels of the line, cut into runs of one level each, plus the
    /// bidi state at its end.
    ///
    /// [§ 9.10](https://www.w3.org/TR/CSS2/visuren.html#direction)
    ///
    /// "For the purposes of the bidirectional algorithm, inline-level
    /// replaced elements are treated as neutral characters, unless their
    /// 'unicode-bidi' property is set to 'embed' or 'bidi-override'."
    fn resolve_runs(&self, block: RenderId, segments: &[Segment], base: Direction) -> (Vec<Run>, BidiStatus) {
        let mut text = Vec::new();
        // Embeddings opened on earlier lines, outermost first.
        if let Some(first) = segments.first() {
            let open: Vec<RenderId> = self
                .ancestors(first.object())
                .take_while(|&a| a != block)
                .collect();
            for &a in open.iter().rev() {
                if let Some(c) = bidi::embedding_open(&self[a].style) {
                    text.push(c);
                }
            }
        }
        let prefix = text.len();
        for segment in segments {
            match *segment {
                Segment::Enter(o) => {
                    if let Some(c) = bidi::embedding_open(&self[o].style) {
                        text.push(c);
                    }
                }
                Segment::Exit(o) => {
                    if bidi::embedding_open(&self[o].style).is_some() {
                        text.push(PDF);
                    }
                }
                Segment::Text { object, start, end } => {
                    text.extend_from_slice(self.rendered_chars(object).get(start..end).unwrap_or_default());
                }
                Segment::Leaf(_) => text.push(OBJECT_REPLACEMENT),
                Segment::Positioned(_) => {}
            }
        }
        let levels = bidi::resolve_levels(&text, base);
        let status = bidi::line_status(&text, &levels);

        let base_level = u8::from(!base.is_ltr());
        let level_at = |pos: usize| levels.get(pos).copied().unwrap_or(base_level);
        let mut runs = Vec::new();
        let mut pos = prefix;
        let mut level = base_level;
        for segment in segments {
            match *segment {
                Segment::Enter(o) => {
                    if bidi::embedding_open(&self[o].style).is_some() {
                        pos += 1;
                    }
                    if self[o].first_child.is_none() {
                        runs.push(Run {
                            kind: RunKind::EmptyFlow(o),
                            level,
                        });
                    }
                }
                Segment::Exit(o) => {
                    if bidi::embedding_open(&self[o].style).is_some() {
                        pos += 1;
                    }
                }
                Segment::Text { object, start, end } => {
                    let mut from = start;
                    while from < end {
                        level = level_at(pos);
                        let mut to = from + 1;
                        while to < end && level_at(pos + to - from) == level {
                            to += 1;
                        }
                        runs.push(Run {
                            kind: RunKind::Text { object, start: from, end: to },
                            level,
                        });
                        pos += to - from;
                        from = to;
                    }
                }
                Segment::Leaf(o) => {
                    level = level_at(pos);
                    pos += 1;
                    runs.push(Run {
                        kind: RunKind::Leaf(o),
                        level,
                    });
                }
                // Takes the level of the content before it.
                Segment::Positioned(o) => runs.push(Run {
                    kind: RunKind::Leaf(o),
                    level,
                }),
            }
        }
        (runs, status)
    }

    /// The flow box `object`'s box goes into on the line being built,
    /// creating flow boxes for its inline ancestors as needed.
    ///
    /// A flow box is reused only while it is the rightmost box of the line
    /// so far; reordered runs split an inline into several boxes.
    fn parent_flow_box(
        &mut self,
        block: RenderId,
        root: BoxId,
        object: RenderId,
        level: u8,
        flows: &mut Vec<(RenderId, BoxId)>,
    ) -> BoxId {
        let Some(parent) = self[object].parent else {
            return root;
        };
        if parent == block || !self[parent].is_inline_flow() {
            return root;
        }
        if let Some(&(_, b)) = flows.iter().rev().find(|(o, _)| *o == parent) {
            if !self.next_on_line_exists(b) {
                return b;
            }
        }
        let grand = self.parent_flow_box(block, root, parent, level, flows);
        let b = self.create_inline_box(parent, BoxKind::Flow(FlowChildren::default()));
        self[b].bidi_level = level;
        self.add_to_line(grand, b);
        flows.push((parent, b));
        b
    }

    /// The object the line ends at, when the break falls at the very start
    /// of one; used to decide whether inlines close on this line.
    fn line_end_object(&self, items: &[Item], end: Cursor) -> Option<RenderId> {
        let mut cursor = end;
        if let Some(&Item::Text(o)) = items.get(cursor.index) {
            if cursor.offset >= self[o].rendered_len() {
                cursor = Cursor::at(cursor.index + 1);
            }
        }
        if cursor.offset != 0 {
            return None;
        }
        items
            .get(cursor.index..)
            .unwrap_or_default()
            .iter()
            .find(|i| i.is_content())
            .map(|i| i.object())
    }

    /// Embedding context of the inlines still open where the next line
    /// starts.
    fn break_context(&self, block: RenderId, items: &[Item], next: Cursor, base: Direction) -> Rc<BidiContext> {
        let open: Vec<Rc<RenderStyle>> = items
            .get(next.index)
            .map(|item| {
                let mut chain: Vec<Rc<RenderStyle>> = self
                    .ancestors(item.object())
                    .take_while(|&a| a != block)
                    .map(|a| Rc::clone(&self[a].style))
                    .collect();
                chain.reverse();
                chain
            })
            .unwrap_or_default();
        bidi::context_for(base, &open)
    }

    /// Build the line from `start` to `brk` with its top at `line_top`, and
    /// return the block height below it. A line with nothing to show gets no
    /// boxes; positioned objects on it still learn their static position.
    fn construct_line(
        &mut self,
        block: RenderId,
        items: &[Item],
        start: Cursor,
        brk: &LineBreak,
        line_top: i32,
        floats: &FloatContext,
    ) -> i32 {
        let segments = self.line_segments(items, start, brk.end);
        let base = self[block].style.direction;
        let ltr = base.is_ltr();
        let bp = self[block].border_and_padding();
        let line_height = self.line_height(block, true);
        let (float_left, available) = floats.available_width_at(line_top, line_height);

        if !self.has_content(&segments) {
            let x = if ltr {
                bp.left + float_left
            } else {
                bp.left + float_left + available
            };
            for segment in &segments {
                if let Segment::Positioned(o) = *segment {
                    let object = &mut self[o];
                    object.static_x = x;
                    object.static_y = line_top;
                }
            }
            return line_top;
        }

        // STEP 1: Resolve bidi levels.
        let (runs, status) = self.resolve_runs(block, &segments, base);

        // STEP 2: Create boxes in visual order.
        let root = self.create_inline_box(block, BoxKind::Root(FlowChildren::default(), Box::default()));
        let levels: Vec<u8> = runs.iter().map(|r| r.level).collect();
        let mut flows: Vec<(RenderId, BoxId)> = Vec::new();
        for index in bidi::visual_order(&levels) {
            let Some(&run) = runs.get(index) else {
                continue;
            };
            let (object, kind, width) = match run.kind {
                RunKind::Text { object, start, end } => {
                    let size = self[object].style.font_size;
                    let chars = self.rendered_chars(object).get(start..end).unwrap_or_default();
                    let width = self.metrics().text_width(chars, size);
                    let run = TextRun {
                        start,
                        len: end - start,
                        truncation: Truncation::None,
                    };
                    (object, BoxKind::Text(run), width)
                }
                RunKind::Leaf(o) => {
                    let width = if self[o].is_positioned() { 0 } else { self[o].width };
                    (o, BoxKind::Leaf, width)
                }
                RunKind::EmptyFlow(o) => (o, BoxKind::Flow(FlowChildren::default()), 0),
            };
            let parent = self.parent_flow_box(block, root, object, run.level, &mut flows);
            let is_text = matches!(kind, BoxKind::Text(_));
            let b = self.create_inline_box(object, kind);
            {
                let ib = &mut self[b];
                ib.width = width;
                ib.bidi_level = run.level;
                ib.flags.set(BoxFlags::REVERSED, is_text && run.level % 2 == 1);
            }
            self.add_to_line(parent, b);
            if let RunKind::EmptyFlow(o) = run.kind {
                flows.push((o, b));
            }
        }
        if self[root].prev_line_box.is_none() {
            self[root].flags.insert(BoxFlags::FIRST_LINE);
        }

        // STEP 3: Decide which inline edges fall on this line.
        let last_line = brk.next.index >= items.len();
        let end_object = self.line_end_object(items, brk.end);
        self.determine_spacing_for_flow_boxes(root, last_line, end_object);

        // STEP 4: Place horizontally.
        //
        // [§ 16.2 Alignment: the 'text-align' property](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
        let line_width = self.place_boxes_horizontally(root, 0);
        let free = available - line_width;
        let align = match self[block].style.text_align {
            TextAlign::Start | TextAlign::Justify if ltr => TextAlign::Left,
            TextAlign::Start | TextAlign::Justify => TextAlign::Right,
            other => other,
        };
        let shift = match align {
            // Overflowing right-to-left lines stay anchored on the right.
            TextAlign::Right if ltr => free.max(0),
            TextAlign::Right => free,
            TextAlign::Center => (free / 2).max(0),
            _ => 0,
        };
        let _ = self.place_boxes_horizontally(root, bp.left + float_left + shift);

        // STEP 5: Place vertically.
        let height = self.vertically_align_boxes(root, line_top);
        self.place_line_objects(root, line_top);

        // STEP 6: Truncate.
        self.apply_ellipsis(block, root);

        // STEP 7: Remember where the next line starts.
        let (break_object, break_pos) = match items.get(brk.next.index) {
            Some(item) => (Some(item.object()), brk.next.offset),
            None => (None, 0),
        };
        let context = self.break_context(block, items, brk.next, base);
        self.set_line_break_info(root, break_object, break_pos, status, Some(context));
        if let Some(info) = self[root].line_info_mut() {
            info.block_height = height;
        }
        if brk.forced {
            self[root].flags.insert(BoxFlags::ENDS_WITH_BREAK);
        }
        self.mark_line_constructed(root);

        #[cfg(feature = "layout-trace")]
        log::trace!("[LINE] {block:?}: line at {line_top}, width {line_width}, bottom {height}");

        height
    }

    /// Move atomic content to its box, and give positioned placeholders
    /// their static position.
    fn place_line_objects(&mut self, flow: BoxId, line_top: i32) {
        let children: Vec<BoxId> = self.line_children(flow).collect();
        for child in children {
            if self[child].is_flow() {
                self.place_line_objects(child, line_top);
                continue;
            }
            if !matches!(self[child].kind, BoxKind::Leaf) {
                continue;
            }
            let object = self[child].object;
            let (x, y) = (self[child].x, self[child].y);
            if self[object].is_positioned() {
                let o = &mut self[object];
                o.static_x = x;
                o.static_y = line_top;
            } else if self[object].is_replaced() {
                let (dx, dy) = self.relative_offset(object);
                let o = &mut self[object];
                o.static_x = x;
                o.static_y = y;
                o.x = x + dx;
                o.y = y + dy;
            }
        }
    }

    /// [CSS Overflow 3 § 4.1 'text-overflow'](https://www.w3.org/TR/css-overflow-3/#text-overflow)
    ///
    /// "This property specifies rendering when inline content overflows its
    /// end line box edge in the inline progression direction of its block
    /// container element that has 'overflow' other than 'visible'."
    fn apply_ellipsis(&mut self, block: RenderId, root: BoxId) {
        let object = &self[block];
        if object.style.text_overflow != TextOverflow::Ellipsis || !object.has_overflow_clip() {
            return;
        }
        let ltr = object.style.direction.is_ltr();
        let bp = object.border_and_padding();
        let content_right = object.width - bp.right;
        let size = object.style.font_size;
        self.clear_truncation(root);

        let (x, width) = (self[root].x, self[root].width);
        let (block_edge, line_edge) = if ltr {
            (content_right, x + width)
        } else {
            (bp.left, x)
        };
        let overflows = if ltr {
            line_edge > block_edge
        } else {
            line_edge < block_edge
        };
        if !overflows {
            return;
        }
        let ellipsis = self.settings().ellipsis.clone();
        let chars: Vec<char> = ellipsis.chars().collect();
        let ellipsis_width = self.metrics().text_width(&chars, size);
        if self.can_accommodate_ellipsis(root, ltr, block_edge, line_edge, ellipsis_width) {
            self.place_ellipsis(root, &ellipsis, ltr, block_edge, ellipsis_width);
        }
    }

    /// Build lines from `start` until the content runs out, and return the
    /// block height below the last one.
    ///
    /// `reuse` holds the first of a chain of extracted clean lines and the
    /// top it had. When a new line would start where it starts, the chain is
    /// reattached, shifted to follow, and building stops.
    fn build_lines(
        &mut self,
        block: RenderId,
        items: &[Item],
        start: Cursor,
        top: i32,
        floats: &mut FloatContext,
        reuse: Option<(BoxId, i32)>,
    ) -> i32 {
        let mut cursor = start;
        let mut height = top;
        while cursor.index < items.len() {
            if let Some((line, old_top)) = reuse {
                if self.line_starts_at(line, items, cursor) {
                    return self.reattach_lines(line, height - old_top);
                }
            }
            let brk = self.find_line_end(block, items, cursor, height, floats);
            height = self.construct_line(block, items, cursor, &brk, height, floats);
            for &float in &brk.deferred {
                self.position_float(block, float, floats, height);
            }
            if brk.next <= cursor {
                break;
            }
            cursor = brk.next;
        }
        if let Some((line, _)) = reuse {
            self.delete_line_chain(line);
        }
        height
    }

    /// Whether the extracted line `line` starts at `cursor`.
    fn line_starts_at(&self, line: BoxId, items: &[Item], cursor: Cursor) -> bool {
        let Some(item) = items.get(cursor.index) else {
            return false;
        };
        let Some(leaf) = self.first_leaf_child(line) else {
            return false;
        };
        let b = &self[leaf];
        if b.object != item.object() {
            return false;
        }
        match b.text_run() {
            Some(run) => run.start == cursor.offset,
            None => cursor.offset == 0,
        }
    }

    fn reattach_lines(&mut self, line: BoxId, dy: i32) -> i32 {
        self.attach_line(line);
        if self[line].prev_line_box.is_none() {
            self[line].flags.insert(BoxFlags::FIRST_LINE);
        }
        let mut bottom = 0;
        let mut current = Some(line);
        while let Some(root) = current {
            if dy != 0 {
                self.adjust_position(root, 0, dy);
            }
            bottom = self[root].line_info().map_or(bottom, |i| i.block_height);
            current = self.next_root_box(root);
        }

        #[cfg(feature = "layout-trace")]
        log::trace!("[INLINE] reattached clean lines from {line:?}, shifted by {dy}");

        bottom
    }

    fn delete_line_chain(&mut self, first: BoxId) {
        let mut roots = Vec::new();
        let mut current = Some(first);
        while let Some(root) = current {
            roots.push(root);
            current = self[root].next_line_box;
        }
        for root in roots {
            self.delete_line(root);
        }
    }

    fn delete_lines(&mut self, block: RenderId) {
        let roots: Vec<BoxId> = self.line_boxes(block).collect();
        for root in roots {
            self.delete_line(root);
        }
    }

    /// Rebuild only the dirty lines of `block`. Returns `None` when the
    /// lines cannot be resumed and the caller must rebuild them all.
    fn relayout_dirty_lines(
        &mut self,
        block: RenderId,
        items: &[Item],
        top: i32,
        floats: &mut FloatContext,
    ) -> Option<i32> {
        let roots: Vec<BoxId> = self.line_boxes(block).collect();
        let Some(first_dirty) = roots.iter().position(|&r| self[r].is_dirty()) else {
            let bottom = roots
                .last()
                .and_then(|&r| self[r].line_info())
                .map_or(top, |i| i.block_height);
            return Some(bottom);
        };
        let last_dirty = roots.iter().rposition(|&r| self[r].is_dirty()).unwrap_or(first_dirty);

        // STEP 1: Resume where the last clean line before the dirty range
        // broke.
        let (start, line_top) = match first_dirty.checked_sub(1).and_then(|i| roots.get(i)) {
            None => (self.skip_leading(items, Cursor::default()), top),
            Some(&prev) => {
                let info = self[prev].line_info()?;
                let object = info.line_break_obj?;
                let pos = info.line_break_pos;
                let line_top = info.block_height;
                let index = items.iter().position(|i| i.is_content() && i.object() == object)?;
                if self[object].is_text() && pos > self[object].rendered_len() {
                    return None;
                }
                (self.skip_leading(items, Cursor { index, offset: pos }), line_top)
            }
        };

        // STEP 2: Set aside the clean lines after the dirty range.
        let reuse = roots.get(last_dirty + 1).map(|&line| {
            let old_top = roots
                .get(last_dirty)
                .and_then(|&r| self[r].line_info())
                .map_or(0, |i| i.block_height);
            (line, old_top)
        });
        if let Some((line, _)) = reuse {
            self.extract_line(line);
        }

        // STEP 3: Drop the dirty lines and rebuild.
        for &root in roots.get(first_dirty..=last_dirty).unwrap_or_default() {
            self.delete_line(root);
        }

        #[cfg(feature = "layout-trace")]
        log::trace!(
            "[INLINE] {block:?}: relayout lines {first_dirty}..={last_dirty} of {}",
            roots.len()
        );

        Some(self.build_lines(block, items, start, line_top, floats, reuse))
    }
}

/// Offsets inside `chars` after which a line may wrap, ascending.
///
/// [UAX #14 Unicode Line Breaking Algorithm](https://www.unicode.org/reports/tr14/)
///
/// The end of the text is left out: whether a line may wrap between two
/// pieces of text is decided where the next one starts.
pub(super) fn soft_break_offsets(chars: &[char]) -> Vec<usize> {
    let text: String = chars.iter().collect();
    let starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    linebreaks(&text)
        .filter(|&(b, op)| matches!(op, BreakOpportunity::Allowed) && b < text.len())
        .filter_map(|(b, _)| starts.binary_search(&b).ok())
        .collect()
}
