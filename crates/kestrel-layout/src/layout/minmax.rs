//! Intrinsic minimum and maximum widths.
//!
//! [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
//!
//! "Calculate the preferred width by formatting the content without
//! breaking lines other than where explicit line breaks occur, and also
//! calculate the preferred minimum width, e.g., by trying all possible line
//! breaks."
//!
//! Both values are border-box widths. They are cached on the object and
//! recomputed only while `MIN_MAX_DIRTY` is set.

use super::inline::soft_break_offsets;
use crate::render::{RenderFlags, RenderId, RenderKind, RenderTree};
use crate::style::Length;

/// Widths of a run of text, split at forced breaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TextWidths {
    /// Widest unbreakable piece.
    min: i32,
    /// Width up to the first forced break.
    first_line: i32,
    /// Width after the last forced break.
    last_line: i32,
    /// Widest line between two forced breaks.
    widest_inner: i32,
    /// Whether the text holds a forced break at all.
    has_break: bool,
}

/// Running state of an inline formatting context.
#[derive(Debug, Default)]
struct InlineWidths {
    min: i32,
    max: i32,
    line: i32,
}

impl InlineWidths {
    fn add(&mut self, width: i32) {
        self.line += width;
    }

    fn break_line(&mut self) {
        self.max = self.max.max(self.line);
        self.line = 0;
    }

    fn finish(mut self) -> (i32, i32) {
        self.break_line();
        (self.min, self.max)
    }
}

impl RenderTree {
    /// `(min, max)` border-box widths of `id`.
    pub(crate) fn min_max_widths(&mut self, id: RenderId) -> (i32, i32) {
        if !self[id].flags.contains(RenderFlags::MIN_MAX_DIRTY) {
            let object = &self[id];
            return (object.min_width, object.max_width);
        }
        let (min, max) = self.compute_min_max_widths(id);
        let object = &mut self[id];
        object.min_width = min;
        object.max_width = max.max(min);
        self.set_min_max_known(id, true);
        (min, max.max(min))
    }

    fn compute_min_max_widths(&mut self, id: RenderId) -> (i32, i32) {
        let (bp, fixed_width, children_inline) = {
            let object = &self[id];
            let style = &object.style;
            let bp = style.border.horizontal() + style.padding_widths(0).horizontal();
            let fixed = match style.width {
                Length::Px(w) if object.is_box() && !object.is_br() => Some(w),
                _ => None,
            };
            (bp, fixed, object.children_inline())
        };

        // A fixed width is its own intrinsic width.
        if let Some(w) = fixed_width {
            let children: Vec<RenderId> = self.children(id).collect();
            for child in children {
                let _ = self.min_max_widths(child);
            }
            return (w + bp, w + bp);
        }
        if let RenderKind::Replaced { intrinsic_width, .. } = self[id].kind {
            return (intrinsic_width + bp, intrinsic_width + bp);
        }
        let object = &self[id];
        if object.is_text() {
            let t = self.text_widths(id);
            return (t.min, t.first_line.max(t.last_line).max(t.widest_inner));
        }
        if object.is_br() || matches!(object.kind, RenderKind::TableColumn) {
            return (0, 0);
        }

        let mut widths = InlineWidths::default();
        if object.is_inline_flow() {
            self.inline_min_max(id, &mut widths);
            return widths.finish();
        }
        let children: Vec<RenderId> = self.children(id).collect();
        if children_inline {
            for child in children {
                self.inline_item_min_max(child, &mut widths);
            }
            let (min, max) = widths.finish();
            return (min + bp, max + bp);
        }

        let mut min = 0;
        let mut max = 0;
        for child in children {
            let (child_min, child_max) = self.min_max_widths(child);
            if self[child].is_positioned() {
                continue;
            }
            let margins = self.fixed_horizontal_margins(child);
            min = min.max(child_min + margins);
            max = max.max(child_max + margins);
        }
        (min + bp, max + bp)
    }

    /// Margins that do not depend on the containing block.
    fn fixed_horizontal_margins(&self, id: RenderId) -> i32 {
        let margin = &self[id].style.margin;
        let fixed = |l: Length| match l {
            Length::Px(px) => px,
            Length::Auto | Length::Percent(_) => 0,
        };
        fixed(margin.left) + fixed(margin.right)
    }

    /// Feed the children of an inline flow into `widths`, with the flow's
    /// own margins, borders and padding around them.
    fn inline_min_max(&mut self, id: RenderId, widths: &mut InlineWidths) {
        let style = std::rc::Rc::clone(&self[id].style);
        let fixed = |l: Length| match l {
            Length::Px(px) => px,
            Length::Auto | Length::Percent(_) => 0,
        };
        let padding = style.padding_widths(0);
        widths.add(fixed(style.margin.left) + style.border.left + padding.left);
        let children: Vec<RenderId> = self.children(id).collect();
        for child in children {
            self.inline_item_min_max(child, widths);
        }
        widths.add(fixed(style.margin.right) + style.border.right + padding.right);
    }

    fn inline_item_min_max(&mut self, id: RenderId, widths: &mut InlineWidths) {
        let (min, max) = self.min_max_widths(id);
        let object = &self[id];
        if object.is_positioned() {
            return;
        }
        if object.is_text() {
            let t = self.text_widths(id);
            widths.min = widths.min.max(t.min);
            widths.add(t.first_line);
            if t.has_break {
                widths.break_line();
                widths.max = widths.max.max(t.widest_inner);
                widths.add(t.last_line);
            }
        } else if object.is_br() {
            widths.break_line();
        } else if object.is_inline_flow() {
            widths.min = widths.min.max(min);
            self.inline_min_max(id, widths);
        } else {
            let margins = self.fixed_horizontal_margins(id);
            widths.min = widths.min.max(min + margins);
            widths.add(max + margins);
        }
    }

    fn text_widths(&self, id: RenderId) -> TextWidths {
        let object = &self[id];
        let Some(text) = object.text() else {
            return TextWidths::default();
        };
        let white_space = object.style.white_space;
        let size = object.style.font_size;
        let fm = self.metrics();
        let mut widths = TextWidths::default();

        let lines: Vec<&[char]> = if white_space.preserves_spaces() {
            text.rendered.split(|&c| c == '\n').collect()
        } else {
            vec![text.rendered.as_slice()]
        };
        let count = lines.len();
        for (i, line) in lines.into_iter().enumerate() {
            let width = fm.text_width(line, size);
            if white_space.allows_wrap() {
                let mut start = 0;
                for end in soft_break_offsets(line).into_iter().chain([line.len()]) {
                    let mut piece = &line[start..end];
                    while let [rest @ .., ' '] = piece {
                        piece = rest;
                    }
                    widths.min = widths.min.max(fm.text_width(piece, size));
                    start = end;
                }
            } else {
                widths.min = widths.min.max(width);
            }
            if i == 0 {
                widths.first_line = width;
            }
            if i + 1 == count {
                widths.last_line = width;
            }
            if i > 0 && i + 1 < count {
                widths.widest_inner = widths.widest_inner.max(width);
            }
        }
        widths.has_break = count > 1;
        widths
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::render::{RenderKind, RenderTree, TextData};
    use crate::settings::LayoutSettings;
    use crate::style::{Display, RenderStyle, WhiteSpace};

    #[test]
    fn test_text_min_is_widest_word() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let canvas = tree.canvas();
        let text = tree.create_object(
            RenderKind::Text(TextData::new("ab abcd a", false)),
            Rc::new(RenderStyle::default()),
            None,
        );
        tree.append_child(canvas, text);
        assert_eq!(tree.min_max_widths(text), (40, 90));
    }

    #[test]
    fn test_text_min_breaks_after_hyphen() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let canvas = tree.canvas();
        let text = tree.create_object(
            RenderKind::Text(TextData::new("ab-cd abc", false)),
            Rc::new(RenderStyle::default()),
            None,
        );
        tree.append_child(canvas, text);
        assert_eq!(tree.min_max_widths(text), (30, 90));
    }

    #[test]
    fn test_preformatted_text_breaks_at_newlines() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let canvas = tree.canvas();
        let mut style = RenderStyle::default();
        style.white_space = WhiteSpace::Pre;
        let text = tree.create_object(RenderKind::Text(TextData::new("abc\nabcdef\nab", true)), Rc::new(style), None);
        tree.append_child(canvas, text);
        assert_eq!(tree.min_max_widths(text), (60, 60));
    }

    #[test]
    fn test_block_takes_widest_child_plus_border() {
        let mut tree = RenderTree::new(LayoutSettings::default());
        let canvas = tree.canvas();
        let mut outer_style = RenderStyle::default().with_display(Display::Block);
        outer_style.border.left = 5;
        outer_style.border.right = 5;
        let outer = tree.create_object(RenderKind::Block, Rc::new(outer_style), None);
        let inner = tree.create_object(
            RenderKind::Replaced {
                intrinsic_width: 120,
                intrinsic_height: 10,
            },
            Rc::new(RenderStyle::default().with_display(Display::Block)),
            None,
        );
        tree.append_child(canvas, outer);
        tree.append_child(outer, inner);
        assert_eq!(tree.min_max_widths(outer), (130, 130));
    }
}
