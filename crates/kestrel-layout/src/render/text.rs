//! Text renderers: DOM/rendered offset conversion and caret geometry.
//!
//! A text renderer keeps two strings. The DOM string is what the node
//! holds; the rendered string has white space collapsed and is what the
//! line boxes index into. Callers outside layout speak DOM offsets, so
//! every query converts at the edge.

use super::object::RenderId;
use super::tree::RenderTree;
use crate::geometry::Rect;
use crate::line::{BoxId, TextRun};

/// Walk the DOM and rendered strings in step, pairing white space that
/// survived collapsing and skipping white space that did not.
fn convert(dom: &[char], rendered: &[char], target: usize, from_dom: bool) -> usize {
    let (mut i, mut j) = (0, 0);
    loop {
        let done = if from_dom {
            i >= target || j >= rendered.len()
        } else {
            i >= dom.len() || j >= target
        };
        if done {
            break;
        }
        let rendered_space = rendered.get(j).is_some_and(|c| c.is_whitespace());
        let dom_space = dom.get(i).is_some_and(|c| c.is_whitespace());
        match (rendered_space, dom_space) {
            (true, false) => j += 1,
            (false, true) => i += 1,
            _ => {
                i += 1;
                j += 1;
            }
        }
    }
    if from_dom { j } else { i }
}

impl RenderTree {
    /// Map a DOM offset of text renderer `id` to a rendered offset.
    ///
    /// Offsets inside a collapsed white-space run map to the single
    /// surviving space. Non-text renderers map to the same offset, line
    /// breaks to zero.
    #[must_use]
    pub fn convert_to_rendered_position(&self, id: RenderId, offset: usize) -> usize {
        let object = &self[id];
        if object.is_br() {
            return 0;
        }
        match object.text() {
            Some(text) if text.is_collapsed() => convert(&text.dom, &text.rendered, offset, true),
            _ => offset,
        }
    }

    /// Map a rendered offset of text renderer `id` back to a DOM offset.
    #[must_use]
    pub fn convert_to_dom_position(&self, id: RenderId, offset: usize) -> usize {
        let object = &self[id];
        if object.is_br() {
            return 0;
        }
        match object.text() {
            Some(text) if text.is_collapsed() => convert(&text.dom, &text.rendered, offset, false),
            _ => offset,
        }
    }

    /// The box showing rendered `offset` of `id`.
    ///
    /// For text, an offset inside unrendered content resolves to the box
    /// before it. Other objects answer with their placeholder.
    #[must_use]
    pub fn inline_box(&self, id: RenderId, offset: usize) -> Option<BoxId> {
        let object = self.get(id)?;
        if !object.is_text() {
            return object.placeholder_box;
        }
        let first = object.first_line_box?;
        for b in self.line_boxes(id) {
            let run = self[b].text_run()?;
            if offset >= run.start && offset <= run.end() {
                return Some(b);
            }
            if offset < run.start {
                return Some(self[b].prev_line_box.unwrap_or(first));
            }
        }
        None
    }

    /// The text box holding rendered `offset` and the offset within it.
    ///
    /// Offsets between boxes belong to the earlier one; offsets past the
    /// last box clamp to its end.
    pub(crate) fn find_inline_text_box(&self, id: RenderId, offset: usize) -> Option<(BoxId, usize)> {
        let mut b = self.get(id)?.first_line_box?;
        let mut end = self[b].text_run()?.len;
        while offset > end {
            let Some(next) = self[b].next_line_box else {
                break;
            };
            b = next;
            end = self[b].text_run()?.end();
        }
        let run = self[b].text_run()?;
        let pos = if offset >= run.start && offset < run.end() {
            offset - run.start
        } else if offset > end {
            run.len
        } else {
            run.len.saturating_sub(end - offset)
        };
        Some((b, pos))
    }

    /// Smallest rendered caret offset of `id`.
    #[must_use]
    pub fn caret_min_offset(&self, id: RenderId) -> usize {
        let Some(object) = self.get(id) else {
            return 0;
        };
        if !object.is_text() {
            return 0;
        }
        object
            .first_line_box
            .and_then(|b| self[b].text_run())
            .map_or(0, |run| run.start)
    }

    /// Largest rendered caret offset of `id`.
    ///
    /// Text without boxes answers with its full length. Atomic content and
    /// line breaks have a position before and after them.
    #[must_use]
    pub fn caret_max_offset(&self, id: RenderId) -> usize {
        let Some(object) = self.get(id) else {
            return 0;
        };
        if object.is_text() {
            return self
                .line_boxes(id)
                .filter_map(|b| self[b].text_run().map(TextRun::end))
                .max()
                .unwrap_or_else(|| object.rendered_len());
        }
        usize::from(object.is_replaced() || object.is_br())
    }

    /// Advance of the first `pos` characters of text box `id`.
    #[must_use]
    pub fn width_from_start(&self, id: BoxId, pos: usize) -> i32 {
        let b = &self[id];
        let Some(run) = b.text_run() else {
            return 0;
        };
        let object = &self[b.object];
        let Some(text) = object.text() else {
            return 0;
        };
        let end = (run.start + pos).min(run.end()).min(text.rendered.len());
        let start = run.start.min(end);
        self.metrics().text_width(&text.rendered[start..end], object.style.font_size)
    }

    /// The caret offset within text box `id` closest to `x`, in block
    /// coordinates. Each character is split at its midpoint.
    #[must_use]
    pub fn offset_for_position(&self, id: BoxId, x: i32) -> usize {
        let b = &self[id];
        let Some(run) = b.text_run() else {
            return 0;
        };
        let object = &self[b.object];
        let Some(text) = object.text() else {
            return 0;
        };
        let fm = self.metrics();
        let size = object.style.font_size;
        let chars = text.rendered.get(run.start..run.end()).unwrap_or_default();
        let mut pos = 0;
        if b.is_reversed() {
            let mut edge = b.x + b.width;
            for &c in chars {
                let w = fm.char_width(c, size);
                if x >= edge - w / 2 {
                    break;
                }
                pos += 1;
                edge -= w;
            }
        } else {
            let mut edge = b.x;
            for &c in chars {
                let w = fm.char_width(c, size);
                if x <= edge + w / 2 {
                    break;
                }
                pos += 1;
                edge += w;
            }
        }
        pos
    }

    /// Caret rectangle before rendered `offset` of `id`, in document
    /// coordinates.
    ///
    /// With `overwrite` the caret is as wide as the character it covers.
    /// Returns `None` when the object has no box to place the caret on.
    #[must_use]
    pub fn caret_pos(&self, id: RenderId, offset: usize, overwrite: bool) -> Option<Rect> {
        let object = self.get(id)?;
        let caret_width = self.settings().caret_width;
        let (ax, ay) = self.absolute_position(id);
        if let Some(text) = object.text() {
            let (b, pos) = self.find_inline_text_box(id, offset)?;
            let size = object.style.font_size;
            let fm = self.metrics();
            let tb = &self[b];
            let advance = self.width_from_start(b, pos);
            let x = if tb.is_reversed() {
                tb.x + tb.width - advance
            } else {
                tb.x + advance
            };
            let y = tb.y + tb.baseline - fm.ascent(size);
            let width = match text.rendered.get(offset) {
                Some(&c) if overwrite => fm.char_width(c, size),
                _ => caret_width,
            };
            return Some(Rect::new(x + ax, y + ay, width, fm.height(size)));
        }
        if object.is_br() {
            let b = &self[object.placeholder_box?];
            let size = object.style.font_size;
            let fm = self.metrics();
            let y = b.y + b.baseline - fm.ascent(size);
            return Some(Rect::new(b.x + ax, y + ay, caret_width, fm.height(size)));
        }
        if object.is_inline_flow() {
            let b = &self[object.first_line_box?];
            return Some(Rect::new(b.x + ax, b.y + ay, caret_width, b.height));
        }
        let x = if offset > 0 { ax + object.width } else { ax };
        let width = if overwrite { object.width } else { caret_width };
        Some(Rect::new(x, ay, width, object.height))
    }
}

#[cfg(test)]
mod tests {
    use super::convert;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_collapsed_run_maps_to_single_space() {
        let dom = chars("a   b");
        let rendered = chars("a b");
        assert_eq!(convert(&dom, &rendered, 1, true), 1);
        assert_eq!(convert(&dom, &rendered, 3, true), 2);
        assert_eq!(convert(&dom, &rendered, 4, true), 2);
        assert_eq!(convert(&dom, &rendered, 5, true), 3);
    }

    #[test]
    fn test_rendered_offsets_map_to_first_dom_match() {
        let dom = chars("a   b");
        let rendered = chars("a b");
        assert_eq!(convert(&dom, &rendered, 2, false), 2);
        assert_eq!(convert(&dom, &rendered, 3, false), 5);
    }
}
