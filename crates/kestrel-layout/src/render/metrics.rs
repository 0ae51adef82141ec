//! Line-height, baseline and vertical-align metrics, and conversion of
//! object geometry to document coordinates.
//!
//! [§ 10.8 Line height calculations: the 'line-height' and 'vertical-align' properties](https://www.w3.org/TR/CSS2/visudet.html#line-height)

use super::object::RenderId;
use super::tree::RenderTree;
use crate::geometry::Rect;
use crate::line::{POSITION_BOTTOM, POSITION_TOP};
use crate::style::{LineHeight, VerticalAlign};

impl RenderTree {
    /// Used line height of `id`.
    ///
    /// Atomic inline content is as tall as its margin box. `as_root` asks
    /// for the value an inline-block uses for its own lines, which follows
    /// its font like any other block.
    #[must_use]
    pub fn line_height(&self, id: RenderId, as_root: bool) -> i32 {
        let object = &self[id];
        if object.is_replaced() && !as_root {
            return object.height + object.margin.vertical();
        }
        let style = &object.style;
        match style.line_height {
            // "Tells user agents to set the used value to a 'reasonable'
            // value based on the font of the element."
            LineHeight::Normal => self.metrics().line_spacing(style.font_size),
            LineHeight::Px(px) => px,
            LineHeight::Percent(p) => style.font_size * p / 100,
        }
    }

    /// Distance from the top of the line-height box of `id` to its
    /// baseline.
    ///
    /// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// "The baseline of an 'inline-block' is the baseline of its last line
    /// box in the normal flow, unless it has either no in-flow line boxes
    /// or if its 'overflow' property has a computed value other than
    /// 'visible', in which case the baseline is the bottom margin edge."
    #[must_use]
    pub fn baseline_position(&self, id: RenderId, as_root: bool) -> i32 {
        let object = &self[id];
        if object.is_replaced() && !as_root {
            if object.is_block_flow() && object.children_inline() && !object.has_overflow_clip() {
                if let Some(last) = object.last_line_box {
                    return self[last].y + self[last].baseline + object.margin.top;
                }
            }
            return object.height + object.margin.vertical();
        }
        let fm = self.metrics();
        let size = object.style.font_size;
        fm.ascent(size) + (self.line_height(id, as_root) - fm.height(size)) / 2
    }

    /// Offset of the baseline of `id` from its parent's baseline, positive
    /// downward, or one of the line-relative sentinels
    /// [`POSITION_TOP`] and [`POSITION_BOTTOM`].
    ///
    /// Text sits on its parent's baseline.
    #[must_use]
    pub fn vertical_position_hint(&self, id: RenderId) -> i32 {
        let object = &self[id];
        if object.is_text() {
            return object.parent.map_or(0, |p| self.vertical_position_hint(p));
        }
        if object.is_table_cell() || !object.is_inline() {
            return 0;
        }
        let va = object.style.vertical_align;
        match va {
            VerticalAlign::Top => return POSITION_TOP,
            VerticalAlign::Bottom => return POSITION_BOTTOM,
            _ => {}
        }
        let Some(parent) = object.parent else {
            return 0;
        };
        let p = &self[parent];
        let check_parent = p.is_inline()
            && !p.is_replaced()
            && !matches!(p.style.vertical_align, VerticalAlign::Top | VerticalAlign::Bottom);
        let mut vpos = if check_parent {
            self.vertical_position_hint(parent)
        } else {
            0
        };
        let fm = self.metrics();
        let parent_size = p.style.font_size;
        match va {
            VerticalAlign::Baseline | VerticalAlign::Top | VerticalAlign::Bottom => {}
            VerticalAlign::Length(px) => vpos -= px,
            VerticalAlign::Sub => vpos += parent_size / 5 + 1,
            VerticalAlign::Super => vpos -= parent_size / 3 + 1,
            VerticalAlign::TextTop => {
                vpos += self.baseline_position(id, false) - (fm.ascent(parent_size) + fm.leading(parent_size) / 2);
            }
            VerticalAlign::Middle => {
                vpos += -fm.x_height(parent_size) / 2 - self.line_height(id, false) / 2
                    + self.baseline_position(id, false);
            }
            VerticalAlign::TextBottom => {
                vpos += fm.descent(parent_size) + fm.leading(parent_size) / 2;
                if !object.is_replaced() {
                    vpos -= self.line_height(id, false) - self.baseline_position(id, false);
                }
            }
        }
        vpos
    }

    /// Position of the border box of `id` in document coordinates.
    ///
    /// Every object's `x`/`y` is relative to its [`container`](Self::container),
    /// so the offsets are summed up that chain. Inline flows and text
    /// contribute only their relative offsets.
    #[must_use]
    pub fn absolute_position(&self, id: RenderId) -> (i32, i32) {
        let mut x = 0;
        let mut y = 0;
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(object) = self.get(c) else {
                break;
            };
            x += object.x;
            y += object.y;
            current = self.container(c);
        }
        (x, y)
    }

    /// Everything `id` paints, in document coordinates.
    #[must_use]
    pub fn absolute_bounding_box(&self, id: RenderId) -> Rect {
        let object = &self[id];
        let (ax, ay) = self.absolute_position(id);
        if object.is_text() || object.is_inline_flow() {
            return self
                .line_boxes(id)
                .map(|b| {
                    let b = &self[b];
                    Rect::new(b.x, b.y, b.width, b.height)
                })
                .fold(Rect::ZERO, |acc, r| acc.unite(&r))
                .translate(ax, ay);
        }
        let own = Rect::new(ax, ay, object.width, object.height);
        own.unite(&object.overflow.translate(ax, ay))
    }
}
