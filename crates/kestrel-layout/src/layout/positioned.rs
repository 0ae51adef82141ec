//! Relative offsets and the absolute positioning equations.
//!
//! [§ 9.3 Positioning schemes](https://www.w3.org/TR/CSS2/visuren.html#positioning-scheme)
//!
//! "In the absolute positioning model, a box is removed from the normal flow
//! entirely (it has no impact on later siblings) and assigned a position
//! with respect to a containing block."
//!
//! Positioned objects are sized against the padding box of their containing
//! block and stored relative to their [`container`](RenderTree::container).
//! Both may differ: a positioned object inside a relatively positioned
//! inline is placed on the inline but sized by the inline's block.

use crate::render::{RenderId, RenderKind, RenderTree};
use crate::style::Length;

/// Used values of one axis of the positioning constraint, in the padding
/// box of the containing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Axis {
    /// Offset of the margin edge from the start of the containing block.
    start: i32,
    /// Content size.
    size: i32,
    /// Start-side margin.
    margin_start: i32,
    /// End-side margin.
    margin_end: i32,
}

/// Specified values of one axis.
#[derive(Debug, Clone, Copy)]
struct AxisInput {
    containing: i32,
    start: Option<i32>,
    end: Option<i32>,
    size: Option<i32>,
    margin_start: Option<i32>,
    margin_end: Option<i32>,
    border_padding: i32,
    /// Static position of the start margin edge.
    static_start: i32,
}

/// Solve "'left' + 'margin-left' + 'border-left-width' + 'padding-left' +
/// 'width' + 'padding-right' + 'border-right-width' + 'margin-right' +
/// 'right' = width of containing block" (and the vertical twin).
///
/// `shrink` answers the size to use when the size is auto and the equation
/// leaves it free, given the space available to it.
fn solve_axis(input: AxisInput, shrink: impl Fn(i32) -> i32) -> Axis {
    let AxisInput {
        containing,
        start,
        end,
        size,
        margin_start,
        margin_end,
        border_padding,
        static_start,
    } = input;

    // CASE 1: "If all three of 'left', 'width', and 'right' are 'auto':
    // First set any 'auto' values for 'margin-left' and 'margin-right' to
    // 0. Then, if the 'direction' property of the element establishing the
    // static-position containing block is 'ltr' set 'left' to the static
    // position."
    if start.is_none() && end.is_none() && size.is_none() {
        let ms = margin_start.unwrap_or(0);
        let me = margin_end.unwrap_or(0);
        let available = containing - static_start - ms - me - border_padding;
        return Axis {
            start: static_start,
            size: shrink(available).max(0),
            margin_start: ms,
            margin_end: me,
        };
    }

    // CASE 2: "If none of the three is 'auto': If both 'margin-left' and
    // 'margin-right' are 'auto', solve the equation under the extra
    // constraint that the two margins get equal values."
    if let (Some(s), Some(e), Some(w)) = (start, end, size) {
        let free = containing - s - e - w - border_padding;
        let (ms, me) = match (margin_start, margin_end) {
            (None, None) => {
                let half = free / 2;
                if half < 0 {
                    // "unless this would make them negative, in which case
                    // when direction of the containing block is 'ltr'
                    // ('rtl'), set 'margin-left' ('margin-right') to zero
                    // and solve for 'margin-right' ('margin-left')."
                    (0, free)
                } else {
                    (half, free - half)
                }
            }
            (None, Some(me)) => (free - me, me),
            (Some(ms), None) => (ms, free - ms),
            // "If the values are over-constrained, ignore the value for
            // 'left' (in case the 'direction' property of the containing
            // block is 'rtl') or 'right' (in case 'direction' is 'ltr')."
            (Some(ms), Some(me)) => (ms, me),
        };
        return Axis {
            start: s,
            size: w,
            margin_start: ms,
            margin_end: me,
        };
    }

    // CASE 3: "Otherwise, set 'auto' values for 'margin-left' and
    // 'margin-right' to 0, and pick the one of the following six rules that
    // applies."
    let ms = margin_start.unwrap_or(0);
    let me = margin_end.unwrap_or(0);
    let solve_start = |w: i32, e: i32| containing - e - me - w - border_padding - ms;
    let (s, w) = match (start, size, end) {
        // 1. "'left' and 'width' are 'auto' and 'right' is not 'auto', then
        // the width is shrink-to-fit. Then solve for 'left'."
        (None, None, Some(e)) => {
            let w = shrink(containing - e - ms - me - border_padding).max(0);
            (solve_start(w, e), w)
        }
        // 2. "'left' and 'right' are 'auto' and 'width' is not 'auto', then
        // if the 'direction' property of the element establishing the
        // static-position containing block is 'ltr' set 'left' to the static
        // position."
        (None, Some(w), None) => (static_start, w),
        // 3. "'width' and 'right' are 'auto' and 'left' is not 'auto', then
        // the width is shrink-to-fit. Then solve for 'right'."
        (Some(s), None, None) => (s, shrink(containing - s - ms - me - border_padding).max(0)),
        // 4. "'left' is 'auto', 'width' and 'right' are not 'auto', then
        // solve for 'left'."
        (None, Some(w), Some(e)) => (solve_start(w, e), w),
        // 5. "'width' is 'auto', 'left' and 'right' are not 'auto', then
        // solve for 'width'."
        (Some(s), None, Some(e)) => (s, (containing - s - e - ms - me - border_padding).max(0)),
        // 6. "'right' is 'auto', 'left' and 'width' are not 'auto', then
        // solve for 'right'."
        (Some(s), Some(w), None) => (s, w),
        (None, None, None) | (Some(_), Some(_), Some(_)) => (static_start, size.unwrap_or(0)),
    };
    Axis {
        start: s,
        size: w,
        margin_start: ms,
        margin_end: me,
    }
}

impl RenderTree {
    /// Offset applied to a relatively positioned object after normal flow.
    ///
    /// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
    ///
    /// "Once a box has been laid out according to the normal flow or
    /// floated, it may be shifted relative to this position."
    #[must_use]
    pub fn relative_offset(&self, id: RenderId) -> (i32, i32) {
        let Some(object) = self.get(id) else {
            return (0, 0);
        };
        if !object.is_rel_positioned() {
            return (0, 0);
        }
        let cb = self.containing_block(id);
        let cb_width = self.content_width(cb);
        let cb_object = &self[cb];
        let cb_height = (!cb_object.style.height.is_auto()).then_some(cb_object.content_height);
        let offsets = &object.style.offsets;

        // "If both 'left' and 'right' are 'auto' (their initial values), the
        // used values are '0'." "If neither 'left' nor 'right' is 'auto', the
        // position is over-constrained, and one of them has to be ignored.
        // If the 'direction' property of the containing block is 'ltr', the
        // value of 'left' wins and 'right' becomes -'left'."
        let left = offsets.left.resolve(cb_width);
        let right = offsets.right.resolve(cb_width);
        let dx = match (left, right) {
            (None, None) => 0,
            (Some(l), None) => l,
            (None, Some(r)) => -r,
            (Some(l), Some(r)) => {
                if cb_object.style.direction.is_ltr() {
                    l
                } else {
                    -r
                }
            }
        };

        // "If neither is 'auto', 'bottom' is ignored (i.e., the used value of
        // 'bottom' will be minus the value of 'top')."
        let vertical = |l: Length| match (l, cb_height) {
            (Length::Percent(_), None) => None,
            (l, h) => l.resolve(h.unwrap_or(0)),
        };
        let dy = match (vertical(offsets.top), vertical(offsets.bottom)) {
            (None, None) => 0,
            (Some(t), _) => t,
            (None, Some(b)) => -b,
        };
        (dx, dy)
    }

    /// Size of the padding box of the containing block of positioned `id`.
    /// The initial containing block has the dimensions of the viewport.
    fn positioned_containing_size(&self, cb: RenderId) -> (i32, i32) {
        let o = &self[cb];
        if o.is_canvas() {
            let settings = self.settings();
            return (settings.viewport_width, settings.viewport_height);
        }
        let border = o.border();
        ((o.width - border.horizontal()).max(0), (o.height - border.vertical()).max(0))
    }

    /// Translation from the padding box of `cb` to the coordinates of the
    /// container of `id`.
    fn padding_box_origin(&self, id: RenderId, cb: RenderId) -> (i32, i32) {
        let (cx, cy) = self.absolute_position(cb);
        let border = self[cb].border();
        let (ox, oy) = self
            .container(id)
            .map_or((0, 0), |c| self.absolute_position(c));
        (cx + border.left - ox, cy + border.top - oy)
    }

    /// Static position of `id` in the padding box of `cb`.
    fn static_position_in(&self, id: RenderId, cb: RenderId) -> (i32, i32) {
        let object = &self[id];
        let reference = match object.placeholder_box {
            Some(b) => Some(self[self.root_box(b)].object),
            None => object.parent,
        };
        let (rx, ry) = reference.map_or((0, 0), |r| self.absolute_position(r));
        let (cx, cy) = self.absolute_position(cb);
        let border = self[cb].border();
        (
            rx + object.static_x - cx - border.left,
            ry + object.static_y - cy - border.top,
        )
    }

    /// Used width, horizontal margins and x of an absolutely or fixed
    /// positioned object.
    ///
    /// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
    pub(crate) fn calc_positioned_width(&mut self, id: RenderId) {
        let cb = self.containing_block(id);
        let (cb_width, _) = self.positioned_containing_size(cb);
        let (static_x, _) = self.static_position_in(id, cb);
        let ltr = self[cb].style.direction.is_ltr();
        let intrinsic = match self[id].kind {
            RenderKind::Replaced { intrinsic_width, .. } => Some(intrinsic_width),
            _ => None,
        };
        let (min, max) = self.min_max_widths(id);

        let object = &mut self[id];
        let style = std::rc::Rc::clone(&object.style);
        let padding = style.padding_widths(cb_width);
        object.padding.left = padding.left;
        object.padding.right = padding.right;
        let bp = style.border.left + style.border.right + padding.left + padding.right;
        // [§ 10.3.8] Replaced elements use their intrinsic width for 'auto'.
        let size = style.width.resolve(cb_width).or(intrinsic);

        // In a right-to-left containing block the static position names the
        // right margin edge; the equation is solved from the right.
        let input = AxisInput {
            containing: cb_width,
            start: if ltr { style.offsets.left } else { style.offsets.right }.resolve(cb_width),
            end: if ltr { style.offsets.right } else { style.offsets.left }.resolve(cb_width),
            size,
            margin_start: if ltr { style.margin.left } else { style.margin.right }.resolve(cb_width),
            margin_end: if ltr { style.margin.right } else { style.margin.left }.resolve(cb_width),
            border_padding: bp,
            static_start: if ltr { static_x } else { cb_width - static_x },
        };
        // "the shrink-to-fit width is: min(max(preferred minimum width,
        // available width), preferred width)."
        let axis = solve_axis(input, |available| available.max(min - bp).min(max - bp));

        object.width = axis.size + bp;
        let x = if ltr {
            object.margin.left = axis.margin_start;
            object.margin.right = axis.margin_end;
            axis.start + axis.margin_start
        } else {
            object.margin.right = axis.margin_start;
            object.margin.left = axis.margin_end;
            cb_width - axis.start - axis.margin_start - object.width
        };
        let (ox, _) = self.padding_box_origin(id, cb);
        self[id].x = ox + x;
    }

    /// Used height, vertical margins and y of an absolutely or fixed
    /// positioned object. An `auto` height uses the content height of the
    /// last layout.
    ///
    /// [§ 10.6.4 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-height)
    pub(crate) fn calc_positioned_height(&mut self, id: RenderId) {
        let cb = self.containing_block(id);
        let (cb_width, cb_height) = self.positioned_containing_size(cb);
        let (_, static_y) = self.static_position_in(id, cb);

        let object = &mut self[id];
        let style = std::rc::Rc::clone(&object.style);
        let padding = style.padding_widths(cb_width);
        object.padding.top = padding.top;
        object.padding.bottom = padding.bottom;
        let bp = style.border.top + style.border.bottom + padding.top + padding.bottom;
        let content = match object.kind {
            RenderKind::Replaced { intrinsic_height, .. } => intrinsic_height,
            _ => object.content_height,
        };
        let input = AxisInput {
            containing: cb_height,
            start: style.offsets.top.resolve(cb_height),
            end: style.offsets.bottom.resolve(cb_height),
            size: style.height.resolve(cb_height).or(match object.kind {
                RenderKind::Replaced { intrinsic_height, .. } => Some(intrinsic_height),
                _ => None,
            }),
            margin_start: style.margin.top.resolve(cb_width),
            margin_end: style.margin.bottom.resolve(cb_width),
            border_padding: bp,
            static_start: static_y,
        };
        // "the height is based on the content"
        let axis = solve_axis(input, |_| content);

        object.height = axis.size + bp;
        object.margin.top = axis.margin_start;
        object.margin.bottom = axis.margin_end;
        let y = axis.start + axis.margin_start;
        let (_, oy) = self.padding_box_origin(id, cb);
        self[id].y = oy + y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AxisInput {
        AxisInput {
            containing: 500,
            start: None,
            end: None,
            size: None,
            margin_start: Some(0),
            margin_end: Some(0),
            border_padding: 0,
            static_start: 20,
        }
    }

    #[test]
    fn test_all_auto_uses_static_position_and_shrinks() {
        let axis = solve_axis(input(), |available| available.min(100));
        assert_eq!(axis.start, 20);
        assert_eq!(axis.size, 100);
    }

    #[test]
    fn test_auto_margins_center_between_offsets() {
        let axis = solve_axis(
            AxisInput {
                start: Some(0),
                end: Some(0),
                size: Some(100),
                margin_start: None,
                margin_end: None,
                ..input()
            },
            |a| a,
        );
        assert_eq!((axis.margin_start, axis.margin_end), (200, 200));
    }

    #[test]
    fn test_width_solved_between_offsets() {
        let axis = solve_axis(
            AxisInput {
                start: Some(10),
                end: Some(40),
                border_padding: 10,
                ..input()
            },
            |a| a,
        );
        assert_eq!(axis.start, 10);
        assert_eq!(axis.size, 440);
    }

    #[test]
    fn test_start_solved_from_end() {
        let axis = solve_axis(
            AxisInput {
                end: Some(50),
                size: Some(100),
                ..input()
            },
            |a| a,
        );
        assert_eq!(axis.start, 350);
    }

    #[test]
    fn test_over_constrained_ignores_end() {
        let axis = solve_axis(
            AxisInput {
                start: Some(10),
                end: Some(10),
                size: Some(100),
                ..input()
            },
            |a| a,
        );
        assert_eq!(axis.start, 10);
        assert_eq!(axis.size, 100);
    }
}
