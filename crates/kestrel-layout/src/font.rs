//! Font metrics used by line layout and caret geometry.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "The height of the inline box encloses all glyphs and their half-leading
//! on each side and is thus exactly 'line-height'."
//!
//! Shaping is outside the layout core; it only needs advances and the
//! vertical metrics of one font per size, which [`FontMetrics`] supplies.

/// Vertical and horizontal metrics of the font at a given pixel size.
///
/// All values are whole pixels.
pub trait FontMetrics {
    /// Advance of a single character.
    fn char_width(&self, ch: char, font_size: i32) -> i32;

    /// Advance of a run of characters.
    fn text_width(&self, text: &[char], font_size: i32) -> i32 {
        text.iter().map(|&c| self.char_width(c, font_size)).sum()
    }

    /// Distance from the baseline to the top of the em box.
    fn ascent(&self, font_size: i32) -> i32;

    /// Distance from the baseline to the bottom of the em box.
    fn descent(&self, font_size: i32) -> i32;

    /// `ascent + descent`; the caret height.
    fn height(&self, font_size: i32) -> i32 {
        self.ascent(font_size) + self.descent(font_size)
    }

    /// The font's own line spacing, used for `line-height: normal`.
    fn line_spacing(&self, font_size: i32) -> i32;

    /// Extra space the font asks for between lines.
    fn leading(&self, font_size: i32) -> i32 {
        self.line_spacing(font_size) - self.height(font_size)
    }

    /// Height of a lowercase `x`, used by `vertical-align: middle`.
    fn x_height(&self, font_size: i32) -> i32;
}

/// Metrics approximated from the font size alone.
///
/// Every character advances `0.6em`, ascent is `0.8em`, descent the rest of
/// the em, and line spacing `1.2em`, all rounded to the nearest pixel. At
/// 16px this gives a 10px advance, 13px ascent, 3px descent and 19px line
/// spacing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    fn char_width(&self, ch: char, font_size: i32) -> i32 {
        match ch {
            '\n' | '\u{200b}' => 0,
            _ => (font_size * 3 + 2) / 5,
        }
    }

    fn ascent(&self, font_size: i32) -> i32 {
        (font_size * 4 + 2) / 5
    }

    fn descent(&self, font_size: i32) -> i32 {
        font_size - self.ascent(font_size)
    }

    fn line_spacing(&self, font_size: i32) -> i32 {
        (font_size * 6 + 2) / 5
    }

    fn x_height(&self, font_size: i32) -> i32 {
        font_size / 2
    }
}
