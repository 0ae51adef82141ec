//! Bidirectional levels and visual reordering of line content.
//!
//! [§ 9.10 Text direction: the 'direction' and 'unicode-bidi' properties](https://www.w3.org/TR/CSS2/visuren.html#direction)
//!
//! "User agents that support bidirectional text must apply the Unicode
//! bidirectional algorithm to every sequence of inline-level boxes
//! uninterrupted by a forced (bidi class B) line break or block boundary."
//!
//! Level resolution is done by `unicode-bidi` over the text of one line,
//! with atomic content standing in as U+FFFC and embedding inlines as
//! explicit formatting characters. Reordering of the resulting runs is done
//! here, on runs rather than characters.

use std::rc::Rc;

use unicode_bidi::{BidiClass, BidiInfo, Level, bidi_class};

use crate::line::{BidiContext, BidiStatus};
use crate::style::{Direction, RenderStyle, UnicodeBidi};

/// Stand-in for atomic inline content.
pub(crate) const OBJECT_REPLACEMENT: char = '\u{FFFC}';
/// POP DIRECTIONAL FORMATTING.
pub(crate) const PDF: char = '\u{202C}';

/// The formatting character that opens the embedding of an inline with
/// `style`, or `None` when `unicode-bidi` is `normal`.
///
/// "'embed': If the element is inline-level, this value opens an
/// additional level of embedding with respect to the bidirectional
/// algorithm."
pub(crate) const fn embedding_open(style: &RenderStyle) -> Option<char> {
    let rtl = matches!(style.direction, Direction::Rtl);
    match style.unicode_bidi {
        UnicodeBidi::Normal => None,
        UnicodeBidi::Embed if rtl => Some('\u{202B}'),
        UnicodeBidi::Embed => Some('\u{202A}'),
        UnicodeBidi::BidiOverride if rtl => Some('\u{202E}'),
        UnicodeBidi::BidiOverride => Some('\u{202D}'),
    }
}

/// Whether `c` is one of the explicit formatting characters inserted for
/// embeddings.
pub(crate) const fn is_formatting(c: char) -> bool {
    matches!(c, '\u{202A}'..='\u{202E}')
}

/// Whether any character needs the full algorithm in a left-to-right
/// paragraph.
fn needs_resolution(text: &[char]) -> bool {
    text.iter().any(|&c| {
        matches!(
            bidi_class(c),
            BidiClass::R
                | BidiClass::AL
                | BidiClass::AN
                | BidiClass::LRE
                | BidiClass::RLE
                | BidiClass::LRO
                | BidiClass::RLO
                | BidiClass::PDF
                | BidiClass::LRI
                | BidiClass::RLI
                | BidiClass::FSI
                | BidiClass::PDI
        )
    })
}

/// Resolved embedding level of every character of one line, with rules L1
/// applied.
pub(crate) fn resolve_levels(text: &[char], base: Direction) -> Vec<u8> {
    let rtl = matches!(base, Direction::Rtl);
    if !rtl && !needs_resolution(text) {
        return vec![0; text.len()];
    }
    let string: String = text.iter().collect();
    let base_level = if rtl { Level::rtl() } else { Level::ltr() };
    let info = BidiInfo::new(&string, Some(base_level));

    let mut levels = Vec::with_capacity(text.len());
    for para in &info.paragraphs {
        let line = para.range.clone();
        levels.extend(info.reordered_levels_per_char(para, line).into_iter().map(|l| l.number()));
    }
    // Every character belongs to exactly one paragraph.
    levels.resize(text.len(), base_level.number());
    levels
}

/// Visual order of runs with the given levels, as indices into `levels`.
///
/// Rule L2: "From the highest level found in the text to the lowest odd
/// level on each line, including intermediate levels not actually present
/// in the text, reverse any contiguous sequence of characters that are at
/// that level or higher."
pub(crate) fn visual_order(levels: &[u8]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    let Some(&highest) = levels.iter().max() else {
        return order;
    };
    let Some(lowest_odd) = levels.iter().filter(|&&l| l % 2 == 1).min().copied() else {
        return order;
    };

    let mut level = highest;
    while level >= lowest_odd {
        let mut i = 0;
        while i < order.len() {
            if levels[order[i]] < level {
                i += 1;
                continue;
            }
            let start = i;
            while i < order.len() && levels[order[i]] >= level {
                i += 1;
            }
            order[start..i].reverse();
        }
        if level == 0 {
            break;
        }
        level -= 1;
    }
    order
}

/// Bidi state at the end of a line's text.
pub(crate) fn line_status(text: &[char], levels: &[u8]) -> BidiStatus {
    let last = text
        .iter()
        .rev()
        .find(|&&c| !is_formatting(c))
        .map_or(BidiClass::ON, |&c| bidi_class(c));
    let last_strong = text
        .iter()
        .rev()
        .map(|&c| bidi_class(c))
        .find(|c| matches!(c, BidiClass::L | BidiClass::R | BidiClass::AL))
        .unwrap_or(BidiClass::ON);
    let eor = match levels.last() {
        Some(l) if l % 2 == 1 => BidiClass::R,
        Some(_) => BidiClass::L,
        None => BidiClass::ON,
    };
    BidiStatus { eor, last_strong, last }
}

/// Embedding context for the inlines still open at a line break, outermost
/// first.
pub(crate) fn context_for(base: Direction, open: &[Rc<RenderStyle>]) -> Rc<BidiContext> {
    let mut context = Rc::new(BidiContext {
        level: u8::from(matches!(base, Direction::Rtl)),
        direction: base,
        is_override: false,
        parent: None,
    });
    for style in open {
        if style.unicode_bidi == UnicodeBidi::Normal {
            continue;
        }
        // "the next higher odd (even) level"
        let rtl = matches!(style.direction, Direction::Rtl);
        let level = if rtl {
            (context.level + 1) | 1
        } else {
            (context.level + 2) & !1
        };
        context = Rc::new(BidiContext {
            level,
            direction: style.direction,
            is_override: style.unicode_bidi == UnicodeBidi::BidiOverride,
            parent: Some(context),
        });
    }
    context
}
