//! Word boundaries and word-wise caret movement.
//!
//! A word here is a maximal run of characters of one class: white space,
//! punctuation, or everything else. Classes come from the word segments of
//! [UAX #29](https://www.unicode.org/reports/tr29/#Word_Boundaries): a
//! segment with a letter or digit in it is word content, a segment of
//! white space is space, and anything else is punctuation. Double-click
//! selection and ctrl-arrow movement both stop at the edges of these runs.

use unicode_segmentation::UnicodeSegmentation;

use super::iterator::PositionIterator;
use super::{LayoutView, Position};

/// The run of same-class characters around an offset, as `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordBoundary {
    /// First offset of the run.
    pub start: usize,
    /// Offset just past the run.
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Punct,
    Word,
}

/// Class of every character of `text`.
fn classes(text: &[char]) -> Vec<CharClass> {
    let s: String = text.iter().collect();
    let mut out = Vec::with_capacity(text.len());
    for segment in s.split_word_bounds() {
        let class = if segment.chars().all(char::is_whitespace) {
            CharClass::Space
        } else if segment.chars().any(char::is_alphanumeric) {
            CharClass::Word
        } else {
            CharClass::Punct
        };
        out.extend(segment.chars().map(|_| class));
    }
    out
}

/// Past the end reads as a word character.
fn class_at(classes: &[CharClass], index: usize) -> CharClass {
    classes.get(index).copied().unwrap_or(CharClass::Word)
}

fn run_around(classes: &[CharClass], position: usize) -> WordBoundary {
    let position = position.min(classes.len());
    let class = class_at(classes, position);
    let mut start = position;
    while start > 0 && classes[start - 1] == class {
        start -= 1;
    }
    let mut end = position;
    while end < classes.len() && classes[end] == class {
        end += 1;
    }
    WordBoundary { start, end }
}

/// The run containing the character at `position` in `text`.
///
/// A position at the end of the text belongs to the last word when the
/// text ends in one, and is an empty run otherwise.
#[must_use]
pub fn find_word_boundary(text: &[char], position: usize) -> WordBoundary {
    run_around(&classes(text), position)
}

/// Boundary used for the trailing end of a selection: a point right after
/// a word belongs to that word rather than to the gap that follows it.
pub(crate) fn find_word_boundary_for_end(text: &[char], position: usize) -> WordBoundary {
    let classes = classes(text);
    let position = position.min(classes.len());
    let after_word = position > 0
        && classes[position - 1] == CharClass::Word
        && (position == classes.len() || classes[position] != CharClass::Word);
    if after_word {
        return run_around(&classes, position - 1);
    }
    run_around(&classes, position)
}

impl Position {
    /// The start of the word before this position, or the position itself
    /// at the start of the document.
    #[must_use]
    pub fn previous_word_position(&self, view: LayoutView<'_>) -> Self {
        if self.is_empty() {
            return Self::empty();
        }
        let mut it = PositionIterator::new(view, *self);
        while !it.at_start() {
            let current = it.current();
            let Some(node) = current.node else {
                break;
            };
            let pos = match view.dom.as_text(node) {
                Some(text) => {
                    let chars: Vec<char> = text.chars().collect();
                    Self::new(node, find_word_boundary(&chars, current.offset).start)
                }
                None => Self::new(node, view.caret_min_offset(node).min(current.offset)),
            };
            if pos != *self {
                return pos;
            }
            it.set_position(pos);
            let _ = it.previous();
        }
        *self
    }

    /// The end of the word after this position, or the position itself at
    /// the end of the document.
    #[must_use]
    pub fn next_word_position(&self, view: LayoutView<'_>) -> Self {
        if self.is_empty() {
            return Self::empty();
        }
        let mut it = PositionIterator::new(view, *self);
        while !it.at_end() {
            let current = it.current();
            let Some(node) = current.node else {
                break;
            };
            let pos = match view.dom.as_text(node) {
                Some(text) => {
                    let chars: Vec<char> = text.chars().collect();
                    Self::new(node, find_word_boundary(&chars, current.offset).end)
                }
                None => Self::new(node, view.caret_max_offset(node).max(current.offset)),
            };
            if pos != *self {
                return pos;
            }
            it.set_position(pos);
            let _ = it.next();
        }
        *self
    }
}
