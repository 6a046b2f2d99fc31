//! Word motions over a line buffer.
//!
//! | Motion                 | Vim key | Description                          |
//! |------------------------|---------|--------------------------------------|
//! | [`word_forward`]       | `w`     | Forward to start of next word        |
//! | [`word_backward`]      | `b`     | Backward to start of previous word   |
//! | [`word_end_forward`]   | `e`     | Forward to end of current/next word  |
//!
//! A word here is a run of non-blank characters, so one step is a
//! whitespace run plus a non-blank run. Motions wrap across line boundaries
//! and stop on empty lines ("An empty line is also considered to be a
//! word").

use crate::buffer::Buffer;
use crate::position::Position;

// ---------------------------------------------------------------------------
// Character classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    Word,
    Blank,
    Newline,
}

pub(crate) fn classify(ch: char) -> CharClass {
    if ch == '\n' {
        CharClass::Newline
    } else if ch.is_whitespace() {
        CharClass::Blank
    } else {
        CharClass::Word
    }
}

// ---------------------------------------------------------------------------
// Flattened view
// ---------------------------------------------------------------------------

/// The buffer as one char sequence with `\n` between lines, so the motions
/// can scan across line boundaries by index.
struct Flat {
    chars: Vec<char>,
    starts: Vec<usize>,
}

impl Flat {
    fn new(buf: &Buffer) -> Self {
        let mut chars = Vec::new();
        let mut starts = Vec::with_capacity(buf.line_count());
        for (i, line) in buf.lines().iter().enumerate() {
            if i > 0 {
                chars.push('\n');
            }
            starts.push(chars.len());
            chars.extend(line.chars());
        }
        Self { chars, starts }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn char(&self, idx: usize) -> char {
        self.chars[idx]
    }

    fn line_len(&self, line: usize) -> usize {
        let end = self
            .starts
            .get(line + 1)
            .map_or(self.chars.len(), |next| next - 1);
        end - self.starts[line]
    }

    fn idx(&self, pos: Position) -> Option<usize> {
        let start = *self.starts.get(pos.line)?;
        let col = pos.col.min(self.line_len(pos.line).saturating_sub(1));
        Some(start + col)
    }

    fn pos(&self, idx: usize) -> Position {
        let line = self.starts.partition_point(|&s| s <= idx).saturating_sub(1);
        Position::new(line, idx - self.starts[line])
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `w`: forward to the start of the next word. Stays put at the last word.
#[must_use]
pub fn word_forward(buf: &Buffer, pos: Position) -> Position {
    let flat = Flat::new(buf);
    let total = flat.len();
    let Some(start) = flat.idx(pos) else {
        return pos;
    };
    if total == 0 || start >= total - 1 {
        return pos;
    }

    let mut idx = start;

    // Phase 1: skip the current word.
    if classify(flat.char(idx)) == CharClass::Word {
        while idx < total && classify(flat.char(idx)) == CharClass::Word {
            idx += 1;
        }
    }

    // Phase 2: skip blanks and line breaks, stopping at empty lines.
    while idx < total {
        match classify(flat.char(idx)) {
            CharClass::Word => break,
            CharClass::Blank => idx += 1,
            CharClass::Newline => {
                idx += 1;
                if idx == total || classify(flat.char(idx)) == CharClass::Newline {
                    break;
                }
            }
        }
    }

    if idx == total && !ends_on_empty_line(&flat) {
        return pos;
    }
    flat.pos(idx)
}

/// `b`: backward to the start of the previous word.
#[must_use]
pub fn word_backward(buf: &Buffer, pos: Position) -> Position {
    let flat = Flat::new(buf);
    let Some(start) = flat.idx(pos) else {
        return pos;
    };
    if start == 0 || flat.len() == 0 {
        return pos;
    }

    let mut idx = start - 1;

    // Phase 1: skip blanks and line breaks backward, stopping at empty lines.
    loop {
        match classify(flat.char(idx)) {
            CharClass::Word => break,
            CharClass::Newline => {
                // The newline closes the line before it; an empty line is a stop.
                let line = flat.pos(idx).line;
                if flat.line_len(line) == 0 {
                    return Position::new(line, 0);
                }
                if idx == 0 {
                    return Position::ZERO;
                }
                idx -= 1;
            }
            CharClass::Blank => {
                if idx == 0 {
                    return Position::ZERO;
                }
                idx -= 1;
            }
        }
    }

    // Phase 2: back up to the start of the word.
    while idx > 0 && classify(flat.char(idx - 1)) == CharClass::Word {
        idx -= 1;
    }
    flat.pos(idx)
}

/// `e`: forward to the last char of the current or next word.
#[must_use]
pub fn word_end_forward(buf: &Buffer, pos: Position) -> Position {
    let flat = Flat::new(buf);
    let total = flat.len();
    let Some(start) = flat.idx(pos) else {
        return pos;
    };
    let last = total.saturating_sub(1);
    if total == 0 || start >= last {
        return pos;
    }

    let mut idx = start + 1;
    while idx < total && classify(flat.char(idx)) != CharClass::Word {
        idx += 1;
    }
    if idx >= total {
        return pos;
    }
    while idx < last && classify(flat.char(idx + 1)) == CharClass::Word {
        idx += 1;
    }
    flat.pos(idx)
}

/// Apply a motion `count` times (at least once), stopping early once it no
/// longer moves.
#[must_use]
pub fn repeat(
    buf: &Buffer,
    pos: Position,
    count: usize,
    motion: fn(&Buffer, Position) -> Position,
) -> Position {
    let mut at = pos;
    for _ in 0..count.max(1) {
        let next = motion(buf, at);
        if next == at {
            break;
        }
        at = next;
    }
    at
}

/// A trailing empty line sits one past the last char of the flat view.
fn ends_on_empty_line(flat: &Flat) -> bool {
    flat.starts.len() > 1 && flat.line_len(flat.starts.len() - 1) == 0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    fn buf(lines: &[&str]) -> Buffer {
        Buffer::from_lines(lines)
    }

    // -- Classification -----------------------------------------------------

    #[test]
    fn punctuation_is_part_of_a_word() {
        assert_eq!(classify('a'), CharClass::Word);
        assert_eq!(classify('.'), CharClass::Word);
        assert_eq!(classify(' '), CharClass::Blank);
        assert_eq!(classify('\t'), CharClass::Blank);
        assert_eq!(classify('\n'), CharClass::Newline);
    }

    // -- w --------------------------------------------------------------------

    #[test]
    fn w_simple_two_words() {
        assert_eq!(word_forward(&buf(&["hello world"]), p(0, 0)), p(0, 6));
    }

    #[test]
    fn w_from_middle_of_word() {
        assert_eq!(word_forward(&buf(&["hello world"]), p(0, 2)), p(0, 6));
    }

    #[test]
    fn w_treats_punctuation_as_word_chars() {
        assert_eq!(word_forward(&buf(&["foo.bar baz"]), p(0, 0)), p(0, 8));
    }

    #[test]
    fn w_across_lines() {
        assert_eq!(word_forward(&buf(&["one", "  two"]), p(0, 0)), p(1, 2));
    }

    #[test]
    fn w_stops_on_empty_line() {
        let b = buf(&["one", "", "two"]);
        assert_eq!(word_forward(&b, p(0, 0)), p(1, 0));
        assert_eq!(word_forward(&b, p(1, 0)), p(2, 0));
    }

    #[test]
    fn w_last_word_no_move() {
        assert_eq!(word_forward(&buf(&["only"]), p(0, 1)), p(0, 1));
        assert_eq!(word_forward(&buf(&[""]), p(0, 0)), p(0, 0));
    }

    #[test]
    fn w_with_count() {
        let b = buf(&["a b c d"]);
        assert_eq!(repeat(&b, p(0, 0), 3, word_forward), p(0, 6));
    }

    // -- b --------------------------------------------------------------------

    #[test]
    fn b_simple_two_words() {
        assert_eq!(word_backward(&buf(&["hello world"]), p(0, 6)), p(0, 0));
    }

    #[test]
    fn b_from_middle_of_word() {
        assert_eq!(word_backward(&buf(&["hello world"]), p(0, 8)), p(0, 6));
    }

    #[test]
    fn b_across_lines() {
        assert_eq!(word_backward(&buf(&["one two", "three"]), p(1, 0)), p(0, 4));
    }

    #[test]
    fn b_stops_on_empty_line() {
        assert_eq!(word_backward(&buf(&["one", "", "two"]), p(2, 0)), p(1, 0));
    }

    #[test]
    fn b_start_of_buffer_no_move() {
        assert_eq!(word_backward(&buf(&["one"]), p(0, 0)), p(0, 0));
    }

    // -- e --------------------------------------------------------------------

    #[test]
    fn e_moves_to_word_end() {
        let b = buf(&["hello world"]);
        assert_eq!(word_end_forward(&b, p(0, 0)), p(0, 4));
        assert_eq!(word_end_forward(&b, p(0, 4)), p(0, 10));
    }
}
