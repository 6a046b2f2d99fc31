//! Cursor position and line-span types.
//!
//! All coordinates are **0-indexed**. Line 0 is the first line, column 0 is
//! the first character. Columns count Unicode scalar values (chars), not
//! bytes. The Ex layer speaks 1-indexed line numbers; that conversion
//! happens in the range resolver and never leaks in here.

use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cursor position: (line, col), both 0-indexed.
///
/// Positions order lexicographically, line first, then column.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin: line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for human display, matching Vim's `line:col` status.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

// ---------------------------------------------------------------------------
// LineRange
// ---------------------------------------------------------------------------

/// An inclusive span of lines `[start, end]`, 0-indexed.
///
/// This is what an Ex range like `2,4` or `%` resolves to. It is transient:
/// resolved against a buffer right before a command runs, never stored.
/// `start <= end` always holds: the resolver rejects reversed input with
/// [`InvalidRange`](crate::error::EditorError::InvalidRange) rather than
/// swapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    /// Create a range. Panics in debug if `start > end`.
    #[inline]
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "LineRange::new requires start <= end");
        Self { start, end }
    }

    /// A single-line range.
    #[inline]
    #[must_use]
    pub const fn line(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Number of lines covered. Never zero.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; present for clippy's `len_without_is_empty`.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, line: usize) -> bool {
        line >= self.start && line <= self.end
    }
}

impl fmt::Debug for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lines({}..={})", self.start, self.end)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for humans, the way an Ex range is typed.
        write!(f, "{},{}", self.start + 1, self.end + 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
