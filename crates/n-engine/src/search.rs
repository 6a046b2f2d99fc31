//! Pattern search: compiling user patterns and finding matching lines.
//!
//! Patterns use the `regex` crate's syntax with two Vim additions: `\<` and
//! `\>` (word boundaries) are accepted and mean `\b`. Case folding follows
//! the session's `ignorecase` option; a substitute flag can override it.
//!
//! Line searches are used by `/pat/` and `?pat?` range addresses. They
//! start on a given line (inclusive) and wrap around the buffer when
//! `wrapscan` is set.

use regex::{Regex, RegexBuilder};

use crate::buffer::Buffer;
use crate::error::{EditorError, Result};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchDirection {
    Forward,
    Backward,
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile a user pattern.
///
/// # Errors
///
/// [`EditorError::InvalidPattern`] if the regex engine rejects it.
pub fn compile(pattern: &str, ignore_case: bool) -> Result<Regex> {
    RegexBuilder::new(&translate(pattern))
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| EditorError::pattern(pattern, &e))
}

/// Rewrite Vim-only escapes into `regex` syntax.
fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('<' | '>') => out.push_str(r"\b"),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Line search
// ---------------------------------------------------------------------------

/// First line matching `re`, scanning from `from` (inclusive) in
/// `direction`. With `wrap`, continues past the buffer end (or start) and
/// comes back around; without it, stops there.
#[must_use]
pub fn find_line(
    buf: &Buffer,
    re: &Regex,
    from: usize,
    direction: SearchDirection,
    wrap: bool,
) -> Option<usize> {
    let count = buf.line_count();
    let from = from.min(count - 1);
    let steps = if wrap {
        count
    } else {
        match direction {
            SearchDirection::Forward => count - from,
            SearchDirection::Backward => from + 1,
        }
    };
    (0..steps)
        .map(|offset| match direction {
            SearchDirection::Forward => (from + offset) % count,
            SearchDirection::Backward => (from + count - offset) % count,
        })
        .find(|&line| buf.line(line).is_some_and(|text| re.is_match(text)))
}

/// Every line index whose match status equals `!inverse`, ascending.
#[must_use]
pub fn matching_lines(buf: &Buffer, re: &Regex, inverse: bool) -> Vec<usize> {
    buf.lines()
        .iter()
        .enumerate()
        .filter(|(_, text)| re.is_match(text) != inverse)
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit() -> Buffer {
        Buffer::from_lines(&["apple", "banana", "cherry", "apple pie"])
    }

    #[test]
    fn word_boundaries_translate() {
        let re = compile(r"\<pie\>", false).unwrap();
        assert!(re.is_match("apple pie"));
        assert!(!re.is_match("pies"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(matches!(
            compile("a(", false),
            Err(EditorError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn case_folding() {
        assert!(compile("APPLE", true).unwrap().is_match("apple"));
        assert!(!compile("APPLE", false).unwrap().is_match("apple"));
    }

    #[test]
    fn forward_search_is_inclusive_and_wraps() {
        let buf = fruit();
        let re = compile("apple", false).unwrap();
        assert_eq!(find_line(&buf, &re, 0, SearchDirection::Forward, true), Some(0));
        assert_eq!(find_line(&buf, &re, 1, SearchDirection::Forward, true), Some(3));
        let re = compile("banana", false).unwrap();
        assert_eq!(find_line(&buf, &re, 2, SearchDirection::Forward, true), Some(1));
        assert_eq!(find_line(&buf, &re, 2, SearchDirection::Forward, false), None);
    }

    #[test]
    fn backward_search() {
        let buf = fruit();
        let re = compile("apple", false).unwrap();
        assert_eq!(find_line(&buf, &re, 2, SearchDirection::Backward, true), Some(0));
        let re = compile("pie", false).unwrap();
        assert_eq!(find_line(&buf, &re, 1, SearchDirection::Backward, true), Some(3));
        assert_eq!(find_line(&buf, &re, 1, SearchDirection::Backward, false), None);
    }

    #[test]
    fn matching_lines_with_inverse() {
        let buf = fruit();
        let re = compile("apple", false).unwrap();
        assert_eq!(matching_lines(&buf, &re, false), vec![0, 3]);
        assert_eq!(matching_lines(&buf, &re, true), vec![1, 2]);
    }
}
