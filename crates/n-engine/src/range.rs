//! Range resolver: Ex line addresses and ranges.
//!
//! A range is parsed once into a [`RangeSpec`] (no buffer needed) and
//! resolved later against the buffer the command runs on. That keeps the
//! Ex parser pure and lets `:g` re-resolve the same range on every line.
//!
//! # Grammar
//!
//! ```text
//! range   := '%' | address [ (',' | ';') address ]
//! address := base offset* | offset+
//! base    := '.' | '$' | N | "'" letter | '/' pat '/' | '?' pat '?'
//! offset  := ('+' | '-') [N]
//! ```
//!
//! Numbers are 1-based on input. `0` clamps to the first line; anything
//! past the last line fails [`EditorError::LineOutOfRange`]. A range whose
//! end precedes its start fails [`EditorError::InvalidRange`] instead of
//! being swapped.
//!
//! Pattern addresses search at or after the current line (`?pat?` at or
//! before it) and wrap when `wrapscan` is set. In `/p1/,/p2/` the second
//! pattern is searched at or after the line the first one found. A `;`
//! separator also makes `.` and bare offsets in the second address count
//! from the first.

use crate::buffer::Buffer;
use crate::error::{EditorError, Result};
use crate::options::Options;
use crate::position::LineRange;
use crate::search::{self, SearchDirection};

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// The base of a single address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    /// `.` (also implied by a bare offset such as `+2`).
    Current,
    /// `$`
    Last,
    /// A 1-based line number.
    Number(usize),
    /// `'x`
    Mark(char),
    /// `/pat/`: empty means "last search pattern".
    Forward(String),
    /// `?pat?`
    Backward(String),
}

/// One address: a base plus the sum of its `+N`/`-N` offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub base: Base,
    pub offset: isize,
}

impl Address {
    #[must_use]
    pub const fn new(base: Base) -> Self {
        Self { base, offset: 0 }
    }
}

/// How the two addresses of a pair are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Semicolon,
}

/// An unresolved range as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RangeSpec {
    /// No range was typed; the command picks its own default.
    #[default]
    Default,
    /// `%`
    Whole,
    Single(Address),
    Pair(Address, Separator, Address),
}

impl RangeSpec {
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Resolve against `buf`. [`RangeSpec::Default`] resolves to `default`.
    ///
    /// # Errors
    ///
    /// [`EditorError::MarkNotSet`], [`EditorError::PatternNotFound`],
    /// [`EditorError::LineOutOfRange`], [`EditorError::InvalidRange`], or
    /// [`EditorError::InvalidPattern`].
    pub fn resolve(&self, buf: &Buffer, opts: &Options, default: LineRange) -> Result<LineRange> {
        let current = buf.current_line();
        match self {
            Self::Default => Ok(default),
            Self::Whole => Ok(LineRange::new(0, buf.last_line())),
            Self::Single(addr) => {
                resolve_address(addr, buf, opts, current, current).map(LineRange::line)
            }
            Self::Pair(first, sep, second) => {
                let start = resolve_address(first, buf, opts, current, current)?;
                let dot = match sep {
                    Separator::Comma => current,
                    Separator::Semicolon => start,
                };
                let end = resolve_address(second, buf, opts, dot, start)?;
                if end < start {
                    return Err(EditorError::InvalidRange);
                }
                Ok(LineRange::new(start, end))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a range from the start of `input`. Returns the range and the
/// unconsumed rest. Input that does not start with an address gives
/// [`RangeSpec::Default`] and the whole input back.
#[must_use]
pub fn parse_prefix(input: &str) -> (RangeSpec, &str) {
    if let Some(rest) = input.strip_prefix('%') {
        return (RangeSpec::Whole, rest);
    }
    let Some((first, rest)) = parse_address(input) else {
        return (RangeSpec::Default, input);
    };
    let sep = match rest.chars().next() {
        Some(',') => Separator::Comma,
        Some(';') => Separator::Semicolon,
        _ => return (RangeSpec::Single(first), rest),
    };
    let after = &rest[1..];
    // `1,` alone means `1,.`
    let (second, rest) = parse_address(after).unwrap_or((Address::new(Base::Current), after));
    (RangeSpec::Pair(first, sep, second), rest)
}

/// Parse one address, or `None` if `input` does not start with one.
fn parse_address(input: &str) -> Option<(Address, &str)> {
    let (base, mut rest) = parse_base(input).map_or((None, input), |(b, r)| (Some(b), r));
    let mut offset: isize = 0;
    let mut saw_offset = false;
    while let Some(sign) = rest.chars().next().filter(|c| matches!(c, '+' | '-')) {
        let (n, after) = split_number(&rest[1..]).unwrap_or((1, &rest[1..]));
        let n = isize::try_from(n).unwrap_or(isize::MAX);
        offset = if sign == '+' { offset.saturating_add(n) } else { offset.saturating_sub(n) };
        saw_offset = true;
        rest = after;
    }
    match base {
        Some(base) => Some((Address { base, offset }, rest)),
        None if saw_offset => Some((Address { base: Base::Current, offset }, rest)),
        None => None,
    }
}

fn parse_base(input: &str) -> Option<(Base, &str)> {
    let mut chars = input.chars();
    match chars.next()? {
        '.' => Some((Base::Current, &input[1..])),
        '$' => Some((Base::Last, &input[1..])),
        '\'' => {
            let name = chars.next().filter(char::is_ascii_lowercase)?;
            Some((Base::Mark(name), &input[2..]))
        }
        delim @ ('/' | '?') => {
            let body = &input[1..];
            let (pattern, rest) = split_at_unescaped(body, delim).unwrap_or((body, ""));
            let pattern = unescape_delim(pattern, delim);
            let base = if delim == '/' {
                Base::Forward(pattern)
            } else {
                Base::Backward(pattern)
            };
            Some((base, rest))
        }
        c if c.is_ascii_digit() => {
            let (n, rest) = split_number(input)?;
            Some((Base::Number(n), rest))
        }
        _ => None,
    }
}

/// Parse a decimal number from the start of `input`.
pub(crate) fn split_number(input: &str) -> Option<(usize, &str)> {
    let end = input
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    let num = input[..end].parse().ok()?;
    Some((num, &input[end..]))
}

/// Split at the first unescaped `delim`. `\<delim>` is not a split point.
pub(crate) fn split_at_unescaped(s: &str, delim: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (byte_idx, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == delim {
            return Some((&s[..byte_idx], &s[byte_idx + ch.len_utf8()..]));
        }
    }
    None
}

/// `\<delim>` → `<delim>`; every other escape passes through for the regex
/// engine or the replacement expander.
pub(crate) fn unescape_delim(s: &str, delim: char) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&delim) {
            result.push(delim);
            chars.next();
            continue;
        }
        result.push(ch);
    }
    result
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve one address. `dot` is what `.` means; `search_from` is where
/// pattern searches start.
fn resolve_address(
    addr: &Address,
    buf: &Buffer,
    opts: &Options,
    dot: usize,
    search_from: usize,
) -> Result<usize> {
    let line = match &addr.base {
        Base::Current => dot,
        Base::Last => buf.last_line(),
        Base::Number(0) => 0,
        Base::Number(n) => {
            if *n > buf.line_count() {
                return Err(EditorError::LineOutOfRange(*n));
            }
            n - 1
        }
        Base::Mark(name) => buf.mark(*name).ok_or(EditorError::MarkNotSet(*name))?,
        Base::Forward(pat) => {
            search_address(buf, opts, pat, search_from, SearchDirection::Forward)?
        }
        Base::Backward(pat) => {
            search_address(buf, opts, pat, search_from, SearchDirection::Backward)?
        }
    };
    let target = line.checked_add_signed(addr.offset);
    match target {
        Some(t) if t < buf.line_count() => Ok(t),
        Some(t) => Err(EditorError::LineOutOfRange(t + 1)),
        None => Err(EditorError::LineOutOfRange(0)),
    }
}

fn search_address(
    buf: &Buffer,
    opts: &Options,
    pattern: &str,
    from: usize,
    direction: SearchDirection,
) -> Result<usize> {
    let pattern = if pattern.is_empty() {
        buf.last_search()
            .ok_or_else(|| EditorError::PatternNotFound(String::new()))?
    } else {
        pattern
    };
    let re = search::compile(pattern, opts.ignorecase)?;
    search::find_line(buf, &re, from, direction, opts.wrapscan)
        .ok_or_else(|| EditorError::PatternNotFound(pattern.to_string()))
}

/// Parse and resolve a complete range expression, defaulting to the
/// current line when `expr` is empty.
///
/// # Errors
///
/// Resolution errors (see [`RangeSpec::resolve`]), or
/// [`EditorError::InvalidRange`] if text is left over after the range.
pub fn parse_range(expr: &str, buf: &Buffer, opts: &Options) -> Result<LineRange> {
    let (parsed, rest) = parse_prefix(expr.trim());
    if !rest.is_empty() {
        return Err(EditorError::InvalidRange);
    }
    parsed.resolve(buf, opts, LineRange::line(buf.current_line()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
