//! Normal-mode interpreter: key sequences that are not `:` commands.
//!
//! Interpretation is split in two stages. [`parse`] turns the accumulated
//! keys into a [`NormalCommand`], or reports that more keys are needed
//! ([`Parsed::Incomplete`]) or that the text can never become a command.
//! [`execute`] runs a parsed command against a buffer and the register
//! file. The cursor column goes in as an argument and comes back in the
//! [`NormalOutcome`]; the interpreter keeps no state of its own.
//!
//! # Grammar (matched in order)
//!
//! | Form                  | Meaning                                        |
//! |-----------------------|------------------------------------------------|
//! | `m{a-z}`              | Set mark on the current line                   |
//! | `'{a-z}`              | Jump to mark                                   |
//! | `'{a-z}{rest}`        | Jump, then run rest; `"{a-z}{rest}` if unset   |
//! | `{N}G{M}{op}`         | Go to line N, then run `{M}{op}`               |
//! | `{N}G`                | Go to line N                                   |
//! | `[N]["x][M]G{rest}`   | Go to the last line, then run the rest         |
//! | `[N]["x][M]{cmd}`     | Command lookup                                 |
//!
//! Commands: `dd` `yy` `Y` `cc` `dw` `cw` `p` `P` `x` `j` `k` `h` `l` `0`
//! `^` `$` `w` `b` `gg` `G`, and `i` `a` `A` `I` `o` `O`. The insert
//! commands may carry their text inline (`iHello`) for callers that do not
//! go through insert mode. Operators take a count before or after them
//! (`2d3d` deletes six lines).

use tracing::debug;

use crate::buffer::Buffer;
use crate::error::{EditorError, Result};
use crate::ops;
use crate::position::{LineRange, Position};
use crate::register::{RegisterFile, is_valid_name};
use crate::word;

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// Cursor motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Down,
    Up,
    Left,
    Right,
    /// `0`
    LineStart,
    /// `^`
    FirstNonBlank,
    /// `$`
    LineEnd,
    WordForward,
    WordBackward,
    /// `gg`
    FirstLine,
    /// `G`
    LastLine,
}

/// How an insert command positions the cursor before inserting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertKind {
    /// `i`: before the cursor.
    Before,
    /// `a`: after the cursor.
    After,
    /// `A`: at the end of the line.
    LineEnd,
    /// `I`: at column 0.
    LineStart,
    /// `o`: on a new line below.
    OpenBelow,
    /// `O`: on a new line above.
    OpenAbove,
}

impl InsertKind {
    /// The command key for this kind.
    #[must_use]
    pub const fn from_key(ch: char) -> Option<Self> {
        match ch {
            'i' => Some(Self::Before),
            'a' => Some(Self::After),
            'A' => Some(Self::LineEnd),
            'I' => Some(Self::LineStart),
            'o' => Some(Self::OpenBelow),
            'O' => Some(Self::OpenAbove),
            _ => None,
        }
    }
}

/// What an [`NormalCommand::Edit`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `dd`
    DeleteLines,
    /// `yy`, `Y`
    YankLines,
    /// `cc`
    ChangeLines,
    /// `dw`
    DeleteWords,
    /// `cw`
    ChangeWords,
    /// `x`
    DeleteChars,
    /// `p` / `P`
    Put { before: bool },
    Move(Motion),
    /// `i`/`a`/`A`/`I`/`o`/`O`, optionally with inline text.
    Insert { kind: InsertKind, text: Option<String> },
}

/// A complete normal-mode command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalCommand {
    SetMark(char),
    JumpMark(char),
    /// `'x{rest}`: `then` if mark `x` is set, `otherwise` (the `"x{rest}`
    /// reading) if not.
    JumpMarkOr {
        mark: char,
        then: Box<Self>,
        otherwise: Box<Self>,
    },
    /// `{N}G` with 1-based N.
    GotoLine(usize),
    Sequence(Vec<Self>),
    Edit {
        count: Option<usize>,
        register: Option<char>,
        action: Action,
    },
}

impl NormalCommand {
    const fn edit(action: Action) -> Self {
        Self::Edit {
            count: None,
            register: None,
            action,
        }
    }
}

/// Result of parsing accumulated keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Complete(NormalCommand),
    /// A valid prefix; wait for more keys.
    Incomplete,
    /// Cannot become a command no matter what follows.
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Split a count (`[1-9][0-9]*`) off the front of `input`.
fn split_count(input: &str) -> (Option<usize>, &str) {
    let end = input
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() && (i > 0 || c != '0')))
        .map_or(input.len(), |(i, _)| i);
    if end == 0 {
        return (None, input);
    }
    (input[..end].parse().ok(), &input[end..])
}

const fn multiply(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.saturating_mul(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Parse accumulated normal-mode keys.
#[must_use]
pub fn parse(input: &str) -> Parsed {
    let invalid = || Parsed::Invalid(input.to_string());
    if input.is_empty() {
        return Parsed::Incomplete;
    }

    // m{a-z}
    if let Some(rest) = input.strip_prefix('m') {
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (None, _) => Parsed::Incomplete,
            (Some(c), None) if c.is_ascii_lowercase() => {
                Parsed::Complete(NormalCommand::SetMark(c))
            }
            _ => invalid(),
        };
    }

    // '{a-z} and '{a-z}{rest}
    if let Some(rest) = input.strip_prefix('\'') {
        let mut chars = rest.chars();
        let Some(mark) = chars.next() else {
            return Parsed::Incomplete;
        };
        if !mark.is_ascii_lowercase() {
            return invalid();
        }
        let tail = chars.as_str();
        if tail.is_empty() {
            return Parsed::Complete(NormalCommand::JumpMark(mark));
        }
        return match (parse(tail), parse(&format!("\"{mark}{tail}"))) {
            (Parsed::Complete(then), Parsed::Complete(otherwise)) => {
                Parsed::Complete(NormalCommand::JumpMarkOr {
                    mark,
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                })
            }
            (Parsed::Invalid(_), _) | (_, Parsed::Invalid(_)) => invalid(),
            _ => Parsed::Incomplete,
        };
    }

    // {N}G and {N}G{M}{op}
    let (count, body) = split_count(input);
    if let (Some(line), Some(after)) = (count, body.strip_prefix('G')) {
        if after.is_empty() {
            return Parsed::Complete(NormalCommand::GotoLine(line));
        }
        return match parse(after) {
            Parsed::Complete(rest) => Parsed::Complete(NormalCommand::Sequence(vec![
                NormalCommand::GotoLine(line),
                rest,
            ])),
            Parsed::Incomplete => Parsed::Incomplete,
            Parsed::Invalid(_) => invalid(),
        };
    }

    // ["x]
    let (register, body) = match body.strip_prefix('"') {
        Some(after) => {
            let mut chars = after.chars();
            match chars.next() {
                None => return Parsed::Incomplete,
                Some(c) if is_valid_name(c) => (Some(c), chars.as_str()),
                Some(_) => return invalid(),
            }
        }
        None => (None, body),
    };
    let (inner, body) = split_count(body);
    let count = multiply(count, inner);

    // G{rest}
    if let Some(after) = body.strip_prefix('G').filter(|a| !a.is_empty()) {
        let mut rest = String::new();
        if let Some(r) = register {
            rest.push('"');
            rest.push(r);
        }
        rest.push_str(after);
        return match parse(&rest) {
            Parsed::Complete(cmd) => Parsed::Complete(NormalCommand::Sequence(vec![
                NormalCommand::edit(Action::Move(Motion::LastLine)),
                cmd,
            ])),
            Parsed::Incomplete => Parsed::Incomplete,
            Parsed::Invalid(_) => invalid(),
        };
    }

    match lookup(body) {
        Lookup::Found(action, extra) => Parsed::Complete(NormalCommand::Edit {
            count: multiply(count, extra),
            register,
            action,
        }),
        Lookup::Incomplete => Parsed::Incomplete,
        Lookup::Invalid => invalid(),
    }
}

enum Lookup {
    Found(Action, Option<usize>),
    Incomplete,
    Invalid,
}

fn lookup(body: &str) -> Lookup {
    let action = match body {
        "" | "d" | "y" | "c" | "g" => return Lookup::Incomplete,
        "dd" => Action::DeleteLines,
        "yy" | "Y" => Action::YankLines,
        "cc" => Action::ChangeLines,
        "dw" => Action::DeleteWords,
        "cw" => Action::ChangeWords,
        "x" => Action::DeleteChars,
        "p" => Action::Put { before: false },
        "P" => Action::Put { before: true },
        "j" => Action::Move(Motion::Down),
        "k" => Action::Move(Motion::Up),
        "h" => Action::Move(Motion::Left),
        "l" => Action::Move(Motion::Right),
        "0" => Action::Move(Motion::LineStart),
        "^" => Action::Move(Motion::FirstNonBlank),
        "$" => Action::Move(Motion::LineEnd),
        "w" => Action::Move(Motion::WordForward),
        "b" => Action::Move(Motion::WordBackward),
        "gg" => Action::Move(Motion::FirstLine),
        "G" => Action::Move(Motion::LastLine),
        _ => return lookup_compound(body),
    };
    Lookup::Found(action, None)
}

/// Operators with an inner count (`d3w`, `2y3y`) and inline inserts.
fn lookup_compound(body: &str) -> Lookup {
    let mut chars = body.chars();
    let Some(first) = chars.next() else {
        return Lookup::Incomplete;
    };
    let rest = chars.as_str();

    if let Some(kind) = InsertKind::from_key(first) {
        // A bare key enters insert mode; trailing text is typed inline.
        let text = (!rest.is_empty()).then(|| rest.to_string());
        return Lookup::Found(Action::Insert { kind, text }, None);
    }

    if !matches!(first, 'd' | 'y' | 'c') {
        return Lookup::Invalid;
    }
    let (inner, motion) = split_count(rest);
    if inner.is_none() {
        return Lookup::Invalid;
    }
    let action = match (first, motion) {
        (_, "") => return Lookup::Incomplete,
        ('d', "d") => Action::DeleteLines,
        ('y', "y") => Action::YankLines,
        ('c', "c") => Action::ChangeLines,
        ('d', "w") => Action::DeleteWords,
        ('c', "w") => Action::ChangeWords,
        _ => return Lookup::Invalid,
    };
    Lookup::Found(action, inner)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// What running a command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalOutcome {
    /// The new cursor column.
    pub col: usize,
    /// Text to report, Vim-style (`3 fewer lines`).
    pub message: Option<String>,
    /// The command switches to insert mode.
    pub enter_insert: bool,
}

impl NormalOutcome {
    const fn at(col: usize) -> Self {
        Self {
            col,
            message: None,
            enter_insert: false,
        }
    }

    fn report(col: usize, count: usize, what: &str) -> Self {
        Self {
            col,
            // Like Vim's default 'report', only changes above two lines speak.
            message: (count > 2).then(|| format!("{count} {what}")),
            enter_insert: false,
        }
    }
}

/// Column of the first non-blank char of `line` (0 for a blank line).
#[must_use]
pub fn first_non_blank(buf: &Buffer, line: usize) -> usize {
    buf.line(line)
        .and_then(|text| text.chars().position(|c| !c.is_whitespace()))
        .unwrap_or(0)
}

/// Clamp a column to a normal-mode position on `line`.
fn clamp_col(buf: &Buffer, line: usize, col: usize) -> usize {
    col.min(buf.line_len(line).saturating_sub(1))
}

/// The `count` lines starting at the current line, cut at the buffer end.
fn lines_from_cursor(buf: &Buffer, count: usize) -> LineRange {
    let start = buf.current_line();
    let end = start.saturating_add(count.max(1) - 1);
    LineRange::new(start, end.min(buf.last_line()))
}

/// Parse and run a whole command string (`:normal`, `:g/…/norm`).
///
/// # Errors
///
/// [`EditorError::UnsupportedCommand`] if the text is not one complete
/// command; otherwise whatever [`execute`] fails with.
pub fn run(
    input: &str,
    buf: &mut Buffer,
    regs: &mut RegisterFile,
    col: usize,
) -> Result<NormalOutcome> {
    match parse(input) {
        Parsed::Complete(cmd) => execute(&cmd, buf, regs, col),
        Parsed::Incomplete | Parsed::Invalid(_) => {
            Err(EditorError::UnsupportedCommand(input.to_string()))
        }
    }
}

/// Run a parsed command with the cursor at (`buf.current_line()`, `col`).
///
/// # Errors
///
/// [`EditorError::MarkNotSet`], [`EditorError::LineOutOfRange`],
/// [`EditorError::EmptyRegister`] and the errors of the underlying
/// [`ops`] functions.
pub fn execute(
    cmd: &NormalCommand,
    buf: &mut Buffer,
    regs: &mut RegisterFile,
    col: usize,
) -> Result<NormalOutcome> {
    debug!(?cmd, col, "normal");
    match cmd {
        NormalCommand::SetMark(name) => {
            buf.set_mark(*name, buf.current_line())?;
            Ok(NormalOutcome::at(col))
        }
        NormalCommand::JumpMark(name) => {
            let line = buf.mark(*name).ok_or(EditorError::MarkNotSet(*name))?;
            buf.set_current_line(line);
            Ok(NormalOutcome::at(first_non_blank(buf, line)))
        }
        NormalCommand::JumpMarkOr {
            mark,
            then,
            otherwise,
        } => {
            if buf.mark(*mark).is_some() {
                let jumped = execute(&NormalCommand::JumpMark(*mark), buf, regs, col)?;
                execute(then, buf, regs, jumped.col)
            } else {
                execute(otherwise, buf, regs, col)
            }
        }
        NormalCommand::GotoLine(n) => {
            if *n == 0 || *n > buf.line_count() {
                return Err(EditorError::LineOutOfRange(*n));
            }
            buf.set_current_line(n - 1);
            Ok(NormalOutcome::at(first_non_blank(buf, n - 1)))
        }
        NormalCommand::Sequence(cmds) => {
            let mut outcome = NormalOutcome::at(col);
            for cmd in cmds {
                outcome = execute(cmd, buf, regs, outcome.col)?;
            }
            Ok(outcome)
        }
        NormalCommand::Edit {
            count,
            register,
            action,
        } => edit(action, *count, *register, buf, regs, col),
    }
}

fn edit(
    action: &Action,
    count: Option<usize>,
    register: Option<char>,
    buf: &mut Buffer,
    regs: &mut RegisterFile,
    col: usize,
) -> Result<NormalOutcome> {
    let n = count.unwrap_or(1).max(1);
    let line = buf.current_line();
    match action {
        Action::DeleteLines => {
            let removed = ops::delete_lines(buf, regs, lines_from_cursor(buf, n), register)?;
            let line = buf.current_line();
            Ok(NormalOutcome::report(first_non_blank(buf, line), removed, "fewer lines"))
        }
        Action::YankLines => {
            let yanked = ops::yank_lines(buf, regs, lines_from_cursor(buf, n), register)?;
            Ok(NormalOutcome::report(col, yanked, "lines yanked"))
        }
        Action::ChangeLines => {
            ops::change_lines(buf, regs, lines_from_cursor(buf, n), register)?;
            Ok(NormalOutcome {
                col: 0,
                message: None,
                enter_insert: true,
            })
        }
        Action::DeleteWords => {
            let col = col.min(buf.line_len(line));
            let to = word_span_end(buf, Position::new(line, col), n);
            ops::delete_span(buf, regs, line, col, to, register)?;
            Ok(NormalOutcome::at(clamp_col(buf, line, col)))
        }
        Action::ChangeWords => {
            let col = col.min(buf.line_len(line));
            let to = change_span_end(buf, Position::new(line, col), n);
            ops::delete_span(buf, regs, line, col, to, register)?;
            Ok(NormalOutcome {
                col,
                message: None,
                enter_insert: true,
            })
        }
        Action::DeleteChars => {
            if buf.line_len(line) > 0 {
                ops::delete_span(buf, regs, line, col, col.saturating_add(n), register)?;
            }
            Ok(NormalOutcome::at(clamp_col(buf, line, col)))
        }
        Action::Put { before } => {
            let peek = register.or_else(|| buf.last_register());
            let inline = buf
                .read_register(regs, peek)
                .is_some_and(|content| ops::is_inline(&content));
            if inline {
                let col = ops::put_inline(buf, regs, col, *before, register, n)?;
                Ok(NormalOutcome::at(col))
            } else {
                let added = ops::put_lines(buf, regs, *before, register, n)?;
                let line = buf.current_line();
                Ok(NormalOutcome::report(first_non_blank(buf, line), added, "more lines"))
            }
        }
        Action::Move(motion) => Ok(NormalOutcome::at(move_cursor(buf, *motion, count, col))),
        Action::Insert { kind, text } => insert(buf, *kind, text.as_deref(), col),
    }
}

/// End column (exclusive) for `dw`: the start of the word `count` words
/// ahead, or the line end when that lies on another line or nowhere.
fn word_span_end(buf: &Buffer, pos: Position, count: usize) -> usize {
    let mut at = pos;
    for _ in 0..count.max(1) {
        let next = word::word_forward(buf, at);
        if next.line != pos.line || next == at {
            return buf.line_len(pos.line);
        }
        at = next;
    }
    at.col
}

/// End column (exclusive) for `cw`: the end of the current word, like `ce`,
/// and like `dw` when the cursor sits on a blank.
fn change_span_end(buf: &Buffer, pos: Position, count: usize) -> usize {
    let chars: Vec<char> = buf.line(pos.line).unwrap_or_default().chars().collect();
    match chars.get(pos.col) {
        None => return pos.col,
        Some(c) if c.is_whitespace() => return word_span_end(buf, pos, count),
        Some(_) => {}
    }
    let at_word_end = chars.get(pos.col + 1).is_none_or(|c| c.is_whitespace());
    let mut end = pos;
    for i in 0..count {
        if i == 0 && at_word_end {
            continue;
        }
        let next = word::word_end_forward(buf, end);
        if next == end {
            break;
        }
        end = next;
    }
    if end.line == pos.line {
        end.col + 1
    } else {
        chars.len()
    }
}

fn move_cursor(buf: &mut Buffer, motion: Motion, count: Option<usize>, col: usize) -> usize {
    let n = count.unwrap_or(1).max(1);
    let line = buf.current_line();
    match motion {
        Motion::Down | Motion::Up => {
            let target = if motion == Motion::Down {
                line.saturating_add(n)
            } else {
                line.saturating_sub(n)
            };
            buf.set_current_line(target);
            clamp_col(buf, buf.current_line(), col)
        }
        Motion::Left => col.saturating_sub(n),
        Motion::Right => clamp_col(buf, line, col.saturating_add(n)),
        Motion::LineStart => 0,
        Motion::FirstNonBlank => first_non_blank(buf, line),
        Motion::LineEnd => buf.line_len(line).saturating_sub(1),
        Motion::WordForward | Motion::WordBackward => {
            let step = if motion == Motion::WordForward {
                word::word_forward
            } else {
                word::word_backward
            };
            let to = word::repeat(buf, Position::new(line, col), n, step);
            buf.set_current_line(to.line);
            to.col
        }
        Motion::FirstLine | Motion::LastLine => {
            let target = match (count, motion) {
                (Some(n), _) => n.saturating_sub(1),
                (None, Motion::FirstLine) => 0,
                (None, _) => buf.last_line(),
            };
            buf.set_current_line(target);
            first_non_blank(buf, buf.current_line())
        }
    }
}

/// Position for an insert command and, with inline text, perform it.
fn insert(
    buf: &mut Buffer,
    kind: InsertKind,
    text: Option<&str>,
    col: usize,
) -> Result<NormalOutcome> {
    let line = buf.current_line();
    let len = buf.line_len(line);
    let (line, col) = match kind {
        InsertKind::Before => (line, col.min(len)),
        InsertKind::After => (line, if len == 0 { 0 } else { (col + 1).min(len) }),
        InsertKind::LineEnd => (line, len),
        InsertKind::LineStart => (line, 0),
        InsertKind::OpenBelow => (ops::open_line(buf, line, true), 0),
        InsertKind::OpenAbove => (ops::open_line(buf, line, false), 0),
    };
    match text {
        None => Ok(NormalOutcome {
            col,
            message: None,
            enter_insert: true,
        }),
        Some(text) => {
            if text.contains('\n') {
                return Err(EditorError::InvalidArgument("line break in inline text".into()));
            }
            let end = ops::insert_text(buf, Position::new(line, col), text);
            Ok(NormalOutcome::at(end.saturating_sub(1)))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::Register;
    use pretty_assertions::assert_eq;

    fn five() -> Buffer {
        Buffer::from_lines(&["line 1", "line 2", "line 3", "line 4", "line 5"])
    }

    fn texts(buf: &Buffer) -> Vec<&str> {
        buf.lines().iter().map(String::as_str).collect()
    }

    fn run_on(buf: &mut Buffer, regs: &mut RegisterFile, input: &str) -> NormalOutcome {
        run(input, buf, regs, 0).unwrap()
    }

    // -- Parsing --------------------------------------------------------------

    #[test]
    fn parse_incomplete_prefixes() {
        for input in ["", "d", "3", "\"", "\"a", "d3", "g", "m", "'", "2\"a", "y"] {
            assert_eq!(parse(input), Parsed::Incomplete, "{input:?}");
        }
    }

    #[test]
    fn parse_invalid() {
        for input in ["dz", "q", "\"!", "m1", "'A", "d3x"] {
            assert!(matches!(parse(input), Parsed::Invalid(_)), "{input:?}");
        }
    }

    #[test]
    fn parse_counts_and_registers() {
        assert_eq!(
            parse("3\"add"),
            Parsed::Complete(NormalCommand::Edit {
                count: Some(3),
                register: Some('a'),
                action: Action::DeleteLines,
            })
        );
        assert_eq!(
            parse("2d3d"),
            Parsed::Complete(NormalCommand::Edit {
                count: Some(6),
                register: None,
                action: Action::DeleteLines,
            })
        );
        assert_eq!(
            parse("0"),
            Parsed::Complete(NormalCommand::edit(Action::Move(Motion::LineStart)))
        );
    }

    #[test]
    fn parse_goto_forms() {
        assert_eq!(parse("5G"), Parsed::Complete(NormalCommand::GotoLine(5)));
        assert_eq!(
            parse("2G3dd"),
            Parsed::Complete(NormalCommand::Sequence(vec![
                NormalCommand::GotoLine(2),
                NormalCommand::Edit {
                    count: Some(3),
                    register: None,
                    action: Action::DeleteLines,
                },
            ]))
        );
        assert!(matches!(parse("Gdd"), Parsed::Complete(NormalCommand::Sequence(_))));
    }

    #[test]
    fn parse_inline_insert() {
        assert_eq!(
            parse("iHello"),
            Parsed::Complete(NormalCommand::edit(Action::Insert {
                kind: InsertKind::Before,
                text: Some("Hello".into()),
            }))
        );
        assert_eq!(
            parse("o"),
            Parsed::Complete(NormalCommand::edit(Action::Insert {
                kind: InsertKind::OpenBelow,
                text: None,
            }))
        );
    }

    // -- Lines ----------------------------------------------------------------

    #[test]
    fn dd_with_count_and_report() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        buf.set_current_line(1);
        let out = run_on(&mut buf, &mut regs, "3dd");
        assert_eq!(texts(&buf), ["line 1", "line 5"]);
        assert_eq!(out.message.as_deref(), Some("3 fewer lines"));
        assert_eq!(buf.current_line(), 1);
    }

    #[test]
    fn dd_count_past_end_is_cut() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        buf.set_current_line(3);
        run_on(&mut buf, &mut regs, "9dd");
        assert_eq!(texts(&buf), ["line 1", "line 2", "line 3"]);
    }

    #[test]
    fn yank_and_put() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        run_on(&mut buf, &mut regs, "\"ayy");
        run_on(&mut buf, &mut regs, "G");
        run_on(&mut buf, &mut regs, "\"ap");
        assert_eq!(buf.line(5), Some("line 1"));
        assert_eq!(buf.current_line(), 5);
    }

    #[test]
    fn goto_line_out_of_range() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        assert!(matches!(run("9G", &mut buf, &mut regs, 0), Err(EditorError::LineOutOfRange(9))));
        assert_eq!(buf.current_line(), 0);
    }

    #[test]
    fn goto_then_operator() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        run_on(&mut buf, &mut regs, "2G2dd");
        assert_eq!(texts(&buf), ["line 1", "line 4", "line 5"]);
    }

    #[test]
    fn huge_counts_are_clamped() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        buf.set_current_line(1);
        let out = run_on(&mut buf, &mut regs, &format!("{}dd", usize::MAX));
        assert_eq!(texts(&buf), ["line 1"]);
        assert_eq!(out.message.as_deref(), Some("4 fewer lines"));

        run_on(&mut buf, &mut regs, &format!("{}x", usize::MAX));
        assert_eq!(texts(&buf), [""]);
        assert!(matches!(
            run(&format!("{}p", usize::MAX), &mut buf, &mut regs, 0),
            Err(EditorError::TextTooLong)
        ));
        assert_eq!(texts(&buf), [""]);
    }

    #[test]
    fn huge_motion_counts_stop_at_the_buffer_end() {
        let mut buf = Buffer::from_lines(&["one two", "three"]);
        let mut regs = RegisterFile::new();
        let out = run_on(&mut buf, &mut regs, &format!("{}w", usize::MAX));
        assert_eq!((buf.current_line(), out.col), (1, 0));
        buf.set_current_line(0);
        run(&format!("{}cw", usize::MAX), &mut buf, &mut regs, 0).unwrap();
        assert_eq!(texts(&buf), ["", "three"]);
    }

    // -- Marks ----------------------------------------------------------------

    #[test]
    fn mark_set_and_jump() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        buf.set_current_line(3);
        run_on(&mut buf, &mut regs, "ma");
        buf.set_current_line(0);
        run_on(&mut buf, &mut regs, "'a");
        assert_eq!(buf.current_line(), 3);
    }

    #[test]
    fn unset_mark_fails_and_changes_nothing() {
        let mut buf = five();
        let before = buf.clone();
        let mut regs = RegisterFile::new();
        assert!(matches!(run("'z", &mut buf, &mut regs, 0), Err(EditorError::MarkNotSet('z'))));
        assert_eq!(buf, before);
    }

    #[test]
    fn mark_then_rest_uses_mark_when_set() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        buf.set_mark('b', 2).unwrap();
        run_on(&mut buf, &mut regs, "'bdd");
        assert_eq!(texts(&buf), ["line 1", "line 2", "line 4", "line 5"]);
    }

    #[test]
    fn mark_then_rest_falls_back_to_register() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        regs.record_delete(Some('a'), Register::linewise(vec!["line 2".into()]));
        regs.record_yank(None, Register::linewise(vec!["other".into()]));
        run_on(&mut buf, &mut regs, "G");
        run_on(&mut buf, &mut regs, "'ap");
        assert_eq!(buf.line(5), Some("line 2"));
    }

    // -- Motions --------------------------------------------------------------

    #[test]
    fn motions() {
        let mut buf = Buffer::from_lines(&["  indented text", "short", "last line here"]);
        let mut regs = RegisterFile::new();
        assert_eq!(run("^", &mut buf, &mut regs, 0).unwrap().col, 2);
        assert_eq!(run("$", &mut buf, &mut regs, 0).unwrap().col, 14);
        assert_eq!(run("w", &mut buf, &mut regs, 2).unwrap().col, 11);
        assert_eq!(run("j", &mut buf, &mut regs, 14).unwrap().col, 4);
        assert_eq!(buf.current_line(), 1);
        assert_eq!(run("k", &mut buf, &mut regs, 4).unwrap().col, 4);
        assert_eq!(run("3l", &mut buf, &mut regs, 0).unwrap().col, 3);
        assert_eq!(run("h", &mut buf, &mut regs, 3).unwrap().col, 2);
        run("G", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.current_line(), 2);
        run("gg", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.current_line(), 0);
        let out = run("b", &mut buf, &mut regs, 11).unwrap();
        assert_eq!(out.col, 2);
    }

    #[test]
    fn word_motion_wraps_lines() {
        let mut buf = Buffer::from_lines(&["one two", "three"]);
        let mut regs = RegisterFile::new();
        let out = run("2w", &mut buf, &mut regs, 0).unwrap();
        assert_eq!((buf.current_line(), out.col), (1, 0));
        let out = run("b", &mut buf, &mut regs, 0).unwrap();
        assert_eq!((buf.current_line(), out.col), (0, 4));
    }

    // -- Char-wise edits ----------------------------------------------------

    #[test]
    fn x_and_dw() {
        let mut buf = Buffer::from_lines(&["hello big world"]);
        let mut regs = RegisterFile::new();
        run("x", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.line(0), Some("ello big world"));
        run("dw", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.line(0), Some("big world"));
        run("d2w", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.line(0), Some(""));
    }

    #[test]
    fn dw_on_last_word_stops_at_line_end() {
        let mut buf = Buffer::from_lines(&["a last", "next"]);
        let mut regs = RegisterFile::new();
        let out = run("dw", &mut buf, &mut regs, 2).unwrap();
        assert_eq!(texts(&buf), ["a ", "next"]);
        assert_eq!(out.col, 1);
    }

    #[test]
    fn cw_changes_to_word_end() {
        let mut buf = Buffer::from_lines(&["foo bar"]);
        let mut regs = RegisterFile::new();
        let out = run("cw", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.line(0), Some(" bar"));
        assert!(out.enter_insert);
        assert_eq!(regs.get(None).unwrap().text(), "foo");
    }

    #[test]
    fn cc_clears_line_and_inserts() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        let out = run_on(&mut buf, &mut regs, "cc");
        assert!(out.enter_insert);
        assert_eq!(buf.line(0), Some(""));
        assert_eq!(regs.get(Some('1')).unwrap().lines(), ["line 1"]);
    }

    #[test]
    fn charwise_put_is_inline() {
        let mut buf = Buffer::from_lines(&["ab"]);
        let mut regs = RegisterFile::new();
        run("x", &mut buf, &mut regs, 0).unwrap();
        run("p", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.line(0), Some("ba"));
    }

    // -- Inserts ----------------------------------------------------------------

    #[test]
    fn inline_insert_variants() {
        let mut buf = Buffer::from_lines(&["line 1"]);
        let mut regs = RegisterFile::new();
        run("iHello", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.line(0), Some("Helloline 1"));
        run("A!", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(buf.line(0), Some("Helloline 1!"));
        run("onew", &mut buf, &mut regs, 0).unwrap();
        run("Otop", &mut buf, &mut regs, 0).unwrap();
        assert_eq!(texts(&buf), ["Helloline 1!", "top", "new"]);
    }

    #[test]
    fn insert_positions_for_interactive_entry() {
        let mut buf = Buffer::from_lines(&["abc"]);
        let mut regs = RegisterFile::new();
        assert_eq!(run("a", &mut buf, &mut regs, 2).unwrap().col, 3);
        assert_eq!(run("a", &mut buf, &mut regs, 0).unwrap().col, 1);
        assert_eq!(run("A", &mut buf, &mut regs, 0).unwrap().col, 3);
        assert_eq!(run("I", &mut buf, &mut regs, 2).unwrap().col, 0);
        assert!(run("i", &mut buf, &mut regs, 1).unwrap().enter_insert);
    }

    #[test]
    fn unsupported_text_is_reported() {
        let mut buf = five();
        let mut regs = RegisterFile::new();
        assert!(matches!(
            run("zz", &mut buf, &mut regs, 0),
            Err(EditorError::UnsupportedCommand(s)) if s == "zz"
        ));
    }
}
