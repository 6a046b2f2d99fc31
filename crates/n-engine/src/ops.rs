//! Text operations: every mutation of buffer text goes through here.
//!
//! Line operations (`delete_lines`, `yank_lines`, `put_lines`) work on
//! whole lines and talk to the register file. `substitute`, `global` and
//! `filter_lines` are the Ex building blocks. The insert-mode and
//! character-wise primitives at the bottom back the state machine and the
//! normal-mode interpreter.
//!
//! Register-taking operations resolve their register through
//! [`Buffer::take_register`], so a register selected earlier with a bare
//! `"x` is consumed by the next one of them.

use std::path::Path;

use bitflags::bitflags;
use tracing::{debug, warn};

use crate::buffer::Buffer;
use crate::error::{EditorError, Result};
use crate::host::ShellRunner;
use crate::options::Options;
use crate::position::{LineRange, Position};
use crate::register::{Register, RegisterFile, RegisterKind, is_valid_name, is_writable_name};
use crate::search;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Byte offset of char column `col` in `line`, clamped to the line end.
fn byte_of(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

fn check_writable(name: Option<char>) -> Result<()> {
    match name {
        Some(ch) if !is_writable_name(ch) => {
            Err(EditorError::InvalidArgument(format!("register: {ch}")))
        }
        _ => Ok(()),
    }
}

fn check_range(buf: &Buffer, range: LineRange) -> Result<()> {
    if range.end >= buf.line_count() {
        return Err(EditorError::LineOutOfRange(range.end + 1));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Line operations
// ---------------------------------------------------------------------------

/// Delete `range` into a register. Returns the number of lines removed.
///
/// The unnamed register and the numbered chain always receive the text;
/// `reg` (or the pending selection) receives it too.
///
/// # Errors
///
/// [`EditorError::LineOutOfRange`] for a range past the end,
/// [`EditorError::InvalidArgument`] for a read-only register.
pub fn delete_lines(
    buf: &mut Buffer,
    regs: &mut RegisterFile,
    range: LineRange,
    reg: Option<char>,
) -> Result<usize> {
    check_range(buf, range)?;
    let target = buf.take_register(reg);
    check_writable(target)?;
    let removed = buf.remove_lines(range);
    let count = removed.len();
    regs.record_delete(target, Register::linewise(removed));
    debug!(%range, ?target, count, "delete lines");
    Ok(count)
}

/// Copy `range` into a register without touching the buffer text, marks,
/// cursor or modified flag. Returns the number of lines yanked.
///
/// # Errors
///
/// As for [`delete_lines`].
pub fn yank_lines(
    buf: &mut Buffer,
    regs: &mut RegisterFile,
    range: LineRange,
    reg: Option<char>,
) -> Result<usize> {
    check_range(buf, range)?;
    let target = buf.take_register(reg);
    check_writable(target)?;
    let lines = buf.lines()[range.start..=range.end].to_vec();
    regs.record_yank(target, Register::linewise(lines));
    Ok(range.len())
}

/// Fetch a register for putting, failing on unknown names and empty slots.
fn fetch(buf: &mut Buffer, regs: &RegisterFile, reg: Option<char>) -> Result<Register> {
    let name = buf.take_register(reg);
    if let Some(ch) = name.filter(|c| !is_valid_name(*c)) {
        return Err(EditorError::InvalidArgument(format!("register: {ch}")));
    }
    let content = buf.read_register(regs, name).unwrap_or_default();
    if content.is_empty() {
        return Err(EditorError::EmptyRegister(name.unwrap_or('"')));
    }
    Ok(content)
}

/// Most lines (or chars, for inline puts) a single counted put may create.
pub const MAX_PUT_SIZE: usize = 1 << 24;

/// Size of `unit` repeated `count` times, refused past [`MAX_PUT_SIZE`].
fn put_size(unit: usize, count: usize) -> Result<usize> {
    unit.checked_mul(count.max(1))
        .filter(|&size| size <= MAX_PUT_SIZE)
        .ok_or(EditorError::TextTooLong)
}

/// Put a register line-wise `count` times below (or `before`, above) the
/// current line. The cursor lands on the last inserted line after, the
/// first inserted line before. Returns the number of lines inserted.
///
/// Char-wise content is put as whole lines here; the normal-mode `p`
/// uses [`put_inline`] for it instead.
///
/// # Errors
///
/// [`EditorError::EmptyRegister`] when the register holds nothing and
/// [`EditorError::TextTooLong`] when `count` copies would be too large.
pub fn put_lines(
    buf: &mut Buffer,
    regs: &RegisterFile,
    before: bool,
    reg: Option<char>,
    count: usize,
) -> Result<usize> {
    let content = fetch(buf, regs, reg)?;
    put_size(content.lines().len(), count)?;
    let lines: Vec<String> = std::iter::repeat_n(content.lines(), count.max(1))
        .flatten()
        .cloned()
        .collect();
    let n = lines.len();
    let at = if before {
        buf.current_line()
    } else {
        buf.current_line() + 1
    };
    buf.insert_lines(at, lines);
    buf.set_current_line(if before { at } else { at + n - 1 });
    Ok(n)
}

/// Put a register char-wise into the current line, after (or `before`) the
/// char at `col`. Multi-line char-wise content splits the line. Returns the
/// column of the last inserted char.
///
/// # Errors
///
/// [`EditorError::EmptyRegister`] when the register holds nothing and
/// [`EditorError::TextTooLong`] when `count` copies would be too large.
pub fn put_inline(
    buf: &mut Buffer,
    regs: &RegisterFile,
    col: usize,
    before: bool,
    reg: Option<char>,
    count: usize,
) -> Result<usize> {
    let content = fetch(buf, regs, reg)?;
    let unit = content.text();
    put_size(unit.len(), count)?;
    let text = unit.repeat(count.max(1));
    let line = buf.current_line();
    let len = buf.line_len(line);
    let at = if before || len == 0 { col.min(len) } else { (col + 1).min(len) };

    let current = buf.line(line).unwrap_or_default().to_string();
    let split = byte_of(&current, at);
    let joined = format!("{}{text}{}", &current[..split], &current[split..]);
    let new_lines: Vec<String> = joined.split('\n').map(str::to_string).collect();
    let last_piece = new_lines.len() - 1;
    let tail_chars = current[split..].chars().count();
    let end_col = new_lines[last_piece].chars().count().saturating_sub(tail_chars + 1);
    buf.replace_lines(LineRange::line(line), new_lines);
    buf.set_current_line(line + last_piece);
    Ok(end_col)
}

// ---------------------------------------------------------------------------
// Substitute
// ---------------------------------------------------------------------------

bitflags! {
    /// `:s` flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct SubFlags: u8 {
        /// `g`: every match on a line, not just the first.
        const GLOBAL      = 0b0001;
        /// `i`: ignore case.
        const IGNORE_CASE = 0b0010;
        /// `I`: match case regardless of `ignorecase`.
        const MATCH_CASE  = 0b0100;
        /// `n`: count matches, change nothing.
        const COUNT_ONLY  = 0b1000;
    }
}

impl SubFlags {
    /// Parse a flag string; unknown characters are ignored, as in Vim.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        s.chars().fold(Self::empty(), |flags, ch| {
            flags
                | match ch {
                    'g' => Self::GLOBAL,
                    'i' => Self::IGNORE_CASE,
                    'I' => Self::MATCH_CASE,
                    'n' => Self::COUNT_ONLY,
                    _ => Self::empty(),
                }
        })
    }

    fn ignore_case(self, opts: &Options) -> bool {
        if self.contains(Self::IGNORE_CASE) {
            true
        } else if self.contains(Self::MATCH_CASE) {
            false
        } else {
            opts.ignorecase
        }
    }
}

/// Translate a Vim replacement string into `regex` expansion syntax.
///
/// `&` and `\0` are the whole match, `\1`-`\9` groups, `\&` a literal `&`,
/// `\t` a tab, `\r`/`\n` a line break, `\\` a backslash. A literal `$` is
/// escaped so the regex expander leaves it alone.
fn expand_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '&' => out.push_str("${0}"),
            '$' => out.push_str("$$"),
            '\\' => match chars.next() {
                Some(d @ '0'..='9') => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some('t') => out.push('\t'),
                Some('r' | 'n') => out.push('\n'),
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

/// Substitute `pattern` with `replacement` on every line of `range`.
///
/// Without [`SubFlags::GLOBAL`] only the first match per line is replaced.
/// Returns the number of replacements made (or counted, with
/// [`SubFlags::COUNT_ONLY`]). The buffer is marked modified only if at least
/// one replacement happened, and the cursor moves to the last changed line.
/// An empty `pattern` reuses the buffer's last search pattern.
///
/// # Errors
///
/// [`EditorError::InvalidPattern`] before any change is made;
/// [`EditorError::PatternNotFound`] for an empty pattern with no previous
/// search.
pub fn substitute(
    buf: &mut Buffer,
    range: LineRange,
    pattern: &str,
    replacement: &str,
    flags: SubFlags,
    opts: &Options,
) -> Result<usize> {
    check_range(buf, range)?;
    let pattern = if pattern.is_empty() {
        buf.last_search()
            .ok_or_else(|| EditorError::PatternNotFound(String::new()))?
            .to_string()
    } else {
        pattern.to_string()
    };
    let re = search::compile(&pattern, flags.ignore_case(opts))?;
    buf.set_last_search(&pattern);
    let expansion = expand_replacement(replacement);
    let global = flags.contains(SubFlags::GLOBAL);

    let mut total = 0;
    let mut shift = 0;
    let mut last_changed = None;
    for i in range.start..=range.end {
        let idx = i + shift;
        let Some(text) = buf.line(idx) else { break };
        let hits = if global {
            re.find_iter(text).count()
        } else {
            usize::from(re.is_match(text))
        };
        if hits == 0 {
            continue;
        }
        total += hits;
        if flags.contains(SubFlags::COUNT_ONLY) {
            continue;
        }
        let limit = if global { 0 } else { 1 };
        let new = re.replacen(text, limit, expansion.as_str()).into_owned();
        if new.contains('\n') {
            let pieces: Vec<String> = new.split('\n').map(str::to_string).collect();
            let extra = pieces.len() - 1;
            buf.replace_lines(LineRange::line(idx), pieces);
            shift += extra;
            last_changed = Some(idx + extra);
        } else {
            *buf.line_mut(idx) = new;
            last_changed = Some(idx);
        }
    }
    if let Some(line) = last_changed {
        buf.set_current_line(line);
    }
    debug!(%range, pattern = %pattern, total, "substitute");
    Ok(total)
}

// ---------------------------------------------------------------------------
// Global
// ---------------------------------------------------------------------------

/// Run `each` on every line of `range` matching `pattern` (or, with
/// `inverse`, not matching), highest line first so removals cannot shift lines still to
/// be visited. The current line is set to each target before `each` runs
/// and restored (clamped) afterwards. Returns how many lines were visited.
///
/// A failure from `each` stops the iteration; changes already made to
/// later lines are kept.
///
/// # Errors
///
/// [`EditorError::InvalidPattern`], [`EditorError::PatternNotFound`] when no
/// line qualifies, or the first error from `each`.
pub fn global<F>(
    buf: &mut Buffer,
    range: LineRange,
    pattern: &str,
    inverse: bool,
    opts: &Options,
    mut each: F,
) -> Result<usize>
where
    F: FnMut(&mut Buffer) -> Result<()>,
{
    let pattern = if pattern.is_empty() {
        buf.last_search()
            .ok_or_else(|| EditorError::PatternNotFound(String::new()))?
            .to_string()
    } else {
        pattern.to_string()
    };
    let re = search::compile(&pattern, opts.ignorecase)?;
    buf.set_last_search(&pattern);

    check_range(buf, range)?;
    let mut targets = search::matching_lines(buf, &re, inverse);
    targets.retain(|&line| range.contains(line));
    if targets.is_empty() {
        return Err(EditorError::PatternNotFound(pattern));
    }

    let original = buf.current_line();
    let mut executed = 0;
    for &line in targets.iter().rev() {
        if line >= buf.line_count() {
            continue;
        }
        buf.set_current_line(line);
        if let Err(e) = each(buf) {
            buf.set_current_line(original);
            return Err(e);
        }
        executed += 1;
    }
    buf.set_current_line(original);
    debug!(pattern = %pattern, inverse, executed, "global");
    Ok(executed)
}

// ---------------------------------------------------------------------------
// External commands
// ---------------------------------------------------------------------------

/// Run a shell command and return its stdout as lines (one trailing
/// newline dropped).
///
/// # Errors
///
/// [`EditorError::FilterFailed`] on spawn failure or non-zero exit.
pub fn run_shell(
    shell: &dyn ShellRunner,
    command: &str,
    stdin: &str,
    cwd: &Path,
) -> Result<Vec<String>> {
    let output = shell.run(command, stdin, cwd).map_err(|e| {
        warn!(command, error = %e, "shell command failed to run");
        EditorError::FilterFailed(format!("{command}: {e}"))
    })?;
    if !output.success() {
        let status = output
            .status
            .map_or_else(|| "killed by signal".to_string(), |c| format!("exit status {c}"));
        warn!(command, %status, "shell command failed");
        let detail = output.stderr.trim();
        return Err(EditorError::FilterFailed(if detail.is_empty() {
            format!("{command}: {status}")
        } else {
            format!("{command}: {status}: {detail}")
        }));
    }
    let stdout = output.stdout.strip_suffix('\n').unwrap_or(&output.stdout);
    if stdout.is_empty() && output.stdout.is_empty() {
        return Ok(Vec::new());
    }
    Ok(stdout
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect())
}

/// Pipe `range` through a shell command and replace it with the output.
/// The buffer is untouched if the command fails. Returns the number of
/// lines the range now holds.
///
/// # Errors
///
/// [`EditorError::FilterFailed`].
pub fn filter_lines(
    buf: &mut Buffer,
    range: LineRange,
    command: &str,
    shell: &dyn ShellRunner,
    cwd: &Path,
) -> Result<usize> {
    check_range(buf, range)?;
    let mut stdin = buf.lines()[range.start..=range.end].join("\n");
    stdin.push('\n');
    let output = run_shell(shell, command, &stdin, cwd)?;
    let count = output.len();
    buf.replace_lines(range, output);
    buf.set_current_line(range.start);
    Ok(count)
}

/// Insert `lines` below line `after` and move onto the first of them.
/// Returns how many lines were inserted.
pub fn append_lines(buf: &mut Buffer, after: usize, lines: Vec<String>) -> usize {
    let count = lines.len();
    if count > 0 {
        buf.insert_lines(after + 1, lines);
        buf.set_current_line(after + 1);
    }
    count
}

// ---------------------------------------------------------------------------
// Insert-mode primitives
// ---------------------------------------------------------------------------

/// Insert `text` (no line breaks) at `pos`. Returns the column after it.
pub fn insert_text(buf: &mut Buffer, pos: Position, text: &str) -> usize {
    let col = pos.col.min(buf.line_len(pos.line));
    let line = buf.line_mut(pos.line);
    let at = byte_of(line, col);
    line.insert_str(at, text);
    col + text.chars().count()
}

/// Break the line at `pos`; the tail moves to a new line below, which
/// becomes current.
pub fn split_line(buf: &mut Buffer, pos: Position) {
    let col = pos.col.min(buf.line_len(pos.line));
    let line = buf.line_mut(pos.line);
    let at = byte_of(line, col);
    let tail = line.split_off(at);
    buf.insert_lines(pos.line + 1, vec![tail]);
    buf.set_current_line(pos.line + 1);
}

/// Delete the char left of `pos`, or join with the previous line at column
/// 0. Returns the new cursor position, `None` at the start of the buffer.
pub fn backspace(buf: &mut Buffer, pos: Position) -> Option<Position> {
    let col = pos.col.min(buf.line_len(pos.line));
    if col > 0 {
        let line = buf.line_mut(pos.line);
        let at = byte_of(line, col - 1);
        line.remove(at);
        return Some(Position::new(pos.line, col - 1));
    }
    if pos.line == 0 {
        return None;
    }
    let prev = pos.line - 1;
    let join_col = buf.line_len(prev);
    let removed = buf.remove_lines(LineRange::line(pos.line));
    if let Some(text) = removed.first() {
        buf.line_mut(prev).push_str(text);
    }
    buf.set_current_line(prev);
    Some(Position::new(prev, join_col))
}

/// Open an empty line below (or above) `line` and move onto it. Returns
/// its index.
pub fn open_line(buf: &mut Buffer, line: usize, below: bool) -> usize {
    let at = if below { line + 1 } else { line };
    buf.insert_lines(at, vec![String::new()]);
    buf.set_current_line(at);
    at
}

// ---------------------------------------------------------------------------
// Char-wise deletes
// ---------------------------------------------------------------------------

/// Delete chars `[from, to)` of `line` into a register (char-wise, no
/// numbered-chain shift). Returns the deleted text.
///
/// # Errors
///
/// [`EditorError::InvalidArgument`] for a read-only register.
pub fn delete_span(
    buf: &mut Buffer,
    regs: &mut RegisterFile,
    line: usize,
    from: usize,
    to: usize,
    reg: Option<char>,
) -> Result<String> {
    let target = buf.take_register(reg);
    check_writable(target)?;
    let len = buf.line_len(line);
    let (from, to) = (from.min(len), to.min(len));
    if from >= to {
        return Ok(String::new());
    }
    let text = buf.line_mut(line);
    let (a, b) = (byte_of(text, from), byte_of(text, to));
    let removed: String = text.drain(a..b).collect();
    regs.set(target, Register::charwise(removed.clone()));
    Ok(removed)
}

/// Replace `range` with one empty line, saving the old text like a
/// line-wise delete (`cc`).
///
/// # Errors
///
/// As for [`delete_lines`].
pub fn change_lines(
    buf: &mut Buffer,
    regs: &mut RegisterFile,
    range: LineRange,
    reg: Option<char>,
) -> Result<()> {
    check_range(buf, range)?;
    let target = buf.take_register(reg);
    check_writable(target)?;
    let old = buf.lines()[range.start..=range.end].to_vec();
    buf.replace_lines(range, vec![String::new()]);
    buf.set_current_line(range.start);
    regs.record_delete(target, Register::linewise(old));
    Ok(())
}

/// True when the register content should be put inline.
#[must_use]
pub fn is_inline(content: &Register) -> bool {
    content.kind() == RegisterKind::Char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
