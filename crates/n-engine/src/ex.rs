//! Ex command execution.
//!
//! [`execute`] runs one parsed [`ExCommand`] against the [`Editor`]. Ranges
//! are resolved here, against the buffer that is current when the command
//! runs. Every variant is handled in one match, so a new command cannot be
//! parsed without also being executed.

use std::path::Path;

use tracing::{debug, info};

use crate::buffer::Buffer;
use crate::command::{ExCommand, GlobalAction, ReadSource};
use crate::editor::{Editor, LastSubstitute};
use crate::error::{EditorError, Result};
use crate::host::FileStore;
use crate::normal::{self, first_non_blank};
use crate::ops::{self, SubFlags};
use crate::position::LineRange;
use crate::range::RangeSpec;
use crate::register::{Register, RegisterKind};

/// What running an Ex command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExOutcome {
    pub message: Option<String>,
    pub quit: bool,
    /// The cursor column afterwards.
    pub col: usize,
}

impl ExOutcome {
    const fn at(col: usize) -> Self {
        Self {
            message: None,
            quit: false,
            col,
        }
    }

    fn said(col: usize, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            quit: false,
            col,
        }
    }

    const fn quit() -> Self {
        Self {
            message: None,
            quit: true,
            col: 0,
        }
    }

    /// A line-count report, shown only above two lines like Vim's 'report'.
    fn report(col: usize, count: usize, what: &str) -> Self {
        Self {
            message: (count > 2).then(|| format!("{count} {what}")),
            quit: false,
            col,
        }
    }
}

/// Column of the first non-blank on the current line.
fn home(buf: &Buffer) -> usize {
    first_non_blank(buf, buf.current_line())
}

fn whole(buf: &Buffer) -> LineRange {
    LineRange::new(0, buf.last_line())
}

fn current(buf: &Buffer) -> LineRange {
    LineRange::line(buf.current_line())
}

/// Run a parsed Ex command with the cursor at `col`.
///
/// # Errors
///
/// Any [`EditorError`]; the session turns them into narration.
pub fn execute(cmd: &ExCommand, editor: &mut Editor, col: usize) -> Result<ExOutcome> {
    debug!(?cmd, "ex");
    match cmd {
        ExCommand::Goto(range) => {
            let buf = editor.buffers.current_mut();
            let target = range.resolve(buf, &editor.options, current(buf))?;
            buf.set_current_line(target.end);
            Ok(ExOutcome::at(home(buf)))
        }

        // -- Files ------------------------------------------------------------
        ExCommand::Edit { path, force } => edit(editor, path.as_deref(), *force),
        ExCommand::Write { path, .. } => write(editor, path.as_deref(), col),
        ExCommand::WriteQuit { path } => {
            write(editor, path.as_deref(), col)?;
            check_quit(editor)?;
            Ok(ExOutcome::quit())
        }
        ExCommand::Exit => {
            if editor.buffer().is_modified() {
                write(editor, None, col)?;
            }
            check_quit(editor)?;
            Ok(ExOutcome::quit())
        }
        ExCommand::Quit { force } => {
            if !force {
                check_quit(editor)?;
            }
            Ok(ExOutcome::quit())
        }
        ExCommand::SaveAs(path) => {
            let resolved = editor.resolve(path)?;
            let buf = editor.buffers.current_mut();
            buf.set_path(resolved);
            let message = write_current(buf, editor.host.files.as_ref())?;
            Ok(ExOutcome::said(col, message))
        }
        ExCommand::Read { range, source } => read(editor, range, source),

        // -- Buffer list ------------------------------------------------------
        ExCommand::BufferNext => {
            editor.buffers.next_buffer();
            Ok(ExOutcome::said(home(editor.buffer()), position_info(editor.buffer())))
        }
        ExCommand::BufferPrev => {
            editor.buffers.prev_buffer();
            Ok(ExOutcome::said(home(editor.buffer()), position_info(editor.buffer())))
        }
        ExCommand::SwitchBuffer(reference) => {
            editor.buffers.switch(reference)?;
            Ok(ExOutcome::said(home(editor.buffer()), position_info(editor.buffer())))
        }
        ExCommand::ListBuffers => {
            let rows: Vec<String> = editor
                .buffers
                .entries()
                .iter()
                .map(ToString::to_string)
                .collect();
            Ok(ExOutcome::said(col, rows.join("\n")))
        }

        // -- Registers and marks --------------------------------------------
        ExCommand::Registers(names) => Ok(ExOutcome::said(col, registers(editor, names))),
        ExCommand::SetMark { range, name } => {
            let buf = editor.buffers.current_mut();
            let line = range.resolve(buf, &editor.options, current(buf))?.end;
            buf.set_mark(*name, line)?;
            Ok(ExOutcome::at(col))
        }
        ExCommand::AtMark {
            mark,
            then,
            otherwise,
        } => {
            let buf = editor.buffers.current_mut();
            if let Some(line) = buf.mark(*mark) {
                buf.set_current_line(line);
                execute(then, editor, col)
            } else {
                execute(otherwise, editor, col)
            }
        }
        ExCommand::WithRegister { name, then } => {
            editor.buffers.current_mut().select_register(*name);
            match then {
                Some(then) => execute(then, editor, col),
                None => Ok(ExOutcome::at(col)),
            }
        }

        // -- Line operations ------------------------------------------------
        ExCommand::Delete {
            range,
            register,
            count,
        } => {
            let target = line_range(editor, range, *count)?;
            let buf = editor.buffers.current_mut();
            let n = ops::delete_lines(buf, &mut editor.registers, target, *register)?;
            Ok(ExOutcome::report(home(buf), n, "fewer lines"))
        }
        ExCommand::Yank {
            range,
            register,
            count,
        } => {
            let target = line_range(editor, range, *count)?;
            let buf = editor.buffers.current_mut();
            let n = ops::yank_lines(buf, &mut editor.registers, target, *register)?;
            Ok(ExOutcome::report(col, n, "lines yanked"))
        }
        ExCommand::Put {
            range,
            register,
            before,
        } => {
            let buf = editor.buffers.current_mut();
            let line = range.resolve(buf, &editor.options, current(buf))?.end;
            buf.set_current_line(line);
            let n = ops::put_lines(buf, &editor.registers, *before, *register, 1)?;
            Ok(ExOutcome::report(home(buf), n, "more lines"))
        }

        // -- Patterns -----------------------------------------------------------
        ExCommand::Substitute {
            range,
            pattern,
            replacement,
            flags,
        } => substitute(editor, range, pattern, replacement, *flags),
        ExCommand::SubRepeat { range, flags } => {
            let last = editor
                .last_substitute
                .clone()
                .ok_or(EditorError::NoPreviousSubstitute)?;
            let flags = flags.unwrap_or(last.flags);
            substitute(editor, range, &last.pattern, &last.replacement, flags)
        }
        ExCommand::Global {
            range,
            pattern,
            inverse,
            action,
        } => global(editor, range, pattern, *inverse, action),

        // -- Normal keys and shell ------------------------------------------
        ExCommand::Normal { range, keys } => {
            let buf = editor.buffers.current_mut();
            if range.is_default() {
                let outcome = normal::run(keys, buf, &mut editor.registers, col)?;
                return Ok(ExOutcome {
                    message: outcome.message,
                    quit: false,
                    col: outcome.col,
                });
            }
            let target = range.resolve(buf, &editor.options, current(buf))?;
            let mut col = col;
            // Lines are visited by number, as Vim does; deletions make it
            // skip lines rather than revisit them.
            let mut line = target.start;
            while line <= target.end && line < buf.line_count() {
                buf.set_current_line(line);
                col = normal::run(keys, buf, &mut editor.registers, 0)?.col;
                line += 1;
            }
            Ok(ExOutcome::at(col))
        }
        ExCommand::Filter { range, command } => {
            let cwd = editor.cwd().to_path_buf();
            if range.is_default() {
                let output = ops::run_shell(editor.host.shell.as_ref(), command, "", &cwd)?;
                return Ok(ExOutcome {
                    message: (!output.is_empty()).then(|| output.join("\n")),
                    quit: false,
                    col,
                });
            }
            let buf = editor.buffers.current_mut();
            let target = range.resolve(buf, &editor.options, current(buf))?;
            ops::filter_lines(buf, target, command, editor.host.shell.as_ref(), &cwd)?;
            Ok(ExOutcome::report(home(buf), target.len(), "lines filtered"))
        }
        ExCommand::Set(args) => {
            let shown = editor.options.apply_set(args)?;
            Ok(ExOutcome {
                message: shown,
                quit: false,
                col,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

fn check_quit(editor: &Editor) -> Result<()> {
    match editor.buffers.first_modified() {
        Some(name) => Err(EditorError::ModifiedBufferOnQuit(name)),
        None => Ok(()),
    }
}

/// `"name" 3L, 20B` (or `[New]`) after loading.
fn load_info(buf: &Buffer) -> String {
    let name = buf.display_name();
    if buf.is_new_file() {
        format!("\"{name}\" [New]")
    } else {
        format!("\"{name}\" {}L, {}B", buf.line_count(), buf.to_text().len())
    }
}

/// `"name" line 3 of 5` after switching buffers.
fn position_info(buf: &Buffer) -> String {
    let modified = if buf.is_modified() { " [Modified]" } else { "" };
    format!(
        "\"{}\"{modified} line {} of {}",
        buf.display_name(),
        buf.current_line() + 1,
        buf.line_count()
    )
}

fn write_current(buf: &mut Buffer, store: &dyn FileStore) -> Result<String> {
    let new = if buf.is_new_file() { " [New]" } else { "" };
    let bytes = buf.write(store)?;
    Ok(format!(
        "\"{}\"{new} {}L, {bytes}B written",
        buf.display_name(),
        buf.line_count()
    ))
}

fn edit(editor: &mut Editor, path: Option<&Path>, force: bool) -> Result<ExOutcome> {
    let target = match path {
        Some(p) => editor.resolve(p)?,
        None => editor
            .buffer()
            .path()
            .map(Path::to_path_buf)
            .ok_or(EditorError::NoFileName)?,
    };
    if editor.buffer().path() == Some(target.as_path()) {
        let buf = editor.buffer();
        if buf.is_modified() && !force {
            return Err(EditorError::ModifiedBufferOnQuit(buf.display_name()));
        }
        let reloaded = Buffer::load(&target, editor.host.files.as_ref())?;
        editor.buffers.replace_current(reloaded);
    } else {
        editor.buffers.open(&target, editor.host.files.as_ref())?;
    }
    info!(path = %target.display(), "edit");
    Ok(ExOutcome::said(home(editor.buffer()), load_info(editor.buffer())))
}

/// `:w` and `:w path`. Writing to another path leaves the buffer modified,
/// unless the buffer had no name, in which case it takes that one.
fn write(editor: &mut Editor, path: Option<&Path>, col: usize) -> Result<ExOutcome> {
    let target = path.map(|p| editor.resolve(p)).transpose()?;
    let store = editor.host.files.as_ref();
    let buf = editor.buffers.current_mut();
    let message = match target {
        Some(target) if buf.path().is_some_and(|own| own != target) => {
            let bytes = buf.write_to(&target, store)?;
            format!("\"{}\" {}L, {bytes}B written", target.display(), buf.line_count())
        }
        Some(target) => {
            buf.set_path(target);
            write_current(buf, store)?
        }
        None => write_current(buf, store)?,
    };
    Ok(ExOutcome::said(col, message))
}

fn read(editor: &mut Editor, range: &RangeSpec, source: &ReadSource) -> Result<ExOutcome> {
    let (lines, message) = match source {
        ReadSource::File(path) => {
            let path = match path {
                Some(p) => editor.resolve(p)?,
                None => editor
                    .buffer()
                    .path()
                    .map(Path::to_path_buf)
                    .ok_or(EditorError::NoFileName)?,
            };
            let text = editor
                .host
                .files
                .load(&path)?
                .ok_or_else(|| EditorError::CannotOpen(path.clone()))?;
            let lines = if text.is_empty() {
                Vec::new()
            } else {
                Buffer::from_text(None, &text).lines().to_vec()
            };
            let message = format!("\"{}\" {}L, {}B", path.display(), lines.len(), text.len());
            (lines, Some(message))
        }
        ReadSource::Shell(command) => {
            let cwd = editor.cwd().to_path_buf();
            let lines = ops::run_shell(editor.host.shell.as_ref(), command, "", &cwd)?;
            (lines, None)
        }
    };
    let buf = editor.buffers.current_mut();
    let after = range.resolve(buf, &editor.options, current(buf))?.end;
    ops::append_lines(buf, after, lines);
    Ok(ExOutcome {
        message,
        quit: false,
        col: home(buf),
    })
}

// ---------------------------------------------------------------------------
// Registers and marks
// ---------------------------------------------------------------------------

/// Register content as `:reg` shows it, line breaks as `^J`.
fn render(content: &Register) -> String {
    let mut text = content.lines().join("^J");
    if content.kind() == RegisterKind::Line {
        text.push_str("^J");
    }
    text
}

fn registers(editor: &Editor, names: &str) -> String {
    let wanted = |name: char| names.is_empty() || names.contains(name);
    let mut rows = vec!["--- Registers ---".to_string()];
    rows.extend(
        editor
            .registers
            .dump()
            .iter()
            .filter(|(name, _)| wanted(*name))
            .map(|(name, content)| format!("\"{name}   {}", render(content))),
    );
    if let Some(path) = editor.buffer().path().filter(|_| wanted('%')) {
        rows.push(format!("\"%   {}", path.display()));
    }
    rows.join("\n")
}

// ---------------------------------------------------------------------------
// Line and pattern operations
// ---------------------------------------------------------------------------

/// Resolve the range of `:d`/`:y`. A count makes it that many lines from
/// the range's last line, cut at the buffer end.
fn line_range(editor: &Editor, range: &RangeSpec, count: Option<usize>) -> Result<LineRange> {
    let buf = editor.buffer();
    let target = range.resolve(buf, &editor.options, current(buf))?;
    Ok(match count {
        Some(n) => {
            let end = target.end.saturating_add(n.max(1) - 1);
            LineRange::new(target.end, end.min(buf.last_line()))
        }
        None => target,
    })
}

fn substitute(
    editor: &mut Editor,
    range: &RangeSpec,
    pattern: &str,
    replacement: &str,
    flags: SubFlags,
) -> Result<ExOutcome> {
    let buf = editor.buffers.current_mut();
    let target = range.resolve(buf, &editor.options, current(buf))?;
    let count = ops::substitute(buf, target, pattern, replacement, flags, &editor.options)?;
    let shown = buf.last_search().unwrap_or(pattern).to_string();
    let col = home(buf);
    editor.last_substitute = Some(LastSubstitute {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
        flags,
    });
    if count == 0 {
        return Err(EditorError::PatternNotFound(shown));
    }
    if flags.contains(SubFlags::COUNT_ONLY) {
        let noun = if count == 1 { "match" } else { "matches" };
        return Ok(ExOutcome::said(col, format!("{count} {noun}")));
    }
    Ok(ExOutcome::report(col, count, "substitutions"))
}

fn global(
    editor: &mut Editor,
    range: &RangeSpec,
    pattern: &str,
    inverse: bool,
    action: &GlobalAction,
) -> Result<ExOutcome> {
    let Editor {
        buffers,
        registers,
        options,
        last_substitute,
        ..
    } = editor;
    let options = &*options;
    let buf = buffers.current_mut();
    let target = range.resolve(buf, options, whole(buf))?;
    let before = buf.line_count();
    if let GlobalAction::Substitute {
        pattern,
        replacement,
        flags,
    } = action
    {
        // `:&` after `:g` repeats the inner substitution.
        *last_substitute = Some(LastSubstitute {
            pattern: pattern.clone(),
            replacement: replacement.clone(),
            flags: *flags,
        });
    }

    ops::global(buf, target, pattern, inverse, options, |b| {
        let line = LineRange::line(b.current_line());
        match action {
            GlobalAction::Delete => ops::delete_lines(b, registers, line, None).map(drop),
            // A line the action's own pattern misses is not an error here.
            GlobalAction::Substitute {
                pattern,
                replacement,
                flags,
            } => ops::substitute(b, line, pattern, replacement, *flags, options).map(drop),
            GlobalAction::Normal(keys) => normal::run(keys, b, registers, 0).map(drop),
        }
    })?;

    let removed = before.saturating_sub(buf.line_count());
    Ok(ExOutcome::report(home(buf), removed, "fewer lines"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
