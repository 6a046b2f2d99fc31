//! Text buffer: one file's lines plus cursor line, marks and metadata.
//!
//! A `Buffer` holds its text as a vector of lines without terminators. The
//! line-oriented model is what every Ex command addresses, and it makes
//! mark bookkeeping on structural edits a matter of index arithmetic.
//!
//! # Invariants
//!
//! - There is always at least one line. An empty file is one empty line.
//! - `current_line < line_count()` after every operation.
//! - Every mark references a valid line. Removing a line removes its marks;
//!   removing lines above a mark shifts it up by the removed count.
//!
//! # Line endings
//!
//! Loading splits on `\r\n` and `\n` uniformly, records the dominant style,
//! and remembers whether the file ended with a newline. Writing joins with
//! the recorded style and restores the final newline, so a file round-trips
//! byte for byte.
//!
//! Structural mutation goes through the `pub(crate)` primitives at the
//! bottom of this file. They are called from [`ops`](crate::ops) only.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{EditorError, Result};
use crate::host::FileStore;
use crate::position::LineRange;
use crate::register::{Register, RegisterFile};

// ---------------------------------------------------------------------------
// Line ending detection
// ---------------------------------------------------------------------------

/// Line ending style of a file. Defaults to `Lf` for new buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\n`: Unix, macOS, Linux.
    #[default]
    Lf,
    /// `\r\n`: Windows, DOS.
    CrLf,
}

impl LineEnding {
    /// The string representation of this line ending.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Detect the dominant line ending by counting both styles. Ties and
    /// text without line breaks give `Lf`.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let total = text.matches('\n').count();
        let crlf = text.matches("\r\n").count();
        if crlf > total - crlf {
            Self::CrLf
        } else {
            Self::Lf
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("unix"),
            Self::CrLf => f.write_str("dos"),
        }
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// An in-memory editable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    path: Option<PathBuf>,
    lines: Vec<String>,
    current_line: usize,
    modified: bool,
    marks: BTreeMap<char, usize>,
    line_ending: LineEnding,
    /// The file ended with a line ending when loaded.
    eol: bool,
    /// Created blank because the file did not exist; cleared once written
    /// with content.
    new_file: bool,
    /// Register chosen by a bare `"x` / `:"x`, consumed by the next
    /// register-taking operation.
    last_register: Option<char>,
    last_search: Option<String>,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create a buffer from lines. An empty `lines` becomes one empty line.
    #[must_use]
    pub fn create(path: Option<PathBuf>, lines: Vec<String>, line_ending: LineEnding) -> Self {
        let lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        };
        Self {
            path,
            lines,
            current_line: 0,
            modified: false,
            marks: BTreeMap::new(),
            line_ending,
            eol: true,
            new_file: false,
            last_register: None,
            last_search: None,
        }
    }

    /// Convenience for tests and hosts: a path-less buffer from string slices.
    #[must_use]
    pub fn from_lines(lines: &[&str]) -> Self {
        Self::create(
            None,
            lines.iter().map(ToString::to_string).collect(),
            LineEnding::Lf,
        )
    }

    /// Parse file text into a buffer.
    ///
    /// Splits on `\r\n`/`\n` uniformly and drops the one trailing empty line
    /// produced by a final newline.
    #[must_use]
    pub fn from_text(path: Option<PathBuf>, text: &str) -> Self {
        let line_ending = LineEnding::detect(text);
        let eol = text.ends_with('\n');
        let mut lines: Vec<String> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        if eol {
            lines.pop();
        }
        let mut buf = Self::create(path, lines, line_ending);
        buf.eol = eol;
        buf
    }

    /// Load a buffer from the file store. A missing file yields a single
    /// blank line, flagged as a new file.
    ///
    /// # Errors
    ///
    /// Propagates read failures other than "not found".
    pub fn load(path: &Path, store: &dyn FileStore) -> Result<Self> {
        if let Some(text) = store.load(path)? {
            let buf = Self::from_text(Some(path.to_path_buf()), &text);
            info!(path = %path.display(), lines = buf.line_count(), "loaded buffer");
            Ok(buf)
        } else {
            info!(path = %path.display(), "new file");
            let mut buf = Self::create(Some(path.to_path_buf()), Vec::new(), LineEnding::Lf);
            buf.new_file = true;
            Ok(buf)
        }
    }

    /// Serialize the lines with the recorded line ending.
    #[must_use]
    pub fn to_text(&self) -> String {
        let ending = self.line_ending.as_str();
        let mut text = self.lines.join(ending);
        if self.eol && !(self.new_file && self.is_blank()) {
            text.push_str(ending);
        }
        text
    }

    /// Write to the buffer's own path and clear the modified flag. Returns
    /// the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`EditorError::NoFileName`] without a path; store failures otherwise.
    pub fn write(&mut self, store: &dyn FileStore) -> Result<usize> {
        let path = self.path.clone().ok_or(EditorError::NoFileName)?;
        let bytes = self.write_to(&path, store)?;
        self.modified = false;
        if !self.is_blank() {
            self.new_file = false;
        }
        Ok(bytes)
    }

    /// Write a copy to `path` without touching the modified flag.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub fn write_to(&self, path: &Path, store: &dyn FileStore) -> Result<usize> {
        let text = self.to_text();
        store.write(path, &text)?;
        info!(path = %path.display(), bytes = text.len(), "wrote buffer");
        Ok(text.len())
    }

    // -- Text access --------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// A line by 0-indexed number.
    #[inline]
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(String::as_str)
    }

    /// Total number of lines. Never zero.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Index of the last line.
    #[inline]
    #[must_use]
    pub fn last_line(&self) -> usize {
        self.lines.len() - 1
    }

    /// Number of chars (not bytes) in a line; 0 for a missing line.
    #[must_use]
    pub fn line_len(&self, line: usize) -> usize {
        self.line(line).map_or(0, |l| l.chars().count())
    }

    /// True when the buffer is a single empty line.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    // -- Metadata -----------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    /// File name for messages, `[No Name]` without a path.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .map_or_else(|| "[No Name]".to_string(), |p| p.display().to_string())
    }

    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    pub const fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    #[inline]
    #[must_use]
    pub const fn is_new_file(&self) -> bool {
        self.new_file
    }

    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    // -- Cursor line --------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn current_line(&self) -> usize {
        self.current_line
    }

    /// Move the cursor line, clamped to the buffer.
    pub fn set_current_line(&mut self, line: usize) {
        self.current_line = line.min(self.last_line());
    }

    // -- Marks --------------------------------------------------------------

    /// Bind mark `name` (`a`-`z`) to `line`.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidArgument`] for a non-letter name,
    /// [`EditorError::LineOutOfRange`] for a line past the end.
    pub fn set_mark(&mut self, name: char, line: usize) -> Result<()> {
        if !name.is_ascii_lowercase() {
            return Err(EditorError::InvalidArgument(format!("mark name: {name}")));
        }
        if line >= self.lines.len() {
            return Err(EditorError::LineOutOfRange(line + 1));
        }
        self.marks.insert(name, line);
        Ok(())
    }

    /// The line a mark points to, if set.
    #[must_use]
    pub fn mark(&self, name: char) -> Option<usize> {
        self.marks.get(&name).copied()
    }

    /// All marks, alphabetically.
    #[must_use]
    pub fn marks(&self) -> Vec<(char, usize)> {
        self.marks.iter().map(|(&k, &v)| (k, v)).collect()
    }

    // -- Registers ----------------------------------------------------------

    /// Read a register as this buffer sees it: `%` is the buffer's path,
    /// everything else comes from the shared register file.
    #[must_use]
    pub fn read_register(&self, regs: &RegisterFile, name: Option<char>) -> Option<Register> {
        match name {
            Some('%') => Some(
                self.path
                    .as_deref()
                    .map_or_else(Register::new, |p| Register::charwise(p.display().to_string())),
            ),
            other => regs.get(other).cloned(),
        }
    }

    /// Remember a register selected without an operator.
    pub const fn select_register(&mut self, name: char) {
        self.last_register = Some(name);
    }

    /// The register to use for an operation: the explicit one, else the
    /// pending selection (consumed).
    pub fn take_register(&mut self, explicit: Option<char>) -> Option<char> {
        match explicit {
            Some(name) => {
                self.last_register = None;
                Some(name)
            }
            None => self.last_register.take(),
        }
    }

    #[must_use]
    pub const fn last_register(&self) -> Option<char> {
        self.last_register
    }

    // -- Search memory ------------------------------------------------------

    #[must_use]
    pub fn last_search(&self) -> Option<&str> {
        self.last_search.as_deref()
    }

    pub fn set_last_search(&mut self, pattern: &str) {
        self.last_search = Some(pattern.to_string());
    }

    // -- Structural primitives (ops only) -----------------------------------

    /// Mutable access to one line's text. Marks the buffer modified.
    pub(crate) fn line_mut(&mut self, line: usize) -> &mut String {
        self.modified = true;
        &mut self.lines[line]
    }

    /// Remove `range`, returning the removed lines.
    ///
    /// Marks inside the range are dropped, marks below shift up. The cursor
    /// moves to `min(start, len-1)` if it was inside, up by the count if it
    /// was below. Removing every line leaves one empty line.
    pub(crate) fn remove_lines(&mut self, range: LineRange) -> Vec<String> {
        let count = range.len();
        let removed: Vec<String> = self.lines.drain(range.start..=range.end).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }

        self.marks.retain(|_, line| !range.contains(*line));
        for line in self.marks.values_mut() {
            if *line > range.end {
                *line -= count;
            }
        }

        if range.contains(self.current_line) {
            self.current_line = range.start.min(self.last_line());
        } else if self.current_line > range.end {
            self.current_line -= count;
        }

        self.modified = true;
        removed
    }

    /// Insert `new` so that its first line lands at index `at`
    /// (`0..=line_count()`). Marks and cursor at or below `at` shift down.
    pub(crate) fn insert_lines(&mut self, at: usize, new: Vec<String>) {
        let count = new.len();
        if count == 0 {
            return;
        }
        let at = at.min(self.lines.len());
        self.lines.splice(at..at, new);
        for line in self.marks.values_mut() {
            if *line >= at {
                *line += count;
            }
        }
        if self.current_line >= at {
            self.current_line += count;
        }
        self.modified = true;
    }

    /// Replace `range` with `new` (possibly a different number of lines).
    ///
    /// Marks inside the range survive while their offset still falls within
    /// the replacement; marks below shift by the size difference.
    pub(crate) fn replace_lines(&mut self, range: LineRange, new: Vec<String>) {
        let old_len = range.len();
        let new_len = new.len();
        self.lines.splice(range.start..=range.end, new);
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }

        self.marks
            .retain(|_, line| !range.contains(*line) || *line - range.start < new_len);
        for line in self.marks.values_mut() {
            if *line > range.end {
                *line = *line + new_len - old_len;
            }
        }

        if self.current_line > range.end {
            self.current_line = self.current_line + new_len - old_len;
        }
        self.current_line = self.current_line.min(self.last_line());
        self.modified = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
