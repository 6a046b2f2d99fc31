//! The mode state machine: the engine's single entry point.
//!
//! A [`Session`] receives one [`Key`] at a time through
//! [`process_key`](Session::process_key) and routes it by mode:
//!
//! | Mode        | Key               | Effect                                       |
//! |-------------|-------------------|----------------------------------------------|
//! | Normal      | `:`               | enter command-line mode                      |
//! | Normal      | anything else     | extend the pending keys; run once complete   |
//! | Normal      | `<Esc>`           | drop pending keys (keeping a `"x` selection) |
//! | Insert      | printable         | insert at the cursor                         |
//! | Insert      | `<CR>`            | split the line                               |
//! | Insert      | `<BS>`            | delete left, joining lines at column 0       |
//! | Insert      | `<Tab>`           | insert `softtabstop` spaces                  |
//! | Insert      | `<Esc>`           | back to normal, cursor one left              |
//! | CommandLine | `<CR>`            | run the Ex command, back to normal           |
//! | CommandLine | `<Esc>`           | discard, back to normal                      |
//!
//! Command failures never escape: they become the step's output text. Only
//! fatal I/O errors ([`EditorError::is_fatal`]) are returned as `Err`.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::buffer::{Buffer, LineEnding};
use crate::buffers::{BufferEntry, BufferId};
use crate::command::{self, CommandLine};
use crate::editor::Editor;
use crate::error::{EditorError, Result};
use crate::ex;
use crate::host::Host;
use crate::key::{Key, parse_notation};
use crate::mode::Mode;
use crate::normal::{self, NormalCommand, Parsed};
use crate::ops;
use crate::options::Options;
use crate::position::Position;
use crate::register::{Register, is_valid_name};

/// What one key produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Narration: messages, listings and error text. Empty when silent.
    pub output: String,
    pub mode_changed: bool,
    /// The session asked to end (`:q`, `:wq`, `:x`).
    pub quit: bool,
}

/// A snapshot for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub mode: Mode,
    pub cursor: Position,
    pub buffer: BufferId,
}

/// Per-session modal state. The cursor line lives in the buffer; only the
/// column is kept here.
#[derive(Debug, Default)]
struct ModeState {
    mode: Mode,
    col: usize,
    /// Normal-mode keys typed so far for an incomplete command.
    pending: String,
    cmdline: CommandLine,
}

#[derive(Debug, Default)]
struct Reply {
    text: Option<String>,
    quit: bool,
}

impl Reply {
    const fn say(text: Option<String>) -> Self {
        Self { text, quit: false }
    }
}

/// Turn a command failure into narration, or pass a fatal one through.
fn narrate(err: EditorError) -> Result<Reply> {
    if err.is_fatal() {
        return Err(err);
    }
    match err {
        EditorError::ModifiedBufferOnQuit(_) | EditorError::FilterFailed(_) => warn!(%err),
        _ => debug!(%err, "command failed"),
    }
    Ok(Reply::say(Some(err.to_string())))
}

/// An editing session.
#[derive(Debug)]
pub struct Session {
    editor: Editor,
    state: ModeState,
}

impl Session {
    /// A session on one empty, unnamed buffer.
    #[must_use]
    pub fn new(host: Host, options: Options) -> Self {
        Self::with_buffer(Buffer::create(None, Vec::new(), LineEnding::Lf), host, options)
    }

    #[must_use]
    pub fn with_buffer(buffer: Buffer, host: Host, options: Options) -> Self {
        Self {
            editor: Editor::new(buffer, host, options),
            state: ModeState::default(),
        }
    }

    /// A session on the file at `path` (resolved inside the project root).
    ///
    /// # Errors
    ///
    /// [`EditorError::AccessDenied`] and read failures.
    pub fn open(path: &Path, host: Host, options: Options) -> Result<Self> {
        let resolved = host.paths.resolve(path)?;
        let buffer = Buffer::load(&resolved, host.files.as_ref())?;
        Ok(Self::with_buffer(buffer, host, options))
    }

    // -- Queries ------------------------------------------------------------

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.state.mode
    }

    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        self.editor.buffer()
    }

    #[must_use]
    pub const fn editor(&self) -> &Editor {
        &self.editor
    }

    pub const fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    /// The command line as displayed, while in command-line mode.
    #[must_use]
    pub fn command_line(&self) -> Option<String> {
        (self.state.mode == Mode::CommandLine).then(|| self.state.cmdline.display())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        let buf = self.editor.buffer();
        SessionState {
            mode: self.state.mode,
            cursor: Position::new(buf.current_line(), self.state.col),
            buffer: self.editor.buffers.current_id(),
        }
    }

    /// Install `buffer` as the current buffer. It shares the session's
    /// registers; a buffer for an already-open path replaces that entry.
    pub fn set_buffer(&mut self, buffer: Buffer) -> BufferId {
        let id = self.editor.buffers.install(buffer);
        self.state.col = 0;
        self.state.pending.clear();
        info!(%id, "buffer set by host");
        id
    }

    #[must_use]
    pub fn buffer_list(&self) -> Vec<BufferEntry> {
        self.editor.buffers.entries()
    }

    /// Every non-empty register, then `%` when the buffer has a path.
    #[must_use]
    pub fn register_dump(&self) -> Vec<(char, Register)> {
        let mut dump = self.editor.registers.dump();
        if let Some(path) = self.editor.buffer().path() {
            dump.push(('%', Register::charwise(path.display().to_string())));
        }
        dump
    }

    #[must_use]
    pub fn mark_dump(&self) -> Vec<(char, usize)> {
        self.editor.buffer().marks()
    }

    // -- Input --------------------------------------------------------------

    /// Feed one key.
    ///
    /// # Errors
    ///
    /// Only fatal I/O errors; every other failure is narrated in the step.
    pub fn process_key(&mut self, key: Key) -> Result<Step> {
        let before = self.state.mode;
        let reply = match before {
            Mode::Normal => self.normal_key(key)?,
            Mode::Insert => self.insert_key(key),
            Mode::CommandLine => self.command_key(key)?,
        };
        let mode_changed = self.state.mode != before;
        if mode_changed {
            debug!(from = %before, to = %self.state.mode, "mode");
        }
        if reply.quit {
            info!("quit requested");
        }
        Ok(Step {
            output: reply.text.unwrap_or_default(),
            mode_changed,
            quit: reply.quit,
        })
    }

    /// Feed a key-notation script such as `"iHello<Esc>:w<CR>"`.
    ///
    /// # Errors
    ///
    /// The first fatal error; keys after it are not processed.
    pub fn feed(&mut self, script: &str) -> Result<Vec<Step>> {
        parse_notation(script)
            .into_iter()
            .map(|key| self.process_key(key))
            .collect()
    }

    // -- Normal mode ----------------------------------------------------------

    fn normal_key(&mut self, key: Key) -> Result<Reply> {
        let ch = match key {
            Key::Char(ch) => ch,
            Key::Escape => {
                self.cancel_pending();
                return Ok(Reply::default());
            }
            Key::Backspace if self.state.pending.is_empty() => 'h',
            Key::Enter if self.state.pending.is_empty() => 'j',
            Key::Enter | Key::Tab | Key::Backspace => return Ok(Reply::default()),
        };

        if ch == ':' && self.state.pending.is_empty() {
            self.state.mode = Mode::CommandLine;
            self.state.cmdline.clear();
            return Ok(Reply::default());
        }

        self.state.pending.push(ch);
        match normal::parse(&self.state.pending) {
            Parsed::Incomplete => Ok(Reply::default()),
            Parsed::Invalid(text) => {
                self.state.pending.clear();
                narrate(EditorError::UnsupportedCommand(text))
            }
            Parsed::Complete(cmd) => {
                self.state.pending.clear();
                self.run_normal(&cmd)
            }
        }
    }

    /// `<Esc>` with keys pending. A register chosen with `"x` stays
    /// selected for the next operation.
    fn cancel_pending(&mut self) {
        let pending = std::mem::take(&mut self.state.pending);
        let selected = pending
            .split_once('"')
            .and_then(|(_, after)| after.chars().next())
            .filter(|c| is_valid_name(*c));
        if let Some(name) = selected {
            self.editor.buffer_mut().select_register(name);
        }
    }

    fn run_normal(&mut self, cmd: &NormalCommand) -> Result<Reply> {
        let Editor {
            buffers, registers, ..
        } = &mut self.editor;
        match normal::execute(cmd, buffers.current_mut(), registers, self.state.col) {
            Ok(outcome) => {
                self.state.col = outcome.col;
                if outcome.enter_insert {
                    self.state.mode = Mode::Insert;
                }
                Ok(Reply::say(outcome.message))
            }
            Err(err) => narrate(err),
        }
    }

    // -- Insert mode ----------------------------------------------------------

    fn insert_key(&mut self, key: Key) -> Reply {
        let softtabstop = self.editor.options.softtabstop;
        let buf = self.editor.buffer_mut();
        let pos = Position::new(buf.current_line(), self.state.col);
        match key {
            Key::Escape => {
                self.state.mode = Mode::Normal;
                let last = buf.line_len(pos.line).saturating_sub(1);
                self.state.col = pos.col.saturating_sub(1).min(last);
            }
            Key::Enter => {
                ops::split_line(buf, pos);
                self.state.col = 0;
            }
            Key::Backspace => {
                if let Some(to) = ops::backspace(buf, pos) {
                    self.state.col = to.col;
                }
            }
            Key::Tab => {
                self.state.col = ops::insert_text(buf, pos, &" ".repeat(softtabstop));
            }
            Key::Char(ch) => {
                self.state.col = ops::insert_text(buf, pos, ch.encode_utf8(&mut [0; 4]));
            }
        }
        Reply::default()
    }

    // -- Command-line mode ----------------------------------------------------

    fn command_key(&mut self, key: Key) -> Result<Reply> {
        match key {
            Key::Escape => {
                self.state.mode = Mode::Normal;
                self.state.cmdline.clear();
                Ok(Reply::say(Some("cancelled".to_string())))
            }
            Key::Enter => {
                self.state.mode = Mode::Normal;
                let text = self.state.cmdline.take();
                if text.trim().is_empty() {
                    return Ok(Reply::default());
                }
                self.run_ex(&text)
            }
            Key::Backspace => {
                self.state.cmdline.backspace();
                Ok(Reply::default())
            }
            Key::Tab => {
                self.state.cmdline.insert_char('\t');
                Ok(Reply::default())
            }
            Key::Char(ch) => {
                self.state.cmdline.insert_char(ch);
                Ok(Reply::default())
            }
        }
    }

    fn run_ex(&mut self, text: &str) -> Result<Reply> {
        debug!(command = text, "ex command");
        let col = self.state.col;
        let result = command::parse(text).and_then(|cmd| ex::execute(&cmd, &mut self.editor, col));
        match result {
            Ok(outcome) => {
                self.state.col = outcome.col;
                Ok(Reply {
                    text: outcome.message,
                    quit: outcome.quit,
                })
            }
            Err(err) => narrate(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FileStore, FnShell, MemoryStore, ProjectRoot, ShellOutput};
    use pretty_assertions::assert_eq;
    use std::io;

    fn host() -> (Host, MemoryStore) {
        let store = MemoryStore::new();
        let shell = FnShell(|cmd: &str, stdin: &str| match cmd {
            "rev" => Ok(ShellOutput {
                stdout: stdin
                    .lines()
                    .map(|l| format!("{}\n", l.chars().rev().collect::<String>()))
                    .collect(),
                stderr: String::new(),
                status: Some(0),
            }),
            _ => Ok(ShellOutput {
                stdout: String::new(),
                stderr: "not found".into(),
                status: Some(127),
            }),
        });
        (Host::new(store.clone(), shell, ProjectRoot::new("/p")), store)
    }

    fn session(lines: &[&str]) -> Session {
        let (host, _) = host();
        Session::with_buffer(Buffer::from_lines(lines), host, Options::default())
    }

    fn five() -> Session {
        session(&["line 1", "line 2", "line 3", "line 4", "line 5"])
    }

    fn texts(s: &Session) -> Vec<String> {
        s.buffer().lines().to_vec()
    }

    /// Output of the last step of a script.
    fn last_output(s: &mut Session, script: &str) -> String {
        s.feed(script).unwrap().pop().unwrap_or_default().output
    }

    // -- Scenarios --------------------------------------------------------------

    #[test]
    fn scenario_range_delete() {
        let mut s = five();
        s.feed(":2,4d<CR>").unwrap();
        assert_eq!(texts(&s), ["line 1", "line 5"]);
    }

    #[test]
    fn scenario_register_through_mark_syntax() {
        let mut s = five();
        s.feed(":2d a<CR>G'ap").unwrap();
        assert_eq!(texts(&s), ["line 1", "line 3", "line 4", "line 5", "line 2"]);
    }

    #[test]
    fn scenario_insert_text() {
        let mut s = five();
        let steps = s.feed("iHello<Esc>").unwrap();
        assert_eq!(s.buffer().line(0), Some("Helloline 1"));
        assert_eq!(s.mode(), Mode::Normal);
        assert!(steps[0].mode_changed && steps.last().unwrap().mode_changed);
        assert_eq!(s.state().cursor, Position::new(0, 4));
    }

    #[test]
    fn bare_insert_keys_enter_insert_mode() {
        let cases: [(char, Position, &[&str]); 6] = [
            ('i', Position::new(0, 1), &["abc"]),
            ('a', Position::new(0, 2), &["abc"]),
            ('A', Position::new(0, 3), &["abc"]),
            ('I', Position::new(0, 0), &["abc"]),
            ('o', Position::new(1, 0), &["abc", ""]),
            ('O', Position::new(0, 0), &["", "abc"]),
        ];
        for (key, cursor, lines) in cases {
            let mut s = session(&["abc"]);
            s.feed("l").unwrap();
            let step = s.process_key(Key::Char(key)).unwrap();
            assert!(step.mode_changed, "{key}");
            assert_eq!(s.mode(), Mode::Insert, "{key}");
            assert_eq!(s.state().cursor, cursor, "{key}");
            assert_eq!(texts(&s), lines, "{key}");
        }
    }

    #[test]
    fn scenario_substitute() {
        let mut s = session(&["apple", "banana", "apple pie"]);
        s.feed(":%s/apple/APPLE/g<CR>").unwrap();
        assert_eq!(texts(&s), ["APPLE", "banana", "APPLE pie"]);
        assert_eq!(last_output(&mut s, ":%s/APPLE//n<CR>"), "2 matches");
    }

    #[test]
    fn scenario_global_delete() {
        let mut s = session(&["apple", "banana", "apple pie", "cherry"]);
        s.feed(":g/apple/d<CR>").unwrap();
        assert_eq!(texts(&s), ["banana", "cherry"]);
    }

    #[test]
    fn scenario_unset_mark() {
        let mut s = five();
        let output = last_output(&mut s, "'z");
        assert_eq!(output, "E20: Mark not set: 'z");
        assert_eq!(texts(&s).len(), 5);
        assert!(!s.buffer().is_modified());
        assert_eq!(last_output(&mut s, ":'z<CR>"), "E20: Mark not set: 'z");
    }

    // -- Normal mode ------------------------------------------------------------

    #[test]
    fn pending_keys_wait_for_completion() {
        let mut s = five();
        let steps = s.feed("2d").unwrap();
        assert!(steps.iter().all(|st| st.output.is_empty()));
        assert_eq!(texts(&s).len(), 5);
        s.feed("d").unwrap();
        assert_eq!(texts(&s), ["line 3", "line 4", "line 5"]);
    }

    #[test]
    fn invalid_keys_are_narrated_and_cleared() {
        let mut s = five();
        assert_eq!(last_output(&mut s, "dz"), "E1: Unsupported command: dz");
        s.feed("dd").unwrap();
        assert_eq!(texts(&s)[0], "line 2");
    }

    #[test]
    fn escape_keeps_selected_register() {
        let mut s = five();
        s.feed("\"b<Esc>dd").unwrap();
        assert_eq!(s.editor().registers.get(Some('b')).unwrap().lines(), ["line 1"]);
    }

    #[test]
    fn marks_and_jumps() {
        let mut s = five();
        s.feed("3Gmajj'a").unwrap();
        assert_eq!(s.state().cursor.line, 2);
        assert_eq!(s.mark_dump(), [('a', 2)]);
    }

    #[test]
    fn open_line_and_change() {
        let mut s = session(&["one two"]);
        s.feed("onew<Esc>").unwrap();
        assert_eq!(texts(&s), ["one two", "new"]);
        s.feed("k0cwfour<Esc>").unwrap();
        assert_eq!(texts(&s), ["four two", "new"]);
    }

    #[test]
    fn yank_put_across_buffers() {
        let (host, store) = host();
        store.insert("/p/b.txt", "other\n");
        let mut s = Session::with_buffer(Buffer::from_lines(&["shared"]), host, Options::default());
        s.feed("yy:e b.txt<CR>p").unwrap();
        assert_eq!(texts(&s), ["other", "shared"]);
        assert_eq!(s.buffer_list().len(), 2);
    }

    // -- Insert mode --------------------------------------------------------------

    #[test]
    fn insert_enter_backspace_tab() {
        let mut s = session(&["abcd"]);
        s.feed("lli<CR>").unwrap();
        assert_eq!(texts(&s), ["ab", "cd"]);
        assert_eq!(s.state().cursor, Position::new(1, 0));
        s.feed("<BS>").unwrap();
        assert_eq!(texts(&s), ["abcd"]);
        assert_eq!(s.state().cursor, Position::new(0, 2));
        s.feed("<Tab><Esc>").unwrap();
        assert_eq!(texts(&s), ["ab  cd"]);
        assert_eq!(s.state().cursor, Position::new(0, 3));
    }

    #[test]
    fn escape_at_column_zero_stays() {
        let mut s = session(&["x"]);
        s.feed("I<Esc>").unwrap();
        assert_eq!(s.state().cursor.col, 0);
    }

    #[test]
    fn softtabstop_option() {
        let mut s = session(&[""]);
        s.feed(":set sts=4<CR>i<Tab>x<Esc>").unwrap();
        assert_eq!(s.buffer().line(0), Some("    x"));
    }

    // -- Command-line mode ------------------------------------------------------

    #[test]
    fn command_line_editing_and_cancel() {
        let mut s = five();
        s.feed(":2x<BS>d").unwrap();
        assert_eq!(s.command_line().as_deref(), Some(":2d"));
        let steps = s.feed("<Esc>").unwrap();
        assert_eq!(steps[0].output, "cancelled");
        assert!(steps[0].mode_changed);
        assert_eq!(texts(&s).len(), 5);
    }

    #[test]
    fn backspace_on_bare_colon_stays() {
        let mut s = five();
        s.feed(":<BS><BS>").unwrap();
        assert_eq!(s.mode(), Mode::CommandLine);
    }

    #[test]
    fn errors_return_to_normal() {
        let mut s = five();
        let output = last_output(&mut s, ":frobnicate<CR>");
        assert_eq!(output, "E492: Not an editor command: frobnicate");
        assert_eq!(s.mode(), Mode::Normal);
        let output = last_output(&mut s, ":9,2d<CR>");
        assert!(output.starts_with("E16"));
        assert_eq!(texts(&s).len(), 5);
    }

    #[test]
    fn failed_filter_leaves_buffer() {
        let mut s = five();
        let output = last_output(&mut s, ":%!nope<CR>");
        assert!(output.starts_with("E485"));
        assert_eq!(texts(&s).len(), 5);
        s.feed(":1!rev<CR>").unwrap();
        assert_eq!(texts(&s)[0], "1 enil");
    }

    /// A store whose disk is always full.
    struct FullStore;

    impl FileStore for FullStore {
        fn load(&self, _path: &Path) -> io::Result<Option<String>> {
            Ok(None)
        }

        fn write(&self, _path: &Path, _text: &str) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::StorageFull))
        }
    }

    #[test]
    fn fatal_errors_propagate() {
        let shell = FnShell(|_: &str, _: &str| Ok(ShellOutput::default()));
        let host = Host::new(FullStore, shell, ProjectRoot::new("/p"));
        let mut s = Session::with_buffer(Buffer::from_lines(&["x"]), host, Options::default());
        let err = s.feed(":w /p/x.txt<CR>").unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(s.mode(), Mode::Normal);
    }

    #[test]
    fn quit_refuses_modified_buffer() {
        let mut s = five();
        s.feed("dd").unwrap();
        let steps = s.feed(":q<CR>").unwrap();
        assert!(!steps.last().unwrap().quit);
        assert!(steps.last().unwrap().output.starts_with("E37"));
        assert!(s.feed(":q!<CR>").unwrap().last().unwrap().quit);
    }

    #[test]
    fn global_normal_partial_failure() {
        let mut s = session(&["a1", "b", "a2", "a3"]);
        let output = last_output(&mut s, ":g/a/norm 3Gdd<CR>");
        assert!(output.starts_with("E16"));
        assert_eq!(texts(&s), ["a1", "b"]);
    }

    #[test]
    fn state_and_dumps() {
        let (host, store) = host();
        store.insert("/p/f.txt", "x\n");
        let mut s = Session::open(Path::new("f.txt"), host, Options::default()).unwrap();
        s.feed("yy").unwrap();
        let dump = s.register_dump();
        assert!(dump.iter().any(|(n, r)| *n == '0' && r.lines() == ["x"]));
        assert_eq!(dump.last().unwrap().0, '%');
        let id = s.set_buffer(Buffer::from_lines(&["fresh"]));
        assert_eq!(s.state().buffer, id);
        assert_eq!(s.state().cursor, Position::new(0, 0));
    }
}
