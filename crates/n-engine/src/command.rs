//! Command-line mode: the `:` prompt and the Ex command parser.
//!
//! [`CommandLine`] is the text typed after `:`. When Enter is pressed the
//! text goes through [`parse`], which produces an [`ExCommand`]. Ranges stay
//! unresolved ([`RangeSpec`]) until [`crate::ex::execute`] runs the command
//! against a buffer.
//!
//! # Resolution order
//!
//! 1. `'x{rest}`: run rest on the line of mark `x`, or as `"x{rest}` when
//!    the mark is not set.
//! 2. `"x{rest}`: select register `x` for the rest (`:"ap` puts it).
//! 3. A range prefix (`%`, `N,M`, `/pat/`, `'a;+2`, …).
//! 4. `s` / `&` substitution, `g` / `v` global, `!` filter. These take their
//!    argument without a separating space.
//! 5. A command name plus an optional `!` and whitespace-separated args.
//!
//! # Commands
//!
//! | Command                       | Action                                 |
//! |-------------------------------|----------------------------------------|
//! | `:e[!] [file]`                | Edit a file (`!` reloads, dropping changes) |
//! | `:w[!] [file]`, `:wq`, `:x`   | Write, write and quit, write if modified and quit |
//! | `:q[!]`                       | Quit                                   |
//! | `:bn`, `:bp`, `:ls`, `:b ref` | Buffer list navigation                 |
//! | `:r file`, `:r !cmd`          | Insert file or command output below    |
//! | `:saveas file`                | Write under a new name                 |
//! | `:reg [names]`                | Show registers                         |
//! | `:ma x`, `:k x`               | Set a mark                             |
//! | `:[range]d [x] [N]`           | Delete lines                           |
//! | `:[range]y [x] [N]`           | Yank lines                             |
//! | `:[line]pu[!] [x]`, `:P`      | Put lines below (`!`/`P`: above)        |
//! | `:[range]s/pat/rep/[flags]`   | Substitute                             |
//! | `:[range]s`, `:&`, `:&&`      | Repeat last substitution               |
//! | `:[range]g/pat/cmd`, `:v`     | Run `d`, `s` or `norm` on matching lines |
//! | `:[range]norm keys`           | Run normal-mode keys on each line      |
//! | `:[range]!cmd`                | Filter lines through a shell command   |
//! | `:set args`                   | Options                                |
//! | `:[range]`                    | Go to the last line of the range       |

use std::path::PathBuf;

use crate::error::{EditorError, Result};
use crate::ops::SubFlags;
use crate::range::{self, RangeSpec, split_at_unescaped, unescape_delim};
use crate::register::is_valid_name;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Where `:r` reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSource {
    /// A file; `None` rereads the buffer's own file.
    File(Option<PathBuf>),
    /// `:r !cmd`
    Shell(String),
}

/// What `:g` runs on each matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalAction {
    Delete,
    Substitute {
        pattern: String,
        replacement: String,
        flags: SubFlags,
    },
    Normal(String),
}

/// A parsed Ex command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExCommand {
    /// `:[range]` with nothing after it.
    Goto(RangeSpec),
    Edit {
        path: Option<PathBuf>,
        force: bool,
    },
    Write {
        path: Option<PathBuf>,
        force: bool,
    },
    WriteQuit {
        path: Option<PathBuf>,
    },
    /// `:x`: write if modified, then quit.
    Exit,
    Quit {
        force: bool,
    },
    BufferNext,
    BufferPrev,
    ListBuffers,
    /// `:b ref`: a 1-based buffer number or a file name fragment.
    SwitchBuffer(String),
    Read {
        range: RangeSpec,
        source: ReadSource,
    },
    SaveAs(PathBuf),
    /// `:reg [names]`: empty shows every non-empty register.
    Registers(String),
    SetMark {
        range: RangeSpec,
        name: char,
    },
    Delete {
        range: RangeSpec,
        register: Option<char>,
        count: Option<usize>,
    },
    Yank {
        range: RangeSpec,
        register: Option<char>,
        count: Option<usize>,
    },
    Put {
        range: RangeSpec,
        register: Option<char>,
        before: bool,
    },
    Substitute {
        range: RangeSpec,
        pattern: String,
        replacement: String,
        flags: SubFlags,
    },
    /// `:s`, `:&`, `:&&`: `None` keeps the last flags.
    SubRepeat {
        range: RangeSpec,
        flags: Option<SubFlags>,
    },
    Global {
        range: RangeSpec,
        pattern: String,
        inverse: bool,
        action: GlobalAction,
    },
    Normal {
        range: RangeSpec,
        keys: String,
    },
    /// `:[range]!cmd`; without a range the output is only shown.
    Filter {
        range: RangeSpec,
        command: String,
    },
    Set(String),
    /// `'x{rest}`
    AtMark {
        mark: char,
        then: Box<Self>,
        /// The `"x{rest}` reading, used when the mark is not set.
        otherwise: Box<Self>,
    },
    /// `"x{rest}`: select a register, then run rest (if any).
    WithRegister {
        name: char,
        then: Option<Box<Self>>,
    },
}

// ---------------------------------------------------------------------------
// CommandLine
// ---------------------------------------------------------------------------

/// The command-line input buffer.
///
/// Stores the text after the `:`, which is never part of `input` and so
/// cannot be erased by Backspace.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    input: String,
}

impl CommandLine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: String::new(),
        }
    }

    /// The typed text (without the leading `:`).
    #[inline]
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The line as displayed, `:` included.
    #[must_use]
    pub fn display(&self) -> String {
        format!(":{}", self.input)
    }

    pub fn insert_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    /// Delete the last char. Returns `false` when only `:` is left.
    pub fn backspace(&mut self) -> bool {
        self.input.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.input.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input.trim().is_empty()
    }

    /// Take the typed text, leaving the line empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.input)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse command text (leading `:` already stripped).
///
/// # Errors
///
/// [`EditorError::UnsupportedExCommand`] for unknown names,
/// [`EditorError::UnsupportedCommand`] for a `:g` action other than `d`,
/// `s` or `norm`, and [`EditorError::InvalidArgument`] for malformed
/// arguments.
pub fn parse(input: &str) -> Result<ExCommand> {
    let input = input.trim();

    if let Some(cmd) = parse_at_mark(input)? {
        return Ok(cmd);
    }

    if let Some(after) = input.strip_prefix('"') {
        let mut chars = after.chars();
        let name = chars
            .next()
            .filter(|c| is_valid_name(*c))
            .ok_or_else(|| EditorError::InvalidArgument(input.to_string()))?;
        let rest = chars.as_str().trim_start();
        let then = if rest.is_empty() {
            None
        } else {
            Some(Box::new(parse(rest)?))
        };
        return Ok(ExCommand::WithRegister { name, then });
    }

    let (range, rest) = range::parse_prefix(input);
    parse_command(range, rest.trim_start())
}

/// `'x{rest}` where rest is a command rather than more of a range.
fn parse_at_mark(input: &str) -> Result<Option<ExCommand>> {
    let Some(after) = input.strip_prefix('\'') else {
        return Ok(None);
    };
    let mut chars = after.chars();
    let Some(mark) = chars.next().filter(char::is_ascii_lowercase) else {
        return Ok(None);
    };
    let rest = chars.as_str().trim_start();
    if rest.is_empty() || rest.starts_with([',', ';', '+', '-']) {
        return Ok(None);
    }
    let then = parse(rest)?;
    let otherwise = parse(&format!("\"{mark}{rest}"))?;
    Ok(Some(ExCommand::AtMark {
        mark,
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    }))
}

fn parse_command(range: RangeSpec, rest: &str) -> Result<ExCommand> {
    if rest.is_empty() {
        return Ok(ExCommand::Goto(range));
    }

    // Commands whose argument follows without a space.
    if let Some(command) = rest.strip_prefix('!') {
        return Ok(ExCommand::Filter {
            range,
            command: command.trim().to_string(),
        });
    }
    if let Some(after) = rest.strip_prefix('&') {
        let flags = after.strip_prefix('&').map_or_else(
            || (!after.trim().is_empty()).then(|| SubFlags::parse(after.trim())),
            |_| None,
        );
        return Ok(ExCommand::SubRepeat { range, flags });
    }
    if let Some(after) = strip_substitute(rest) {
        return Ok(parse_substitute(range, after));
    }
    if let Some((inverse, body)) = strip_global(rest) {
        return parse_global(range, inverse, body);
    }

    let name_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (name, after) = rest.split_at(name_len);
    let (bang, args) = after
        .strip_prefix('!')
        .map_or((false, after.trim()), |a| (true, a.trim()));
    let path = (!args.is_empty()).then(|| PathBuf::from(args));

    let cmd = match name {
        "e" | "edit" => ExCommand::Edit { path, force: bang },
        "w" | "write" => {
            if args.starts_with('!') {
                return Err(EditorError::InvalidArgument(rest.to_string()));
            }
            ExCommand::Write { path, force: bang }
        }
        "wq" => ExCommand::WriteQuit { path },
        "x" | "xit" | "exit" => ExCommand::Exit,
        "q" | "quit" => ExCommand::Quit { force: bang },
        "bn" | "bnext" => ExCommand::BufferNext,
        "bp" | "bprev" | "bprevious" | "bN" | "bNext" => ExCommand::BufferPrev,
        "ls" | "buffers" | "files" => ExCommand::ListBuffers,
        "b" | "buffer" => {
            if args.is_empty() {
                return Err(EditorError::InvalidArgument("buffer".into()));
            }
            ExCommand::SwitchBuffer(args.to_string())
        }
        "r" | "read" => {
            let source = if bang {
                ReadSource::Shell(args.to_string())
            } else if let Some(command) = args.strip_prefix('!') {
                ReadSource::Shell(command.trim().to_string())
            } else {
                ReadSource::File(path)
            };
            ExCommand::Read { range, source }
        }
        "sav" | "saveas" => ExCommand::SaveAs(path.ok_or(EditorError::NoFileName)?),
        "reg" | "registers" | "di" | "display" => ExCommand::Registers(args.to_string()),
        "ma" | "mark" | "k" => ExCommand::SetMark {
            range,
            name: single_mark(args)?,
        },
        // `:ka` needs no space.
        _ if name.len() == 2 && name.starts_with('k') && args.is_empty() => ExCommand::SetMark {
            range,
            name: single_mark(&name[1..])?,
        },
        "d" | "delete" => {
            let (register, count) = register_and_count(args)?;
            ExCommand::Delete {
                range,
                register,
                count,
            }
        }
        "y" | "yank" => {
            let (register, count) = register_and_count(args)?;
            ExCommand::Yank {
                range,
                register,
                count,
            }
        }
        "p" | "pu" | "put" | "P" | "Put" => {
            let (register, _) = register_and_count(args)?;
            ExCommand::Put {
                range,
                register,
                before: bang || name.starts_with('P'),
            }
        }
        "norm" | "normal" => {
            if args.is_empty() {
                return Err(EditorError::InvalidArgument("normal".into()));
            }
            ExCommand::Normal {
                range,
                keys: args.to_string(),
            }
        }
        "se" | "set" => ExCommand::Set(args.to_string()),
        _ => return Err(EditorError::UnsupportedExCommand(name_or_text(name, rest))),
    };
    Ok(cmd)
}

fn name_or_text(name: &str, rest: &str) -> String {
    if name.is_empty() { rest } else { name }.to_string()
}

/// `s` followed by a delimiter or nothing (not `set`, `saveas`, …).
fn strip_substitute(rest: &str) -> Option<&str> {
    let after = rest
        .strip_prefix("substitute")
        .or_else(|| rest.strip_prefix('s'))?;
    match after.chars().next() {
        None => Some(after),
        Some(c) if is_delimiter(c) => Some(after),
        _ => None,
    }
}

/// `g`, `g!`, `v`, `global`, `vglobal` followed by an optional space and a
/// delimiter. Returns `(inverse, body)` with the body starting at the
/// delimiter.
fn strip_global(rest: &str) -> Option<(bool, &str)> {
    let (inverse, after) = ["global", "vglobal", "g", "v"]
        .iter()
        .find_map(|name| rest.strip_prefix(name).map(|a| (name.starts_with('v'), a)))?;
    let (inverse, after) = after.strip_prefix('!').map_or((inverse, after), |a| (true, a));
    let body = after.trim_start();
    body.chars().next().filter(|c| is_delimiter(*c))?;
    Some((inverse, body))
}

fn is_delimiter(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '\\' | '"' | '|')
}

/// Parse the body of `:s` (everything after the `s`).
///
/// Handles arbitrary delimiters and escaped delimiters (`s#a#b#g`,
/// `s/a\/b/c/`). A missing closing delimiter ends the part there. An empty
/// body repeats the last substitution.
fn parse_substitute(range: RangeSpec, body: &str) -> ExCommand {
    let mut chars = body.chars();
    let Some(delim) = chars.next() else {
        return ExCommand::SubRepeat { range, flags: None };
    };
    let after_delim = chars.as_str();

    let (pattern, rest) = split_at_unescaped(after_delim, delim).unwrap_or((after_delim, ""));
    let (replacement, flags) = split_at_unescaped(rest, delim).unwrap_or((rest, ""));

    ExCommand::Substitute {
        range,
        pattern: unescape_delim(pattern, delim),
        replacement: unescape_delim(replacement, delim),
        flags: SubFlags::parse(flags.trim()),
    }
}

fn parse_global(range: RangeSpec, inverse: bool, body: &str) -> Result<ExCommand> {
    let mut chars = body.chars();
    let delim = chars
        .next()
        .ok_or_else(|| EditorError::InvalidArgument("global".into()))?;
    let after_delim = chars.as_str();
    let (pattern, sub) = split_at_unescaped(after_delim, delim).unwrap_or((after_delim, ""));
    let action = parse_global_action(sub.trim())?;
    Ok(ExCommand::Global {
        range,
        pattern: unescape_delim(pattern, delim),
        inverse,
        action,
    })
}

/// The subcommand of `:g`. Only `d`, `s` and `norm` are supported; anything
/// else is rejected here, before any line is touched.
fn parse_global_action(sub: &str) -> Result<GlobalAction> {
    if matches!(sub, "d" | "delete") {
        return Ok(GlobalAction::Delete);
    }
    if let Some(ExCommand::Substitute {
        pattern,
        replacement,
        flags,
        ..
    }) = strip_substitute(sub)
        .filter(|body| !body.is_empty())
        .map(|body| parse_substitute(RangeSpec::Default, body))
    {
        return Ok(GlobalAction::Substitute {
            pattern,
            replacement,
            flags,
        });
    }
    for prefix in ["normal", "norm"] {
        if let Some(keys) = sub.strip_prefix(prefix) {
            let keys = keys.strip_prefix('!').unwrap_or(keys);
            if keys.starts_with(char::is_whitespace) && !keys.trim().is_empty() {
                return Ok(GlobalAction::Normal(keys.trim_start().to_string()));
            }
        }
    }
    Err(EditorError::UnsupportedCommand(sub.to_string()))
}

fn single_mark(args: &str) -> Result<char> {
    let mut chars = args.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Ok(c),
        _ => Err(EditorError::InvalidArgument(format!("mark: {args}"))),
    }
}

/// `[x] [N]` arguments of `:d`, `:y` and `:pu`.
fn register_and_count(args: &str) -> Result<(Option<char>, Option<usize>)> {
    let mut rest = args.trim();
    let mut register = None;
    if let Some(c) = rest.chars().next().filter(|c| !c.is_ascii_digit()) {
        if !is_valid_name(c) {
            return Err(EditorError::InvalidArgument(args.to_string()));
        }
        register = Some(c);
        rest = rest[c.len_utf8()..].trim_start();
    }
    if rest.is_empty() {
        return Ok((register, None));
    }
    match range::split_number(rest) {
        Some((n, "")) if n > 0 => Ok((register, Some(n))),
        _ => Err(EditorError::InvalidArgument(args.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{Address, Base};
    use pretty_assertions::assert_eq;

    fn num(n: usize) -> Address {
        Address::new(Base::Number(n))
    }

    // -- CommandLine ------------------------------------------------------

    #[test]
    fn command_line_keeps_colon() {
        let mut cl = CommandLine::new();
        assert_eq!(cl.display(), ":");
        cl.insert_char('w');
        cl.insert_char('q');
        assert_eq!(cl.display(), ":wq");
        assert!(cl.backspace());
        assert!(cl.backspace());
        assert!(!cl.backspace());
        assert_eq!(cl.display(), ":");
    }

    #[test]
    fn command_line_take_clears() {
        let mut cl = CommandLine::new();
        cl.insert_char('q');
        assert_eq!(cl.take(), "q");
        assert!(cl.is_empty());
    }

    // -- Files and quitting -------------------------------------------------

    #[test]
    fn parse_write_forms() {
        assert_eq!(parse("w").unwrap(), ExCommand::Write { path: None, force: false });
        assert_eq!(
            parse("w! out.txt").unwrap(),
            ExCommand::Write {
                path: Some(PathBuf::from("out.txt")),
                force: true,
            }
        );
        assert_eq!(parse("wq").unwrap(), ExCommand::WriteQuit { path: None });
        assert_eq!(parse("x").unwrap(), ExCommand::Exit);
        assert_eq!(
            parse("w my file.txt").unwrap(),
            ExCommand::Write {
                path: Some(PathBuf::from("my file.txt")),
                force: false,
            }
        );
    }

    #[test]
    fn parse_quit_and_edit() {
        assert_eq!(parse("q").unwrap(), ExCommand::Quit { force: false });
        assert_eq!(parse("  q!  ").unwrap(), ExCommand::Quit { force: true });
        assert_eq!(parse("e!").unwrap(), ExCommand::Edit { path: None, force: true });
        assert_eq!(
            parse("e src/lib.rs").unwrap(),
            ExCommand::Edit {
                path: Some(PathBuf::from("src/lib.rs")),
                force: false,
            }
        );
    }

    #[test]
    fn parse_buffer_commands() {
        assert_eq!(parse("bn").unwrap(), ExCommand::BufferNext);
        assert_eq!(parse("bprevious").unwrap(), ExCommand::BufferPrev);
        assert_eq!(parse("ls").unwrap(), ExCommand::ListBuffers);
        assert_eq!(parse("b 2").unwrap(), ExCommand::SwitchBuffer("2".into()));
        assert_eq!(parse("b2").unwrap(), ExCommand::SwitchBuffer("2".into()));
        assert!(matches!(parse("b"), Err(EditorError::InvalidArgument(_))));
    }

    #[test]
    fn parse_read_sources() {
        assert_eq!(
            parse("r notes.txt").unwrap(),
            ExCommand::Read {
                range: RangeSpec::Default,
                source: ReadSource::File(Some(PathBuf::from("notes.txt"))),
            }
        );
        assert_eq!(
            parse("3r !date").unwrap(),
            ExCommand::Read {
                range: RangeSpec::Single(num(3)),
                source: ReadSource::Shell("date".into()),
            }
        );
        assert_eq!(
            parse("r!ls -a").unwrap(),
            ExCommand::Read {
                range: RangeSpec::Default,
                source: ReadSource::Shell("ls -a".into()),
            }
        );
    }

    #[test]
    fn saveas_needs_a_name() {
        assert!(matches!(parse("saveas"), Err(EditorError::NoFileName)));
    }

    #[test]
    fn unknown_command() {
        assert!(matches!(
            parse("frobnicate now"),
            Err(EditorError::UnsupportedExCommand(name)) if name == "frobnicate"
        ));
    }

    // -- Line commands ------------------------------------------------------

    #[test]
    fn parse_delete_with_register_and_count() {
        assert_eq!(
            parse("2,4d").unwrap(),
            ExCommand::Delete {
                range: RangeSpec::Pair(num(2), range::Separator::Comma, num(4)),
                register: None,
                count: None,
            }
        );
        assert_eq!(
            parse("2d a").unwrap(),
            ExCommand::Delete {
                range: RangeSpec::Single(num(2)),
                register: Some('a'),
                count: None,
            }
        );
        assert_eq!(
            parse("y A 3").unwrap(),
            ExCommand::Yank {
                range: RangeSpec::Default,
                register: Some('A'),
                count: Some(3),
            }
        );
        assert!(matches!(parse("d !"), Err(EditorError::InvalidArgument(_))));
    }

    #[test]
    fn parse_put_variants() {
        let put = |register, before| ExCommand::Put {
            range: RangeSpec::Default,
            register,
            before,
        };
        assert_eq!(parse("pu").unwrap(), put(None, false));
        assert_eq!(parse("pu! a").unwrap(), put(Some('a'), true));
        assert_eq!(parse("P").unwrap(), put(None, true));
        assert_eq!(parse("p b").unwrap(), put(Some('b'), false));
    }

    #[test]
    fn parse_marks() {
        let mark = |name| ExCommand::SetMark {
            range: RangeSpec::Default,
            name,
        };
        assert_eq!(parse("ma x").unwrap(), mark('x'));
        assert_eq!(parse("k b").unwrap(), mark('b'));
        assert_eq!(parse("kc").unwrap(), mark('c'));
        assert!(matches!(parse("marks"), Err(EditorError::UnsupportedExCommand(_))));
        assert!(matches!(parse("mark 1"), Err(EditorError::InvalidArgument(_))));
    }

    #[test]
    fn bare_range_is_goto() {
        assert_eq!(parse("5").unwrap(), ExCommand::Goto(RangeSpec::Single(num(5))));
        assert_eq!(
            parse("$").unwrap(),
            ExCommand::Goto(RangeSpec::Single(Address::new(Base::Last)))
        );
    }

    // -- Marks and registers as prefixes ----------------------------------

    #[test]
    fn mark_prefix_with_command() {
        let ExCommand::AtMark {
            mark,
            then,
            otherwise,
        } = parse("'ad").unwrap()
        else {
            panic!("expected AtMark");
        };
        assert_eq!(mark, 'a');
        assert!(matches!(*then, ExCommand::Delete { .. }));
        assert!(matches!(*otherwise, ExCommand::WithRegister { name: 'a', .. }));
    }

    #[test]
    fn mark_prefix_alone_or_with_range_is_a_range() {
        assert_eq!(
            parse("'z").unwrap(),
            ExCommand::Goto(RangeSpec::Single(Address::new(Base::Mark('z'))))
        );
        assert!(matches!(
            parse("'a,'bd").unwrap(),
            ExCommand::Delete { range: RangeSpec::Pair(..), .. }
        ));
    }

    #[test]
    fn register_prefix() {
        assert_eq!(parse("\"a").unwrap(), ExCommand::WithRegister { name: 'a', then: None });
        let ExCommand::WithRegister { name: 'b', then: Some(then) } = parse("\"bp").unwrap() else {
            panic!("expected WithRegister");
        };
        assert!(matches!(*then, ExCommand::Put { before: false, register: None, .. }));
    }

    // -- Substitute ---------------------------------------------------------

    #[test]
    fn sub_basic() {
        assert_eq!(
            parse("%s/apple/APPLE/g").unwrap(),
            ExCommand::Substitute {
                range: RangeSpec::Whole,
                pattern: "apple".into(),
                replacement: "APPLE".into(),
                flags: SubFlags::GLOBAL,
            }
        );
    }

    #[test]
    fn sub_delimiters_and_escapes() {
        assert_eq!(
            parse(r"s#a\#b#c#").unwrap(),
            ExCommand::Substitute {
                range: RangeSpec::Default,
                pattern: "a#b".into(),
                replacement: "c".into(),
                flags: SubFlags::empty(),
            }
        );
        assert_eq!(
            parse("s/foo").unwrap(),
            ExCommand::Substitute {
                range: RangeSpec::Default,
                pattern: "foo".into(),
                replacement: String::new(),
                flags: SubFlags::empty(),
            }
        );
    }

    #[test]
    fn sub_repeat_forms() {
        let repeat = |range| ExCommand::SubRepeat { range, flags: None };
        assert_eq!(parse("s").unwrap(), repeat(RangeSpec::Default));
        assert_eq!(parse("%&&").unwrap(), repeat(RangeSpec::Whole));
        assert_eq!(
            parse("&g").unwrap(),
            ExCommand::SubRepeat {
                range: RangeSpec::Default,
                flags: Some(SubFlags::GLOBAL),
            }
        );
    }

    #[test]
    fn set_is_not_substitute() {
        assert_eq!(parse("set ic").unwrap(), ExCommand::Set("ic".into()));
        assert!(matches!(parse("saveas x").unwrap(), ExCommand::SaveAs(_)));
    }

    // -- Global -------------------------------------------------------------

    #[test]
    fn global_forms() {
        let g = |inverse, action| ExCommand::Global {
            range: RangeSpec::Default,
            pattern: "apple".into(),
            inverse,
            action,
        };
        assert_eq!(parse("g/apple/d").unwrap(), g(false, GlobalAction::Delete));
        assert_eq!(parse("g /apple/d").unwrap(), g(false, GlobalAction::Delete));
        assert_eq!(parse("g!/apple/d").unwrap(), g(true, GlobalAction::Delete));
        assert_eq!(parse("v/apple/d").unwrap(), g(true, GlobalAction::Delete));
        assert_eq!(
            parse("g/apple/norm dd").unwrap(),
            g(false, GlobalAction::Normal("dd".into()))
        );
        assert_eq!(
            parse("g/apple/s/p/P/g").unwrap(),
            g(
                false,
                GlobalAction::Substitute {
                    pattern: "p".into(),
                    replacement: "P".into(),
                    flags: SubFlags::GLOBAL,
                }
            )
        );
    }

    #[test]
    fn global_rejects_other_actions() {
        assert!(matches!(
            parse("g/apple/p"),
            Err(EditorError::UnsupportedCommand(sub)) if sub == "p"
        ));
        assert!(matches!(parse("g/apple/"), Err(EditorError::UnsupportedCommand(_))));
    }

    #[test]
    fn goto_is_not_global() {
        assert!(matches!(parse("go"), Err(EditorError::UnsupportedExCommand(_))));
    }

    // -- Filter and normal ------------------------------------------------

    #[test]
    fn filter_and_normal() {
        assert_eq!(
            parse("%!sort").unwrap(),
            ExCommand::Filter {
                range: RangeSpec::Whole,
                command: "sort".into(),
            }
        );
        assert_eq!(
            parse("!ls").unwrap(),
            ExCommand::Filter {
                range: RangeSpec::Default,
                command: "ls".into(),
            }
        );
        assert_eq!(
            parse("2,3norm Ax").unwrap(),
            ExCommand::Normal {
                range: RangeSpec::Pair(num(2), range::Separator::Comma, num(3)),
                keys: "Ax".into(),
            }
        );
    }
}
