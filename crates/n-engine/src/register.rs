//! Register: storage for yanked and deleted text.
//!
//! Every yank and delete copies text into registers; put retrieves it. A
//! register records whether its text was captured line-wise or
//! character-wise, because put behaves differently for each:
//!
//! - **Line-wise**: put inserts whole lines below/above the cursor line.
//! - **Char-wise**: put inserts inline after/before the cursor column.
//!
//! ## Slots
//!
//! - **Unnamed (`"`)**: receives every yank and delete.
//! - **Numbered (`0`–`9`)**: `0` holds the last yank. Each delete shifts
//!   `1..=8` into `2..=9` and stores the deleted text in `1`.
//! - **Named (`a`–`z`)**: user-selectable. Uppercase (`A`–`Z`) appends to
//!   the lowercase register.
//! - **`%`**: read-only, the active buffer's path. It is not stored here;
//!   [`Buffer::read_register`](crate::buffer::Buffer::read_register) answers
//!   it from the buffer.
//!
//! One [`RegisterFile`] serves every buffer of a session, so a yank in one
//! file can be put into another.

use std::fmt;

/// How the register content was captured: determines put behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterKind {
    /// Character-wise (`x`, `dw`). Put inserts inline at the cursor.
    Char,
    /// Line-wise (`dd`, `yy`, `:d`, `:y`). Put inserts entire lines.
    #[default]
    Line,
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Char => "c",
            Self::Line => "l",
        })
    }
}

/// A single register slot: the text and its capture kind.
///
/// Content is kept as lines. A char-wise register spanning a line break has
/// more than one entry; the break sits between entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    lines: Vec<String>,
    kind: RegisterKind,
}

impl Register {
    /// An empty register.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            kind: RegisterKind::Line,
        }
    }

    /// Line-wise content.
    #[must_use]
    pub const fn linewise(lines: Vec<String>) -> Self {
        Self {
            lines,
            kind: RegisterKind::Line,
        }
    }

    /// Char-wise content from a single piece of text.
    #[must_use]
    pub fn charwise(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            kind: RegisterKind::Char,
        }
    }

    /// Append another register's content (uppercase register names).
    ///
    /// If either side is line-wise, the result is line-wise and the new
    /// content starts on its own line. Char onto char joins inline.
    pub fn append(&mut self, other: &Self) {
        if self.is_empty() {
            self.clone_from(other);
            return;
        }
        if self.kind == RegisterKind::Char && other.kind == RegisterKind::Char {
            let mut incoming = other.lines.iter();
            if let (Some(last), Some(first)) = (self.lines.last_mut(), incoming.next()) {
                last.push_str(first);
            }
            self.lines.extend(incoming.cloned());
        } else {
            self.lines.extend(other.lines.iter().cloned());
            self.kind = RegisterKind::Line;
        }
    }

    /// The stored lines. Empty if nothing has been captured.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The content as one string, lines joined with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// How the text was captured.
    #[must_use]
    pub const fn kind(&self) -> RegisterKind {
        self.kind
    }

    /// True if there is nothing to put.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
            || (self.kind == RegisterKind::Char && self.lines.iter().all(String::is_empty))
    }
}

// ---------------------------------------------------------------------------
// Register names
// ---------------------------------------------------------------------------

/// True for any name a command may address: `"`, `0`-`9`, `a`-`z`, `A`-`Z`, `%`.
#[must_use]
pub const fn is_valid_name(name: char) -> bool {
    matches!(name, '"' | '%' | '0'..='9' | 'a'..='z' | 'A'..='Z')
}

/// True for names that can receive text (everything but `%`).
#[must_use]
pub const fn is_writable_name(name: char) -> bool {
    is_valid_name(name) && name != '%'
}

// ---------------------------------------------------------------------------
// Register file
// ---------------------------------------------------------------------------

/// The complete register file: unnamed, numbered `0`-`9`, named `a`-`z`.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    /// The unnamed register: receives every yank and delete.
    unnamed: Register,

    /// `0` = last yank, `1..=9` = delete history, newest first.
    numbered: [Register; 10],

    /// Named registers a-z. Indexed by `ch as u8 - b'a'`.
    named: [Register; 26],
}

impl RegisterFile {
    /// A register file with every slot seeded empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record deleted text.
    ///
    /// Always updates the unnamed register and shifts the numbered chain
    /// (`1` ← newest). A named target (`a`-`z` overwrite, `A`-`Z` append) or
    /// an explicit digit also receives the text.
    pub fn record_delete(&mut self, target: Option<char>, content: Register) {
        self.numbered[1..].rotate_right(1);
        self.numbered[1] = content.clone();
        self.write_target(target, &content);
        self.unnamed = self.resolve_unnamed(target, content);
    }

    /// Record yanked text: unnamed, `0`, and the named target if any.
    pub fn record_yank(&mut self, target: Option<char>, content: Register) {
        self.numbered[0] = content.clone();
        self.write_target(target, &content);
        self.unnamed = self.resolve_unnamed(target, content);
    }

    /// Store text in exactly the named slot (plus unnamed), with no numbered
    /// chain side effects.
    pub fn set(&mut self, target: Option<char>, content: Register) {
        self.write_target(target, &content);
        self.unnamed = self.resolve_unnamed(target, content);
    }

    fn write_target(&mut self, target: Option<char>, content: &Register) {
        match target {
            Some(ch @ 'a'..='z') => {
                self.named[(ch as u8 - b'a') as usize] = content.clone();
            }
            Some(ch @ 'A'..='Z') => {
                self.named[(ch as u8 - b'A') as usize].append(content);
            }
            Some(ch @ '0'..='9') => {
                self.numbered[(ch as u8 - b'0') as usize] = content.clone();
            }
            // None, `"` and `%` leave only the unnamed register.
            _ => {}
        }
    }

    /// After an uppercase append the unnamed register holds the full
    /// appended content, not just the new piece.
    fn resolve_unnamed(&self, target: Option<char>, content: Register) -> Register {
        match target {
            Some(ch @ 'A'..='Z') => self.named[(ch as u8 - b'A') as usize].clone(),
            _ => content,
        }
    }

    /// Read a register. `None` and `"` read the unnamed register; uppercase
    /// reads the lowercase slot. `%` and unknown names return `None`.
    #[must_use]
    pub const fn get(&self, name: Option<char>) -> Option<&Register> {
        match name {
            None | Some('"') => Some(&self.unnamed),
            Some(ch @ 'a'..='z') => Some(&self.named[(ch as u8 - b'a') as usize]),
            Some(ch @ 'A'..='Z') => Some(&self.named[(ch as u8 - b'A') as usize]),
            Some(ch @ '0'..='9') => Some(&self.numbered[(ch as u8 - b'0') as usize]),
            _ => None,
        }
    }

    /// Every non-empty slot in display order: `"`, `0`-`9`, `a`-`z`.
    #[must_use]
    pub fn dump(&self) -> Vec<(char, Register)> {
        let unnamed = std::iter::once(('"', &self.unnamed));
        let numbered = ('0'..='9').zip(self.numbered.iter());
        let named = ('a'..='z').zip(self.named.iter());
        unnamed
            .chain(numbered)
            .chain(named)
            .filter(|(_, reg)| !reg.is_empty())
            .map(|(name, reg)| (name, reg.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(items: &[&str]) -> Register {
        Register::linewise(items.iter().map(ToString::to_string).collect())
    }

    // -- Register (individual slot) ------------------------------------------

    #[test]
    fn new_register_is_empty() {
        let reg = Register::new();
        assert!(reg.is_empty());
        assert_eq!(reg.text(), "");
    }

    #[test]
    fn kinds_are_line_or_char() {
        let mut reg = Register::charwise("ab");
        assert_eq!(reg.kind().to_string(), "c");
        reg.append(&lines(&["cd"]));
        assert_eq!(reg.kind(), RegisterKind::Line);
        assert_eq!(reg.kind().to_string(), "l");
    }

    #[test]
    fn charwise_empty_text_is_empty() {
        assert!(Register::charwise("").is_empty());
        assert!(!Register::charwise("x").is_empty());
    }

    #[test]
    fn linewise_single_blank_line_is_content() {
        // `dd` on an empty line still yields something to put.
        assert!(!lines(&[""]).is_empty());
    }

    #[test]
    fn append_char_to_char_joins_inline() {
        let mut reg = Register::charwise("foo");
        reg.append(&Register::charwise("bar"));
        assert_eq!(reg.lines(), ["foobar"]);
        assert_eq!(reg.kind(), RegisterKind::Char);
    }

    #[test]
    fn append_line_upgrades_kind() {
        let mut reg = Register::charwise("first");
        reg.append(&lines(&["second"]));
        assert_eq!(reg.lines(), ["first", "second"]);
        assert_eq!(reg.kind(), RegisterKind::Line);
    }

    #[test]
    fn append_to_empty_takes_other() {
        let mut reg = Register::new();
        reg.append(&Register::charwise("x"));
        assert_eq!(reg, Register::charwise("x"));
    }

    // -- RegisterFile --------------------------------------------------------

    #[test]
    fn register_file_starts_empty() {
        let rf = RegisterFile::new();
        assert!(rf.get(None).unwrap().is_empty());
        for ch in ('a'..='z').chain('0'..='9') {
            assert!(rf.get(Some(ch)).unwrap().is_empty());
        }
        assert!(rf.dump().is_empty());
    }

    #[test]
    fn percent_is_not_stored_here() {
        assert!(RegisterFile::new().get(Some('%')).is_none());
    }

    #[test]
    fn yank_updates_unnamed_and_zero() {
        let mut rf = RegisterFile::new();
        rf.record_yank(None, lines(&["a"]));
        assert_eq!(rf.get(None).unwrap().lines(), ["a"]);
        assert_eq!(rf.get(Some('0')).unwrap().lines(), ["a"]);
        assert!(rf.get(Some('1')).unwrap().is_empty());
    }

    #[test]
    fn yank_named_writes_named_unnamed_and_zero() {
        let mut rf = RegisterFile::new();
        rf.record_yank(Some('q'), lines(&["x"]));
        assert_eq!(rf.get(Some('q')).unwrap().lines(), ["x"]);
        assert_eq!(rf.get(Some('"')).unwrap().lines(), ["x"]);
        assert_eq!(rf.get(Some('0')).unwrap().lines(), ["x"]);
    }

    #[test]
    fn deletes_shift_numbered_chain() {
        let mut rf = RegisterFile::new();
        rf.record_delete(None, lines(&["d1"]));
        rf.record_delete(None, lines(&["d2"]));
        rf.record_delete(None, lines(&["d3"]));
        assert_eq!(rf.get(Some('1')).unwrap().lines(), ["d3"]);
        assert_eq!(rf.get(Some('2')).unwrap().lines(), ["d2"]);
        assert_eq!(rf.get(Some('3')).unwrap().lines(), ["d1"]);
        assert_eq!(rf.get(None).unwrap().lines(), ["d3"]);
    }

    #[test]
    fn chain_drops_oldest_after_nine() {
        let mut rf = RegisterFile::new();
        for i in 1..=10 {
            rf.record_delete(None, lines(&[&format!("d{i}")]));
        }
        assert_eq!(rf.get(Some('1')).unwrap().lines(), ["d10"]);
        assert_eq!(rf.get(Some('9')).unwrap().lines(), ["d2"]);
    }

    #[test]
    fn delete_does_not_touch_yank_register() {
        let mut rf = RegisterFile::new();
        rf.record_yank(None, lines(&["kept"]));
        rf.record_delete(None, lines(&["gone"]));
        assert_eq!(rf.get(Some('0')).unwrap().lines(), ["kept"]);
    }

    #[test]
    fn uppercase_appends_and_unnamed_gets_whole() {
        let mut rf = RegisterFile::new();
        rf.record_yank(Some('a'), lines(&["one"]));
        rf.record_yank(Some('A'), lines(&["two"]));
        assert_eq!(rf.get(Some('a')).unwrap().lines(), ["one", "two"]);
        assert_eq!(rf.get(None).unwrap().lines(), ["one", "two"]);
        assert_eq!(rf.get(Some('A')).unwrap().lines(), ["one", "two"]);
    }

    #[test]
    fn dump_lists_non_empty_slots_in_order() {
        let mut rf = RegisterFile::new();
        rf.record_yank(Some('b'), lines(&["b"]));
        rf.record_delete(None, Register::charwise("c"));
        let names: Vec<char> = rf.dump().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!['"', '0', '1', 'b']);
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name('a'));
        assert!(is_valid_name('%'));
        assert!(!is_writable_name('%'));
        assert!(!is_valid_name('!'));
    }
}
