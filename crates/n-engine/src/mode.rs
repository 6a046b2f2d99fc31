//! The three editing modes.
//!
//! | Mode        | Cursor column          | Keys are                        |
//! |-------------|------------------------|---------------------------------|
//! | Normal      | on a character         | commands, accumulated until complete |
//! | Insert      | may sit past the end   | literal text                    |
//! | CommandLine | in the `:` line        | Ex command text, run on Enter   |
//!
//! Transitions live in [`session`](crate::session).

use std::fmt;

/// Which interpreter the next key goes to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    /// After `:` until Enter or Escape.
    CommandLine,
}

impl Mode {
    /// The name a status line shows.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::CommandLine => "COMMAND",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
