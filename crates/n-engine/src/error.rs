//! Error taxonomy for every interpreter and text operation.
//!
//! Messages follow Vim's `E<nr>: text` convention so the narration a host
//! shows for a failed command reads the way Vim users expect. Errors never
//! cross [`Session::process_key`](crate::session::Session::process_key)
//! except the fatal I/O class reported by [`EditorError::is_fatal`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while interpreting a key or a command.
#[derive(Debug, Error)]
pub enum EditorError {
    /// `'x` or a range used a mark that was never set (or was deleted).
    #[error("E20: Mark not set: '{0}")]
    MarkNotSet(char),

    /// A `/pattern/` search found nothing.
    #[error("E486: Pattern not found: {0}")]
    PatternNotFound(String),

    /// A range whose end lies before its start.
    #[error("E16: Invalid range")]
    InvalidRange,

    /// A 1-based line number outside `1..=len`.
    #[error("E16: Invalid range: line {0} out of range")]
    LineOutOfRange(usize),

    /// Normal-mode text that does not name a supported command.
    #[error("E1: Unsupported command: {0}")]
    UnsupportedCommand(String),

    /// Ex-command name that does not name a supported command.
    #[error("E492: Not an editor command: {0}")]
    UnsupportedExCommand(String),

    /// The regex engine rejected a pattern.
    #[error("E383: Invalid search string: {pattern} ({reason})")]
    InvalidPattern { pattern: String, reason: String },

    /// A put from a register that holds nothing.
    #[error("E353: Nothing in register {0}")]
    EmptyRegister(char),

    /// A `:!` filter could not be spawned or exited unsuccessfully.
    #[error("E485: Shell filter failed: {0}")]
    FilterFailed(String),

    /// A path resolved outside the project root.
    #[error("E212: Access denied: {} is outside the project root", .0.display())]
    AccessDenied(PathBuf),

    /// `:q` while a buffer has unsaved changes.
    #[error("E37: No write since last change for buffer \"{0}\" (add ! to override)")]
    ModifiedBufferOnQuit(String),

    /// `:r` of a file that does not exist.
    #[error("E484: Can't open file {}", .0.display())]
    CannotOpen(PathBuf),

    /// `:s` or `:&` with no earlier substitution to repeat.
    #[error("E35: No previous substitute")]
    NoPreviousSubstitute,

    /// `:w` on a buffer with no path.
    #[error("E32: No file name")]
    NoFileName,

    /// A counted put that would create more text than a buffer holds.
    #[error("E1240: Resulting text too long")]
    TextTooLong,

    /// A malformed argument (bad register name, bad `:set` value, …).
    #[error("E474: Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EditorError {
    /// True for I/O failures the session cannot narrate away: the host must
    /// see them as a rejected operation.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::StorageFull
                    | io::ErrorKind::WriteZero
                    | io::ErrorKind::OutOfMemory
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }

    /// Build an [`InvalidPattern`](Self::InvalidPattern) from a regex error.
    pub(crate) fn pattern(pattern: &str, err: &regex::Error) -> Self {
        let reason = match err {
            regex::Error::Syntax(s) => {
                s.lines().last().unwrap_or("syntax error").trim().to_string()
            }
            regex::Error::CompiledTooBig(_) => "pattern too large".to_string(),
            _ => err.to_string(),
        };
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EditorError>;
