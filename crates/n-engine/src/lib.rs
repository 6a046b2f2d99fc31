//! # n-engine: Modal editing engine for n-vi
//!
//! A practical subset of Vim as a library. The host constructs a
//! [`Session`], feeds it one [`Key`] at a time and shows the narration each
//! step returns. Files, shell commands and path containment come from the
//! host through the capabilities in [`host`].
//!
//! Leaves first:
//!
//! - **[`buffer`]**: lines, current line, marks, line endings, load/write
//! - **[`register`]**: unnamed, numbered and named registers, shift chain
//! - **[`range`]**: Ex address and range grammar
//! - **[`ops`]**: delete, yank, put, substitute, global and shell filter
//! - **[`normal`]**: normal-mode command parser and interpreter
//! - **[`command`]** / **[`ex`]**: Ex command parser and executor
//! - **[`buffers`]**: the session's buffer table
//! - **[`session`]**: the mode state machine and the host-facing API

pub mod buffer;
pub mod buffers;
pub mod command;
pub mod editor;
pub mod error;
pub mod ex;
pub mod host;
pub mod key;
pub mod mode;
pub mod normal;
pub mod ops;
pub mod options;
pub mod position;
pub mod range;
pub mod register;
pub mod search;
pub mod session;
pub mod word;

pub use buffer::{Buffer, LineEnding};
pub use error::{EditorError, Result};
pub use host::{DiskStore, Host, MemoryStore, ProjectRoot, SystemShell};
pub use key::{Key, parse_notation};
pub use mode::Mode;
pub use options::Options;
pub use position::{LineRange, Position};
pub use session::{Session, SessionState, Step};
