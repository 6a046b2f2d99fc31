//! Session-wide editing state shared by every buffer.
//!
//! The [`Editor`] owns the buffer table, the one register file all buffers
//! share, the options and the host capabilities. It holds no mode state;
//! that lives in [`Session`](crate::session::Session).

use std::path::{Path, PathBuf};

use crate::buffer::Buffer;
use crate::buffers::{BufferId, BufferList};
use crate::error::Result;
use crate::host::Host;
use crate::ops::SubFlags;
use crate::options::Options;
use crate::register::RegisterFile;

/// The last `:s`, for `:s` / `:&` repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSubstitute {
    pub pattern: String,
    pub replacement: String,
    pub flags: SubFlags,
}

#[derive(Debug)]
pub struct Editor {
    pub buffers: BufferList,
    pub registers: RegisterFile,
    pub options: Options,
    pub host: Host,
    pub last_substitute: Option<LastSubstitute>,
}

impl Editor {
    #[must_use]
    pub fn new(buffer: Buffer, host: Host, options: Options) -> Self {
        Self {
            buffers: BufferList::new(buffer),
            registers: RegisterFile::new(),
            options,
            host,
            last_substitute: None,
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        self.buffers.current()
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        self.buffers.current_mut()
    }

    /// Resolve a user path against the project root.
    ///
    /// # Errors
    ///
    /// [`EditorError::AccessDenied`](crate::error::EditorError::AccessDenied)
    /// outside the root.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        self.host.paths.resolve(path)
    }

    /// Open (or switch to) the buffer for `path`.
    ///
    /// # Errors
    ///
    /// Resolution and read failures.
    pub fn open(&mut self, path: &Path) -> Result<BufferId> {
        let resolved = self.resolve(path)?;
        self.buffers.open(&resolved, self.host.files.as_ref())
    }

    /// Working directory for shell commands.
    #[must_use]
    pub fn cwd(&self) -> &Path {
        self.host.paths.root()
    }
}
