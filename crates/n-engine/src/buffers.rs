//! The session's buffer table.
//!
//! Buffers are numbered from 1 in the order they were opened and keyed by
//! their resolved absolute path, so opening the same file twice switches to
//! the existing buffer instead of loading a second copy. Numbers are never
//! reused. Exactly one buffer is current at any time.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::buffer::Buffer;
use crate::error::{EditorError, Result};
use crate::host::FileStore;

/// A buffer's number in the table (1-based, stable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub usize);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of `:ls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferEntry {
    pub id: BufferId,
    pub name: String,
    pub current: bool,
    pub modified: bool,
    /// 1-based current line.
    pub line: usize,
}

impl fmt::Display for BufferEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = if self.current { "%a" } else { "  " };
        let modified = if self.modified { '+' } else { ' ' };
        let quoted = format!("\"{}\"", self.name);
        write!(
            f,
            "{:>3} {active} {modified} {quoted:<30} line {}",
            self.id, self.line
        )
    }
}

#[derive(Debug)]
struct Slot {
    id: BufferId,
    buffer: Buffer,
}

/// The buffer table.
#[derive(Debug)]
pub struct BufferList {
    slots: Vec<Slot>,
    current: usize,
    next_id: usize,
}

impl BufferList {
    /// A table holding `buffer` as buffer 1.
    #[must_use]
    pub fn new(buffer: Buffer) -> Self {
        Self {
            slots: vec![Slot {
                id: BufferId(1),
                buffer,
            }],
            current: 0,
            next_id: 2,
        }
    }

    #[must_use]
    pub fn current(&self) -> &Buffer {
        &self.slots[self.current].buffer
    }

    pub fn current_mut(&mut self) -> &mut Buffer {
        &mut self.slots[self.current].buffer
    }

    #[must_use]
    pub fn current_id(&self) -> BufferId {
        self.slots[self.current].id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn position_of(&self, path: &Path) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.buffer.path() == Some(path))
    }

    /// Make the buffer for `path` current, loading it from `store` if the
    /// table does not have it yet. `path` must already be resolved.
    ///
    /// # Errors
    ///
    /// Read failures from the store.
    pub fn open(&mut self, path: &Path, store: &dyn FileStore) -> Result<BufferId> {
        if let Some(index) = self.position_of(path) {
            self.current = index;
            debug!(id = %self.current_id(), path = %path.display(), "switched buffer");
            return Ok(self.current_id());
        }
        let buffer = Buffer::load(path, store)?;
        Ok(self.push(buffer))
    }

    /// Install `buffer` as current. A buffer for the same path replaces the
    /// existing entry (keeping its number); otherwise it is added.
    pub fn install(&mut self, buffer: Buffer) -> BufferId {
        if let Some(index) = buffer.path().and_then(|p| self.position_of(p)) {
            self.slots[index].buffer = buffer;
            self.current = index;
            return self.current_id();
        }
        self.push(buffer)
    }

    fn push(&mut self, buffer: Buffer) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        debug!(%id, name = %buffer.display_name(), "added buffer");
        self.slots.push(Slot { id, buffer });
        self.current = self.slots.len() - 1;
        id
    }

    /// Replace the current buffer's content in place (`:e!`).
    pub fn replace_current(&mut self, buffer: Buffer) {
        self.slots[self.current].buffer = buffer;
    }

    /// `:bn`, wrapping.
    pub fn next_buffer(&mut self) -> BufferId {
        self.current = (self.current + 1) % self.slots.len();
        self.current_id()
    }

    /// `:bp`, wrapping.
    pub fn prev_buffer(&mut self) -> BufferId {
        self.current = (self.current + self.slots.len() - 1) % self.slots.len();
        self.current_id()
    }

    /// Switch by `:b` reference: a buffer number, or a fragment of exactly
    /// one buffer's name.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidArgument`] when nothing or more than one buffer
    /// matches.
    pub fn switch(&mut self, reference: &str) -> Result<BufferId> {
        let index = if let Ok(n) = reference.parse::<usize>() {
            self.slots
                .iter()
                .position(|slot| slot.id.0 == n)
                .ok_or_else(|| EditorError::InvalidArgument(format!("buffer {n} does not exist")))?
        } else {
            let mut matches = self
                .slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.buffer.display_name().contains(reference))
                .map(|(i, _)| i);
            match (matches.next(), matches.next()) {
                (Some(i), None) => i,
                (None, _) => {
                    return Err(EditorError::InvalidArgument(format!(
                        "no matching buffer for {reference}"
                    )));
                }
                (Some(_), Some(_)) => {
                    return Err(EditorError::InvalidArgument(format!(
                        "more than one match for {reference}"
                    )));
                }
            }
        };
        self.current = index;
        Ok(self.current_id())
    }

    /// Name of the first modified buffer, if any.
    #[must_use]
    pub fn first_modified(&self) -> Option<String> {
        self.slots
            .iter()
            .find(|slot| slot.buffer.is_modified())
            .map(|slot| slot.buffer.display_name())
    }

    /// Rows for `:ls`.
    #[must_use]
    pub fn entries(&self) -> Vec<BufferEntry> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| BufferEntry {
                id: slot.id,
                name: slot.buffer.display_name(),
                current: i == self.current,
                modified: slot.buffer.is_modified(),
                line: slot.buffer.current_line() + 1,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
