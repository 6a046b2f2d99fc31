//! Host capabilities: the narrow I/O surface the engine is allowed to use.
//!
//! The engine never touches the file system or spawns processes directly.
//! It goes through three traits the host supplies:
//!
//! - [`FileStore`]: read and write whole UTF-8 text files.
//! - [`ShellRunner`]: run a shell command with stdin, capture stdout.
//!   Used only by `:!` filtering and `:r !cmd`.
//! - [`PathResolver`]: turn user-typed paths into absolute ones and refuse
//!   anything outside the project root.
//!
//! Standard implementations are provided ([`DiskStore`], [`SystemShell`],
//! [`ProjectRoot`]) along with an in-memory [`MemoryStore`] for embedding
//! and tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};
use std::rc::Rc;

use crate::error::{EditorError, Result};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Whole-file text storage.
pub trait FileStore {
    /// Read a file. `Ok(None)` means the file does not exist.
    ///
    /// # Errors
    ///
    /// Any failure other than "not found", including invalid UTF-8.
    fn load(&self, path: &Path) -> io::Result<Option<String>>;

    /// Replace a file's contents.
    ///
    /// # Errors
    ///
    /// Any write failure.
    fn write(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// What a finished shell command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when killed by a signal.
    pub status: Option<i32>,
}

impl ShellOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }
}

/// Runs shell commands for `:!` filters.
pub trait ShellRunner {
    /// Run `command` with `stdin` piped in, in working directory `cwd`.
    ///
    /// # Errors
    ///
    /// Spawn or pipe failures. A non-zero exit is not an error here; it is
    /// reported through [`ShellOutput::status`].
    fn run(&self, command: &str, stdin: &str, cwd: &Path) -> io::Result<ShellOutput>;
}

/// Path resolution plus the project-root containment check.
pub trait PathResolver {
    /// Resolve a user-typed path to an absolute path inside the project.
    ///
    /// # Errors
    ///
    /// [`EditorError::AccessDenied`] if the path escapes the project root.
    fn resolve(&self, path: &Path) -> Result<PathBuf>;

    /// Working directory for shell commands.
    fn root(&self) -> &Path;
}

/// The capabilities a session runs with.
pub struct Host {
    pub files: Box<dyn FileStore>,
    pub shell: Box<dyn ShellRunner>,
    pub paths: Box<dyn PathResolver>,
}

impl Host {
    #[must_use]
    pub fn new(
        files: impl FileStore + 'static,
        shell: impl ShellRunner + 'static,
        paths: impl PathResolver + 'static,
    ) -> Self {
        Self {
            files: Box::new(files),
            shell: Box::new(shell),
            paths: Box::new(paths),
        }
    }

    /// Real disk, `sh -c`, contained to `root`.
    #[must_use]
    pub fn system(root: impl Into<PathBuf>, shell: &str) -> Self {
        Self::new(DiskStore, SystemShell::new(shell), ProjectRoot::new(root))
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("root", &self.paths.root())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DiskStore
// ---------------------------------------------------------------------------

/// [`FileStore`] over `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn load(&self, path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        fs::write(path, text)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// [`FileStore`] backed by a map. Clones share the same files, so a host can
/// keep one handle and give another to the session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Rc<RefCell<HashMap<PathBuf, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), text.into());
    }

    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }
}

impl FileStore for MemoryStore {
    fn load(&self, path: &Path) -> io::Result<Option<String>> {
        Ok(self.files.borrow().get(path).cloned())
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), text.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SystemShell
// ---------------------------------------------------------------------------

/// [`ShellRunner`] spawning `<program> -c <command>`.
#[derive(Debug, Clone)]
pub struct SystemShell {
    program: String,
}

impl SystemShell {
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ShellRunner for SystemShell {
    fn run(&self, command: &str, stdin: &str, cwd: &Path) -> io::Result<ShellOutput> {
        let mut child = Command::new(&self.program)
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from a separate thread so a command that writes before
        // reading everything cannot deadlock against us.
        let mut pipe = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("child stdin unavailable"))?;
        let input = stdin.to_string();
        let feeder = std::thread::spawn(move || pipe.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        match feeder.join() {
            Ok(Ok(())) => {}
            // The command may exit without reading all of stdin (`head`).
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(io::Error::other("stdin feeder panicked")),
        }

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

/// [`ShellRunner`] from a closure, for hosts that sandbox commands
/// themselves (and for tests).
pub struct FnShell<F>(pub F);

impl<F> ShellRunner for FnShell<F>
where
    F: Fn(&str, &str) -> io::Result<ShellOutput>,
{
    fn run(&self, command: &str, stdin: &str, _cwd: &Path) -> io::Result<ShellOutput> {
        (self.0)(command, stdin)
    }
}

// ---------------------------------------------------------------------------
// ProjectRoot
// ---------------------------------------------------------------------------

/// [`PathResolver`] that keeps every path under one root directory.
///
/// Resolution is lexical: relative paths join onto the root, `.` and `..`
/// are folded, and the result must still start with the root. Symlinks are
/// not followed.
#[derive(Debug, Clone)]
pub struct ProjectRoot {
    root: PathBuf,
}

impl ProjectRoot {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
        }
    }
}

impl PathResolver for ProjectRoot {
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let resolved = normalize(&joined);
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(EditorError::AccessDenied(resolved))
        }
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

/// Fold `.` and `..` without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
