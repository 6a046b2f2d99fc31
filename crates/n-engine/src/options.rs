//! Session options: the `:set` system.
//!
//! Options are never persisted: the host builds an [`Options`] value (usually
//! [`Options::default`]) and the user adjusts it at run time with `:set`.
//!
//! | Syntax           | Effect                        |
//! |------------------|-------------------------------|
//! | `:set option`    | Enable boolean / show value   |
//! | `:set nooption`  | Disable boolean               |
//! | `:set option!`   | Toggle boolean                |
//! | `:set option?`   | Query current value           |
//! | `:set option=N`  | Assign numeric value          |
//! | `:set`           | Show all options              |
//!
//! | Full name     | Abbrev | Type    | Default |
//! |---------------|--------|---------|---------|
//! | `ignorecase`  | `ic`   | bool    | false   |
//! | `wrapscan`    | `ws`   | bool    | true    |
//! | `softtabstop` | `sts`  | integer | 2       |

use crate::error::{EditorError, Result};

// ---------------------------------------------------------------------------
// SetDirective
// ---------------------------------------------------------------------------

/// A parsed `:set` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    On(String),
    Off(String),
    Toggle(String),
    Query(String),
    Assign(String, String),
    /// `:set` or `:set all`.
    Show,
}

impl SetDirective {
    /// Parse one whitespace-free argument.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        if arg == "all" {
            return Self::Show;
        }
        if let Some((name, value)) = arg.split_once('=') {
            return Self::Assign(name.to_string(), value.to_string());
        }
        if let Some(name) = arg.strip_suffix('?') {
            return Self::Query(name.to_string());
        }
        if let Some(name) = arg.strip_suffix('!') {
            return Self::Toggle(name.to_string());
        }
        // `nowrapscan` is Off only when the remainder is a boolean option.
        if let Some(name) = arg.strip_prefix("no") {
            if matches!(canonical_name(name), Some("ignorecase" | "wrapscan")) {
                return Self::Off(name.to_string());
            }
        }
        // A bare value option shows its value, as in Vim.
        if canonical_name(arg) == Some("softtabstop") {
            return Self::Query(arg.to_string());
        }
        Self::On(arg.to_string())
    }
}

/// Canonical full name for an option name or abbreviation.
fn canonical_name(name: &str) -> Option<&'static str> {
    match name {
        "ignorecase" | "ic" => Some("ignorecase"),
        "wrapscan" | "ws" => Some("wrapscan"),
        "softtabstop" | "sts" => Some("softtabstop"),
        _ => None,
    }
}

fn unknown(name: &str) -> EditorError {
    EditorError::InvalidArgument(format!("unknown option: {name}"))
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// The option values of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Fold case in substitute, global and range patterns.
    pub ignorecase: bool,
    /// Pattern searches wrap around the end of the buffer.
    pub wrapscan: bool,
    /// Spaces inserted by the insert-mode Tab key.
    pub softtabstop: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ignorecase: false,
            wrapscan: true,
            softtabstop: 2,
        }
    }
}

impl Options {
    /// Apply every directive in a `:set` argument string (`ic nows sts=4`).
    /// Returns the text to show, if any.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidArgument`] on an unknown option or a value of
    /// the wrong type. Directives before the bad one stay applied.
    pub fn apply_set(&mut self, args: &str) -> Result<Option<String>> {
        let mut shown = Vec::new();
        let args: Vec<&str> = args.split_whitespace().collect();
        if args.is_empty() {
            return Ok(Some(self.listing()));
        }
        for arg in args {
            if let Some(text) = self.apply(&SetDirective::parse(arg))? {
                shown.push(text);
            }
        }
        Ok((!shown.is_empty()).then(|| shown.join("\n")))
    }

    fn apply(&mut self, directive: &SetDirective) -> Result<Option<String>> {
        match directive {
            SetDirective::Show => Ok(Some(self.listing())),
            SetDirective::Query(name) => self.query(name).map(Some),
            SetDirective::On(name) => self.set_bool(name, |_| true).map(|()| None),
            SetDirective::Off(name) => self.set_bool(name, |_| false).map(|()| None),
            SetDirective::Toggle(name) => self.set_bool(name, |v| !v).map(|()| None),
            SetDirective::Assign(name, value) => {
                if canonical_name(name) != Some("softtabstop") {
                    return Err(EditorError::InvalidArgument(format!("{name}={value}")));
                }
                self.softtabstop = value.parse().map_err(|_| {
                    EditorError::InvalidArgument(format!("number required after =: {name}={value}"))
                })?;
                Ok(None)
            }
        }
    }

    fn set_bool(&mut self, name: &str, f: impl FnOnce(bool) -> bool) -> Result<()> {
        let slot = match canonical_name(name) {
            Some("ignorecase") => &mut self.ignorecase,
            Some("wrapscan") => &mut self.wrapscan,
            _ => return Err(unknown(name)),
        };
        *slot = f(*slot);
        Ok(())
    }

    fn query(&self, name: &str) -> Result<String> {
        let flag = |name: &str, on: bool| if on { name.to_string() } else { format!("no{name}") };
        Ok(match canonical_name(name) {
            Some("ignorecase") => flag("ignorecase", self.ignorecase),
            Some("wrapscan") => flag("wrapscan", self.wrapscan),
            Some("softtabstop") => format!("softtabstop={}", self.softtabstop),
            _ => return Err(unknown(name)),
        })
    }

    fn listing(&self) -> String {
        ["ignorecase", "wrapscan", "softtabstop"]
            .iter()
            .filter_map(|name| self.query(name).ok())
            .collect::<Vec<_>>()
            .join("  ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
