//! Input symbols and the `<Esc>`-style key notation.
//!
//! The host feeds the session one [`Key`] at a time. Hosts that deal in
//! strings can use [`Key::from_symbol`] for a single symbol (`"a"`,
//! `"Escape"`, `"<CR>"`) or [`parse_notation`] for a whole script such as
//! `"iHello<Esc>:2,4d<CR>"`.

use std::fmt;

/// One input symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A Unicode character (printable).
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
}

impl Key {
    /// Parse a single symbol. Accepts a lone character, Vim notation
    /// (`<Esc>`, `<CR>`, `<BS>`, `<Tab>`, `<lt>`, `<Space>`) or the spelled-out
    /// names `Escape`, `Enter`, `Backspace`, `Tab`. Case-insensitive for the
    /// named forms.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let mut chars = symbol.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Some(Self::from_char(ch));
        }
        let name = symbol
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(symbol);
        match name.to_ascii_lowercase().as_str() {
            "esc" | "escape" => Some(Self::Escape),
            "cr" | "enter" | "return" => Some(Self::Enter),
            "bs" | "backspace" => Some(Self::Backspace),
            "tab" => Some(Self::Tab),
            "space" => Some(Self::Char(' ')),
            "lt" => Some(Self::Char('<')),
            _ => None,
        }
    }

    /// Map a raw character, folding control characters onto named keys.
    #[must_use]
    pub const fn from_char(ch: char) -> Self {
        match ch {
            '\u{1b}' => Self::Escape,
            '\r' | '\n' => Self::Enter,
            '\t' => Self::Tab,
            '\u{8}' | '\u{7f}' => Self::Backspace,
            c => Self::Char(c),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char('<') => f.write_str("<lt>"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Enter => f.write_str("<CR>"),
            Self::Tab => f.write_str("<Tab>"),
            Self::Backspace => f.write_str("<BS>"),
            Self::Escape => f.write_str("<Esc>"),
        }
    }
}

/// Parse a key script in Vim notation into individual keys.
///
/// `<...>` groups that name a known key become that key; anything else
/// (including an unterminated `<`) is taken literally, character by
/// character, so `:%s/<b>/x/` keeps its angle brackets.
#[must_use]
pub fn parse_notation(script: &str) -> Vec<Key> {
    let mut keys = Vec::with_capacity(script.len());
    let mut rest = script;
    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            if let Some(close) = rest.find('>') {
                if let Some(key) = Key::from_symbol(&rest[..=close]).filter(|_| close > 1) {
                    keys.push(key);
                    rest = &rest[close + 1..];
                    continue;
                }
            }
        }
        keys.push(Key::from_char(ch));
        rest = &rest[ch.len_utf8()..];
    }
    keys
}
