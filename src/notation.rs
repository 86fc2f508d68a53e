//! Vim-style notation parsing
//!
//! Turns a binding notation like `gg`, `<C-x>` or `<leader>p` into an
//! ordered keystroke sequence. The grammar is a closed concatenation of
//! tokens, scanned left to right with no backtracking:
//!
//! - a literal character (uppercase ASCII letter ⇒ lowercase key + shift)
//! - `<leader>` — substituted with the configured leader keystroke
//! - `<Name>` — a special key from a fixed table, no modifiers
//! - `<M1-M2-...-key>` — modifier letters (`C`, `S`, `A`/`M`, `D`) in any
//!   order, followed by a literal char or special-key name

use std::fmt;

use crate::types::{Key, Keystroke, Modifiers};

/// Errors raised for malformed notation, carrying the offending text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// `<` without a matching `>`
    UnclosedBracket(String),
    /// Bracket content that is neither `leader`, a special-key name, nor a
    /// modifier-prefixed key
    UnknownKey(String),
    /// A modifier position holding something other than `C`, `S`, `A`, `M`
    /// or `D`
    UnknownModifier(String),
    /// A `-` outside brackets; modifiers are only recognized inside `<...>`
    StrayDash(String),
    /// Empty notation string
    Empty,
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::UnclosedBracket(s) => write!(f, "unclosed bracket in \"{}\"", s),
            NotationError::UnknownKey(s) => write!(f, "unknown key \"{}\"", s),
            NotationError::UnknownModifier(s) => write!(f, "unknown modifier \"{}\"", s),
            NotationError::StrayDash(s) => {
                write!(f, "stray '-' outside brackets in \"{}\"", s)
            }
            NotationError::Empty => write!(f, "empty notation"),
        }
    }
}

impl std::error::Error for NotationError {}

/// Parse a notation string into its keystroke sequence
///
/// `leader` is the keystroke substituted for `<leader>` tokens. The result is
/// never empty; an empty notation is an error.
pub fn parse(notation: &str, leader: Keystroke) -> Result<Vec<Keystroke>, NotationError> {
    if notation.is_empty() {
        return Err(NotationError::Empty);
    }

    let mut keystrokes = Vec::new();
    let mut rest = notation;

    while !rest.is_empty() {
        if let Some(after_open) = rest.strip_prefix('<') {
            let Some(close) = after_open.find('>') else {
                return Err(NotationError::UnclosedBracket(rest.to_string()));
            };
            keystrokes.push(parse_bracketed(&after_open[..close], leader)?);
            rest = &after_open[close + 1..];
            continue;
        }

        let c = rest.chars().next().ok_or(NotationError::Empty)?;
        if c == '-' {
            return Err(NotationError::StrayDash(notation.to_string()));
        }
        keystrokes.push(literal(c));
        rest = &rest[c.len_utf8()..];
    }

    Ok(keystrokes)
}

/// A literal character token; uppercase ASCII means lowercase key + shift
fn literal(c: char) -> Keystroke {
    if c.is_ascii_uppercase() {
        Keystroke::char_with_mods(c, Modifiers::SHIFT)
    } else {
        Keystroke::char(c)
    }
}

/// Parse the content between `<` and `>`
fn parse_bracketed(content: &str, leader: Keystroke) -> Result<Keystroke, NotationError> {
    if content.eq_ignore_ascii_case("leader") {
        return Ok(leader);
    }

    let mut parts: Vec<&str> = content.split('-').collect();
    let key_part = parts.pop().filter(|p| !p.is_empty());
    let Some(key_part) = key_part else {
        return Err(NotationError::UnknownKey(content.to_string()));
    };

    if parts.is_empty() {
        // No modifiers: must be a special-key name
        let key = special_key(key_part)
            .ok_or_else(|| NotationError::UnknownKey(content.to_string()))?;
        return Ok(Keystroke::key(key));
    }

    let mut mods = Modifiers::NONE;
    for part in parts {
        mods = mods.union(modifier(part)?);
    }

    let stroke = if let Some(key) = special_key(key_part) {
        Keystroke::new(key, mods)
    } else if key_part.chars().count() == 1 {
        let c = key_part.chars().next().ok_or(NotationError::Empty)?;
        if c.is_ascii_uppercase() {
            Keystroke::char_with_mods(c, mods.union(Modifiers::SHIFT))
        } else {
            Keystroke::char_with_mods(c, mods)
        }
    } else {
        return Err(NotationError::UnknownKey(key_part.to_string()));
    };

    Ok(stroke)
}

/// A single modifier letter: C=ctrl, S=shift, A/M=alt, D=meta
fn modifier(part: &str) -> Result<Modifiers, NotationError> {
    match part {
        "C" | "c" => Ok(Modifiers::CTRL),
        "S" | "s" => Ok(Modifiers::SHIFT),
        "A" | "a" | "M" | "m" => Ok(Modifiers::ALT),
        "D" | "d" => Ok(Modifiers::META),
        other => Err(NotationError::UnknownModifier(other.to_string())),
    }
}

/// Special-key name lookup, case-insensitive
fn special_key(name: &str) -> Option<Key> {
    match name.to_ascii_lowercase().as_str() {
        "space" => Some(Key::Space),
        "tab" => Some(Key::Tab),
        "enter" => Some(Key::Enter),
        "escape" => Some(Key::Escape),
        "bs" | "backspace" => Some(Key::Backspace),
        "del" | "delete" => Some(Key::Delete),
        "up" => Some(Key::Up),
        "down" => Some(Key::Down),
        "left" => Some(Key::Left),
        "right" => Some(Key::Right),
        _ => None,
    }
}
