//! Core types for the keymap system: Keystroke, Modifiers, Key

use std::fmt;

/// Modifier keys as a bitfield for efficient storage and comparison
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(0b0001);
    pub const SHIFT: Modifiers = Modifiers(0b0010);
    pub const ALT: Modifiers = Modifiers(0b0100);
    pub const META: Modifiers = Modifiers(0b1000); // Cmd on macOS, Win on Windows

    /// Create modifiers from individual flags
    pub const fn new(ctrl: bool, shift: bool, alt: bool, meta: bool) -> Self {
        let mut bits = 0u8;
        if ctrl {
            bits |= 0b0001;
        }
        if shift {
            bits |= 0b0010;
        }
        if alt {
            bits |= 0b0100;
        }
        if meta {
            bits |= 0b1000;
        }
        Modifiers(bits)
    }

    /// Check if ctrl is held
    #[inline]
    pub const fn ctrl(self) -> bool {
        self.0 & 0b0001 != 0
    }

    /// Check if shift is held
    #[inline]
    pub const fn shift(self) -> bool {
        self.0 & 0b0010 != 0
    }

    /// Check if alt/option is held
    #[inline]
    pub const fn alt(self) -> bool {
        self.0 & 0b0100 != 0
    }

    /// Check if meta (cmd/win) is held
    #[inline]
    pub const fn meta(self) -> bool {
        self.0 & 0b1000 != 0
    }

    /// Check if no modifiers are held
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Combine two modifier sets
    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Remove the modifiers in `other` from this set
    #[inline]
    pub const fn without(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// A key code representing a physical or logical key
///
/// Only keys that can appear in binding notation exist here; the notation
/// grammar is closed, so this enum is too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key (normalized to lowercase)
    Char(char),

    // Named keys
    Space,
    Tab,
    Enter,
    Escape,
    Backspace,
    Delete,

    // Arrow keys
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Canonical notation name for named keys, as accepted by the parser
    pub const fn name(self) -> &'static str {
        match self {
            Key::Char(_) => "",
            Key::Space => "Space",
            Key::Tab => "Tab",
            Key::Enter => "Enter",
            Key::Escape => "Escape",
            Key::Backspace => "BS",
            Key::Delete => "Del",
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Left => "Left",
            Key::Right => "Right",
        }
    }
}

/// A single keystroke: a key with modifiers
///
/// Two keystrokes are the same trie edge iff they compare equal, which
/// coincides with their canonical notation (`Display`) being identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub key: Key,
    pub mods: Modifiers,
}

impl Keystroke {
    /// Create a new keystroke
    ///
    /// Character keys are lowercased and `' '` is folded into [`Key::Space`]
    /// so that equal keystrokes always hash alike.
    pub fn new(key: Key, mods: Modifiers) -> Self {
        let key = match key {
            Key::Char(' ') => Key::Space,
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        };
        Self { key, mods }
    }

    /// Create a keystroke with no modifiers
    pub fn key(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// Create a keystroke with a character key and no modifiers
    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::NONE)
    }

    /// Create a keystroke with a character and modifiers
    pub fn char_with_mods(c: char, mods: Modifiers) -> Self {
        Self::new(Key::Char(c), mods)
    }
}

/// Canonical notation rendering, the inverse of the parser.
///
/// Modifiers come in fixed order (ctrl, shift, alt, meta as `C-S-A-D`) and
/// named keys use their friendly notation names, so the output always parses
/// back to an equal keystroke.
impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.is_empty() {
            if let Key::Char(c) = self.key {
                return write!(f, "{}", c);
            }
        }

        write!(f, "<")?;
        if self.mods.ctrl() {
            write!(f, "C-")?;
        }
        if self.mods.shift() {
            write!(f, "S-")?;
        }
        if self.mods.alt() {
            write!(f, "A-")?;
        }
        if self.mods.meta() {
            write!(f, "D-")?;
        }
        match self.key {
            Key::Char(c) => write!(f, "{}", c)?,
            named => write!(f, "{}", named.name())?,
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_empty() {
        let mods = Modifiers::NONE;
        assert!(mods.is_empty());
        assert!(!mods.ctrl());
        assert!(!mods.shift());
        assert!(!mods.alt());
        assert!(!mods.meta());
    }

    #[test]
    fn test_modifiers_combined() {
        let mods = Modifiers::CTRL | Modifiers::SHIFT;
        assert!(mods.ctrl());
        assert!(mods.shift());
        assert!(!mods.alt());
        assert!(!mods.meta());
    }

    #[test]
    fn test_modifiers_new() {
        let mods = Modifiers::new(true, false, true, false);
        assert!(mods.ctrl());
        assert!(!mods.shift());
        assert!(mods.alt());
        assert!(!mods.meta());
    }

    #[test]
    fn test_keystroke_char_lowercase() {
        assert_eq!(Keystroke::char('A'), Keystroke::char('a'));
    }

    #[test]
    fn test_keystroke_space_folds_to_named_key() {
        assert_eq!(Keystroke::char(' '), Keystroke::key(Key::Space));
    }

    #[test]
    fn test_display_bare_char() {
        assert_eq!(Keystroke::char('g').to_string(), "g");
    }

    #[test]
    fn test_display_modified_char() {
        let stroke = Keystroke::char_with_mods('x', Modifiers::CTRL);
        assert_eq!(stroke.to_string(), "<C-x>");
    }

    #[test]
    fn test_display_modifier_order_is_fixed() {
        let mods = Modifiers::META | Modifiers::ALT | Modifiers::SHIFT | Modifiers::CTRL;
        let stroke = Keystroke::char_with_mods('k', mods);
        assert_eq!(stroke.to_string(), "<C-S-A-D-k>");
    }

    #[test]
    fn test_display_named_key() {
        assert_eq!(Keystroke::key(Key::Space).to_string(), "<Space>");
        assert_eq!(Keystroke::key(Key::Escape).to_string(), "<Escape>");
        assert_eq!(
            Keystroke::new(Key::Up, Modifiers::CTRL).to_string(),
            "<C-Up>"
        );
    }
}
