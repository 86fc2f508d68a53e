//! Host key events and the ignore-context filter
//!
//! The engine does not own an event loop; the embedding UI forwards one
//! key-down per call as a [`KeyEvent`] carrying the host's key identifier
//! (DOM-style, e.g. `"g"`, `"Enter"`, `"ArrowUp"`), the four modifier
//! booleans, and which surface had focus when the key was pressed.

use crate::types::{Key, Keystroke, Modifiers};

/// The focused surface an event was delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    /// The graph canvas (or anything else that is not text entry)
    #[default]
    Graph,
    /// An `<input>`-like single-line text field
    Input,
    /// A multi-line text area
    TextArea,
    /// A select/dropdown control
    Select,
    /// Any content-editable region
    ContentEditable,
}

/// A single key-down event from the host UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Host key identifier (DOM `event.key` style)
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    pub target: FocusTarget,
}

impl KeyEvent {
    /// A plain key-down on the graph canvas with no modifiers
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
            target: FocusTarget::Graph,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_target(mut self, target: FocusTarget) -> Self {
        self.target = target;
        self
    }
}

/// True when the event targets a text-entry surface and must bypass matching
///
/// Pure predicate; no engine state is consulted or touched.
pub fn should_ignore(event: &KeyEvent) -> bool {
    matches!(
        event.target,
        FocusTarget::Input
            | FocusTarget::TextArea
            | FocusTarget::Select
            | FocusTarget::ContentEditable
    )
}

/// True for key-down events of a modifier key itself
///
/// Holding ctrl ahead of a combination emits its own key-down; those never
/// advance or break a sequence.
pub fn is_modifier_key(key: &str) -> bool {
    matches!(key, "Control" | "Shift" | "Alt" | "Meta")
}

/// Convert a host event to a canonical keystroke
///
/// Returns `None` for keys outside the closed notation grammar (function
/// keys, media keys, bare modifiers).
pub fn keystroke_from_event(event: &KeyEvent) -> Option<Keystroke> {
    let mods = Modifiers::new(event.ctrl, event.shift, event.alt, event.meta);

    let (key, mods) = match event.key.as_str() {
        " " | "Space" => (Key::Space, mods),
        "Tab" => (Key::Tab, mods),
        "Enter" => (Key::Enter, mods),
        "Escape" => (Key::Escape, mods),
        "Backspace" => (Key::Backspace, mods),
        "Delete" => (Key::Delete, mods),
        "ArrowUp" => (Key::Up, mods),
        "ArrowDown" => (Key::Down, mods),
        "ArrowLeft" => (Key::Left, mods),
        "ArrowRight" => (Key::Right, mods),
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    // The host identifier is already the produced symbol.
                    // Only letters keep an explicit shift bit (notation "G"
                    // means shift+g); for punctuation the shift that typed
                    // "?" or "*" is spent producing the character.
                    let mods = if c.is_ascii_alphabetic() {
                        mods
                    } else {
                        mods.without(Modifiers::SHIFT)
                    };
                    (Key::Char(c), mods)
                }
                _ => return None,
            }
        }
    };

    Some(Keystroke::new(key, mods))
}
