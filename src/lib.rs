//! Keybinding resolution engine for the mdgraph graph viewer
//!
//! Compiles a vim-style keybinding configuration into a prefix trie and
//! resolves live key events against it:
//! - Notation parsing: single keys (`j`), chords (`gg`), modifiers
//!   (`<C-x>`), and a configurable `<leader>` prefix
//! - Compile-time conflict detection (a single key cannot also start a chord)
//! - Bounded-time ambiguity resolution when a typed prefix could continue
//!   into a longer bound sequence
//!
//! # Architecture
//!
//! ```text
//! KeymapConfig → notation::parse → KeyTrie          (compile)
//! KeyEvent → Keystroke → KeymapEngine → Dispatcher  (match)
//! ```
//!
//! The engine is single-threaded and event-driven: one instance per input
//! surface, fed one key-down per call. The only asynchronous element is the
//! ambiguity timer, modelled as a single deadline the host polls.

pub mod config;
pub mod engine;
pub mod event;
pub mod notation;
pub mod trie;
pub mod types;

pub use config::{parse_config_yaml, ConfigError, KeymapConfig};
pub use engine::{Dispatcher, KeymapEngine};
pub use event::{keystroke_from_event, should_ignore, FocusTarget, KeyEvent};
pub use notation::NotationError;
pub use trie::{CompileError, KeyTrie};
pub use types::{Key, Keystroke, Modifiers};
