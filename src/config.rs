//! Keybinding configuration
//!
//! The host owns file loading and persistence; this module only defines the
//! compile-time input shape and a YAML string parser for it.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Default leader key: space
fn default_leader() -> char {
    ' '
}

/// Default ambiguity window in milliseconds
fn default_timeout_ms() -> u64 {
    500
}

/// Flat keybinding configuration, read-only after compile
///
/// `bindings` maps notation strings to opaque command ids understood by the
/// host's command executor. A `BTreeMap` keeps iteration (and therefore
/// conflict reporting) deterministic.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct KeymapConfig {
    /// Character substituted for `<leader>` in notations
    #[serde(default = "default_leader")]
    pub leader: char,
    /// How long a partial match waits before committing or resetting
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self {
            leader: default_leader(),
            timeout_ms: default_timeout_ms(),
            bindings: BTreeMap::new(),
        }
    }
}

/// Parse a keymap configuration from a YAML string
pub fn parse_config_yaml(yaml: &str) -> Result<KeymapConfig, ConfigError> {
    serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Errors from deserializing a configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
