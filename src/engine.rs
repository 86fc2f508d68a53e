//! Runtime matcher: walks the trie one keystroke at a time
//!
//! A single mutable engine instance per input surface. Each key-down either
//! advances the current trie position, dispatches a command, or declines the
//! event. Ambiguity (a complete binding that is also a prefix of a longer
//! one) is resolved by a bounded timer: exactly one deadline is outstanding
//! at any time, and every transition that arms a new one clears the previous
//! one first.
//!
//! The engine owns no event loop and no clock thread. The host forwards
//! key-downs to [`KeymapEngine::handle_key`] and drives time by calling
//! [`KeymapEngine::poll_timeout`] (scheduling a wakeup from
//! [`KeymapEngine::timeout_deadline`] if it wants tight timing). The `*_at`
//! variants take an explicit `Instant` for deterministic tests.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::KeymapConfig;
use crate::event::{self, KeyEvent};
use crate::notation;
use crate::trie::{CompileError, KeyTrie, NodeId, ROOT};
use crate::types::Keystroke;

/// Executes a resolved command id; implemented by the host
///
/// Dispatch is fire-and-forget: the engine resets its matcher state before
/// calling `execute`, logs any error, and never propagates it.
pub trait Dispatcher {
    fn execute(&mut self, command_id: &str) -> anyhow::Result<()>;
}

/// The keybinding resolution engine
pub struct KeymapEngine {
    trie: KeyTrie,
    bindings: BTreeMap<String, String>,
    leader: Keystroke,
    timeout: Duration,
    dispatcher: Box<dyn Dispatcher>,

    // Matcher state; reset returns all of it to idle
    current: NodeId,
    buffer: Vec<Keystroke>,
    deadline: Option<Instant>,
    deferred: Option<String>,
}

impl KeymapEngine {
    /// Compile a configuration into a ready engine
    pub fn compile(
        config: KeymapConfig,
        dispatcher: Box<dyn Dispatcher>,
    ) -> Result<Self, CompileError> {
        let leader = Keystroke::char(config.leader);
        let trie = KeyTrie::compile(&config.bindings, leader)?;
        debug!(bindings = config.bindings.len(), "compiled keymap");
        Ok(Self {
            trie,
            bindings: config.bindings,
            leader,
            timeout: Duration::from_millis(config.timeout_ms),
            dispatcher,
            current: ROOT,
            buffer: Vec::new(),
            deadline: None,
            deferred: None,
        })
    }

    /// Replace all bindings with a new configuration (hot reload)
    ///
    /// The replacement trie is built fully before anything is swapped, so a
    /// failed compile leaves the engine exactly as it was. A successful
    /// reload drops any in-flight pending sequence; the bindings it was
    /// walking may no longer exist.
    pub fn reload(&mut self, config: KeymapConfig) -> Result<(), CompileError> {
        let leader = Keystroke::char(config.leader);
        let trie = KeyTrie::compile(&config.bindings, leader)?;
        debug!(bindings = config.bindings.len(), "reloaded keymap");
        self.trie = trie;
        self.bindings = config.bindings;
        self.leader = leader;
        self.timeout = Duration::from_millis(config.timeout_ms);
        self.reset();
        Ok(())
    }

    /// Handle one key-down event
    ///
    /// Returns `true` when the event was consumed (a sequence advanced or a
    /// command dispatched) and the host should suppress its default
    /// handling; `false` when the event is declined and should pass through.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        self.handle_key_at(event, Instant::now())
    }

    /// [`Self::handle_key`] with an explicit current time
    pub fn handle_key_at(&mut self, event: &KeyEvent, now: Instant) -> bool {
        if event::should_ignore(event) {
            return false;
        }

        // A deadline that passed before this key arrived fires first, so the
        // key is matched against post-timeout state.
        self.poll_timeout_at(now);

        let Some(stroke) = event::keystroke_from_event(event) else {
            if event::is_modifier_key(&event.key) {
                // Bare modifier key-downs never break a sequence
                return false;
            }
            // Unmappable keys count as unmatched input
            self.reset();
            return false;
        };

        self.advance(stroke, now)
    }

    /// One trie step, with a single bounded retry from the root
    fn advance(&mut self, stroke: Keystroke, now: Instant) -> bool {
        let mut retried = false;
        loop {
            if let Some(child) = self.trie.child(self.current, &stroke) {
                self.deadline = None;
                self.deferred = None;
                self.current = child;
                self.buffer.push(stroke);
                return self.settle(child, now);
            }

            if self.current == ROOT || retried {
                self.reset();
                return false;
            }

            // A new sequence may legitimately start with the key that broke
            // this one; retry once from the root.
            self.reset();
            retried = true;
        }
    }

    /// Decide what advancing into `node` means
    fn settle(&mut self, node: NodeId, now: Instant) -> bool {
        let command = self.trie.command(node).map(str::to_string);
        let has_children = self.trie.has_children(node);

        match command {
            // Pure leaf: nothing can follow, commit immediately
            Some(command) if !has_children => {
                self.reset();
                self.dispatch(&command);
            }
            // Complete binding that is also a prefix: wait out the ambiguity
            Some(command) => {
                debug!(%command, "binding complete but ambiguous, deferring");
                self.deferred = Some(command);
                self.deadline = Some(now + self.timeout);
            }
            // Strict prefix: wait for the rest of the sequence
            None => {
                self.deadline = Some(now + self.timeout);
            }
        }
        true
    }

    /// Fire the ambiguity timer if its deadline has passed
    pub fn poll_timeout(&mut self) {
        self.poll_timeout_at(Instant::now());
    }

    /// [`Self::poll_timeout`] with an explicit current time
    pub fn poll_timeout_at(&mut self, now: Instant) {
        let Some(deadline) = self.deadline else {
            return;
        };
        if now < deadline {
            return;
        }

        let deferred = self.deferred.take();
        self.reset();
        match deferred {
            Some(command) => self.dispatch(&command),
            None => debug!("ambiguity timeout, abandoning partial sequence"),
        }
    }

    /// The instant the pending timer fires, if one is armed
    ///
    /// Hosts that want timely deferred dispatch schedule a wakeup for this
    /// instant and call [`Self::poll_timeout`] from it.
    pub fn timeout_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Return to idle: root position, empty buffer, no timer
    ///
    /// Idempotent; resetting an idle engine is a no-op.
    pub fn reset(&mut self) {
        self.current = ROOT;
        self.buffer.clear();
        self.deadline = None;
        self.deferred = None;
    }

    /// Hand a resolved command to the executor; errors are logged, not raised
    fn dispatch(&mut self, command: &str) {
        debug!(%command, "dispatching");
        if let Err(error) = self.dispatcher.execute(command) {
            warn!(%command, %error, "command dispatch failed");
        }
    }

    /// Whether a partial sequence is in flight
    pub fn is_pending(&self) -> bool {
        self.current != ROOT
    }

    /// The buffered partial sequence in notation form, for progress display
    pub fn pending_display(&self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(
                self.buffer
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    }

    /// Look up the command bound to a notation, if any
    ///
    /// Read-only diagnostic; malformed notation yields `None` rather than an
    /// error.
    pub fn binding_for(&self, notation: &str) -> Option<&str> {
        let seq = notation::parse(notation, self.leader).ok()?;
        self.trie.lookup(&seq)
    }

    /// All configured bindings, notation → command id
    pub fn bindings(&self) -> &BTreeMap<String, String> {
        &self.bindings
    }
}
