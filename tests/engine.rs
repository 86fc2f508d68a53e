//! End-to-end tests for the keybinding engine
//!
//! Time is driven explicitly through the `*_at` entry points, so no test
//! sleeps or depends on wall-clock behavior. Engine logs are opt-in via
//! RUST_LOG, e.g. `RUST_LOG=mdgraph_keymap=debug cargo test`.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

use mdgraph_keymap::{
    CompileError, Dispatcher, FocusTarget, KeyEvent, KeymapConfig, KeymapEngine,
};

static INIT_LOGGING: Once = Once::new();

fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
    fn commands(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl Dispatcher for Recorder {
    fn execute(&mut self, command_id: &str) -> anyhow::Result<()> {
        self.0.borrow_mut().push(command_id.to_string());
        Ok(())
    }
}

/// A dispatcher whose executor always rejects the command
struct FailingDispatcher;

impl Dispatcher for FailingDispatcher {
    fn execute(&mut self, command_id: &str) -> anyhow::Result<()> {
        anyhow::bail!("executor rejected {}", command_id)
    }
}

fn config(pairs: &[(&str, &str)]) -> KeymapConfig {
    KeymapConfig {
        bindings: pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..KeymapConfig::default()
    }
}

fn engine(pairs: &[(&str, &str)]) -> (KeymapEngine, Recorder) {
    init_logging();
    let recorder = Recorder::default();
    let engine = KeymapEngine::compile(config(pairs), Box::new(recorder.clone())).unwrap();
    (engine, recorder)
}

#[test]
fn conflict_between_single_key_and_chord_head_fails_compile() {
    let err = KeymapEngine::compile(
        config(&[("g", "cmd-a"), ("gg", "cmd-b")]),
        Box::new(Recorder::default()),
    )
    .err()
    .expect("compile must fail");

    match err {
        CompileError::Conflict { binding, sequence } => {
            assert_eq!(binding, "g");
            assert_eq!(sequence, "gg");
        }
        other => panic!("expected conflict, got {}", other),
    }
}

#[test]
fn immediate_dispatch_for_unambiguous_key() {
    let (mut engine, recorder) = engine(&[("j", "pan-down")]);
    let now = Instant::now();

    assert!(engine.handle_key_at(&KeyEvent::new("j"), now));
    assert_eq!(recorder.commands(), ["pan-down"]);
    assert_eq!(engine.timeout_deadline(), None);
}

#[test]
fn deferred_binding_commits_on_timeout() {
    // "dd" is complete but also prefixes "ddd"; ambiguity between multi-key
    // sequences is resolved by the timer.
    let (mut engine, recorder) = engine(&[("dd", "delete-node"), ("ddd", "delete-subtree")]);
    let now = Instant::now();

    assert!(engine.handle_key_at(&KeyEvent::new("d"), now));
    assert!(engine.handle_key_at(&KeyEvent::new("d"), now));
    assert!(recorder.commands().is_empty(), "no dispatch before timeout");

    let deadline = engine.timeout_deadline().expect("timer armed");
    engine.poll_timeout_at(deadline);
    assert_eq!(recorder.commands(), ["delete-node"]);
    assert!(!engine.is_pending());
}

#[test]
fn deferred_binding_superseded_by_longer_sequence() {
    let (mut engine, recorder) = engine(&[("dd", "delete-node"), ("ddd", "delete-subtree")]);
    let now = Instant::now();

    engine.handle_key_at(&KeyEvent::new("d"), now);
    engine.handle_key_at(&KeyEvent::new("d"), now);
    // Third key lands inside the ambiguity window
    assert!(engine.handle_key_at(&KeyEvent::new("d"), now + Duration::from_millis(100)));

    assert_eq!(recorder.commands(), ["delete-subtree"]);
    assert_eq!(engine.timeout_deadline(), None);
}

#[test]
fn late_key_sees_post_timeout_state() {
    let (mut engine, recorder) = engine(&[("dd", "delete-node"), ("ddd", "delete-subtree")]);
    let now = Instant::now();

    engine.handle_key_at(&KeyEvent::new("d"), now);
    engine.handle_key_at(&KeyEvent::new("d"), now);

    // Key arrives after the deadline: the deferred command fires first, then
    // the key starts a fresh sequence from the root.
    let late = now + Duration::from_secs(1);
    assert!(engine.handle_key_at(&KeyEvent::new("d"), late));
    assert_eq!(recorder.commands(), ["delete-node"]);
    assert!(engine.is_pending());
}

#[test]
fn strict_prefix_abandoned_silently_on_timeout() {
    let (mut engine, recorder) = engine(&[("gg", "jump-first")]);
    let now = Instant::now();

    engine.handle_key_at(&KeyEvent::new("g"), now);
    let deadline = engine.timeout_deadline().expect("timer armed");
    engine.poll_timeout_at(deadline);

    assert!(recorder.commands().is_empty());
    assert!(!engine.is_pending());
}

#[test]
fn abandoned_sequence_key_is_retried_from_root() {
    let (mut engine, recorder) = engine(&[("gg", "jump-first"), ("j", "pan-down")]);
    let now = Instant::now();

    assert!(engine.handle_key_at(&KeyEvent::new("g"), now));
    // "j" cannot continue "g", but it starts its own binding
    assert!(engine.handle_key_at(&KeyEvent::new("j"), now));

    assert_eq!(recorder.commands(), ["pan-down"]);
    assert!(!engine.is_pending());
}

#[test]
fn retry_that_matches_nothing_declines() {
    let (mut engine, recorder) = engine(&[("gg", "jump-first")]);
    let now = Instant::now();

    engine.handle_key_at(&KeyEvent::new("g"), now);
    assert!(!engine.handle_key_at(&KeyEvent::new("x"), now));

    assert!(recorder.commands().is_empty());
    assert!(!engine.is_pending());
    assert_eq!(engine.timeout_deadline(), None);
}

#[test]
fn leader_substitution_matches_physical_leader_key() {
    let recorder = Recorder::default();
    let mut cfg = config(&[("<leader>x", "export-graph")]);
    cfg.leader = ';';
    let mut engine = KeymapEngine::compile(cfg, Box::new(recorder.clone())).unwrap();
    let now = Instant::now();

    assert!(engine.handle_key_at(&KeyEvent::new(";"), now));
    assert!(engine.handle_key_at(&KeyEvent::new("x"), now));
    assert_eq!(recorder.commands(), ["export-graph"]);
}

#[test]
fn default_leader_is_space() {
    let (mut engine, recorder) = engine(&[("<leader>f", "focus-search")]);
    let now = Instant::now();

    assert!(engine.handle_key_at(&KeyEvent::new(" "), now));
    assert!(engine.handle_key_at(&KeyEvent::new("f"), now));
    assert_eq!(recorder.commands(), ["focus-search"]);
}

#[test]
fn text_entry_focus_bypasses_matching_entirely() {
    let (mut engine, recorder) = engine(&[("j", "pan-down"), ("gg", "jump-first")]);
    let now = Instant::now();

    for target in [
        FocusTarget::Input,
        FocusTarget::TextArea,
        FocusTarget::Select,
        FocusTarget::ContentEditable,
    ] {
        assert!(!engine.handle_key_at(&KeyEvent::new("j").with_target(target), now));
    }
    assert!(recorder.commands().is_empty());

    // A pending sequence survives ignored events untouched
    engine.handle_key_at(&KeyEvent::new("g"), now);
    let deadline = engine.timeout_deadline();
    assert!(!engine.handle_key_at(
        &KeyEvent::new("g").with_target(FocusTarget::Input),
        now
    ));
    assert!(engine.is_pending());
    assert_eq!(engine.timeout_deadline(), deadline);
}

#[test]
fn reset_is_idempotent() {
    let (mut engine, recorder) = engine(&[("j", "pan-down")]);
    let now = Instant::now();

    engine.reset();
    engine.reset();
    engine.poll_timeout_at(now);

    assert!(engine.handle_key_at(&KeyEvent::new("j"), now));
    assert_eq!(recorder.commands(), ["pan-down"]);
}

#[test]
fn chord_progress_rearms_the_timer() {
    let (mut engine, _recorder) = engine(&[("abc", "run-layout")]);
    let now = Instant::now();

    engine.handle_key_at(&KeyEvent::new("a"), now);
    let first = engine.timeout_deadline().expect("timer armed");

    let later = now + Duration::from_millis(200);
    engine.handle_key_at(&KeyEvent::new("b"), later);
    let second = engine.timeout_deadline().expect("timer re-armed");

    assert!(second > first, "each step gets a fresh ambiguity window");
}

#[test]
fn dispatcher_failure_is_contained() {
    let mut engine = KeymapEngine::compile(
        config(&[("j", "pan-down"), ("k", "pan-up")]),
        Box::new(FailingDispatcher),
    )
    .unwrap();
    let now = Instant::now();

    // The event is still reported consumed and the engine stays usable
    assert!(engine.handle_key_at(&KeyEvent::new("j"), now));
    assert!(!engine.is_pending());
    assert!(engine.handle_key_at(&KeyEvent::new("k"), now));
}

#[test]
fn shifted_punctuation_binding_matches_host_event() {
    // A host reports "?" as the produced character with shift still held;
    // the binding parsed from notation "?" must match it anyway.
    let (mut engine, recorder) = engine(&[("?", "open-search"), ("g?", "show-help")]);
    let now = Instant::now();

    assert!(engine.handle_key_at(&KeyEvent::new("?").with_shift(), now));
    assert_eq!(recorder.commands(), ["open-search"]);

    engine.handle_key_at(&KeyEvent::new("g"), now);
    assert!(engine.handle_key_at(&KeyEvent::new("?").with_shift(), now));
    assert_eq!(recorder.commands(), ["open-search", "show-help"]);
}

#[test]
fn shifted_bindings_distinguish_case() {
    let (mut engine, recorder) = engine(&[("g", "cmd-lower"), ("G", "jump-last")]);
    let now = Instant::now();

    assert!(engine.handle_key_at(&KeyEvent::new("G").with_shift(), now));
    assert_eq!(recorder.commands(), ["jump-last"]);

    assert!(engine.handle_key_at(&KeyEvent::new("g"), now));
    assert_eq!(recorder.commands(), ["jump-last", "cmd-lower"]);
}

#[test]
fn modifier_bindings_match_events() {
    let (mut engine, recorder) = engine(&[("<C-S-p>", "command-palette")]);
    let now = Instant::now();

    assert!(engine.handle_key_at(&KeyEvent::new("P").with_ctrl().with_shift(), now));
    assert_eq!(recorder.commands(), ["command-palette"]);
}

#[test]
fn recompile_replaces_prior_state_completely() {
    let (mut engine, recorder) = engine(&[("gg", "jump-first")]);
    let now = Instant::now();

    engine.handle_key_at(&KeyEvent::new("g"), now);
    engine
        .reload(config(&[("g", "toggle-grid")]))
        .expect("reload");

    // Old pending state is gone; "g" is now a plain leaf binding
    assert!(engine.handle_key_at(&KeyEvent::new("g"), now));
    assert_eq!(recorder.commands(), ["toggle-grid"]);
    assert_eq!(engine.binding_for("gg"), None);
    assert_eq!(engine.binding_for("g"), Some("toggle-grid"));
}
