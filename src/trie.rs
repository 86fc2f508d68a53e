//! Prefix trie compiled from binding notations
//!
//! The trie is an arena of nodes indexed by `NodeId`; each edge is one
//! canonical keystroke and a node carries a command id iff some configured
//! sequence terminates exactly there. Read-only after compile.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::notation::{self, NotationError};
use crate::types::Keystroke;

/// Index into the trie arena
pub type NodeId = usize;

/// The root node: no keys typed yet
pub const ROOT: NodeId = 0;

#[derive(Debug, Default)]
struct Node {
    children: HashMap<Keystroke, NodeId>,
    command: Option<String>,
}

/// Compile-time errors: malformed notation or a binding conflict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Notation(NotationError),
    /// A single-key binding that is also the head of a longer sequence. The
    /// runtime could never commit to either interpretation, so this is
    /// rejected up front.
    Conflict {
        /// The single-key binding's notation
        binding: String,
        /// The longer sequence it collides with
        sequence: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Notation(e) => write!(f, "invalid notation: {}", e),
            CompileError::Conflict { binding, sequence } => write!(
                f,
                "keybinding conflict: \"{}\" is a complete command but also starts \"{}\"",
                binding, sequence
            ),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Notation(e) => Some(e),
            CompileError::Conflict { .. } => None,
        }
    }
}

impl From<NotationError> for CompileError {
    fn from(e: NotationError) -> Self {
        CompileError::Notation(e)
    }
}

/// The compiled keybinding trie
#[derive(Debug)]
pub struct KeyTrie {
    nodes: Vec<Node>,
}

impl KeyTrie {
    /// Compile a notation → command-id mapping into a trie
    ///
    /// All notations are parsed and the whole configuration is checked for
    /// conflicts before the first insertion, so a failed compile produces no
    /// partial trie and the reported conflict does not depend on insertion
    /// order (the bindings map iterates sorted).
    pub fn compile(
        bindings: &BTreeMap<String, String>,
        leader: Keystroke,
    ) -> Result<Self, CompileError> {
        let mut parsed: Vec<(&str, Vec<Keystroke>, &str)> = Vec::with_capacity(bindings.len());
        for (notation, command) in bindings {
            let seq = notation::parse(notation, leader)?;
            parsed.push((notation.as_str(), seq, command.as_str()));
        }

        // First keystroke of every multi-key sequence, for the conflict scan
        let mut heads: HashMap<Keystroke, &str> = HashMap::new();
        for &(notation, ref seq, _) in &parsed {
            if seq.len() > 1 {
                heads.entry(seq[0]).or_insert(notation);
            }
        }
        for (notation, seq, _) in &parsed {
            if seq.len() == 1 {
                if let Some(&sequence) = heads.get(&seq[0]) {
                    return Err(CompileError::Conflict {
                        binding: notation.to_string(),
                        sequence: sequence.to_string(),
                    });
                }
            }
        }

        let mut trie = KeyTrie {
            nodes: vec![Node::default()],
        };
        for (_, seq, command) in parsed {
            trie.insert(&seq, command.to_string());
        }
        Ok(trie)
    }

    /// Insert one sequence, creating missing nodes along the path
    fn insert(&mut self, seq: &[Keystroke], command: String) {
        let mut current = ROOT;
        for &stroke in seq {
            current = match self.nodes[current].children.get(&stroke) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[current].children.insert(stroke, child);
                    child
                }
            };
        }
        self.nodes[current].command = Some(command);
    }

    /// The child reached from `node` along `stroke`, if bound
    pub fn child(&self, node: NodeId, stroke: &Keystroke) -> Option<NodeId> {
        self.nodes[node].children.get(stroke).copied()
    }

    /// The command bound exactly at `node`
    pub fn command(&self, node: NodeId) -> Option<&str> {
        self.nodes[node].command.as_deref()
    }

    /// Whether any longer sequence continues past `node`
    pub fn has_children(&self, node: NodeId) -> bool {
        !self.nodes[node].children.is_empty()
    }

    /// Walk a whole sequence from the root; used by diagnostics
    pub fn lookup(&self, seq: &[Keystroke]) -> Option<&str> {
        let mut current = ROOT;
        for stroke in seq {
            current = self.child(current, stroke)?;
        }
        self.command(current)
    }
}
