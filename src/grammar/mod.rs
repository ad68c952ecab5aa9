//! Command grammar collaborator
//!
//! The resolver only talks to a grammar through the [`Grammar`] trait:
//! parse a fully-qualified line into a [`MatchResult`], and enumerate
//! completions for a partial line. [`TreeGrammar`] is the implementation
//! shipped with the crate; commands are declared with the compact expression
//! syntax of [`expr`] and can be exported/imported as YAML through [`yaml`].

pub mod expr;
pub mod node;
pub mod tree;
pub mod yaml;

pub use expr::{compile_command, ArgKind, ArgSpec};
pub use node::{GrammarNode, NodeAttrs, NodeKind};
pub use tree::{lex, TreeGrammar};

use crate::dispatch::Handler;

/// How a completion candidate relates to the token being completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// The candidate is a whole token
    Full,
    /// The candidate is a fragment that needs more input
    Partial,
    /// Free-form argument; the grammar cannot suggest a value
    Unknown,
}

impl CompletionKind {
    /// Full and partial completions are usable for abbreviation expansion
    pub fn is_expansion(self) -> bool {
        matches!(self, CompletionKind::Full | CompletionKind::Partial)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub value: String,
    pub kind: CompletionKind,
}

/// The narrow interface the resolver consumes
pub trait Grammar: Send + Sync {
    /// Parse a fully-qualified command line. `None` means the text is
    /// malformed (cannot even be tokenized).
    fn parse(&self, text: &str) -> Option<MatchResult<'_>>;

    /// Ordered, de-duplicated completion candidates for the last token of
    /// `text` (an empty token when `text` ends with whitespace).
    fn complete(&self, text: &str) -> Vec<Completion>;

    /// Root of the grammar tree, used for help, docs and export
    fn root(&self) -> &GrammarNode;
}

/// Outcome of parsing one line against a grammar
#[derive(Debug, Clone)]
pub struct MatchResult<'g> {
    complete: bool,
    nodes: Vec<&'g GrammarNode>,
    args: Vec<(&'g str, String)>,
}

impl<'g> MatchResult<'g> {
    pub fn matched(nodes: Vec<&'g GrammarNode>, args: Vec<(&'g str, String)>) -> Self {
        Self {
            complete: true,
            nodes,
            args,
        }
    }

    /// Well-formed input that no grammar path consumes entirely
    pub fn unmatched() -> Self {
        Self {
            complete: false,
            nodes: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Matched nodes, outermost first
    pub fn nodes(&self) -> &[&'g GrammarNode] {
        &self.nodes
    }

    /// First value captured by the argument node with this id
    pub fn arg(&self, id: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(arg_id, _)| *arg_id == id)
            .map(|(_, value)| value.as_str())
    }

    /// Integer argument, or `default` when absent or not a number
    pub fn arg_int(&self, id: &str, default: i64) -> i64 {
        self.arg(id)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    pub fn args(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().map(|(id, value)| (*id, value.as_str()))
    }

    /// Handler bound directly on the matched chain; the innermost one wins
    pub fn handler(&self) -> Option<&'g Handler> {
        self.nodes
            .iter()
            .rev()
            .find_map(|node| node.attrs.handler.as_ref())
    }

    /// Symbolic callback name on the matched chain; the innermost one wins
    pub fn callback_name(&self) -> Option<&'g str> {
        self.nodes
            .iter()
            .rev()
            .find_map(|node| node.attrs.callback.as_deref())
    }
}
