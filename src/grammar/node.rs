//! Grammar tree nodes
//!
//! A command grammar is a tree of keyword and argument terminals combined by
//! sequence, alternative and optional nodes. Attributes attached to a node
//! carry the help text and the code binding (direct handler and/or symbolic
//! callback name) of the command it roots.

use std::fmt;

use regex::Regex;

use crate::dispatch::Handler;
use crate::error::GrammarError;

/// Attributes attached to a grammar node
#[derive(Clone, Default)]
pub struct NodeAttrs {
    pub help: Option<String>,
    /// Symbolic callback name, resolved through the dispatch table
    pub callback: Option<String>,
    /// Directly bound handler (compiled-in grammars only)
    pub handler: Option<Handler>,
    /// Original command expression, shown in help and docs
    pub syntax: Option<String>,
}

impl fmt::Debug for NodeAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeAttrs")
            .field("help", &self.help)
            .field("callback", &self.callback)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .field("syntax", &self.syntax)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Literal word
    Keyword(String),
    /// Decimal integer within an inclusive range
    Int { min: i64, max: i64 },
    /// Token matching a regular expression over the whole token
    Pattern { source: String, regex: Regex },
    Seq(Vec<GrammarNode>),
    Or(Vec<GrammarNode>),
    Optional(Box<GrammarNode>),
}

#[derive(Debug, Clone)]
pub struct GrammarNode {
    pub id: Option<String>,
    pub kind: NodeKind,
    pub attrs: NodeAttrs,
}

impl GrammarNode {
    fn from_kind(kind: NodeKind) -> Self {
        Self {
            id: None,
            kind,
            attrs: NodeAttrs::default(),
        }
    }

    pub fn keyword(word: impl Into<String>) -> Self {
        Self::from_kind(NodeKind::Keyword(word.into()))
    }

    pub fn int(id: impl Into<String>, min: i64, max: i64) -> Self {
        Self::from_kind(NodeKind::Int { min, max }).with_id(id)
    }

    pub fn pattern(id: impl Into<String>, pattern: &str) -> Result<Self, GrammarError> {
        let id = id.into();
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            GrammarError::Pattern {
                id: id.clone(),
                source,
            }
        })?;
        Ok(Self::from_kind(NodeKind::Pattern {
            source: pattern.to_string(),
            regex,
        })
        .with_id(id))
    }

    pub fn seq(children: Vec<GrammarNode>) -> Self {
        Self::from_kind(NodeKind::Seq(children))
    }

    pub fn or(children: Vec<GrammarNode>) -> Self {
        Self::from_kind(NodeKind::Or(children))
    }

    pub fn optional(child: GrammarNode) -> Self {
        Self::from_kind(NodeKind::Optional(Box::new(child)))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.attrs.help = Some(help.into());
        self
    }

    pub fn with_callback(mut self, name: impl Into<String>) -> Self {
        self.attrs.callback = Some(name.into());
        self
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.attrs.handler = Some(handler);
        self
    }

    pub fn with_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.attrs.syntax = Some(syntax.into());
        self
    }

    pub fn help(&self) -> Option<&str> {
        self.attrs.help.as_deref()
    }

    pub fn callback(&self) -> Option<&str> {
        self.attrs.callback.as_deref()
    }

    pub fn children(&self) -> &[GrammarNode] {
        match &self.kind {
            NodeKind::Seq(children) | NodeKind::Or(children) => children,
            NodeKind::Optional(child) => std::slice::from_ref(child.as_ref()),
            _ => &[],
        }
    }

    /// Whether a terminal node accepts `token`. Non-terminals never do.
    pub fn accepts(&self, token: &str) -> bool {
        match &self.kind {
            NodeKind::Keyword(word) => word == token,
            NodeKind::Int { min, max } => token
                .parse::<i64>()
                .map(|value| (*min..=*max).contains(&value))
                .unwrap_or(false),
            NodeKind::Pattern { regex, .. } => regex.is_match(token),
            _ => false,
        }
    }

    pub fn is_argument(&self) -> bool {
        matches!(self.kind, NodeKind::Int { .. } | NodeKind::Pattern { .. })
    }

    /// The top-level commands of a root node
    pub fn commands(&self) -> &[GrammarNode] {
        match &self.kind {
            NodeKind::Or(children) => children,
            _ => std::slice::from_ref(self),
        }
    }

    /// Depth-first search for the node bound to a callback name
    pub fn find_by_callback(&self, name: &str) -> Option<&GrammarNode> {
        if self.callback() == Some(name) {
            return Some(self);
        }
        self.children()
            .iter()
            .find_map(|child| child.find_by_callback(name))
    }

    /// Human-readable syntax: the declared expression if any, otherwise one
    /// rendered from the tree.
    pub fn syntax(&self) -> String {
        match &self.attrs.syntax {
            Some(syntax) => syntax.clone(),
            None => self.render_syntax(),
        }
    }

    fn render_syntax(&self) -> String {
        match &self.kind {
            NodeKind::Keyword(word) => word.clone(),
            NodeKind::Int { .. } => format!("<{}>", self.placeholder_name("int")),
            NodeKind::Pattern { .. } => format!("<{}>", self.placeholder_name("re")),
            NodeKind::Optional(child) => format!("[{}]", child.render_syntax()),
            NodeKind::Seq(children) => children
                .iter()
                .map(GrammarNode::render_syntax)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            NodeKind::Or(children) => {
                let parts: Vec<String> = children.iter().map(GrammarNode::render_syntax).collect();
                if parts.len() > 1 {
                    format!("({})", parts.join("|"))
                } else {
                    parts.concat()
                }
            }
        }
    }

    fn placeholder_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.id
            .as_deref()
            .or(self.attrs.help.as_deref())
            .unwrap_or(fallback)
    }
}
