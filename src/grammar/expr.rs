//! Command expression syntax
//!
//! Commands are declared as compact expressions:
//!
//! ```text
//! show doc <cmd_name> [file <filename> [format (md|rst|txt)]]
//! ```
//!
//! Bare words are keywords, `<id>` references an [`ArgSpec`] supplied with the
//! command, `[ ... ]` is optional and `( a | b )` is a group of alternatives.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{cut, map},
    error::{context, convert_error, VerboseError},
    multi::{many1, separated_list1},
    sequence::{delimited, preceded, terminated},
    Finish, IResult,
};

use super::node::GrammarNode;
use crate::dispatch::Handler;
use crate::error::GrammarError;

type ExprResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Value constraint of a command argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    Int { min: i64, max: i64 },
    /// Regular expression the whole token must match
    Pattern(String),
}

/// Declaration of an argument referenced as `<id>` in an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub id: String,
    pub kind: ArgKind,
    pub help: Option<String>,
}

impl ArgSpec {
    pub fn int(id: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            id: id.into(),
            kind: ArgKind::Int { min, max },
            help: None,
        }
    }

    pub fn pattern(id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ArgKind::Pattern(pattern.into()),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn to_node(&self) -> Result<GrammarNode, GrammarError> {
        let node = match &self.kind {
            ArgKind::Int { min, max } => GrammarNode::int(self.id.clone(), *min, *max),
            ArgKind::Pattern(pattern) => GrammarNode::pattern(self.id.clone(), pattern)?,
        };
        Ok(match &self.help {
            Some(help) => node.with_help(help.clone()),
            None => node,
        })
    }
}

/// Parsed expression item
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Keyword(String),
    Arg(String),
    Optional(Vec<Expr>),
    Alt(Vec<Vec<Expr>>),
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '?')
}

fn keyword(input: &str) -> ExprResult<'_, Expr> {
    context(
        "keyword",
        map(take_while1(is_word_char), |word: &str| {
            Expr::Keyword(word.to_string())
        }),
    )(input)
}

fn argument(input: &str) -> ExprResult<'_, Expr> {
    context(
        "argument",
        map(
            delimited(
                char('<'),
                cut(take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')),
                cut(char('>')),
            ),
            |id: &str| Expr::Arg(id.to_string()),
        ),
    )(input)
}

fn optional(input: &str) -> ExprResult<'_, Expr> {
    context(
        "optional",
        map(
            delimited(
                char('['),
                cut(sequence),
                cut(preceded(multispace0, char(']'))),
            ),
            Expr::Optional,
        ),
    )(input)
}

fn alternatives(input: &str) -> ExprResult<'_, Expr> {
    context(
        "alternatives",
        map(
            delimited(
                char('('),
                cut(separated_list1(preceded(multispace0, char('|')), sequence)),
                cut(preceded(multispace0, char(')'))),
            ),
            Expr::Alt,
        ),
    )(input)
}

fn item(input: &str) -> ExprResult<'_, Expr> {
    alt((argument, optional, alternatives, keyword))(input)
}

fn sequence(input: &str) -> ExprResult<'_, Vec<Expr>> {
    context("sequence", many1(preceded(multispace0, item)))(input)
}

fn parse_expression(expr: &str) -> Result<Vec<Expr>, GrammarError> {
    let (rest, items) = terminated(sequence, multispace0)(expr)
        .finish()
        .map_err(|e| GrammarError::Expression {
            expr: expr.to_string(),
            message: convert_error(expr, e),
        })?;

    if !rest.is_empty() {
        return Err(GrammarError::Expression {
            expr: expr.to_string(),
            message: format!("unexpected input '{rest}'"),
        });
    }
    Ok(items)
}

struct Compiler<'a> {
    command: &'a str,
    args: &'a [ArgSpec],
}

impl Compiler<'_> {
    fn sequence(&self, items: &[Expr]) -> Result<Vec<GrammarNode>, GrammarError> {
        items.iter().map(|item| self.item(item)).collect()
    }

    /// A one-item sequence collapses to the item itself
    fn group(&self, items: &[Expr]) -> Result<GrammarNode, GrammarError> {
        let mut nodes = self.sequence(items)?;
        if nodes.len() == 1 {
            if let Some(node) = nodes.pop() {
                return Ok(node);
            }
        }
        Ok(GrammarNode::seq(nodes))
    }

    fn item(&self, item: &Expr) -> Result<GrammarNode, GrammarError> {
        match item {
            Expr::Keyword(word) => Ok(GrammarNode::keyword(word.clone())),
            Expr::Arg(id) => self
                .args
                .iter()
                .find(|spec| &spec.id == id)
                .ok_or_else(|| GrammarError::UnknownArgument {
                    command: self.command.to_string(),
                    id: id.clone(),
                })?
                .to_node(),
            Expr::Optional(items) => Ok(GrammarNode::optional(self.group(items)?)),
            Expr::Alt(branches) => {
                let nodes = branches
                    .iter()
                    .map(|branch| self.group(branch))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(GrammarNode::or(nodes))
            }
        }
    }
}

/// Compile one command expression into a grammar subtree.
///
/// The returned sequence node carries `name` as its callback name, the
/// expression as its syntax, and the optional help text and direct handler.
pub fn compile_command(
    name: &str,
    expr: &str,
    help: Option<&str>,
    args: &[ArgSpec],
    handler: Option<Handler>,
) -> Result<GrammarNode, GrammarError> {
    let items = parse_expression(expr)?;
    let compiler = Compiler {
        command: name,
        args,
    };

    let mut node = GrammarNode::seq(compiler.sequence(&items)?)
        .with_callback(name)
        .with_syntax(expr.trim());
    if let Some(help) = help {
        node = node.with_help(help);
    }
    if let Some(handler) = handler {
        node = node.with_handler(handler);
    }
    Ok(node)
}
