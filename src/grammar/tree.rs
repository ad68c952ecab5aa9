//! Tree grammar: backtracking matcher and completer over [`GrammarNode`]s

use super::node::{GrammarNode, NodeKind};
use super::{Completion, CompletionKind, Grammar, MatchResult};

/// Split a line into shell-like tokens.
///
/// Whitespace separates tokens; single or double quotes group words into one
/// token. Returns `None` on an unterminated quote.
pub fn lex(text: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return None;
    }
    if in_token {
        tokens.push(current);
    }
    Some(tokens)
}

/// One way of consuming a prefix of the token list
#[derive(Clone, Default)]
struct Trail<'g> {
    pos: usize,
    nodes: Vec<&'g GrammarNode>,
    args: Vec<(&'g str, String)>,
}

struct Walker<'a> {
    tokens: &'a [String],
    /// Token being completed once all `tokens` are consumed
    probe: Option<&'a str>,
    candidates: Vec<Completion>,
}

impl<'a> Walker<'a> {
    fn new(tokens: &'a [String], probe: Option<&'a str>) -> Self {
        Self {
            tokens,
            probe,
            candidates: Vec::new(),
        }
    }

    fn walk<'g>(&mut self, node: &'g GrammarNode, mut trail: Trail<'g>) -> Vec<Trail<'g>> {
        match &node.kind {
            NodeKind::Seq(children) => {
                trail.nodes.push(node);
                let mut states = vec![trail];
                for child in children {
                    let mut next = Vec::new();
                    for state in states {
                        next.extend(self.walk(child, state));
                    }
                    if next.is_empty() {
                        return next;
                    }
                    states = next;
                }
                states
            }
            NodeKind::Or(children) => {
                trail.nodes.push(node);
                let mut states = Vec::new();
                for child in children {
                    states.extend(self.walk(child, trail.clone()));
                }
                states
            }
            NodeKind::Optional(child) => {
                trail.nodes.push(node);
                let mut states = vec![trail.clone()];
                states.extend(self.walk(child, trail));
                states
            }
            _ => self.walk_terminal(node, trail),
        }
    }

    fn walk_terminal<'g>(&mut self, node: &'g GrammarNode, mut trail: Trail<'g>) -> Vec<Trail<'g>> {
        let Some(token) = self.tokens.get(trail.pos) else {
            if let Some(partial) = self.probe {
                self.offer(node, partial);
            }
            return Vec::new();
        };

        if !node.accepts(token) {
            return Vec::new();
        }
        if node.is_argument() {
            if let Some(id) = node.id.as_deref() {
                trail.args.push((id, token.clone()));
            }
        }
        trail.pos += 1;
        trail.nodes.push(node);
        vec![trail]
    }

    fn offer(&mut self, node: &GrammarNode, partial: &str) {
        let completion = match &node.kind {
            NodeKind::Keyword(word) if word.starts_with(partial) => Completion {
                value: word.clone(),
                kind: CompletionKind::Full,
            },
            NodeKind::Keyword(_) => return,
            _ => Completion {
                value: partial.to_string(),
                kind: CompletionKind::Unknown,
            },
        };
        if !self.candidates.contains(&completion) {
            self.candidates.push(completion);
        }
    }
}

/// Grammar backed by an in-memory node tree
#[derive(Debug, Clone)]
pub struct TreeGrammar {
    root: GrammarNode,
}

impl TreeGrammar {
    pub fn new(root: GrammarNode) -> Self {
        Self { root }
    }
}

impl Grammar for TreeGrammar {
    fn parse(&self, text: &str) -> Option<MatchResult<'_>> {
        let tokens = lex(text)?;
        let mut walker = Walker::new(&tokens, None);
        let states = walker.walk(&self.root, Trail::default());

        let result = states
            .into_iter()
            .find(|state| state.pos == tokens.len())
            .map(|state| MatchResult::matched(state.nodes, state.args))
            .unwrap_or_else(MatchResult::unmatched);
        Some(result)
    }

    fn complete(&self, text: &str) -> Vec<Completion> {
        let Some(mut tokens) = lex(text) else {
            return Vec::new();
        };
        let partial = if text.is_empty() || text.ends_with(char::is_whitespace) {
            String::new()
        } else {
            tokens.pop().unwrap_or_default()
        };

        let mut walker = Walker::new(&tokens, Some(&partial));
        let _ = walker.walk(&self.root, Trail::default());
        walker.candidates
    }

    fn root(&self) -> &GrammarNode {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> TreeGrammar {
        TreeGrammar::new(GrammarNode::or(vec![
            GrammarNode::seq(vec![
                GrammarNode::keyword("show"),
                GrammarNode::keyword("running-config"),
            ])
            .with_callback("show_running_config"),
            GrammarNode::seq(vec![
                GrammarNode::keyword("show"),
                GrammarNode::keyword("run"),
            ])
            .with_callback("show_run"),
            GrammarNode::seq(vec![
                GrammarNode::keyword("set"),
                GrammarNode::keyword("name"),
                GrammarNode::pattern("value", "[a-zA-Z]+").unwrap(),
            ])
            .with_callback("set_name"),
            GrammarNode::seq(vec![
                GrammarNode::keyword("interface"),
                GrammarNode::keyword("mtu"),
                GrammarNode::int("mtu", 64, 9000),
                GrammarNode::optional(GrammarNode::keyword("force")),
            ])
            .with_callback("interface_mtu"),
        ]))
    }

    fn values(completions: Vec<Completion>) -> Vec<String> {
        completions
            .into_iter()
            .filter(|c| c.kind.is_expansion())
            .map(|c| c.value)
            .collect()
    }

    #[test]
    fn test_lex_quotes_and_errors() {
        assert_eq!(
            lex("  set name \"Alice Smith\" ").unwrap(),
            vec!["set", "name", "Alice Smith"]
        );
        assert_eq!(lex("a 'b c'd").unwrap(), vec!["a", "b cd"]);
        assert!(lex("set name \"Alice").is_none());
        assert!(lex("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_complete_match_captures_args() {
        let grammar = grammar();
        let result = grammar.parse("set name Alice").unwrap();
        assert!(result.is_complete());
        assert_eq!(result.arg("value"), Some("Alice"));
        assert_eq!(result.callback_name(), Some("set_name"));
    }

    #[test]
    fn test_parse_incomplete_and_malformed() {
        let grammar = grammar();
        assert!(!grammar.parse("set name").unwrap().is_complete());
        assert!(!grammar.parse("sh run").unwrap().is_complete());
        assert!(!grammar.parse("").unwrap().is_complete());
        assert!(grammar.parse("set name 'Alice").is_none());
    }

    #[test]
    fn test_parse_optional_and_int_range() {
        let grammar = grammar();
        let plain = grammar.parse("interface mtu 1500").unwrap();
        assert!(plain.is_complete());
        assert_eq!(plain.arg_int("mtu", 0), 1500);

        assert!(grammar.parse("interface mtu 1500 force").unwrap().is_complete());
        assert!(!grammar.parse("interface mtu 10").unwrap().is_complete());
    }

    #[test]
    fn test_complete_keywords() {
        let grammar = grammar();
        assert_eq!(values(grammar.complete("sh")), vec!["show"]);
        assert_eq!(values(grammar.complete("show r")), vec!["running-config", "run"]);
        assert_eq!(values(grammar.complete("show runn")), vec!["running-config"]);
        assert_eq!(values(grammar.complete("")), vec!["show", "set", "interface"]);
        assert!(values(grammar.complete("frob")).is_empty());
    }

    #[test]
    fn test_complete_argument_is_unknown() {
        let grammar = grammar();
        let completions = grammar.complete("set name Al");
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].kind, CompletionKind::Unknown);
    }
}
