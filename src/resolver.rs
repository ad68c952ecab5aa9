//! Command resolution
//!
//! Each input line goes through:
//!
//! 1. trim; an empty line does nothing
//! 2. `end` leaves every context; `exit` inside a context leaves one
//!    (at top level `exit` is an ordinary command)
//! 3. prefix the context path and parse
//! 4. unparseable input is a parse error
//! 5. an incomplete match is retried after abbreviation expansion; failing
//!    that, a lone context-group keyword enters that context, anything else is
//!    an unknown command
//! 6. a complete match is dispatched
//!
//! Replayed configuration skips the navigation rules of steps 2 and 5.

use tracing::{debug, trace, warn};

use crate::cli::Cli;
use crate::context::ContextStack;
use crate::dispatch::HandlerRef;
use crate::error::CliError;
use crate::grammar::{Grammar, MatchResult};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Typed at a prompt: `end`, `exit` and context entry apply
    Interactive,
    /// Read from a configuration file: every line is a command
    Replay,
}

/// What a line resolved to
#[derive(Debug)]
pub enum Resolution<'g> {
    Empty,
    EndContexts,
    ExitContext,
    EnterContext(String),
    Matched(MatchResult<'g>),
}

/// Result of processing one interactive line
#[derive(Debug)]
pub enum LineOutcome {
    Idle,
    Navigated,
    Executed,
    Failed(CliError),
}

/// The single full/partial completion of `candidate`, if there is exactly one
fn unique_completion(grammar: &dyn Grammar, candidate: &str, token: &str) -> Result<String, CliError> {
    let mut expansions = grammar
        .complete(candidate)
        .into_iter()
        .filter(|completion| completion.kind.is_expansion());

    match (expansions.next(), expansions.next()) {
        (Some(only), None) => Ok(only.value),
        (None, _) => Err(CliError::NoMatch {
            line: candidate.to_string(),
        }),
        (Some(_), Some(_)) => Err(CliError::AmbiguousToken {
            token: token.to_string(),
            candidates: 2 + expansions.count(),
        }),
    }
}

/// Expand each token to its unique completion, left to right.
///
/// A token with zero or several candidates is kept as typed. Returns `None`
/// when no token changed. Tokens are judged one at a time, so a line can
/// expand even if the expanded whole is not a complete command.
pub fn expand_abbreviations(grammar: &dyn Grammar, command: &str) -> Option<String> {
    let mut result = String::new();
    let mut changed = false;

    for token in command.split_whitespace() {
        let candidate = if result.is_empty() {
            token.to_string()
        } else {
            format!("{result} {token}")
        };

        let expanded = match unique_completion(grammar, &candidate, token) {
            Ok(value) => value,
            Err(e) => {
                trace!("Keeping '{}': {}", token, e);
                token.to_string()
            }
        };
        if expanded != token {
            changed = true;
        }

        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(&expanded);
    }

    changed.then_some(result)
}

pub fn resolve<'g>(
    grammar: &'g dyn Grammar,
    context_groups: &[String],
    context: &ContextStack,
    line: &str,
    navigation: Navigation,
) -> Result<Resolution<'g>, CliError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Resolution::Empty);
    }

    let interactive = navigation == Navigation::Interactive;
    if interactive {
        if line == "end" {
            return Ok(Resolution::EndContexts);
        }
        if line == "exit" && context.depth() > 0 {
            return Ok(Resolution::ExitContext);
        }
    }

    let full = context.build_full_command(line);
    let parsed = grammar.parse(&full).ok_or(CliError::Parse)?;
    if parsed.is_complete() {
        return Ok(Resolution::Matched(parsed));
    }

    if let Some(expanded) = expand_abbreviations(grammar, &full) {
        if let Some(matched) = grammar.parse(&expanded).filter(MatchResult::is_complete) {
            debug!("Expanded '{}' to '{}'", full, expanded);
            return Ok(Resolution::Matched(matched));
        }
    }

    if interactive
        && !line.contains(char::is_whitespace)
        && context_groups.iter().any(|group| group == line)
    {
        return Ok(Resolution::EnterContext(line.to_string()));
    }

    Err(CliError::NoMatch {
        line: line.to_string(),
    })
}

/// Run the handler bound to a complete match
pub fn dispatch(session: &mut Session, cli: &Cli, result: &MatchResult<'_>) -> Result<(), CliError> {
    let handler_ref = HandlerRef::from_match(cli.dispatch_mode(), result).ok_or_else(|| {
        CliError::NoHandler {
            name: result.callback_name().map(str::to_string),
        }
    })?;
    let handler = cli.dispatch_table().resolve(&handler_ref)?;

    handler(session, result).map_err(|e| {
        warn!(session = %session.id(), "Command failed: {:#}", e);
        CliError::CommandFailed {
            reason: format!("{e:#}"),
        }
    })
}

/// Resolve and run one command without navigation handling or prompting
pub fn execute_line(session: &mut Session, line: &str) -> Result<(), CliError> {
    let cli = session.cli_handle();
    let resolution = resolve(
        cli.grammar(),
        cli.context_groups(),
        session.context(),
        line,
        Navigation::Replay,
    )?;
    match resolution {
        Resolution::Matched(result) => dispatch(session, &cli, &result),
        _ => Ok(()),
    }
}

/// Process one interactive line: resolve, dispatch, report errors and
/// re-prompt (unless the line stopped the session).
pub fn process_line(session: &mut Session, line: &str) -> LineOutcome {
    let cli = session.cli_handle();
    let resolution = resolve(
        cli.grammar(),
        cli.context_groups(),
        session.context(),
        line,
        Navigation::Interactive,
    );

    let outcome = match resolution {
        Ok(Resolution::Empty) => LineOutcome::Idle,
        Ok(Resolution::EndContexts) => {
            session.exit_all_contexts();
            LineOutcome::Navigated
        }
        Ok(Resolution::ExitContext) => match session.exit_context() {
            Ok(()) => LineOutcome::Navigated,
            Err(e) => failed(session, e),
        },
        Ok(Resolution::EnterContext(name)) => {
            session.enter_context(name);
            LineOutcome::Navigated
        }
        Ok(Resolution::Matched(result)) => match dispatch(session, &cli, &result) {
            Ok(()) => LineOutcome::Executed,
            Err(e) => failed(session, e),
        },
        Err(e) => failed(session, e),
    };

    if cli.is_running() {
        session.write_prompt();
    }
    outcome
}

fn failed(session: &mut Session, error: CliError) -> LineOutcome {
    debug!(session = %session.id(), "{}", error);
    session.error(&error);
    LineOutcome::Failed(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{compile_command, ArgSpec, GrammarNode, TreeGrammar};

    fn grammar() -> TreeGrammar {
        let value = [ArgSpec::pattern("value", "[a-zA-Z0-9.]+")];
        TreeGrammar::new(GrammarNode::or(vec![
            compile_command("show_name", "show name", None, &[], None).unwrap(),
            compile_command("show_address", "show address", None, &[], None).unwrap(),
            compile_command("set_name", "set name <value>", None, &value, None).unwrap(),
            compile_command("set_address", "set address <value>", None, &value, None).unwrap(),
            compile_command("interface_mtu", "interface mtu <mtu>", None, &[ArgSpec::int("mtu", 64, 9000)], None)
                .unwrap(),
            compile_command("quit", "exit", None, &[], None).unwrap(),
        ]))
    }

    fn groups() -> Vec<String> {
        vec!["interface".to_string()]
    }

    fn callback(resolution: Resolution<'_>) -> Option<String> {
        match resolution {
            Resolution::Matched(result) => result.callback_name().map(str::to_string),
            _ => None,
        }
    }

    #[test]
    fn test_expansion_of_unique_prefixes() {
        let grammar = grammar();
        assert_eq!(
            expand_abbreviations(&grammar, "sh addr"),
            Some("show address".to_string())
        );
        assert_eq!(
            expand_abbreviations(&grammar, "se na Alice"),
            Some("set name Alice".to_string())
        );
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let grammar = grammar();
        assert_eq!(expand_abbreviations(&grammar, "show address"), None);
        assert_eq!(expand_abbreviations(&grammar, "set name Alice"), None);
        assert_eq!(expand_abbreviations(&grammar, "frobnicate"), None);
    }

    #[test]
    fn test_ambiguous_token_is_kept_literally() {
        let grammar = grammar();
        // "s" could be show or set; "na" is then judged against "s na" and has no candidates
        assert_eq!(expand_abbreviations(&grammar, "s na"), None);
        assert_eq!(
            unique_completion(&grammar, "s", "s").unwrap_err().to_string(),
            "Ambiguous token 's' (2 candidates)"
        );
    }

    #[test]
    fn test_expansion_is_judged_per_token() {
        let grammar = grammar();
        // Each token has a single completion, so the line expands even though
        // "show name" takes no value.
        assert_eq!(
            expand_abbreviations(&grammar, "sh na Alice"),
            Some("show name Alice".to_string())
        );
        let stack = ContextStack::new("cli> ");
        let err = resolve(&grammar, &groups(), &stack, "sh na Alice", Navigation::Interactive)
            .unwrap_err();
        assert!(matches!(err, CliError::NoMatch { .. }));
    }

    #[test]
    fn test_resolve_navigation() {
        let grammar = grammar();
        let mut stack = ContextStack::new("cli> ");

        assert!(matches!(
            resolve(&grammar, &groups(), &stack, "   ", Navigation::Interactive),
            Ok(Resolution::Empty)
        ));
        assert!(matches!(
            resolve(&grammar, &groups(), &stack, "end", Navigation::Interactive),
            Ok(Resolution::EndContexts)
        ));
        // At top level "exit" is resolved by the grammar
        assert_eq!(
            callback(resolve(&grammar, &groups(), &stack, "exit", Navigation::Interactive).unwrap()),
            Some("quit".to_string())
        );

        stack.enter("interface");
        assert!(matches!(
            resolve(&grammar, &groups(), &stack, " exit ", Navigation::Interactive),
            Ok(Resolution::ExitContext)
        ));
    }

    #[test]
    fn test_context_group_entry_and_transparency() {
        let grammar = grammar();
        let mut stack = ContextStack::new("cli> ");

        match resolve(&grammar, &groups(), &stack, "interface", Navigation::Interactive) {
            Ok(Resolution::EnterContext(name)) => assert_eq!(name, "interface"),
            other => panic!("unexpected {other:?}"),
        }
        // Replay never enters contexts
        assert!(matches!(
            resolve(&grammar, &groups(), &stack, "interface", Navigation::Replay),
            Err(CliError::NoMatch { .. })
        ));

        stack.enter("interface");
        let nested = resolve(&grammar, &groups(), &stack, "mtu 1500", Navigation::Interactive).unwrap();
        let flat = resolve(
            &grammar,
            &groups(),
            &ContextStack::new("cli> "),
            "interface mtu 1500",
            Navigation::Interactive,
        )
        .unwrap();
        assert_eq!(callback(nested), callback(flat));
    }

    #[test]
    fn test_parse_and_match_errors() {
        let grammar = grammar();
        let stack = ContextStack::new("cli> ");
        assert!(matches!(
            resolve(&grammar, &groups(), &stack, "set name 'Alice", Navigation::Interactive),
            Err(CliError::Parse)
        ));
        let err = resolve(&grammar, &groups(), &stack, "frobnicate now", Navigation::Interactive)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: frobnicate now");
    }

    #[test]
    fn test_replay_treats_end_as_a_command() {
        let grammar = grammar();
        let stack = ContextStack::new("cli> ");
        assert!(matches!(
            resolve(&grammar, &groups(), &stack, "end", Navigation::Replay),
            Err(CliError::NoMatch { .. })
        ));
    }
}
