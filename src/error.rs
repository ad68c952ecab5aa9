//! Error types for the session engine
//!
//! Every failure a user can trigger from a prompt is a `CliError`. None of
//! them are fatal: the resolver turns them into a message on the session's
//! output channel and keeps prompting. Only grammar construction at startup
//! (`GrammarError`) aborts initialization.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while resolving, dispatching or replaying commands
#[derive(Error, Debug)]
pub enum CliError {
    /// The line could not be tokenized (e.g. an unterminated quote)
    #[error("Parse error")]
    Parse,

    /// Well-formed input that no grammar path accepts, after expansion failed
    #[error("Unknown command: {line}")]
    NoMatch { line: String },

    /// A token with several completions; only used inside abbreviation expansion
    #[error("Ambiguous token '{token}' ({candidates} candidates)")]
    AmbiguousToken { token: String, candidates: usize },

    #[error("Already at top level")]
    ContextUnderflow,

    /// The matched leaf has no bound or resolvable handler
    #[error("No handler for command")]
    NoHandler { name: Option<String> },

    #[error("Another session is active from {active}")]
    DuplicateClientRejected { active: SocketAddr },

    #[error("Cannot open file: {}: {source}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write file: {}: {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The handler ran and reported failure; details were printed by the handler
    #[error("Command failed")]
    CommandFailed { reason: String },

    #[error("Invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

impl CliError {
    pub(crate) fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::FileIo {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while building, importing or exporting a grammar
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("Invalid command expression '{expr}': {message}")]
    Expression { expr: String, message: String },

    #[error("Command '{command}' references unknown argument <{id}>")]
    UnknownArgument { command: String, id: String },

    #[error("Invalid pattern for <{id}>: {source}")]
    Pattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid grammar definition: {message}")]
    Definition { message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        let err = CliError::NoMatch {
            line: "frobnicate".into(),
        };
        assert_eq!(err.to_string(), "Unknown command: frobnicate");
        assert_eq!(CliError::ContextUnderflow.to_string(), "Already at top level");

        let active: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        assert_eq!(
            CliError::DuplicateClientRejected { active }.to_string(),
            "Another session is active from 127.0.0.1:40000"
        );
    }

    #[test]
    fn test_file_io_names_path() {
        let err = CliError::file_io(
            "/nope/running.cfg",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.to_string(), "Cannot open file: /nope/running.cfg: not found");
    }
}
