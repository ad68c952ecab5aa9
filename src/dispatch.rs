//! Handler dispatch
//!
//! A matched command is bound to code in one of two ways. Compiled-in
//! grammars attach the handler to the command node itself (direct mode).
//! Grammars loaded from YAML only carry a callback name, which is looked up
//! in a name → handler table populated at startup (symbolic mode). The mode
//! is chosen once, when the grammar is selected.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::CliError;
use crate::grammar::MatchResult;
use crate::session::Session;

/// Command handler. Errors are reported to the user as "Command failed";
/// anything more specific must be written to the session before returning.
pub type Handler =
    Arc<dyn Fn(&mut Session, &MatchResult<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure or fn item as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Session, &MatchResult<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Handlers attached to the compiled-in grammar nodes
    Direct,
    /// Callback names resolved through the [`DispatchTable`]
    Symbolic,
}

/// The code binding found on a matched command
#[derive(Clone)]
pub enum HandlerRef {
    Direct(Handler),
    Symbolic(String),
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Direct(_) => f.write_str("Direct(<handler>)"),
            HandlerRef::Symbolic(name) => f.debug_tuple("Symbolic").field(name).finish(),
        }
    }
}

impl HandlerRef {
    /// Innermost binding on the matched node chain for the given mode
    pub fn from_match(mode: DispatchMode, result: &MatchResult<'_>) -> Option<Self> {
        match mode {
            DispatchMode::Direct => result.handler().cloned().map(HandlerRef::Direct),
            DispatchMode::Symbolic => result
                .callback_name()
                .map(|name| HandlerRef::Symbolic(name.to_string())),
        }
    }
}

/// Name → handler table used in symbolic mode
#[derive(Clone, Default)]
pub struct DispatchTable {
    handlers: HashMap<String, Handler>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`. A later registration under the same
    /// name replaces the earlier one, which is returned.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) -> Option<Handler> {
        let name = name.into();
        let previous = self.handlers.insert(name.clone(), handler);
        if previous.is_some() {
            debug!("Replaced handler for callback '{}'", name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn resolve(&self, handler_ref: &HandlerRef) -> Result<Handler, CliError> {
        match handler_ref {
            HandlerRef::Direct(handler) => Ok(handler.clone()),
            HandlerRef::Symbolic(name) => {
                self.get(name)
                    .cloned()
                    .ok_or_else(|| CliError::NoHandler {
                        name: Some(name.clone()),
                    })
            }
        }
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("DispatchTable").field("handlers", &names).finish()
    }
}
