//! Per-client session state

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::cli::Cli;
use crate::context::ContextStack;
use crate::error::CliError;
use crate::output::ConfigSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Interactive loop on the local terminal
    Local,
    /// Client of the line server
    Remote,
}

/// One attached client: its context stack and pending output.
///
/// Handlers write through [`Session::output`] (or `write!`); the transport
/// collects the buffered text with [`Session::take_output`] after each line.
pub struct Session {
    id: Uuid,
    mode: TransportMode,
    context: ContextStack,
    cli: Arc<Cli>,
    output: String,
    peer: Option<SocketAddr>,
}

impl Session {
    pub fn new(cli: Arc<Cli>, mode: TransportMode) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, ?mode, "Session created");
        Self {
            id,
            mode,
            context: ContextStack::new(cli.config().prompt.clone()),
            cli,
            output: String::new(),
            peer: None,
        }
    }

    pub fn local(cli: Arc<Cli>) -> Self {
        Self::new(cli, TransportMode::Local)
    }

    pub fn remote(cli: Arc<Cli>, peer: SocketAddr) -> Self {
        let mut session = Self::new(cli, TransportMode::Remote);
        session.peer = Some(peer);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn cli(&self) -> &Cli {
        &self.cli
    }

    /// Shared handle, for calls that need the CLI and `&mut self` together
    pub fn cli_handle(&self) -> Arc<Cli> {
        Arc::clone(&self.cli)
    }

    pub fn context(&self) -> &ContextStack {
        &self.context
    }

    pub fn prompt(&self) -> &str {
        self.context.prompt()
    }

    pub fn output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Write `Error: <message>` on its own line
    pub fn error(&mut self, message: impl fmt::Display) {
        self.output.push_str(&format!("Error: {message}\n"));
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn write_prompt(&mut self) {
        let prompt = self.context.prompt().to_string();
        self.output.push_str(&prompt);
    }

    pub fn enter_context(&mut self, name: impl Into<String>) {
        let name = name.into();
        debug!(session = %self.id, context = %name, "Entering context");
        self.context.enter(name);
    }

    pub fn exit_context(&mut self) -> Result<(), CliError> {
        self.context.exit_one()
    }

    pub fn exit_all_contexts(&mut self) {
        self.context.exit_all();
    }

    /// Stop the transport loop after the current line
    pub fn request_exit(&self) {
        self.cli.run_flag().stop();
    }
}

impl fmt::Write for Session {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

impl ConfigSink for Session {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("depth", &self.context.depth())
            .field("peer", &self.peer)
            .finish()
    }
}
