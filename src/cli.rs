//! CLI assembly
//!
//! [`CliBuilder`] collects commands, output bindings, context groups and
//! documentation at startup and produces an immutable [`Cli`], shared by every
//! session as an `Arc<Cli>`.
//!
//! Grammar selection happens in [`CliBuilder::build`]: when a YAML grammar
//! is configured (explicit path first, then the `grammar_env` variable) and
//! loads, it becomes the active grammar and dispatch goes through callback
//! names. Otherwise the compiled-in grammar with direct handlers is used.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::builtins;
use crate::config::CliConfig;
use crate::dispatch::{handler, DispatchMode, DispatchTable, Handler};
use crate::doc::DocTable;
use crate::error::CliError;
use crate::grammar::{compile_command, yaml, ArgSpec, Grammar, GrammarNode, MatchResult, TreeGrammar};
use crate::output::{ConfigSink, FormatOverrides, OutputBinding, OutputRegistry};
use crate::session::Session;

/// Cooperative "keep running" flag shared by the transports and handlers
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// A command declaration: callback name, expression, help and handler
pub struct Command {
    name: String,
    expr: String,
    help: Option<String>,
    args: Vec<ArgSpec>,
    handler: Handler,
}

impl Command {
    pub fn new<F>(name: impl Into<String>, expr: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Session, &MatchResult<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::with_handler(name, expr, handler(f))
    }

    pub fn with_handler(name: impl Into<String>, expr: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
            help: None,
            args: Vec::new(),
            handler,
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn arg(mut self, spec: ArgSpec) -> Self {
        self.args.push(spec);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn compile(&self) -> Result<GrammarNode, CliError> {
        Ok(compile_command(
            &self.name,
            &self.expr,
            self.help.as_deref(),
            &self.args,
            Some(self.handler.clone()),
        )?)
    }
}

pub struct CliBuilder {
    config: CliConfig,
    commands: Vec<Command>,
    outputs: OutputRegistry,
    context_groups: Vec<String>,
    docs: Option<DocTable>,
    grammar_file: Option<PathBuf>,
    use_grammar_env: bool,
    run_flag: RunFlag,
    builtins: bool,
}

impl CliBuilder {
    pub fn new(config: CliConfig) -> Self {
        Self {
            config: config.with_defaults(),
            commands: Vec::new(),
            outputs: OutputRegistry::new(),
            context_groups: Vec::new(),
            docs: None,
            grammar_file: None,
            use_grammar_env: true,
            run_flag: RunFlag::new(),
            builtins: true,
        }
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn output(mut self, binding: OutputBinding) -> Self {
        self.outputs.register(binding);
        self
    }

    /// A bare keyword that, typed alone, enters a context of that name
    pub fn context_group(mut self, keyword: impl Into<String>) -> Self {
        self.context_groups.push(keyword.into());
        self
    }

    pub fn docs(mut self, docs: DocTable) -> Self {
        self.docs = Some(docs);
        self
    }

    /// Load this YAML grammar instead of the compiled-in one
    pub fn grammar_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.grammar_file = Some(path.into());
        self
    }

    /// Do not consult the `grammar_env` variable
    pub fn ignore_grammar_env(mut self) -> Self {
        self.use_grammar_env = false;
        self
    }

    pub fn run_flag(mut self, flag: RunFlag) -> Self {
        self.run_flag = flag;
        self
    }

    /// Leave out help/quit/show/write/doc
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    pub fn build(self) -> Result<Cli, CliError> {
        let mut commands = if self.builtins {
            builtins::commands()
        } else {
            Vec::new()
        };
        commands.extend(self.commands);

        let mut table = DispatchTable::new();
        let mut nodes = Vec::with_capacity(commands.len());
        for command in &commands {
            nodes.push(command.compile()?);
            table.register(command.name.clone(), command.handler.clone());
        }
        let compiled = GrammarNode::or(nodes);

        let override_path = self.grammar_file.clone().or_else(|| {
            self.use_grammar_env
                .then(|| self.config.grammar_from_env())
                .flatten()
        });

        let (root, mode, formats) = match override_path {
            Some(path) => match yaml::load(&path) {
                Ok(loaded) => {
                    info!(
                        "Using grammar {} with symbolic dispatch ({} output format override(s))",
                        path.display(),
                        loaded.formats.len()
                    );
                    let formats = (!loaded.formats.is_empty()).then_some(loaded.formats);
                    (loaded.root, DispatchMode::Symbolic, formats)
                }
                Err(e) => {
                    warn!(
                        "Cannot load grammar {}: {}; using the built-in grammar",
                        path.display(),
                        e
                    );
                    (compiled, DispatchMode::Direct, None)
                }
            },
            None => (compiled, DispatchMode::Direct, None),
        };

        info!(
            "CLI ready: {} command(s), {} output binding(s), {:?} dispatch",
            commands.len(),
            self.outputs.len(),
            mode
        );

        Ok(Cli {
            config: self.config,
            grammar: Box::new(TreeGrammar::new(root)),
            mode,
            table,
            outputs: self.outputs,
            formats,
            context_groups: self.context_groups,
            docs: self.docs,
            running: self.run_flag,
        })
    }
}

/// Process-wide registries, immutable once built
pub struct Cli {
    config: CliConfig,
    grammar: Box<dyn Grammar>,
    mode: DispatchMode,
    table: DispatchTable,
    outputs: OutputRegistry,
    formats: Option<FormatOverrides>,
    context_groups: Vec<String>,
    docs: Option<DocTable>,
    running: RunFlag,
}

impl Cli {
    pub fn builder(config: CliConfig) -> CliBuilder {
        CliBuilder::new(config)
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn outputs(&self) -> &OutputRegistry {
        &self.outputs
    }

    pub fn format_overrides(&self) -> Option<&FormatOverrides> {
        self.formats.as_ref()
    }

    pub fn context_groups(&self) -> &[String] {
        &self.context_groups
    }

    pub fn docs(&self) -> Option<&DocTable> {
        self.docs.as_ref()
    }

    pub fn run_flag(&self) -> &RunFlag {
        &self.running
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    /// `<banner> v<version>`, when a banner is configured
    pub fn banner_line(&self) -> Option<String> {
        self.config
            .banner
            .as_ref()
            .map(|banner| format!("{} v{}", banner, self.config.version))
    }

    pub fn dump_running_config(&self, sink: &mut dyn ConfigSink) -> io::Result<()> {
        self.outputs.dump(sink, self.format_overrides())
    }

    /// One `  <syntax> - <help>` line per command that has help text
    pub fn help_text(&self) -> String {
        let mut text = String::from("Commands:\n");
        for command in self.grammar.root().commands() {
            if let Some(help) = command.help() {
                text.push_str(&format!("  {} - {}\n", command.syntax(), help));
            }
        }
        text
    }
}
