//! opshell: an embeddable session engine for router/switch-style operator CLIs
//!
//! An application declares its commands with a compact expression syntax,
//! registers how its state is written back as commands, and hands the
//! resulting [`Cli`] to a transport:
//!
//! ```no_run
//! use std::sync::Arc;
//! use opshell::{types, CliBuilder, CliConfig, Command};
//!
//! let cli = CliBuilder::new(CliConfig::new("router> "))
//!     .command(
//!         Command::new("set_hostname", "hostname <name>", |session, m| {
//!             session.output(&format!("hostname is now {}\n", m.arg("name").unwrap_or("?")));
//!             Ok(())
//!         })
//!         .help("set the host name")
//!         .arg(types::hostname("name", "host name")),
//!     )
//!     .build()?;
//! opshell::transport::run_local(Arc::new(cli))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Per input line the [`resolver`] handles context navigation (`end`,
//! `exit`, context-group keywords), parses against the active grammar,
//! retries with abbreviation expansion and dispatches to the bound handler.
//! `show running-config` / `write file` walk the [`OutputRegistry`]; the
//! resulting text replays through [`replay::load_config`].

mod builtins;
pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod doc;
pub mod error;
pub mod grammar;
pub mod output;
pub mod replay;
pub mod resolver;
pub mod session;
pub mod transport;
pub mod types;

pub use cli::{Cli, CliBuilder, Command, RunFlag};
pub use config::CliConfig;
pub use context::{ContextFrame, ContextStack};
pub use dispatch::{handler, DispatchMode, DispatchTable, Handler, HandlerRef};
pub use doc::{DocEntry, DocFormat, DocTable};
pub use error::{CliError, CliResult, GrammarError};
pub use grammar::{ArgSpec, Grammar, MatchResult};
pub use output::{ConfigSink, FmtValue, FormatOverrides, OutputBinding, OutputRegistry, WriterSink};
pub use replay::{load_config, ReplayFailure, ReplayReport};
pub use resolver::{process_line, LineOutcome};
pub use session::{Session, TransportMode};
