//! Minimal opshell demo
//!
//! ```bash
//! # Interactive on the terminal
//! opshell-minimal
//!
//! # Replay a saved configuration, then serve one TCP client at a time
//! opshell-minimal --config running.cfg --tcp 2323
//!
//! # Run a translated grammar exported with `write yaml`
//! OPSHELL_GRAMMAR=fr.yaml opshell-minimal
//! ```

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use opshell::transport::{run_local, LineServer};
use opshell::{
    load_config, types, Cli, CliBuilder, CliConfig, Command, DocEntry, DocTable, OutputBinding,
    Session,
};

const DEFAULT_NAME: &str = "world";
const DEFAULT_MTU: i64 = 1500;

#[derive(Parser)]
#[command(name = "opshell-minimal")]
#[command(version)]
#[command(about = "Minimal operator CLI built on opshell")]
struct Args {
    /// Serve on this TCP port instead of the terminal
    #[arg(long)]
    tcp: Option<u16>,

    /// Configuration file to replay before starting
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// CLI settings (YAML: prompt, banner, version, grammar_env, app_name)
    #[arg(long, env = "OPSHELL_SETTINGS")]
    settings: Option<PathBuf>,

    /// Alternate YAML grammar; takes precedence over the grammar environment variable
    #[arg(long)]
    grammar: Option<PathBuf>,
}

#[derive(Debug)]
struct DemoState {
    name: String,
    address: Option<Ipv4Addr>,
    mtu: i64,
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            address: None,
            mtu: DEFAULT_MTU,
        }
    }
}

type SharedState = Arc<Mutex<DemoState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, DemoState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_address(session: &mut Session, text: &str) -> Result<Ipv4Addr> {
    match types::parse_ipv4(text) {
        Some(addr) => Ok(addr),
        None => {
            session.error(format!("Invalid IPv4 address: {text}"));
            bail!("invalid IPv4 address '{text}'")
        }
    }
}

fn commands(state: &SharedState) -> Vec<Command> {
    let show_name = {
        let state = state.clone();
        Command::new("show_name", "show name", move |session, _| {
            let name = lock(&state).name.clone();
            session.output(&format!("Name: {name}\n"));
            Ok(())
        })
        .help("display the greeting name")
    };

    let set_name = {
        let state = state.clone();
        Command::new("set_name", "set name <value>", move |session, m| {
            let value = m.arg("value").context("missing <value>")?;
            lock(&state).name = value.to_string();
            session.output(&format!("Name set to {value}\n"));
            Ok(())
        })
        .help("set the greeting name")
        .arg(types::name("value", "name to greet"))
    };

    let show_address = {
        let state = state.clone();
        Command::new("show_address", "show address", move |session, _| {
            let address = lock(&state).address;
            match address {
                Some(addr) => session.output(&format!("Address: {addr}\n")),
                None => session.output("Address: not set\n"),
            }
            Ok(())
        })
        .help("display the configured address")
    };

    let set_address = {
        let state = state.clone();
        Command::new("set_address", "set address <addr>", move |session, m| {
            let text = m.arg("addr").context("missing <addr>")?;
            let addr = parse_address(session, text)?;
            lock(&state).address = Some(addr);
            session.output(&format!("Address set to {addr}\n"));
            Ok(())
        })
        .help("set the IPv4 address")
        .arg(types::ipv4("addr", "IPv4 address"))
    };

    let del_address = {
        let state = state.clone();
        Command::new("del_address", "del address <addr>", move |session, m| {
            let text = m.arg("addr").context("missing <addr>")?;
            let addr = parse_address(session, text)?;
            let mut guard = lock(&state);
            if guard.address != Some(addr) {
                drop(guard);
                session.error(format!("Address {addr} is not configured"));
                bail!("address {addr} not configured");
            }
            guard.address = None;
            drop(guard);
            session.output(&format!("Address {addr} removed\n"));
            Ok(())
        })
        .help("remove the IPv4 address")
        .arg(types::ipv4("addr", "IPv4 address"))
    };

    let hello = {
        let state = state.clone();
        Command::new("hello", "hello", move |session, _| {
            let name = lock(&state).name.clone();
            session.output(&format!("Hello, {name}!\n"));
            Ok(())
        })
        .help("say hello")
    };

    let interface_mtu = {
        let state = state.clone();
        Command::new("interface_mtu", "interface mtu <mtu>", move |session, m| {
            let mtu = m.arg_int("mtu", DEFAULT_MTU);
            lock(&state).mtu = mtu;
            session.output(&format!("MTU set to {mtu}\n"));
            Ok(())
        })
        .help("set the interface MTU")
        .arg(types::mtu("mtu", "MTU in bytes"))
    };

    vec![
        show_name,
        set_name,
        show_address,
        set_address,
        del_address,
        hello,
        interface_mtu,
    ]
}

fn outputs(state: &SharedState) -> Vec<OutputBinding> {
    let greeting = {
        let state = state.clone();
        OutputBinding::new("set_name", "greeting", "set name {name}\n", 10, move |sink, template| {
            let name = lock(&state).name.clone();
            if name == DEFAULT_NAME {
                return Ok(());
            }
            sink.emit_fmt(template, &[("name", (&name).into())])
        })
    };

    let network = {
        let state = state.clone();
        OutputBinding::new("set_address", "network", "set address {addr}\n", 20, move |sink, template| {
            let Some(addr) = lock(&state).address else {
                return Ok(());
            };
            let addr = addr.to_string();
            sink.emit_fmt(template, &[("addr", (&addr).into())])
        })
    };

    let interface = {
        let state = state.clone();
        OutputBinding::new("interface_mtu", "interface", "interface mtu {mtu}\n", 30, move |sink, template| {
            let mtu = lock(&state).mtu;
            if mtu == DEFAULT_MTU {
                return Ok(());
            }
            sink.emit_fmt(template, &[("mtu", mtu.into())])
        })
    };

    vec![greeting, network, interface]
}

fn docs() -> DocTable {
    DocTable::new()
        .with(
            "set_name",
            DocEntry::new("Changes the name used by the hello command. The default name is not saved.")
                .with_examples("set name alice\nse na bob"),
        )
        .with(
            "interface_mtu",
            DocEntry::new("Sets the MTU. Also available inside the interface context as 'mtu <mtu>'.")
                .with_examples("interface mtu 9000\ninterface\n  mtu 9000"),
        )
}

fn build_cli(config: CliConfig, grammar: Option<PathBuf>, state: &SharedState) -> Result<Cli> {
    let mut builder = CliBuilder::new(config).context_group("interface").docs(docs());
    for command in commands(state) {
        builder = builder.command(command);
    }
    for binding in outputs(state) {
        builder = builder.output(binding);
    }
    if let Some(path) = grammar {
        builder = builder.grammar_file(path);
    }
    Ok(builder.build()?)
}

fn serve(cli: Arc<Cli>, port: u16) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async move {
        let server = LineServer::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("Failed to listen on port {port}"))?;

        let flag = cli.run_flag().clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, stopping");
                flag.stop();
            }
        });

        server.run(cli).await.context("Line server failed")
    })
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.settings {
        Some(path) => CliConfig::from_yaml_file(path)?,
        None => CliConfig::new("demo> ").with_banner("opshell minimal demo"),
    };

    let state: SharedState = Arc::new(Mutex::new(DemoState::default()));
    let cli = Arc::new(build_cli(config, args.grammar.clone(), &state)?);

    if let Some(path) = &args.config {
        let mut session = Session::local(cli.clone());
        let report = load_config(&mut session, path)?;
        if !report.is_clean() {
            warn!(
                "{} of {} configuration command(s) in {} failed",
                report.failed(),
                report.commands,
                path.display()
            );
        }
    }

    match args.tcp {
        Some(port) => serve(cli, port),
        None => run_local(cli).context("Terminal session failed"),
    }
}
