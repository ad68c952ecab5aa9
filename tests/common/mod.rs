//! Router-style fixture shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use opshell::{types, Cli, CliBuilder, CliConfig, Command, OutputBinding, Session};

pub const DEFAULT_HOSTNAME: &str = "router";
pub const DEFAULT_MTU: i64 = 1500;

#[derive(Debug)]
pub struct RouterState {
    pub hostname: String,
    pub mtu: i64,
}

impl Default for RouterState {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            mtu: DEFAULT_MTU,
        }
    }
}

#[derive(Clone, Default)]
pub struct Router {
    pub state: Arc<Mutex<RouterState>>,
    pub hello_calls: Arc<AtomicUsize>,
}

impl Router {
    pub fn state(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap()
    }

    pub fn hello_calls(&self) -> usize {
        self.hello_calls.load(Ordering::SeqCst)
    }

    pub fn builder(&self, config: CliConfig) -> CliBuilder {
        let hostname_state = self.state.clone();
        let mtu_state = self.state.clone();
        let calls = self.hello_calls.clone();

        CliBuilder::new(config)
            .ignore_grammar_env()
            .context_group("interface")
            .context_group("vlan")
            .command(
                Command::new("set_hostname", "hostname <name>", move |session, m| {
                    let name = m.arg("name").unwrap_or_default().to_string();
                    session.output(&format!("Hostname set to {name}\n"));
                    hostname_state.lock().unwrap().hostname = name;
                    Ok(())
                })
                .help("set the host name")
                .arg(types::hostname("name", "host name")),
            )
            .command(
                Command::new("interface_mtu", "interface mtu <mtu>", move |_, m| {
                    mtu_state.lock().unwrap().mtu = m.arg_int("mtu", DEFAULT_MTU);
                    Ok(())
                })
                .help("set the interface MTU")
                .arg(types::mtu("mtu", "MTU in bytes")),
            )
            .command(
                Command::new("hello", "hello", move |session, _| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    session.output("Hello!\n");
                    Ok(())
                })
                .help("say hello"),
            )
            .command(Command::new("fail", "fail", |session, _| {
                session.error("something broke");
                anyhow::bail!("deliberate failure")
            }))
            .output(self.hostname_binding())
            .output(self.mtu_binding())
    }

    pub fn build(&self) -> Arc<Cli> {
        Arc::new(self.builder(CliConfig::default()).build().unwrap())
    }

    pub fn session(&self) -> Session {
        Session::local(self.build())
    }

    fn hostname_binding(&self) -> OutputBinding {
        let state = self.state.clone();
        OutputBinding::new("set_hostname", "system", "hostname {name}\n", 10, move |sink, template| {
            let name = state.lock().unwrap().hostname.clone();
            if name == DEFAULT_HOSTNAME {
                return Ok(());
            }
            sink.emit_fmt(template, &[("name", (&name).into())])
        })
    }

    fn mtu_binding(&self) -> OutputBinding {
        let state = self.state.clone();
        OutputBinding::new("interface_mtu", "interface", "interface mtu {mtu}\n", 20, move |sink, template| {
            let mtu = state.lock().unwrap().mtu;
            if mtu == DEFAULT_MTU {
                return Ok(());
            }
            sink.emit_fmt(template, &[("mtu", mtu.into())])
        })
    }
}

/// Feed one interactive line and return everything it printed
pub fn run(session: &mut Session, line: &str) -> String {
    opshell::process_line(session, line);
    session.take_output()
}
