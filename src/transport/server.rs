//! Single-client TCP line server
//!
//! One connection is served at a time. While a client is attached, further
//! connections are told who holds the session and closed; the attached
//! client is not disturbed. Each attached connection gets a fresh session.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::error::CliError;
use crate::resolver::process_line;
use crate::session::Session;
use crate::transport::decode_line;

/// How often the loop wakes up to check the run flag
const TICK: Duration = Duration::from_millis(100);

struct Client {
    peer: SocketAddr,
    session: Session,
    reader: BufReader<OwnedReadHalf>,
    /// Bytes of the line being read; kept across cancelled reads
    pending: Vec<u8>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn attach(cli: &Arc<Cli>, stream: TcpStream, peer: SocketAddr) -> io::Result<Self> {
        let (reader, mut writer) = stream.into_split();
        let mut session = Session::remote(Arc::clone(cli), peer);

        let mut greeting = String::new();
        if let Some(banner) = cli.banner_line() {
            greeting.push_str(&banner);
            greeting.push_str("\r\n");
        }
        session.write_prompt();
        greeting.push_str(&session.take_output());
        writer.write_all(greeting.as_bytes()).await?;

        info!(session = %session.id(), %peer, "Client attached");
        Ok(Self {
            peer,
            session,
            reader: BufReader::new(reader),
            pending: Vec::new(),
            writer,
        })
    }

    /// Next input line, or `None` at EOF. Cancel safe: a partial line stays
    /// in `pending` until its newline arrives.
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.pending).await?;
        if read == 0 && self.pending.is_empty() {
            return Ok(None);
        }
        let line = decode_line(&self.pending).into_owned();
        self.pending.clear();
        Ok(Some(line))
    }

    async fn handle_line(&mut self, line: &str) -> io::Result<()> {
        process_line(&mut self.session, line);
        let output = self.session.take_output();
        self.writer.write_all(output.as_bytes()).await
    }
}

async fn reject(mut stream: TcpStream, active: SocketAddr, peer: SocketAddr) {
    let notice = format!("{}\r\n", CliError::DuplicateClientRejected { active });
    if let Err(e) = stream.write_all(notice.as_bytes()).await {
        debug!(%peer, "Failed to notify rejected client: {}", e);
    }
    let _ = stream.shutdown().await;
    info!(%peer, %active, "Rejected connection: session busy");
}

/// Next line from the attached client; never resolves when there is none
async fn next_line(client: &mut Option<Client>) -> io::Result<Option<String>> {
    match client {
        Some(client) => client.read_line().await,
        None => std::future::pending().await,
    }
}

pub struct LineServer {
    listener: TcpListener,
}

impl LineServer {
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Line server listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the CLI's run flag is cleared
    pub async fn run(self, cli: Arc<Cli>) -> io::Result<()> {
        let mut client: Option<Client> = None;
        let mut ticker = tokio::time::interval(TICK);

        while cli.is_running() {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!("Accept failed: {}", e);
                            continue;
                        }
                    };
                    match &client {
                        Some(active) => reject(stream, active.peer, peer).await,
                        None => match Client::attach(&cli, stream, peer).await {
                            Ok(attached) => client = Some(attached),
                            Err(e) => warn!(%peer, "Failed to attach client: {}", e),
                        },
                    }
                }
                line = next_line(&mut client), if client.is_some() => {
                    let detach = match (line, client.as_mut()) {
                        (Ok(Some(line)), Some(active)) => match active.handle_line(&line).await {
                            Ok(()) => false,
                            Err(e) => {
                                warn!(peer = %active.peer, "Write failed: {}", e);
                                true
                            }
                        },
                        (Ok(None), _) => true,
                        (Err(e), _) => {
                            warn!("Read failed: {}", e);
                            true
                        }
                        (Ok(Some(_)), None) => false,
                    };
                    if detach {
                        if let Some(gone) = client.take() {
                            info!(session = %gone.session.id(), peer = %gone.peer, "Client detached");
                        }
                    }
                }
                _ = ticker.tick() => {}
            }
        }

        info!("Line server stopped");
        Ok(())
    }
}
