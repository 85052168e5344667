use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::state::VehicleState;

/// A request never exceeds one bounded read.
const MAX_REQUEST: usize = 1024;

/// Strictly sequential command server: accept one connection, one bounded
/// read, compute the reply, one write, close, accept the next. One client
/// at a time holds the server, and there is no read timeout, so a
/// connected-but-silent client stalls the loop until it speaks or hangs up.
pub struct CommandServer {
    listener: TcpListener,
}

impl CommandServer {
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("bind command server {}", addr))?;
        info!("command server listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs until a `quit` has been acknowledged. Per-connection faults are
    /// logged and the loop keeps accepting; only `quit` ends it.
    pub async fn run(self, state: Arc<Mutex<VehicleState>>) -> Result<()> {
        loop {
            let (sock, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            };
            match serve_one(sock, &state).await {
                Ok(shutdown) => {
                    if shutdown {
                        info!("command server quitting");
                        return Ok(());
                    }
                }
                Err(e) => warn!("connection from {} failed: {:#}", peer, e),
            }
        }
    }
}

async fn serve_one(mut sock: TcpStream, state: &Arc<Mutex<VehicleState>>) -> Result<bool> {
    let mut buf = [0u8; MAX_REQUEST];
    let n = sock.read(&mut buf).await.context("read request")?;
    let line = String::from_utf8_lossy(&buf[..n]).into_owned();
    info!("received: {}", line.trim());
    let reply = state.lock().unwrap().handle(&line);
    sock.write_all(reply.text.as_bytes()).await.context("write reply")?;
    Ok(reply.shutdown)
}
