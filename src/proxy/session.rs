//! Per-connection session handling
//!
//! A session pairs one accepted client with one backend connection and runs
//! the two relay directions until either side closes.

use crate::proxy::backend::{Backend, BackendPool};
use crate::proxy::relay::{self, Direction};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Options applied to every session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Backend connect timeout, none by default
    pub connect_timeout: Option<Duration>,
}

/// Byte counts for a finished session
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub backend: Backend,
    pub client_to_backend: u64,
    pub backend_to_client: u64,
}

/// Handle one accepted client connection
///
/// Picks the next backend and connects to it. If the connect fails the
/// client is closed and the error is returned, with no retry against
/// another backend. Otherwise both relay directions are spawned and this
/// waits for them to finish.
pub async fn handle_connection(
    mut client: TcpStream,
    client_addr: SocketAddr,
    pool: BackendPool,
    opts: SessionOptions,
) -> Result<SessionStats> {
    let backend = pool.pick_next().await;

    let upstream = match connect(&backend.addr, opts.connect_timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            relay::close(&mut client).await;
            return Err(e.context(format!("Backend {} unreachable", backend.addr)));
        }
    };

    tracing::info!(
        client = %client_addr,
        backend = %backend.addr,
        index = backend.index,
        "Session opened"
    );

    if let Err(e) = client.set_nodelay(true) {
        tracing::trace!(error = %e, "Failed to set TCP_NODELAY on client");
    }
    if let Err(e) = upstream.set_nodelay(true) {
        tracing::trace!(error = %e, "Failed to set TCP_NODELAY on backend");
    }

    let (client_read, client_write) = client.into_split();
    let (backend_read, backend_write) = upstream.into_split();
    let teardown = CancellationToken::new();

    let outbound = tokio::spawn(relay::relay(
        client_read,
        backend_write,
        teardown.clone(),
        Direction::ClientToBackend,
    ));
    let inbound = tokio::spawn(relay::relay(
        backend_read,
        client_write,
        teardown,
        Direction::BackendToClient,
    ));

    let (outbound, inbound) = tokio::join!(outbound, inbound);

    let client_to_backend = outbound.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Relay task failed");
        0
    });
    let backend_to_client = inbound.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Relay task failed");
        0
    });

    Ok(SessionStats {
        backend,
        client_to_backend,
        backend_to_client,
    })
}

async fn connect(addr: &str, connect_timeout: Option<Duration>) -> Result<TcpStream> {
    match connect_timeout {
        Some(limit) => timeout(limit, TcpStream::connect(addr))
            .await
            .context("Connection timeout")?
            .context("Failed to connect to backend"),
        None => TcpStream::connect(addr)
            .await
            .context("Failed to connect to backend"),
    }
}
