use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::proxy::{BackendPool, SessionOptions, handle_connection};

/// Bind the configured port and serve connections forever
///
/// Bind failures are returned to the caller and are fatal for the process.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let pool = BackendPool::new(cfg.backends.clone())?;
    let opts = SessionOptions {
        connect_timeout: cfg.connect_timeout(),
    };

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {} with {} backends", addr, pool.len());

    serve(listener, pool, opts).await
}

/// Accept connections on an already bound listener
///
/// Each connection is handled on its own task so a slow backend never holds
/// up `accept`. An accept error ends the loop.
pub async fn serve(
    listener: TcpListener,
    pool: BackendPool,
    opts: SessionOptions,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        debug!("Accepted connection from {}", peer);

        let pool = pool.clone();
        let opts = opts.clone();
        tokio::spawn(async move {
            match handle_connection(socket, peer, pool, opts).await {
                Ok(stats) => {
                    info!(
                        client = %peer,
                        backend = %stats.backend.addr,
                        sent = stats.client_to_backend,
                        received = stats.backend_to_client,
                        "Session closed"
                    );
                }
                Err(e) => {
                    warn!("Session from {} failed: {:#}", peer, e);
                }
            }
        });
    }
}
