//! Unidirectional byte relay
//!
//! A session runs two relays, one per direction, that share a teardown
//! token. Whichever relay finishes first cancels the token, and the other
//! one unwinds instead of waiting on its own peer.

use bytes::BytesMut;
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Read chunk size for each relay
pub const CHUNK_SIZE: usize = 4096;

/// Which way a relay carries bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToBackend,
    BackendToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToBackend => write!(f, "client->backend"),
            Direction::BackendToClient => write!(f, "backend->client"),
        }
    }
}

/// Copy bytes from `src` to `dst` until end-of-stream, an I/O error, or
/// session teardown.
///
/// Every chunk is written in full and flushed before the next read. On exit
/// the session token is cancelled and `dst` is shut down; both halves are
/// dropped when this returns. I/O errors end the relay and are only logged.
///
/// Returns the number of bytes delivered to `dst`.
pub async fn relay<R, W>(
    mut src: R,
    mut dst: W,
    teardown: CancellationToken,
    direction: Direction,
) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(CHUNK_SIZE);
    let mut copied: u64 = 0;

    loop {
        buffer.clear();

        let read = tokio::select! {
            _ = teardown.cancelled() => {
                trace!(%direction, "Session torn down, stopping relay");
                break;
            }
            res = src.read_buf(&mut buffer) => res,
        };

        let n = match read {
            Ok(0) => {
                trace!(%direction, "End of stream");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                debug!(%direction, error = %e, "Read failed");
                break;
            }
        };

        let written = tokio::select! {
            _ = teardown.cancelled() => {
                trace!(%direction, "Session torn down during write");
                break;
            }
            res = write_chunk(&mut dst, &buffer) => res,
        };

        if let Err(e) = written {
            debug!(%direction, error = %e, "Write failed");
            break;
        }

        copied += n as u64;
    }

    teardown.cancel();
    close(&mut dst).await;

    copied
}

async fn write_chunk<W>(dst: &mut W, chunk: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    dst.write_all(chunk).await?;
    dst.flush().await
}

/// Shut down the write side of a stream, ignoring errors
///
/// Safe to call on a stream that is already shut down or reset.
pub async fn close<W>(dst: &mut W)
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = dst.shutdown().await {
        trace!(error = %e, "Shutdown on closed stream");
    }
}
