//! Bidirectional byte relay between a connection and a pair of local streams.
//!
//! [`run`] spawns one task per direction. Each task copies until its source
//! reaches EOF or an I/O error occurs, then shuts down and drops only its
//! own destination: remote→local shuts down the local output, local→remote
//! half-closes the connection's write side. Neither direction stops the
//! other. The session result is available once both tasks have reported.

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const BUF_SIZE: usize = 8 * 1024;

/// One of the two copy directions of a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Connection → local output (bytes received).
    RemoteToLocal,
    /// Local input → connection (bytes sent).
    LocalToRemote,
}

impl Direction {
    /// Which peer ended this direction by closing its source.
    pub fn closed_by(self) -> &'static str {
        match self {
            Direction::RemoteToLocal => "remote peer",
            Direction::LocalToRemote => "local peer",
        }
    }

    fn other(self) -> Direction {
        match self {
            Direction::RemoteToLocal => Direction::LocalToRemote,
            Direction::LocalToRemote => Direction::RemoteToLocal,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::RemoteToLocal => write!(f, "remote->local"),
            Direction::LocalToRemote => write!(f, "local->remote"),
        }
    }
}

/// Outcome of one direction.
#[derive(Debug)]
pub struct Transfer {
    pub direction: Direction,
    /// Bytes fully written to the destination.
    pub bytes: u64,
    /// The read or write error that ended the copy early, if any.
    pub fault: Option<io::Error>,
}

/// Outcome of a whole session.
#[derive(Debug)]
pub struct TransferResult {
    pub remote_to_local: Transfer,
    pub local_to_remote: Transfer,
    /// The direction whose task completed first.
    pub first_closed: Direction,
}

impl TransferResult {
    /// Bytes received from the remote peer.
    pub fn received(&self) -> u64 {
        self.remote_to_local.bytes
    }

    /// Bytes sent to the remote peer.
    pub fn sent(&self) -> u64 {
        self.local_to_remote.bytes
    }

    /// Both transfers, in the order they completed.
    pub fn in_completion_order(&self) -> [&Transfer; 2] {
        match self.first_closed {
            Direction::RemoteToLocal => [&self.remote_to_local, &self.local_to_remote],
            Direction::LocalToRemote => [&self.local_to_remote, &self.remote_to_local],
        }
    }
}

/// Relay bytes between `conn` and the local streams until both directions
/// are done.
///
/// The connection is dropped, and so fully closed, only after both tasks
/// have finished.
pub async fn run<C, I, O>(conn: C, local_in: I, local_out: O) -> TransferResult
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    I: AsyncRead + Send + Unpin + 'static,
    O: AsyncWrite + Send + Unpin + 'static,
{
    let (conn_read, conn_write) = tokio::io::split(conn);
    let (tx, mut rx) = mpsc::channel::<Transfer>(2);

    tokio::spawn(transfer(Direction::RemoteToLocal, conn_read, local_out, tx.clone()));
    tokio::spawn(transfer(Direction::LocalToRemote, local_in, conn_write, tx));

    let first = recv_transfer(&mut rx, Direction::RemoteToLocal).await;
    let second = recv_transfer(&mut rx, first.direction.other()).await;

    let first_closed = first.direction;
    let (remote_to_local, local_to_remote) = match first_closed {
        Direction::RemoteToLocal => (first, second),
        Direction::LocalToRemote => (second, first),
    };

    TransferResult {
        remote_to_local,
        local_to_remote,
        first_closed,
    }
}

// A task that panicked drops its sender without reporting; count it as a
// fault with nothing transferred so the session still completes.
async fn recv_transfer(rx: &mut mpsc::Receiver<Transfer>, fallback: Direction) -> Transfer {
    match rx.recv().await {
        Some(transfer) => transfer,
        None => Transfer {
            direction: fallback,
            bytes: 0,
            fault: Some(io::Error::other("relay task ended without reporting")),
        },
    }
}

async fn transfer<R, W>(direction: Direction, mut src: R, mut dst: W, tx: mpsc::Sender<Transfer>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (bytes, fault) = copy_counted(&mut src, &mut dst).await;

    if let Some(e) = &fault {
        warn!(%direction, bytes, "Transfer ended with error: {e}");
    }

    if let Err(e) = dst.shutdown().await {
        debug!(%direction, "Shutdown of destination failed: {e}");
    }
    // Some writers (an owned stdout descriptor) only close on drop.
    drop(dst);
    drop(src);

    debug!(%direction, bytes, "Transfer finished");
    let _ = tx
        .send(Transfer {
            direction,
            bytes,
            fault,
        })
        .await;
}

/// Copy until EOF, returning the bytes written and the error that stopped
/// the copy early, if any. Output is flushed after every chunk.
async fn copy_counted<R, W>(src: &mut R, dst: &mut W) -> (u64, Option<io::Error>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total = 0u64;

    loop {
        let n = match src.read(&mut buf).await {
            Ok(0) => return (total, None),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (total, Some(e)),
        };

        if let Err(e) = dst.write_all(&buf[..n]).await {
            return (total, Some(e));
        }
        if let Err(e) = dst.flush().await {
            return (total, Some(e));
        }
        total += n as u64;
    }
}
