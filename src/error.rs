//! Error handling types and utilities.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for shard-search application plumbing.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` in `main` and configuration loading.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when a shard cannot be opened.
#[derive(Debug, Error)]
pub enum ShardError {
    /// The shard file could not be read.
    #[error("failed to read shard '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The shard file was read but its contents did not decode.
    #[error("failed to decode shard '{}': {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: postcard::Error,
    },
    /// The blocking load task was cancelled or panicked.
    #[error("shard load task for '{}' did not complete", .path.display())]
    Interrupted { path: PathBuf },
}

/// Error returned by the listening socket.
#[derive(Debug, Error)]
pub enum SocketError {
    /// No wildcard candidate address could be bound.
    #[error("could not bind any candidate address for port {port}")]
    Bind {
        port: u16,
        #[source]
        last: Option<io::Error>,
    },
    /// A socket bound but refused to listen.
    #[error("listen failed on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// `accept` was called before `bind_and_listen`, or after `close`.
    #[error("socket is not listening")]
    NotListening,
    /// A non-retryable accept failure.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
}

/// Error ending a single connection's serving loop.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The peer closed the stream before a complete request arrived.
    #[error("connection closed by peer")]
    Closed,
    #[error("connection i/o failed: {0}")]
    Io(#[from] io::Error),
}
