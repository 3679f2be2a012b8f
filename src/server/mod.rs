//! The accept loop, the worker pool it feeds, and the per-connection serving loop.
//!
//! One task accepts connections and hands each to the pool. A worker then owns that
//! connection until it closes, reading pipelined requests and answering them in order.
//! Everything the workers read (router, shards, policy) is an immutable snapshot
//! built before the first accept.

pub(crate) mod files;
pub(crate) mod pool;
pub(crate) mod router;

pub use files::{FileReader, content_type};
pub use pool::WorkerPool;
pub use router::{RequestRouter, STATIC_PREFIX};

use crate::config::{ClosePolicy, ServerConfig};
use crate::error::{ConnectionError, Result};
use crate::http::Connection;
use crate::net::{AcceptedConnection, ListeningSocket};
use crate::query::QueryEngine;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// State shared read-only by every worker.
#[derive(Debug)]
pub struct ServerContext {
    pub router: RequestRouter,
    pub close_policy: ClosePolicy,
}

/// A bound server, ready to accept.
#[derive(Debug)]
pub struct Server {
    socket: ListeningSocket,
    workers: usize,
    context: Arc<ServerContext>,
}

impl Server {
    /// Bind the listening socket and build the shared context.
    pub fn bind(config: &ServerConfig, engine: Arc<QueryEngine>) -> Result<Self> {
        let files = FileReader::new(&config.static_root).with_context(|| {
            format!("Cannot open static root {}", config.static_root.display())
        })?;
        let router = RequestRouter::new(files, engine, config.crawl_root.clone());

        let mut socket =
            ListeningSocket::new(config.port, config.family).with_reverse_dns(config.reverse_dns);
        socket
            .bind_and_listen()
            .context("Couldn't bind to the listening socket")?;

        Ok(Self {
            socket,
            workers: config.workers,
            context: Arc::new(ServerContext {
                router,
                close_policy: config.close_policy,
            }),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr()
    }

    /// Accept connections until accepting fails.
    ///
    /// Connections already handed to workers keep running on their own; nothing waits
    /// for them here.
    pub async fn run(self) -> Result<()> {
        let context = Arc::clone(&self.context);
        let pool = WorkerPool::new(self.workers, move |accepted: AcceptedConnection| {
            let context = Arc::clone(&context);
            async move { handle_client(accepted, &context).await }
        });
        tracing::info!("Accepting connections with {} workers", pool.size());

        loop {
            match self.socket.accept().await {
                Ok(accepted) => {
                    if !pool.dispatch(accepted) {
                        tracing::error!("Worker pool is gone, stopping accept loop");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Accept failed, shutting down: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn handle_client(accepted: AcceptedConnection, context: &ServerContext) {
    let peer = accepted.peer;
    tracing::info!(
        "Client {}:{} (IP address {}) connected",
        peer.client_dns,
        peer.client_port,
        peer.client_addr
    );

    serve_connection(accepted.stream, &context.router, context.close_policy).await;
    tracing::debug!("Client {}:{} disconnected", peer.client_addr, peer.client_port);
}

/// Answer requests on one connection until the client closes, errors, or asks to close.
///
/// The stream is dropped (closed) on return.
pub async fn serve_connection<S>(stream: S, router: &RequestRouter, close_policy: ClosePolicy)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut connection = Connection::new(stream);

    loop {
        let request = match connection.next_request().await {
            Ok(request) => request,
            Err(ConnectionError::Closed) => break,
            Err(e) => {
                tracing::debug!("Read failed: {}", e);
                break;
            }
        };

        let closing = request.wants_close();
        if closing && close_policy == ClosePolicy::DropFinal {
            break;
        }

        let response = router.route(&request).await;
        if let Err(e) = connection.write_response(&response).await {
            tracing::debug!("Write failed: {}", e);
            break;
        }

        if closing {
            break;
        }
    }
}
