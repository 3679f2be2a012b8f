//! Bind, listen and accept over tokio sockets.
//!
//! All retry handling for interrupted accepts lives here; callers only ever see a
//! connection or a terminal error.

use crate::error::SocketError;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{TcpListener, TcpStream};

/// Host name reported when a reverse lookup fails or is disabled.
pub const UNKNOWN_HOST: &str = "<unknown>";

/// Largest listen backlog we ask for; the kernel clamps it to its own maximum.
const MAX_BACKLOG: i32 = 4096;

/// Which address family the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AddressFamily {
    V4,
    /// IPv6 only; IPv4-mapped peers are refused.
    V6,
    /// Either family; the IPv6 wildcard is tried first so dual-stack hosts accept both.
    #[default]
    Unspecified,
}

impl AddressFamily {
    /// Wildcard addresses to try, in order.
    fn candidates(self, port: u16) -> Vec<SocketAddr> {
        let v4 = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        let v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port);
        match self {
            Self::V4 => vec![v4],
            Self::V6 => vec![v6],
            Self::Unspecified => vec![v6, v4],
        }
    }
}

/// Both ends of a freshly accepted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub client_addr: IpAddr,
    pub client_port: u16,
    pub client_dns: String,
    pub server_addr: IpAddr,
    pub server_dns: String,
}

/// An accepted stream plus who is on either end of it.
#[derive(Debug)]
pub struct AcceptedConnection {
    pub stream: TcpStream,
    pub peer: PeerInfo,
}

/// The server's listening endpoint. Owns the listener exclusively.
#[derive(Debug)]
pub struct ListeningSocket {
    port: u16,
    family: AddressFamily,
    reverse_dns: bool,
    listener: Option<TcpListener>,
}

impl ListeningSocket {
    pub const fn new(port: u16, family: AddressFamily) -> Self {
        Self {
            port,
            family,
            reverse_dns: true,
            listener: None,
        }
    }

    /// Toggle reverse-DNS lookups for accepted connections (on by default).
    #[must_use]
    pub const fn with_reverse_dns(mut self, enabled: bool) -> Self {
        self.reverse_dns = enabled;
        self
    }

    /// Bind the first wildcard candidate that accepts us and start listening.
    pub fn bind_and_listen(&mut self) -> Result<SocketAddr, SocketError> {
        let mut last_error = None;

        for addr in self.family.candidates(self.port) {
            // A failed candidate's socket is dropped (closed) before the next attempt.
            match bind_candidate(addr, self.family) {
                Ok(socket) => {
                    let listener =
                        listen(socket).map_err(|source| SocketError::Listen { addr, source })?;
                    let local = listener
                        .local_addr()
                        .map_err(|source| SocketError::Listen { addr, source })?;

                    tracing::info!("Listening on {}", local);
                    self.listener = Some(listener);
                    return Ok(local);
                }
                Err(e) => {
                    tracing::debug!("Bind to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(SocketError::Bind {
            port: self.port,
            last: last_error,
        })
    }

    /// The bound address, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Wait for the next connection.
    pub async fn accept(&self) -> Result<AcceptedConnection, SocketError> {
        let listener = self.listener.as_ref().ok_or(SocketError::NotListening)?;

        let (stream, client) = loop {
            match listener.accept().await {
                Ok(pair) => break pair,
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
                Err(e) => return Err(SocketError::Accept(e)),
            }
        };

        let server = stream.local_addr().map_err(SocketError::Accept)?;
        let client_addr = client.ip().to_canonical();
        let server_addr = server.ip().to_canonical();

        let (client_dns, server_dns) = if self.reverse_dns {
            tokio::join!(reverse_lookup(client_addr), reverse_lookup(server_addr))
        } else {
            (UNKNOWN_HOST.to_string(), UNKNOWN_HOST.to_string())
        };

        Ok(AcceptedConnection {
            stream,
            peer: PeerInfo {
                client_addr,
                client_port: client.port(),
                client_dns,
                server_addr,
                server_dns,
            },
        })
    }

    /// Stop listening. Later `accept` calls fail with [`SocketError::NotListening`].
    pub fn close(&mut self) {
        if self.listener.take().is_some() {
            tracing::debug!("Closed listening socket on port {}", self.port);
        }
    }
}

fn bind_candidate(addr: SocketAddr, family: AddressFamily) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    if addr.is_ipv6() {
        // Set explicitly; the kernel default (`bindv6only`) varies by host.
        socket.set_only_v6(family == AddressFamily::V6)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    Ok(socket)
}

fn listen(socket: Socket) -> io::Result<TcpListener> {
    socket.listen(MAX_BACKLOG)?;
    socket.set_nonblocking(true)?;
    TcpListener::from_std(socket.into())
}

async fn reverse_lookup(addr: IpAddr) -> String {
    let lookup = tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&addr)).await;
    match lookup {
        Ok(Ok(name)) => name,
        Ok(Err(e)) => {
            tracing::debug!("Reverse lookup for {} failed: {}", addr, e);
            UNKNOWN_HOST.to_string()
        }
        Err(_) => UNKNOWN_HOST.to_string(),
    }
}
