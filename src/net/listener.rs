//! Bounded TCP listener.
//!
//! # Responsibilities
//! - Bind the single public port
//! - Hold one semaphore permit per live HTTP connection
//! - Surface accept failures without tearing the server down

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

#[derive(Debug, Error)]
pub enum ListenerError {
    /// The port could not be bound (in use, bad address, no permission).
    #[error("failed to bind: {0}")]
    Bind(#[source] io::Error),

    /// A single accept failed; the listener itself is still usable.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),

    #[error("connection limiter closed")]
    Closed,
}

/// The gateway's listening socket plus its connection cap.
///
/// Once `max_connections` permits are out, `accept` waits for one to come
/// back before taking the next connection off the backlog.
pub struct Listener {
    socket: TcpListener,
    slots: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|e| ListenerError::Bind(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        let socket = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        Self::from_tcp(socket, config.max_connections)
    }

    /// Wrap an already bound socket.
    pub fn from_tcp(socket: TcpListener, max_connections: usize) -> Result<Self, ListenerError> {
        let addr = socket.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %addr, max_connections, "Listening");

        Ok(Self {
            socket,
            slots: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        })
    }

    /// Wait for a free slot, then for the next client.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, peer_addr) = self.socket.accept().await.map_err(ListenerError::Accept)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer_addr = %peer_addr, error = %e, "set_nodelay failed");
        }
        tracing::debug!(
            peer_addr = %peer_addr,
            free_slots = self.slots.available_permits(),
            "Accepted"
        );

        Ok((stream, peer_addr, ConnectionPermit { _slot: permit }))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn available_permits(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// One connection slot; returned to the listener on drop.
#[derive(Debug)]
pub struct ConnectionPermit {
    _slot: OwnedSemaphorePermit,
}
