//! Transport abstraction layer for deltarpc.
//!
//! Provides the [`Connection`] trait: a persistent duplex link that moves
//! whole text frames in both directions. The RPC client sits on top of it
//! and never touches sockets directly.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;

/// Close code for an orderly shutdown requested by the local side.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code used when a link is torn down because a newer one replaces it.
///
/// Lives in the 4000-4999 range reserved for private use.
pub const CLOSE_REPLACED: u16 = 4000;

/// Opaque identifier for a connection.
///
/// Every dial produces a fresh id, so a client can tell an old link from
/// the one that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// A single duplex connection that can send and receive frames.
///
/// `send` and `recv` must be usable concurrently: a reader task sits in
/// `recv` for the whole life of the link while callers keep sending.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one text frame to the remote peer.
    async fn send(&self, frame: &str) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection with the given close code and reason.
    async fn close(&self, code: u16, reason: &str) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
