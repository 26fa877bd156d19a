//! Transport abstraction layer for fivedc.
//!
//! Provides the [`Connection`] trait: an ordered, reliable stream of whole
//! messages to and from the match server. Framing is delegated to a
//! `tokio_util` codec, so a connection never hands out half a frame.
//!
//! [`FramedConnection`] implements the trait for any Tokio stream and codec:
//! TCP in production, `tokio::io::duplex` in tests.

mod error;
mod framed;

pub use error::TransportError;
pub use framed::{FramedConnection, TcpConnection};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
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
        write!(f, "conn-{}", self.0)
    }
}

/// A single connection that can send and receive messages.
///
/// The returned futures are `Send` so a connection can be driven from a
/// spawned Tokio task regardless of its concrete type.
pub trait Connection: Send + 'static {
    /// What one frame decodes to.
    type Message: Send + Sync + 'static;

    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Encodes `message` and writes it to the remote peer.
    ///
    /// Nothing is written if encoding fails.
    fn send(
        &mut self,
        message: Self::Message,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `None` once the stream has ended. Dropping the future before
    /// it completes loses nothing: partial frames stay buffered.
    fn recv(&mut self)
    -> impl Future<Output = Option<Result<Self::Message, Self::Error>>> + Send;

    /// Flushes pending writes and shuts down the write side.
    fn close(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_equality() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(1);
        let c = ConnectionId::new(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
