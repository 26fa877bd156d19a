//! [`Connection`] over a `tokio_util::codec::Framed` stream.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, Framed};

use crate::{Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A connection to the match server over TCP.
pub type TcpConnection<C> = FramedConnection<TcpStream, C>;

/// A [`Connection`] that frames a Tokio stream with codec `C`.
///
/// The read buffer lives inside the `Framed`, so a cancelled
/// [`recv`](Connection::recv) keeps whatever part of a frame it had read.
pub struct FramedConnection<S, C> {
    id: ConnectionId,
    framed: Framed<S, C>,
}

impl<C> FramedConnection<TcpStream, C> {
    /// Opens a TCP connection to the given address.
    pub async fn connect(addr: &str, codec: C) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        // Frames are small and latency matters more than throughput.
        stream
            .set_nodelay(true)
            .map_err(TransportError::ConnectFailed)?;
        let conn = Self::new(stream, codec);
        tracing::info!(id = %conn.id, addr, "connected to match server");
        Ok(conn)
    }
}

impl<S, C> FramedConnection<S, C>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wraps an already-open stream.
    pub fn new(stream: S, codec: C) -> Self {
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            framed: Framed::new(stream, codec),
        }
    }

    pub fn codec(&self) -> &C {
        self.framed.codec()
    }
}

impl<S, C> Connection for FramedConnection<S, C>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    C: Decoder + Encoder<<C as Decoder>::Item, Error = <C as Decoder>::Error> + Send + 'static,
    <C as Decoder>::Item: Send + Sync + 'static,
    <C as Decoder>::Error: std::error::Error + Send + Sync + 'static,
{
    type Message = <C as Decoder>::Item;
    type Error = <C as Decoder>::Error;

    async fn send(&mut self, message: Self::Message) -> Result<(), Self::Error> {
        self.framed.send(message).await
    }

    async fn recv(&mut self) -> Option<Result<Self::Message, Self::Error>> {
        let next = self.framed.next().await;
        if next.is_none() {
            tracing::debug!(id = %self.id, "peer closed the stream");
        }
        next
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        SinkExt::<Self::Message>::close(&mut self.framed).await
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
