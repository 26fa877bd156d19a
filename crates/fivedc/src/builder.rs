//! `Client` builder.
//!
//! This is the entry point for talking to a match server. It ties together
//! all the layers: transport → protocol → session → client task.

use fivedc_protocol::{FrameCodec, Message, ProtocolError, WireCodec};
use fivedc_session::SessionConfig;
use fivedc_transport::{Connection, FramedConnection, TcpConnection};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::client::{EventReceiver, spawn_client};
use crate::{ClientConfig, ClientHandle, FivedcError};

/// Entry point for creating clients.
pub struct Client;

impl Client {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

/// Builder for configuring and starting a client.
///
/// # Example
///
/// ```rust,ignore
/// use fivedc::prelude::*;
///
/// let (client, mut events) = Client::builder()
///     .strict_message_ids(false)
///     .connect("127.0.0.1:39005")
///     .await?;
/// client.greet().await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the version pair sent in the greet.
    pub fn client_version(mut self, version1: i64, version2: i64) -> Self {
        self.config.session.client_version = (version1, version2);
        self
    }

    /// Chooses strict (`>`) or lenient (`>=`) message id checking.
    pub fn strict_message_ids(mut self, strict: bool) -> Self {
        self.config.session.strict_message_ids = strict;
        self
    }

    /// Accepts legacy opponent actions instead of ending the session.
    pub fn accept_legacy_actions(mut self, accept: bool) -> Self {
        self.config.session.accept_legacy_actions = accept;
        self
    }

    /// Sets the largest frame accepted from the server.
    ///
    /// Values below the largest message on the wire make that message
    /// unusable; the default is
    /// [`DEFAULT_MAX_FRAME_LENGTH`](fivedc_protocol::DEFAULT_MAX_FRAME_LENGTH).
    pub fn max_frame_length(mut self, max: u64) -> Self {
        self.config.max_frame_length = max;
        self
    }

    /// Sets the capacity of the command channel.
    pub fn command_buffer(mut self, size: usize) -> Self {
        self.config.command_buffer = size;
        self
    }

    /// Connects over TCP and starts the client task.
    pub async fn connect(
        self,
        addr: &str,
    ) -> Result<(ClientHandle, EventReceiver), FivedcError> {
        let conn = TcpConnection::connect(addr, self.codec()).await?;
        Ok(self.spawn(conn))
    }

    /// Frames an already-open stream with the configured codec and starts
    /// the client task on it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_stream<S>(self, stream: S) -> (ClientHandle, EventReceiver)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let conn = FramedConnection::new(stream, self.codec());
        self.spawn(conn)
    }

    /// Starts the client task on an already-open connection.
    ///
    /// The connection brings its own codec, so
    /// [`max_frame_length`](Self::max_frame_length) does not apply here.
    /// Must be called from within a Tokio runtime.
    pub fn spawn<C>(self, conn: C) -> (ClientHandle, EventReceiver)
    where
        C: Connection<Message = Message, Error = ProtocolError>,
    {
        tracing::debug!(conn_id = %conn.id(), "starting client");
        spawn_client(conn, self.config)
    }

    fn codec(&self) -> FrameCodec {
        FrameCodec::new(WireCodec::new(self.config.max_frame_length))
    }
}

#[cfg(test)]
mod tests {
    use fivedc_protocol::DEFAULT_MAX_FRAME_LENGTH;

    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = Client::builder();
        assert_eq!(builder.config, ClientConfig::default());
        assert_eq!(builder.config.max_frame_length, DEFAULT_MAX_FRAME_LENGTH);
    }

    #[test]
    fn test_builder_setters() {
        let builder = ClientBuilder::new()
            .client_version(12, 0)
            .strict_message_ids(false)
            .accept_legacy_actions(true)
            .max_frame_length(2048)
            .command_buffer(8);
        assert_eq!(builder.config.session.client_version, (12, 0));
        assert!(!builder.config.session.strict_message_ids);
        assert!(builder.config.session.accept_legacy_actions);
        assert_eq!(builder.config.max_frame_length, 2048);
        assert_eq!(builder.config.command_buffer, 8);
        assert_eq!(builder.codec().wire().max_frame_length(), 2048);
    }
}
