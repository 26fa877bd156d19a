/// Errors that can occur in the transport layer.
///
/// Once a connection is open, failures surface through the codec's error
/// type instead: a `Framed` stream reports reads, writes and malformed
/// frames through one channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Opening the connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),
}
