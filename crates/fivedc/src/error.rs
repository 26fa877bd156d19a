//! Unified error type for the fivedc client.

use fivedc_protocol::ProtocolError;
use fivedc_session::SessionError;
use fivedc_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attributes let `?` lift sub-crate errors into this one.
#[derive(Debug, thiserror::Error)]
pub enum FivedcError {
    /// Connecting to the server failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded, or the stream failed or could not be
    /// decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session refused a command or hit a protocol violation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client task has stopped.
    #[error("client is no longer running")]
    Unavailable,
}
