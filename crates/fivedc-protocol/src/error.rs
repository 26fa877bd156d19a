//! Error types for the protocol layer.
//!
//! Every variant describes a problem with bytes on the wire or with a
//! message that cannot be put on the wire. Nothing here is retryable:
//! decoding the same malformed frame again gives the same answer.

use crate::{ActionType, MessageType};

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The length prefix cannot describe a valid frame: it is smaller than
    /// the type tag or larger than the configured maximum.
    #[error("invalid frame length {length} (allowed 8..={max})")]
    InvalidLength { length: u64, max: u64 },

    /// The stream ended in the middle of a frame.
    #[error("stream ended inside a frame ({buffered} bytes buffered)")]
    Truncated { buffered: usize },

    /// The type tag is not in the message catalog.
    ///
    /// The frame is left in the buffer; [`FrameCodec`](crate::FrameCodec)
    /// skips it and carries on.
    #[error("unknown message type {0}")]
    UnknownMessageType(i64),

    /// Tag 8 was received. It has never been observed legitimately, so its
    /// shape is unknown and it is flagged rather than guessed at.
    #[error("message type 8 is reserved")]
    ReservedMessageType,

    /// The tag is known but the frame length does not match its schema.
    #[error(
        "schema mismatch for {message_type:?}: expected length {expected}, got {actual}"
    )]
    SchemaMismatch {
        message_type: MessageType,
        expected: u64,
        actual: u64,
    },

    /// A field holds a value outside its closed enumeration.
    #[error("invalid {kind} value {value}")]
    InvalidField { kind: &'static str, value: i64 },

    /// A fixed-capacity array claims (or was given) more entries than fit.
    #[error("{field} count {count} exceeds capacity {capacity}")]
    CapacityExceeded {
        field: &'static str,
        count: i64,
        capacity: usize,
    },

    /// Action types from the other protocol revision are never sent.
    #[error("action type {0:?} is deprecated and cannot be sent")]
    DeprecatedAction(ActionType),

    /// Reading or writing the underlying stream failed.
    ///
    /// Framed streams report I/O failures through the codec's error type, so
    /// they arrive here rather than as a transport error.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl ProtocolError {
    /// Returns `true` when the stream cannot be trusted after this error.
    ///
    /// Only an unknown tag leaves the stream position intact; everything else
    /// means the bytes and our understanding of them have diverged.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnknownMessageType(_))
    }

    /// Returns `true` for errors about the length prefix or stream end.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::InvalidLength { .. } | Self::Truncated { .. })
    }

    /// Returns `true` when the stream itself failed, not its contents.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
