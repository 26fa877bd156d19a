//! Codec for `tokio_util::codec::Framed` streams.
//!
//! [`WireCodec`] reports a frame with an unknown tag and leaves it in the
//! buffer. On a live connection such frames are skipped: the length prefix
//! still says where the next frame starts, so the stream stays in step.
//! [`FrameCodec`] adds that policy and is what connections are built with.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{Message, ProtocolError, WireCodec};

/// [`WireCodec`] plus skipping of unknown frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec {
    wire: WireCodec,
    skipped: u64,
}

impl FrameCodec {
    pub fn new(wire: WireCodec) -> Self {
        Self { wire, skipped: 0 }
    }

    pub fn wire(&self) -> &WireCodec {
        &self.wire
    }

    /// Number of frames dropped for carrying an unknown tag.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, ProtocolError> {
        loop {
            match self.wire.decode(src) {
                Err(ProtocolError::UnknownMessageType(tag)) => {
                    // Only reported once the whole frame is buffered.
                    let Some(total) = self.wire.frame_size(src)? else {
                        return Ok(None);
                    };
                    tracing::warn!(tag, total, "skipping frame of unknown type");
                    src.advance(total);
                    self.skipped += 1;
                }
                other => return other,
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>, ProtocolError> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(ProtocolError::Truncated {
                buffered: src.len(),
            }),
        }
    }
}

impl Encoder<&Message> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: &Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        Encoder::<&Message>::encode(&mut self.wire, message, dst)
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        Encoder::<&Message>::encode(&mut self.wire, &message, dst)
    }
}
