//! Frame encoding and decoding.
//!
//! [`WireCodec`] turns a [`Message`] into one complete frame and back. The
//! slice-level [`encode_frame`](WireCodec::encode_frame) and
//! [`decode_frame`](WireCodec::decode_frame) never buffer; the
//! `tokio_util::codec` impls on top of them let a `Framed` stream do the
//! reassembly.
//!
//! All integers are little-endian. Field order inside each payload follows
//! the catalog in [`schema`](crate::schema); the helpers below read and
//! write one record at a time so the order is visible in a single place.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    Action, ActionKind, ActionType, ClientGreet, Clock, Color, ColorChoice, Coordinate,
    DEFAULT_MAX_FRAME_LENGTH, HistoryMatch, HistoryStatus, LIST_CAPACITY, MatchId, MatchList,
    MatchRequest, MatchRequestResult, MatchSettings, MatchStart, Message, MessageCatalog,
    MessageId, MessageType, Passcode, ProtocolError, PublicMatch, ResultCode, ServerGreet,
    Variant, Visibility,
};

/// Size of the length prefix.
pub const LENGTH_PREFIX: usize = 8;

/// Size of the type tag, which the length prefix counts.
pub const TAG_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// WireCodec
// ---------------------------------------------------------------------------

/// Encodes and decodes whole frames.
#[derive(Debug, Clone, Copy)]
pub struct WireCodec {
    max_frame_length: u64,
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LENGTH)
    }
}

impl WireCodec {
    /// Creates a codec that refuses length prefixes above `max_frame_length`.
    pub fn new(max_frame_length: u64) -> Self {
        Self { max_frame_length }
    }

    pub fn max_frame_length(&self) -> u64 {
        self.max_frame_length
    }

    /// Encodes one message as a complete frame, length prefix included.
    ///
    /// # Errors
    /// [`ProtocolError::DeprecatedAction`] for legacy action types,
    /// [`ProtocolError::CapacityExceeded`] for over-long match lists, and
    /// [`ProtocolError::InvalidLength`] if the frame exceeds the configured
    /// maximum.
    pub fn encode_frame(&self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        let schema = message.schema();
        let mut buf = Vec::with_capacity(LENGTH_PREFIX + schema.length as usize);
        let mut w = FrameWriter::new(&mut buf);
        let len_pos = w.reserve_length();
        w.put_i64(schema.message_type.tag());
        encode_body(&mut w, message)?;
        let length = w.patch_length(len_pos);

        if length != schema.length {
            return Err(ProtocolError::SchemaMismatch {
                message_type: schema.message_type,
                expected: schema.length,
                actual: length,
            });
        }
        if length > self.max_frame_length {
            return Err(ProtocolError::InvalidLength {
                length,
                max: self.max_frame_length,
            });
        }
        tracing::trace!(message = schema.name, length, "encoded frame");
        Ok(buf)
    }

    /// Reads the length prefix at the start of `buf`, if it has arrived.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidLength`] if the prefix is below the tag size
    /// or above the configured maximum.
    pub fn peek_length(&self, buf: &[u8]) -> Result<Option<u64>, ProtocolError> {
        let Some(prefix) = buf.get(..LENGTH_PREFIX) else {
            return Ok(None);
        };
        let mut arr = [0u8; LENGTH_PREFIX];
        arr.copy_from_slice(prefix);
        let length = u64::from_le_bytes(arr);
        if length < TAG_SIZE as u64 || length > self.max_frame_length {
            return Err(self.invalid_length(length));
        }
        Ok(Some(length))
    }

    /// Size of the frame at the start of `buf`, length prefix included.
    ///
    /// # Errors
    /// As [`peek_length`](Self::peek_length), and
    /// [`ProtocolError::InvalidLength`] if the size does not fit in memory
    /// addressing.
    pub fn frame_size(&self, buf: &[u8]) -> Result<Option<usize>, ProtocolError> {
        let Some(length) = self.peek_length(buf)? else {
            return Ok(None);
        };
        usize::try_from(length)
            .ok()
            .and_then(|len| len.checked_add(LENGTH_PREFIX))
            .map(Some)
            .ok_or_else(|| self.invalid_length(length))
    }

    /// Decodes the first frame in `buf`.
    ///
    /// Returns `Ok(None)` when `buf` does not yet hold a complete frame, and
    /// otherwise the message together with the number of bytes it used.
    /// Nothing is consumed on error; the caller decides whether to skip.
    pub fn decode_frame(&self, buf: &[u8]) -> Result<Option<(Message, usize)>, ProtocolError> {
        let Some(total) = self.frame_size(buf)? else {
            return Ok(None);
        };
        let Some(frame) = buf.get(LENGTH_PREFIX..total) else {
            return Ok(None);
        };

        let mut r = FrameReader::new(frame);
        let tag = r.take_i64()?;
        let message = MessageCatalog::classify(tag, r.rest())?;
        tracing::trace!(tag, total, "decoded frame");
        Ok(Some((message, total)))
    }

    fn invalid_length(&self, length: u64) -> ProtocolError {
        ProtocolError::InvalidLength {
            length,
            max: self.max_frame_length,
        }
    }
}

/// Largest frame any known message needs, prefix included. Read buffers
/// never grow past this ahead of the bytes actually arriving.
fn largest_known_frame() -> usize {
    LENGTH_PREFIX + MessageType::MatchList.schema().length as usize
}

impl Decoder for WireCodec {
    type Item = Message;
    type Error = ProtocolError;

    /// Decodes one frame off the front of `src`.
    ///
    /// On error nothing is consumed, so after
    /// [`ProtocolError::UnknownMessageType`] the frame is still in `src`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, ProtocolError> {
        match self.decode_frame(src)? {
            Some((message, used)) => {
                src.advance(used);
                Ok(Some(message))
            }
            None => {
                if let Some(total) = self.frame_size(src)? {
                    let wanted = total.min(largest_known_frame());
                    src.reserve(wanted.saturating_sub(src.len()));
                }
                Ok(None)
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

impl Encoder<&Message> for WireCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: &Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let frame = self.encode_frame(message)?;
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

impl Encoder<Message> for WireCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        Encoder::<&Message>::encode(self, &message, dst)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Writes the payload of `message` (everything after the tag).
pub(crate) fn encode_body(w: &mut FrameWriter<'_>, message: &Message) -> Result<(), ProtocolError> {
    match message {
        Message::ClientGreet(greet) => {
            w.put_i64(greet.version1);
            w.put_i64(greet.version2);
            greet.reserved.iter().for_each(|&v| w.put_i64(v));
        }
        Message::ServerGreet(greet) => {
            w.put_i64(greet.version);
            greet.reserved.iter().for_each(|&v| w.put_i64(v));
        }
        Message::MatchCreateOrJoin(request) => {
            w.put_settings(&request.settings);
            w.put_i64(request.passcode.0);
        }
        Message::MatchCreateOrJoinResult(result) => {
            w.put_i64(result.result.to_wire());
            w.put_i64(result.reason);
            w.put_settings(&result.settings);
            w.put_i64(result.passcode.0);
        }
        Message::MatchCancel { reserved }
        | Message::OpponentLeft { reserved }
        | Message::Forfeit { reserved }
        | Message::MatchListRequest { reserved } => w.put_i8(*reserved),
        Message::MatchCancelResult { result } => w.put_i64(result.to_wire()),
        Message::MatchStart(start) => {
            w.put_i64(start.clock.to_wire());
            w.put_i64(start.variant.0);
            w.put_u64(start.match_id.0);
            w.put_i64(start.color.to_wire());
            w.put_u64(start.message_id.0);
        }
        Message::Action(action) => encode_action(w, action)?,
        Message::MatchList(list) => encode_match_list(w, list)?,
    }
    Ok(())
}

fn encode_action(w: &mut FrameWriter<'_>, action: &Action) -> Result<(), ProtocolError> {
    let action_type = action.action_type();
    if action_type.is_deprecated() {
        return Err(ProtocolError::DeprecatedAction(action_type));
    }
    w.put_i64(action_type.to_wire());
    w.put_i64(action.color.to_wire());
    w.put_u64(action.message_id.0);
    // Only moves carry coordinates; everything else sends zeros.
    let (src, dst) = match action.kind {
        ActionKind::Move(mv) => (mv.src, mv.dst),
        _ => (Coordinate::ZERO, Coordinate::ZERO),
    };
    w.put_coordinate(&src);
    w.put_coordinate(&dst);
    Ok(())
}

fn encode_match_list(w: &mut FrameWriter<'_>, list: &MatchList) -> Result<(), ProtocolError> {
    check_capacity("public_matches", list.public_matches.len())?;
    check_capacity("history", list.history.len())?;

    w.put_i64(list.reserved);
    let empty = PublicMatch {
        color: ColorChoice::None,
        clock: Clock::None,
        variant: Variant::NONE,
        passcode: Passcode::NONE,
    };
    w.put_public_match(list.host.as_ref().unwrap_or(&empty));
    w.put_i64(i64::from(list.host.is_some()));

    for slot in 0..LIST_CAPACITY {
        w.put_public_match(list.public_matches.get(slot).unwrap_or(&empty));
    }
    w.put_i64(list.public_matches.len() as i64);

    for slot in 0..LIST_CAPACITY {
        match list.history.get(slot) {
            Some(entry) => w.put_history(entry),
            None => (0..5).for_each(|_| w.put_i64(0)),
        }
    }
    w.put_i64(list.history.len() as i64);
    Ok(())
}

fn check_capacity(field: &'static str, count: usize) -> Result<(), ProtocolError> {
    if count > LIST_CAPACITY {
        return Err(ProtocolError::CapacityExceeded {
            field,
            count: count as i64,
            capacity: LIST_CAPACITY,
        });
    }
    Ok(())
}

/// Reads the payload of a frame whose length already matched its schema.
pub(crate) fn decode_body(
    message_type: MessageType,
    payload: &[u8],
) -> Result<Message, ProtocolError> {
    let mut r = FrameReader::new(payload);
    let message = match message_type {
        MessageType::ClientGreet => Message::ClientGreet(ClientGreet {
            version1: r.take_i64()?,
            version2: r.take_i64()?,
            reserved: r.take_array()?,
        }),
        MessageType::ServerGreet => Message::ServerGreet(ServerGreet {
            version: r.take_i64()?,
            reserved: r.take_array()?,
        }),
        MessageType::MatchCreateOrJoin => Message::MatchCreateOrJoin(MatchRequest {
            settings: r.take_settings()?,
            passcode: Passcode(r.take_i64()?),
        }),
        MessageType::MatchCreateOrJoinResult => {
            Message::MatchCreateOrJoinResult(MatchRequestResult {
                result: ResultCode::from_wire(r.take_i64()?)?,
                reason: r.take_i64()?,
                settings: r.take_settings()?,
                passcode: Passcode(r.take_i64()?),
            })
        }
        MessageType::MatchCancel => Message::MatchCancel {
            reserved: r.take_i8()?,
        },
        MessageType::MatchCancelResult => Message::MatchCancelResult {
            result: ResultCode::from_wire(r.take_i64()?)?,
        },
        MessageType::MatchStart => Message::MatchStart(MatchStart {
            clock: Clock::from_wire(r.take_i64()?)?,
            variant: Variant(r.take_i64()?),
            match_id: MatchId(r.take_u64()?),
            color: Color::from_wire(r.take_i64()?)?,
            message_id: MessageId(r.take_u64()?),
        }),
        MessageType::OpponentLeft => Message::OpponentLeft {
            reserved: r.take_i8()?,
        },
        MessageType::Forfeit => Message::Forfeit {
            reserved: r.take_i8()?,
        },
        MessageType::Action => Message::Action(decode_action(&mut r)?),
        MessageType::MatchListRequest => Message::MatchListRequest {
            reserved: r.take_i8()?,
        },
        MessageType::MatchList => Message::MatchList(decode_match_list(&mut r)?),
    };
    Ok(message)
}

fn decode_action(r: &mut FrameReader<'_>) -> Result<Action, ProtocolError> {
    let action_type = ActionType::from_wire(r.take_i64()?)?;
    let color = Color::from_wire(r.take_i64()?)?;
    let message_id = MessageId(r.take_u64()?);
    let src: [i64; 5] = r.take_array()?;
    let dst: [i64; 5] = r.take_array()?;

    // Coordinates of non-move actions are ignored, whatever they hold.
    let kind = match action_type {
        ActionType::Move => ActionKind::Move(crate::Move {
            src: coordinate(src)?,
            dst: coordinate(dst)?,
        }),
        ActionType::UndoMove => ActionKind::UndoMove,
        ActionType::SubmitMoves => ActionKind::SubmitMoves,
        ActionType::ResetPuzzle => ActionKind::ResetPuzzle,
        ActionType::DisplayCheckReason => ActionKind::DisplayCheckReason {
            source: coordinate(src)?,
            opaque: dst,
        },
        ActionType::Header => ActionKind::Header,
    };
    Ok(Action {
        kind,
        color,
        message_id,
    })
}

fn coordinate([l, t, board_color, y, x]: [i64; 5]) -> Result<Coordinate, ProtocolError> {
    Ok(Coordinate {
        l,
        t,
        board_color: Color::from_wire(board_color)?,
        y,
        x,
    })
}

fn decode_match_list(r: &mut FrameReader<'_>) -> Result<MatchList, ProtocolError> {
    let reserved = r.take_i64()?;
    let host_raw: [i64; 4] = r.take_array()?;
    let is_host = r.take_i64()?;

    let public_raw: [[i64; 4]; LIST_CAPACITY] = r.take_records()?;
    let public_count = list_count("public_matches", r.take_i64()?)?;
    let history_raw: [[i64; 5]; LIST_CAPACITY] = r.take_records()?;
    let history_count = list_count("history", r.take_i64()?)?;

    let host = if is_host == 0 {
        None
    } else {
        Some(public_match(host_raw)?)
    };
    let public_matches = public_raw[..public_count]
        .iter()
        .map(|&raw| public_match(raw))
        .collect::<Result<_, _>>()?;
    let history = history_raw[..history_count]
        .iter()
        .map(|&[status, clock, variant, visibility, seconds_passed]| {
            Ok::<_, ProtocolError>(HistoryMatch {
                status: HistoryStatus::from_wire(status)?,
                clock: Clock::from_wire(clock)?,
                variant: Variant(variant),
                visibility: Visibility::from_wire(visibility)?,
                seconds_passed,
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(MatchList {
        reserved,
        host,
        public_matches,
        history,
    })
}

fn list_count(field: &'static str, count: i64) -> Result<usize, ProtocolError> {
    if !(0..=LIST_CAPACITY as i64).contains(&count) {
        return Err(ProtocolError::CapacityExceeded {
            field,
            count,
            capacity: LIST_CAPACITY,
        });
    }
    Ok(count as usize)
}

fn public_match([color, clock, variant, passcode]: [i64; 4]) -> Result<PublicMatch, ProtocolError> {
    Ok(PublicMatch {
        color: ColorChoice::from_wire(color)?,
        clock: Clock::from_wire(clock)?,
        variant: Variant(variant),
        passcode: Passcode(passcode),
    })
}

// ---------------------------------------------------------------------------
// FrameWriter / FrameReader
// ---------------------------------------------------------------------------

/// Appends little-endian fields to a buffer.
pub(crate) struct FrameWriter<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> FrameWriter<'a> {
    pub(crate) fn new(buf: &'a mut Vec<u8>) -> Self {
        Self { buf }
    }

    fn put_i8(&mut self, v: i8) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_settings(&mut self, s: &MatchSettings) {
        self.put_i64(s.color.to_wire());
        self.put_i64(s.clock.to_wire());
        self.put_i64(s.variant.0);
        self.put_i64(s.visibility.to_wire());
    }

    fn put_coordinate(&mut self, c: &Coordinate) {
        self.put_i64(c.l);
        self.put_i64(c.t);
        self.put_i64(c.board_color.to_wire());
        self.put_i64(c.y);
        self.put_i64(c.x);
    }

    fn put_public_match(&mut self, m: &PublicMatch) {
        self.put_i64(m.color.to_wire());
        self.put_i64(m.clock.to_wire());
        self.put_i64(m.variant.0);
        self.put_i64(m.passcode.0);
    }

    fn put_history(&mut self, h: &HistoryMatch) {
        self.put_i64(h.status.to_wire());
        self.put_i64(h.clock.to_wire());
        self.put_i64(h.variant.0);
        self.put_i64(h.visibility.to_wire());
        self.put_i64(h.seconds_passed);
    }

    /// Writes a placeholder length prefix and returns its position.
    fn reserve_length(&mut self) -> usize {
        let pos = self.buf.len();
        self.put_u64(0);
        pos
    }

    /// Fills in the length prefix at `pos` and returns the value written.
    fn patch_length(&mut self, pos: usize) -> u64 {
        let length = (self.buf.len() - pos - LENGTH_PREFIX) as u64;
        self.buf[pos..pos + LENGTH_PREFIX].copy_from_slice(&length.to_le_bytes());
        length
    }
}

/// Reads little-endian fields from a slice.
pub(crate) struct FrameReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> FrameReader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    fn rest(&self) -> &'a [u8] {
        &self.buf[self.cursor..]
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let bytes = self
            .buf
            .get(self.cursor..self.cursor + N)
            .ok_or(ProtocolError::Truncated {
                buffered: self.buf.len() - self.cursor,
            })?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(bytes);
        self.cursor += N;
        Ok(arr)
    }

    fn take_i8(&mut self) -> Result<i8, ProtocolError> {
        self.take::<1>().map(i8::from_le_bytes)
    }

    fn take_i64(&mut self) -> Result<i64, ProtocolError> {
        self.take::<8>().map(i64::from_le_bytes)
    }

    fn take_u64(&mut self) -> Result<u64, ProtocolError> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[i64; N], ProtocolError> {
        let mut out = [0i64; N];
        for v in &mut out {
            *v = self.take_i64()?;
        }
        Ok(out)
    }

    fn take_records<const N: usize, const M: usize>(
        &mut self,
    ) -> Result<[[i64; N]; M], ProtocolError> {
        let mut out = [[0i64; N]; M];
        for record in &mut out {
            *record = self.take_array()?;
        }
        Ok(out)
    }

    fn take_settings(&mut self) -> Result<MatchSettings, ProtocolError> {
        Ok(MatchSettings {
            color: ColorChoice::from_wire(self.take_i64()?)?,
            clock: Clock::from_wire(self.take_i64()?)?,
            variant: Variant(self.take_i64()?),
            visibility: Visibility::from_wire(self.take_i64()?)?,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: i64, fields: &[i64]) -> Vec<u8> {
        let length = (TAG_SIZE + fields.len() * 8) as u64;
        let mut buf = length.to_le_bytes().to_vec();
        buf.extend_from_slice(&tag.to_le_bytes());
        for f in fields {
            buf.extend_from_slice(&f.to_le_bytes());
        }
        buf
    }

    // =====================================================================
    // encode_frame()
    // =====================================================================

    #[test]
    fn test_encode_forfeit_is_seventeen_bytes() {
        let bytes = WireCodec::default().encode_frame(&Message::forfeit()).unwrap();
        assert_eq!(bytes.len(), 17);
        assert_eq!(&bytes[..8], &9u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &10i64.to_le_bytes());
        assert_eq!(bytes[16], 0);
    }

    #[test]
    fn test_encode_client_greet_layout() {
        let bytes = WireCodec::default()
            .encode_frame(&Message::ClientGreet(ClientGreet::default()))
            .unwrap();
        assert_eq!(bytes, frame(1, &[11, 16, 0, 0, 0, 0]));
    }

    #[test]
    fn test_encode_create_request_layout() {
        let request = MatchRequest::create(MatchSettings {
            color: ColorChoice::Random,
            clock: Clock::Short,
            variant: Variant::STANDARD,
            visibility: Visibility::Public,
        });
        let bytes = WireCodec::default()
            .encode_frame(&Message::MatchCreateOrJoin(request))
            .unwrap();
        assert_eq!(bytes, frame(3, &[1, 2, 1, 1, -1]));
    }

    #[test]
    fn test_encode_non_move_action_zeroes_coordinates() {
        let action = Action::local(ActionKind::SubmitMoves, Color::Black);
        let bytes = WireCodec::default().encode_frame(&Message::Action(action)).unwrap();
        let mut fields = vec![3, 1, 0];
        fields.extend([0; 10]);
        assert_eq!(bytes, frame(11, &fields));
    }

    #[test]
    fn test_encode_move_writes_y_before_x() {
        let src = Coordinate {
            l: 0,
            t: 1,
            board_color: Color::White,
            y: 1,
            x: 4,
        };
        let dst = Coordinate { y: 3, ..src };
        let action = Action::local(ActionKind::Move(crate::Move { src, dst }), Color::White);
        let bytes = WireCodec::default().encode_frame(&Message::Action(action)).unwrap();
        assert_eq!(
            bytes,
            frame(11, &[1, 0, 0, 0, 1, 0, 1, 4, 0, 1, 0, 3, 4])
        );
    }

    #[test]
    fn test_encode_deprecated_action_rejected() {
        let action = Action::local(ActionKind::ResetPuzzle, Color::White);
        let err = WireCodec::default()
            .encode_frame(&Message::Action(action))
            .unwrap_err();
        assert_eq!(err, ProtocolError::DeprecatedAction(ActionType::ResetPuzzle));
    }

    #[test]
    fn test_encode_over_capacity_list_rejected() {
        let entry = PublicMatch {
            color: ColorChoice::White,
            clock: Clock::Long,
            variant: Variant::STANDARD,
            passcode: Passcode(5),
        };
        let list = MatchList {
            public_matches: vec![entry; 14],
            ..MatchList::default()
        };
        let err = WireCodec::default()
            .encode_frame(&Message::MatchList(list))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::CapacityExceeded { count: 14, .. }));
    }

    #[test]
    fn test_encode_above_max_frame_length_rejected() {
        let codec = WireCodec::new(64);
        let err = codec
            .encode_frame(&Message::MatchList(MatchList::default()))
            .unwrap_err();
        assert_eq!(err, ProtocolError::InvalidLength { length: 1008, max: 64 });
    }

    // =====================================================================
    // decode_frame()
    // =====================================================================

    #[test]
    fn test_decode_partial_frame_returns_none() {
        let bytes = frame(6, &[1]);
        let codec = WireCodec::default();
        assert_eq!(codec.decode_frame(&bytes[..3]), Ok(None));
        assert_eq!(codec.decode_frame(&bytes[..12]), Ok(None));
        let (msg, used) = codec.decode_frame(&bytes).unwrap().unwrap();
        assert_eq!(used, 16);
        assert_eq!(
            msg,
            Message::MatchCancelResult {
                result: ResultCode::Success
            }
        );
    }

    #[test]
    fn test_decode_length_below_tag_size_is_invalid() {
        let bytes = 4u64.to_le_bytes();
        assert_eq!(
            WireCodec::default().decode_frame(&bytes),
            Err(ProtocolError::InvalidLength {
                length: 4,
                max: 4096
            })
        );
    }

    #[test]
    fn test_decode_length_above_max_is_invalid() {
        let bytes = 5000u64.to_le_bytes();
        assert!(matches!(
            WireCodec::default().decode_frame(&bytes),
            Err(ProtocolError::InvalidLength { length: 5000, .. })
        ));
    }

    #[test]
    fn test_decode_match_start_fields() {
        let bytes = frame(7, &[3, 1, 77, 0, 1]);
        let (msg, _) = WireCodec::default().decode_frame(&bytes).unwrap().unwrap();
        assert_eq!(
            msg,
            Message::MatchStart(MatchStart {
                clock: Clock::Medium,
                variant: Variant::STANDARD,
                match_id: MatchId(77),
                color: Color::White,
                message_id: MessageId(1),
            })
        );
    }

    #[test]
    fn test_decode_non_move_action_ignores_coordinate_garbage() {
        let mut fields = vec![2, 1, 9];
        fields.extend([7, 7, 99, 7, 7, 7, 7, 99, 7, 7]);
        let (msg, _) = WireCodec::default()
            .decode_frame(&frame(11, &fields))
            .unwrap()
            .unwrap();
        assert_eq!(
            msg,
            Message::Action(Action {
                kind: ActionKind::UndoMove,
                color: Color::Black,
                message_id: MessageId(9),
            })
        );
    }

    #[test]
    fn test_decode_invalid_enum_value_is_field_error() {
        let bytes = frame(7, &[9, 1, 77, 0, 1]);
        assert_eq!(
            WireCodec::default().decode_frame(&bytes),
            Err(ProtocolError::InvalidField {
                kind: "Clock",
                value: 9
            })
        );
    }

    #[test]
    fn test_decode_frame_huge_prefix_under_unbounded_max_is_invalid() {
        let codec = WireCodec::new(u64::MAX);
        let bytes = u64::MAX.to_le_bytes();
        assert_eq!(
            codec.decode_frame(&bytes),
            Err(ProtocolError::InvalidLength {
                length: u64::MAX,
                max: u64::MAX
            })
        );
    }

    // =====================================================================
    // Decoder / Encoder
    // =====================================================================

    #[test]
    fn test_decoder_advances_past_decoded_frame() {
        let mut codec = WireCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(Message::forfeit(), &mut buf).unwrap();
        codec.encode(Message::match_list_request(), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf), Ok(Some(Message::forfeit())));
        assert_eq!(buf.len(), 17);
        assert_eq!(
            codec.decode(&mut buf),
            Ok(Some(Message::match_list_request()))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decoder_large_announced_frame_does_not_reserve_it() {
        let mut codec = WireCodec::new(u64::MAX);
        let mut buf = BytesMut::from(&(1u64 << 40).to_le_bytes()[..]);
        assert_eq!(codec.decode(&mut buf), Ok(None));
        assert!(buf.capacity() <= 2 * largest_known_frame());
    }

    #[test]
    fn test_encoder_rejects_without_writing() {
        let mut codec = WireCodec::default();
        let mut buf = BytesMut::new();
        let action = Action::local(ActionKind::ResetPuzzle, Color::White);
        assert!(codec.encode(Message::Action(action), &mut buf).is_err());
        assert!(buf.is_empty());
    }
}
