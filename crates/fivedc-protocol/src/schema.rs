//! The message catalog: which tags exist, how long each frame is, and which
//! way it travels.
//!
//! Every frame on the wire looks like this (all integers little-endian):
//!
//! ```text
//!   +----------------+----------------+---------------------------+
//!   | length: u64    | tag: i64       | payload (length - 8)      |
//!   +----------------+----------------+---------------------------+
//! ```
//!
//! The length prefix does not count itself. Each tag has exactly one valid
//! length, listed in [`SCHEMAS`]. A frame whose length disagrees with its
//! tag is rejected before any field is read.

use serde::{Deserialize, Serialize};

use crate::{Message, ProtocolError, codec};

/// Tag 8 has never been seen in legitimate traffic.
pub const RESERVED_TAG: i64 = 8;

/// Slots in each fixed array of a match list.
pub const LIST_CAPACITY: usize = 13;

/// Largest length prefix accepted by default. The reference server uses the
/// same bound.
pub const DEFAULT_MAX_FRAME_LENGTH: u64 = 4096;

/// Every known message tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    ClientGreet = 1,
    ServerGreet = 2,
    MatchCreateOrJoin = 3,
    MatchCreateOrJoinResult = 4,
    MatchCancel = 5,
    MatchCancelResult = 6,
    MatchStart = 7,
    OpponentLeft = 9,
    Forfeit = 10,
    Action = 11,
    MatchListRequest = 12,
    MatchList = 13,
}

/// Which side is allowed to send a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
    Both,
}

impl Direction {
    /// Returns `true` if a client may receive this message.
    pub fn reaches_client(self) -> bool {
        matches!(self, Self::ServerToClient | Self::Both)
    }

    /// Returns `true` if a client may send this message.
    pub fn from_client(self) -> bool {
        matches!(self, Self::ClientToServer | Self::Both)
    }
}

/// The fixed shape of one message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub message_type: MessageType,
    pub name: &'static str,
    /// Value of the length prefix, tag included.
    pub length: u64,
    pub direction: Direction,
}

/// The whole catalog, ordered by tag.
pub static SCHEMAS: [Schema; 12] = [
    schema(MessageType::ClientGreet, "ClientGreet", 56, Direction::ClientToServer),
    schema(MessageType::ServerGreet, "ServerGreet", 56, Direction::ServerToClient),
    schema(MessageType::MatchCreateOrJoin, "MatchCreateOrJoin", 48, Direction::ClientToServer),
    schema(
        MessageType::MatchCreateOrJoinResult,
        "MatchCreateOrJoinResult",
        64,
        Direction::ServerToClient,
    ),
    schema(MessageType::MatchCancel, "MatchCancel", 9, Direction::ClientToServer),
    schema(MessageType::MatchCancelResult, "MatchCancelResult", 16, Direction::ServerToClient),
    schema(MessageType::MatchStart, "MatchStart", 48, Direction::ServerToClient),
    schema(MessageType::OpponentLeft, "OpponentLeft", 9, Direction::ServerToClient),
    schema(MessageType::Forfeit, "Forfeit", 9, Direction::ClientToServer),
    schema(MessageType::Action, "Action", 112, Direction::Both),
    schema(MessageType::MatchListRequest, "MatchListRequest", 9, Direction::ClientToServer),
    schema(MessageType::MatchList, "MatchList", 1008, Direction::ServerToClient),
];

const fn schema(
    message_type: MessageType,
    name: &'static str,
    length: u64,
    direction: Direction,
) -> Schema {
    Schema {
        message_type,
        name,
        length,
        direction,
    }
}

impl MessageType {
    /// The tag written on the wire.
    pub const fn tag(self) -> i64 {
        self as i64
    }

    /// Looks up a tag. Tag 8 is reported separately from unknown tags.
    ///
    /// # Errors
    /// [`ProtocolError::ReservedMessageType`] for tag 8,
    /// [`ProtocolError::UnknownMessageType`] for anything else unlisted.
    pub fn from_tag(tag: i64) -> Result<Self, ProtocolError> {
        if tag == RESERVED_TAG {
            return Err(ProtocolError::ReservedMessageType);
        }
        SCHEMAS
            .iter()
            .find(|s| s.message_type.tag() == tag)
            .map(|s| s.message_type)
            .ok_or(ProtocolError::UnknownMessageType(tag))
    }

    /// The schema for this type.
    pub fn schema(self) -> &'static Schema {
        // SCHEMAS is ordered by tag with 8 missing.
        let index = match self.tag() {
            tag @ 1..=7 => tag - 1,
            tag => tag - 2,
        };
        &SCHEMAS[index as usize]
    }
}

impl Message {
    /// The type tag of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::ClientGreet(_) => MessageType::ClientGreet,
            Self::ServerGreet(_) => MessageType::ServerGreet,
            Self::MatchCreateOrJoin(_) => MessageType::MatchCreateOrJoin,
            Self::MatchCreateOrJoinResult(_) => MessageType::MatchCreateOrJoinResult,
            Self::MatchCancel { .. } => MessageType::MatchCancel,
            Self::MatchCancelResult { .. } => MessageType::MatchCancelResult,
            Self::MatchStart(_) => MessageType::MatchStart,
            Self::OpponentLeft { .. } => MessageType::OpponentLeft,
            Self::Forfeit { .. } => MessageType::Forfeit,
            Self::Action(_) => MessageType::Action,
            Self::MatchListRequest { .. } => MessageType::MatchListRequest,
            Self::MatchList(_) => MessageType::MatchList,
        }
    }

    /// The schema of this message.
    pub fn schema(&self) -> &'static Schema {
        self.message_type().schema()
    }
}

// ---------------------------------------------------------------------------
// MessageCatalog
// ---------------------------------------------------------------------------

/// Entry point for turning a tag and payload into a typed message.
///
/// Stateless; the codec and the frame decoder both go through it so there
/// is one place that checks lengths against the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCatalog;

impl MessageCatalog {
    /// Returns the schema for a tag.
    pub fn schema_for(tag: i64) -> Result<&'static Schema, ProtocolError> {
        MessageType::from_tag(tag).map(MessageType::schema)
    }

    /// Checks that a length prefix fits the schema of `tag`.
    pub fn check_length(tag: i64, length: u64) -> Result<&'static Schema, ProtocolError> {
        let schema = Self::schema_for(tag)?;
        if schema.length != length {
            return Err(ProtocolError::SchemaMismatch {
                message_type: schema.message_type,
                expected: schema.length,
                actual: length,
            });
        }
        Ok(schema)
    }

    /// Decodes a payload (the bytes after the tag) into a typed message.
    ///
    /// # Errors
    /// Tag lookup errors, [`ProtocolError::SchemaMismatch`] if the payload
    /// has the wrong size, and field errors from the payload itself.
    pub fn classify(tag: i64, payload: &[u8]) -> Result<Message, ProtocolError> {
        let schema = Self::check_length(tag, payload.len() as u64 + 8)?;
        codec::decode_body(schema.message_type, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemas_ordered_and_consistent() {
        for s in &SCHEMAS {
            assert_eq!(s.message_type.schema(), s);
        }
    }

    #[test]
    fn test_from_tag_reserved_and_unknown() {
        assert_eq!(
            MessageType::from_tag(8),
            Err(ProtocolError::ReservedMessageType)
        );
        assert_eq!(
            MessageType::from_tag(14),
            Err(ProtocolError::UnknownMessageType(14))
        );
        assert_eq!(
            MessageType::from_tag(0),
            Err(ProtocolError::UnknownMessageType(0))
        );
        assert_eq!(MessageType::from_tag(9), Ok(MessageType::OpponentLeft));
    }

    #[test]
    fn test_schema_lengths_match_table() {
        assert_eq!(MessageType::ClientGreet.schema().length, 56);
        assert_eq!(MessageType::MatchCancelResult.schema().length, 16);
        assert_eq!(MessageType::Action.schema().length, 112);
        assert_eq!(MessageType::MatchList.schema().length, 1008);
    }

    #[test]
    fn test_direction_of_action_is_both() {
        let d = MessageType::Action.schema().direction;
        assert!(d.reaches_client());
        assert!(d.from_client());
        assert!(!MessageType::Forfeit.schema().direction.reaches_client());
    }

    #[test]
    fn test_check_length_mismatch() {
        let err = MessageCatalog::check_length(2, 48).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::SchemaMismatch {
                message_type: MessageType::ServerGreet,
                expected: 56,
                actual: 48,
            }
        );
    }

    #[test]
    fn test_classify_cancel_result() {
        let msg = MessageCatalog::classify(6, &1i64.to_le_bytes()).unwrap();
        assert_eq!(
            msg,
            Message::MatchCancelResult {
                result: crate::ResultCode::Success
            }
        );
    }
}
