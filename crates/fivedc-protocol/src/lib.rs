//! Wire protocol for the fivedc match client.
//!
//! This crate defines the binary "language" spoken between a game client
//! and the match server:
//!
//! - **Types** ([`Message`], [`Action`], [`MatchList`], etc.): the typed
//!   view of every frame.
//! - **Catalog** ([`MessageCatalog`], [`SCHEMAS`]): which tags exist, their
//!   fixed lengths and directions.
//! - **Codec** ([`WireCodec`]): one message to one frame and back, also as
//!   a `tokio_util` [`Decoder`](tokio_util::codec::Decoder) and
//!   [`Encoder`](tokio_util::codec::Encoder).
//! - **Stream codec** ([`FrameCodec`]): what a `Framed` connection uses;
//!   skips frames with unknown tags.
//! - **Passcodes** ([`Passcode`]): the numeric code and its six-piece
//!   spelling.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (what a message means right now). It knows nothing about connections or
//! match state; a [`Message`] is valid here whenever its bytes are.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Session (state + events)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod framed;
mod passcode;
mod schema;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{LENGTH_PREFIX, TAG_SIZE, WireCodec};
pub use error::ProtocolError;
pub use framed::FrameCodec;
pub use passcode::{Passcode, PasscodeParseError};
pub use schema::{
    DEFAULT_MAX_FRAME_LENGTH, Direction, LIST_CAPACITY, MessageCatalog, MessageType,
    RESERVED_TAG, SCHEMAS, Schema,
};
pub use types::{
    Action, ActionKind, ActionType, ClientGreet, Clock, Color, ColorChoice, Coordinate,
    HistoryMatch, HistoryStatus, MatchId, MatchList, MatchRequest, MatchRequestResult,
    MatchSettings, MatchStart, Message, MessageId, Move, PublicMatch, ResultCode, ServerGreet,
    Variant, Visibility,
};
