//! Typed messages and the small enumerations they carry.
//!
//! Every type in this module maps onto a fixed-size record on the wire.
//! The byte layout itself lives in the codec; here we only describe what
//! the fields mean.
//!
//! Two color encodings exist on this protocol and they are kept apart on
//! purpose: [`ColorChoice`] is used in the lobby (0 = none, 1 = random,
//! 2 = white, 3 = black) while [`Color`] is used once a match is running
//! (0 = white, 1 = black). The switch happens at [`MatchStart`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Passcode, ProtocolError};

// ---------------------------------------------------------------------------
// Closed enumerations
// ---------------------------------------------------------------------------

/// Declares a fieldless enum backed by fixed `i64` wire values, with
/// `to_wire`/`from_wire` conversions. Unknown values are decode errors.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Returns the value written on the wire.
            pub const fn to_wire(self) -> i64 {
                match self {
                    $( Self::$variant => $value, )+
                }
            }

            /// Parses a wire value.
            ///
            /// # Errors
            /// Returns [`ProtocolError::InvalidField`] for values outside
            /// the enumeration.
            pub fn from_wire(value: i64) -> Result<Self, ProtocolError> {
                match value {
                    $( $value => Ok(Self::$variant), )+
                    _ => Err(ProtocolError::InvalidField {
                        kind: stringify!($name),
                        value,
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Color as chosen in the lobby.
    ///
    /// `None` doubles as "join" in a match request and as "empty slot" in
    /// lists.
    pub enum ColorChoice {
        None = 0,
        Random = 1,
        White = 2,
        Black = 3,
    }
}

wire_enum! {
    /// Color inside a running match: the side you play and the side each
    /// action belongs to.
    pub enum Color {
        White = 0,
        Black = 1,
    }
}

wire_enum! {
    /// Time control of a match.
    pub enum Clock {
        None = 0,
        NoClock = 1,
        Short = 2,
        Medium = 3,
        Long = 4,
    }
}

wire_enum! {
    /// Whether a match is listed in the public lobby.
    pub enum Visibility {
        None = 0,
        Public = 1,
        Private = 2,
    }
}

wire_enum! {
    /// What an action message does.
    ///
    /// `ResetPuzzle` and `DisplayCheckReason` belong to the other protocol
    /// revision. They decode, but the codec refuses to send them.
    pub enum ActionType {
        Move = 1,
        UndoMove = 2,
        SubmitMoves = 3,
        ResetPuzzle = 4,
        DisplayCheckReason = 5,
        Header = 6,
    }
}

wire_enum! {
    /// Outcome flag of create/join and cancel requests.
    pub enum ResultCode {
        Failed = 0,
        Success = 1,
    }
}

wire_enum! {
    /// State of a match in the server's recent-history list.
    pub enum HistoryStatus {
        Completed = 0,
        InProgress = 1,
    }
}

impl Color {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

/// The lobby encoding of a concrete in-match color.
impl From<Color> for ColorChoice {
    fn from(color: Color) -> Self {
        match color {
            Color::White => ColorChoice::White,
            Color::Black => ColorChoice::Black,
        }
    }
}

/// Only a decided lobby color maps onto an in-match color.
impl TryFrom<ColorChoice> for Color {
    type Error = ProtocolError;

    fn try_from(choice: ColorChoice) -> Result<Self, Self::Error> {
        match choice {
            ColorChoice::White => Ok(Color::White),
            ColorChoice::Black => Ok(Color::Black),
            other => Err(ProtocolError::InvalidField {
                kind: "Color",
                value: other.to_wire(),
            }),
        }
    }
}

impl ActionType {
    /// Returns `true` for the action types of the other protocol revision.
    pub fn is_deprecated(self) -> bool {
        matches!(self, Self::ResetPuzzle | Self::DisplayCheckReason)
    }
}

// ---------------------------------------------------------------------------
// Open enumeration: Variant
// ---------------------------------------------------------------------------

/// Game variant. Open-ended: new variants show up without a protocol bump,
/// so any value passes through untouched.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Variant(pub i64);

impl Variant {
    /// No variant (join requests, empty list slots).
    pub const NONE: Variant = Variant(0);
    pub const STANDARD: Variant = Variant(1);
    /// Let the server pick.
    pub const RANDOM: Variant = Variant(34);
    pub const TURN_ZERO: Variant = Variant(35);

    /// Returns the name of a well-known variant.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::NONE => Some("None"),
            Self::STANDARD => Some("Standard"),
            Self::RANDOM => Some("Random"),
            Self::TURN_ZERO => Some("Turn Zero"),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "variant {}", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Server-assigned identifiers
// ---------------------------------------------------------------------------

/// Identifier the server gives a started match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// Identifier the server stamps on relayed actions.
///
/// Clients always send 0; only the server picks real values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    /// The placeholder carried by every client-originated action.
    pub const UNASSIGNED: MessageId = MessageId(0);
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Greeting
// ---------------------------------------------------------------------------

/// Client → Server, tag 1. Opens every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientGreet {
    pub version1: i64,
    pub version2: i64,
    /// Always zero in observed traffic; carried verbatim.
    pub reserved: [i64; 4],
}

impl ClientGreet {
    /// The version pair sent by current game clients.
    pub const CURRENT_VERSION: (i64, i64) = (11, 16);

    pub fn new(version1: i64, version2: i64) -> Self {
        Self {
            version1,
            version2,
            reserved: [0; 4],
        }
    }
}

impl Default for ClientGreet {
    fn default() -> Self {
        Self::new(Self::CURRENT_VERSION.0, Self::CURRENT_VERSION.1)
    }
}

/// Server → Client, tag 2.
///
/// The first field looks like a version (always 1 so far) but that reading
/// is unconfirmed, so nothing checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerGreet {
    pub version: i64,
    pub reserved: [i64; 5],
}

impl Default for ServerGreet {
    fn default() -> Self {
        Self {
            version: 1,
            reserved: [0; 5],
        }
    }
}

// ---------------------------------------------------------------------------
// Matchmaking
// ---------------------------------------------------------------------------

/// The options a host picks when creating a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    pub color: ColorChoice,
    pub clock: Clock,
    pub variant: Variant,
    pub visibility: Visibility,
}

impl MatchSettings {
    /// All-zero settings, as sent when joining.
    pub const JOIN: MatchSettings = MatchSettings {
        color: ColorChoice::None,
        clock: Clock::None,
        variant: Variant::NONE,
        visibility: Visibility::None,
    };
}

/// Client → Server, tag 3. Creates a match (passcode -1) or joins one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub settings: MatchSettings,
    pub passcode: Passcode,
}

impl MatchRequest {
    /// A request to host a new match.
    pub fn create(settings: MatchSettings) -> Self {
        Self {
            settings,
            passcode: Passcode::CREATE,
        }
    }

    /// A request to join the match behind `passcode`.
    pub fn join(passcode: Passcode) -> Self {
        Self {
            settings: MatchSettings::JOIN,
            passcode,
        }
    }

    /// Returns `true` if this request creates a match.
    pub fn is_create(&self) -> bool {
        self.passcode == Passcode::CREATE
    }
}

/// Server → Client, tag 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequestResult {
    pub result: ResultCode,
    /// Unconfirmed: 0 on success, 1 seen when the match was not found.
    pub reason: i64,
    /// Zeroed on failure.
    pub settings: MatchSettings,
    /// The match passcode on success (also for public matches), -1 on failure.
    pub passcode: Passcode,
}

impl MatchRequestResult {
    /// The `reason` value observed when joining a passcode nobody hosts.
    pub const REASON_MATCH_NOT_FOUND: i64 = 1;

    pub fn success(settings: MatchSettings, passcode: Passcode) -> Self {
        Self {
            result: ResultCode::Success,
            reason: 0,
            settings,
            passcode,
        }
    }

    pub fn failed(reason: i64) -> Self {
        Self {
            result: ResultCode::Failed,
            reason,
            settings: MatchSettings::JOIN,
            passcode: Passcode::CREATE,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == ResultCode::Success
    }
}

/// Server → Client, tag 7. Both players are in; the match is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStart {
    pub clock: Clock,
    pub variant: Variant,
    pub match_id: MatchId,
    /// The side *you* play, in the in-match encoding.
    pub color: Color,
    pub message_id: MessageId,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A square on one board of the multiverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Timeline.
    pub l: i64,
    /// Turn within the timeline.
    pub t: i64,
    pub board_color: Color,
    /// Row, from 0.
    pub y: i64,
    /// Column, from 0.
    pub x: i64,
}

impl Coordinate {
    /// The all-zero coordinate written for actions that carry none.
    pub const ZERO: Coordinate = Coordinate {
        l: 0,
        t: 0,
        board_color: Color::White,
        y: 0,
        x: 0,
    };
}

/// A piece movement. Legality is the rules engine's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub src: Coordinate,
    pub dst: Coordinate,
}

/// What an action does, with the coordinates it actually carries.
///
/// Coordinates exist only where the action type gives them meaning, so
/// stray bytes in the coordinate fields of other actions never leak out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move(Move),
    UndoMove,
    SubmitMoves,
    /// Legacy revision only. Resets the whole game.
    ResetPuzzle,
    /// Legacy revision only. Only the source square is understood; the
    /// other five fields are kept as they arrived.
    DisplayCheckReason {
        source: Coordinate,
        opaque: [i64; 5],
    },
    Header,
}

impl ActionKind {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Move(_) => ActionType::Move,
            Self::UndoMove => ActionType::UndoMove,
            Self::SubmitMoves => ActionType::SubmitMoves,
            Self::ResetPuzzle => ActionType::ResetPuzzle,
            Self::DisplayCheckReason { .. } => ActionType::DisplayCheckReason,
            Self::Header => ActionType::Header,
        }
    }
}

/// Client ↔ Server, tag 11.
///
/// Sent by a client with `message_id = 0`; relayed by the server to both
/// players with an assigned id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub color: Color,
    pub message_id: MessageId,
}

impl Action {
    /// A client-originated action (id left for the server to assign).
    pub fn local(kind: ActionKind, color: Color) -> Self {
        Self {
            kind,
            color,
            message_id: MessageId::UNASSIGNED,
        }
    }

    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }
}

// ---------------------------------------------------------------------------
// Match list
// ---------------------------------------------------------------------------

/// An open match waiting in the lobby. Also used for the "your own hosted
/// match" block at the top of a match list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMatch {
    pub color: ColorChoice,
    pub clock: Clock,
    pub variant: Variant,
    pub passcode: Passcode,
}

/// A recently started match as the server remembers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMatch {
    pub status: HistoryStatus,
    pub clock: Clock,
    pub variant: Variant,
    pub visibility: Visibility,
    pub seconds_passed: i64,
}

/// Server → Client, tag 13.
///
/// On the wire both lists are fixed arrays of
/// [`LIST_CAPACITY`](crate::LIST_CAPACITY) slots plus a count; here only the
/// counted entries are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchList {
    /// Always 1 in observed traffic; carried verbatim.
    pub reserved: i64,
    /// The match you are hosting, if any.
    pub host: Option<PublicMatch>,
    pub public_matches: Vec<PublicMatch>,
    pub history: Vec<HistoryMatch>,
}

impl Default for MatchList {
    fn default() -> Self {
        Self {
            reserved: 1,
            host: None,
            public_matches: Vec::new(),
            history: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Message: one decoded frame
// ---------------------------------------------------------------------------

/// Every message the protocol knows, one variant per tag.
///
/// The single-byte `reserved` fields on the small messages have always been
/// zero; they are kept so a decoded message re-encodes to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    ClientGreet(ClientGreet),
    ServerGreet(ServerGreet),
    MatchCreateOrJoin(MatchRequest),
    MatchCreateOrJoinResult(MatchRequestResult),
    MatchCancel { reserved: i8 },
    MatchCancelResult { result: ResultCode },
    MatchStart(MatchStart),
    OpponentLeft { reserved: i8 },
    Forfeit { reserved: i8 },
    Action(Action),
    MatchListRequest { reserved: i8 },
    MatchList(MatchList),
}

impl Message {
    pub fn match_cancel() -> Self {
        Self::MatchCancel { reserved: 0 }
    }

    pub fn opponent_left() -> Self {
        Self::OpponentLeft { reserved: 0 }
    }

    pub fn forfeit() -> Self {
        Self::Forfeit { reserved: 0 }
    }

    pub fn match_list_request() -> Self {
        Self::MatchListRequest { reserved: 0 }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Wire enums
    // =====================================================================

    #[test]
    fn test_from_wire_known_values_round_trip() {
        for choice in [
            ColorChoice::None,
            ColorChoice::Random,
            ColorChoice::White,
            ColorChoice::Black,
        ] {
            assert_eq!(ColorChoice::from_wire(choice.to_wire()), Ok(choice));
        }
        assert_eq!(Clock::from_wire(4), Ok(Clock::Long));
        assert_eq!(Visibility::from_wire(2), Ok(Visibility::Private));
        assert_eq!(ActionType::from_wire(6), Ok(ActionType::Header));
    }

    #[test]
    fn test_from_wire_unknown_value_names_the_type() {
        let err = Clock::from_wire(5).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidField {
                kind: "Clock",
                value: 5
            }
        );
    }

    #[test]
    fn test_color_encodings_differ_between_lobby_and_match() {
        // White is 2 in the lobby but 0 in a match.
        assert_eq!(ColorChoice::White.to_wire(), 2);
        assert_eq!(Color::White.to_wire(), 0);
        assert_eq!(ColorChoice::from(Color::Black), ColorChoice::Black);
        assert_eq!(Color::try_from(ColorChoice::White), Ok(Color::White));
    }

    #[test]
    fn test_color_try_from_random_choice_fails() {
        assert!(Color::try_from(ColorChoice::Random).is_err());
        assert!(Color::try_from(ColorChoice::None).is_err());
    }

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::Black.opponent(), Color::White);
    }

    #[test]
    fn test_action_type_deprecated_values() {
        assert!(ActionType::ResetPuzzle.is_deprecated());
        assert!(ActionType::DisplayCheckReason.is_deprecated());
        assert!(!ActionType::Move.is_deprecated());
        assert!(!ActionType::Header.is_deprecated());
    }

    // =====================================================================
    // Variant
    // =====================================================================

    #[test]
    fn test_variant_unknown_value_passes_through() {
        let v = Variant(44);
        assert_eq!(v.name(), None);
        assert_eq!(v.to_string(), "variant 44");
    }

    #[test]
    fn test_variant_known_names() {
        assert_eq!(Variant::TURN_ZERO.to_string(), "Turn Zero");
        assert_eq!(Variant(1), Variant::STANDARD);
    }

    #[test]
    fn test_variant_serializes_as_plain_number() {
        let json = serde_json::to_string(&Variant::RANDOM).unwrap();
        assert_eq!(json, "34");
    }

    // =====================================================================
    // Identifiers
    // =====================================================================

    #[test]
    fn test_match_id_display() {
        assert_eq!(MatchId(77).to_string(), "M-77");
    }

    #[test]
    fn test_message_id_ordering_and_placeholder() {
        assert_eq!(MessageId::UNASSIGNED, MessageId(0));
        assert!(MessageId(3) > MessageId(2));
        assert_eq!(MessageId(5).to_string(), "#5");
    }

    // =====================================================================
    // Constructors
    // =====================================================================

    #[test]
    fn test_client_greet_default_uses_current_version() {
        let greet = ClientGreet::default();
        assert_eq!((greet.version1, greet.version2), (11, 16));
        assert_eq!(greet.reserved, [0; 4]);
    }

    #[test]
    fn test_match_request_create_and_join() {
        let settings = MatchSettings {
            color: ColorChoice::Random,
            clock: Clock::Short,
            variant: Variant::STANDARD,
            visibility: Visibility::Public,
        };
        let create = MatchRequest::create(settings);
        assert!(create.is_create());
        assert_eq!(create.passcode, Passcode::CREATE);

        let join = MatchRequest::join(Passcode(12345));
        assert!(!join.is_create());
        assert_eq!(join.settings, MatchSettings::JOIN);
    }

    #[test]
    fn test_match_request_result_failed_shape() {
        let failed = MatchRequestResult::failed(
            MatchRequestResult::REASON_MATCH_NOT_FOUND,
        );
        assert!(!failed.is_success());
        assert_eq!(failed.passcode, Passcode::CREATE);
        assert_eq!(failed.settings, MatchSettings::JOIN);
    }

    #[test]
    fn test_action_local_has_unassigned_id() {
        let action = Action::local(ActionKind::SubmitMoves, Color::Black);
        assert_eq!(action.message_id, MessageId::UNASSIGNED);
        assert_eq!(action.action_type(), ActionType::SubmitMoves);
    }

    // =====================================================================
    // JSON shape (events are handed to UI collaborators as JSON)
    // =====================================================================

    #[test]
    fn test_message_json_is_internally_tagged() {
        let json = serde_json::to_value(Message::forfeit()).unwrap();
        assert_eq!(json["type"], "Forfeit");
        assert_eq!(json["reserved"], 0);
    }

    #[test]
    fn test_match_start_json_round_trip() {
        let msg = Message::MatchStart(MatchStart {
            clock: Clock::Medium,
            variant: Variant::STANDARD,
            match_id: MatchId(77),
            color: Color::White,
            message_id: MessageId(1),
        });
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: Message = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }
}
