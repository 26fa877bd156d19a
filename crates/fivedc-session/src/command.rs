//! Commands and events: the session's interface to the rules engine and UI.

use fivedc_protocol::{Action, MatchList, MatchSettings, MatchStart, MessageId, Move, Passcode, ServerGreet};
use serde::{Deserialize, Serialize};

use crate::{EndReason, Role};

/// Something the local player wants to send.
///
/// Each command maps to exactly one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Greet,
    CreateMatch(MatchSettings),
    JoinMatch(Passcode),
    CancelMatch,
    SubmitMove(Move),
    UndoMove,
    SubmitMoves,
    /// Header action; the opponent reads it as "timed out".
    Header,
    Forfeit,
    RequestMatchList,
}

/// Something that happened on the session, for the rules engine and UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// The server answered the greet.
    Greeted(ServerGreet),

    /// Create/join accepted. For a host this carries the passcode to share.
    MatchFound {
        role: Role,
        passcode: Passcode,
        settings: MatchSettings,
    },

    /// Create/join refused. `reason` 1 has been seen for "match not found".
    MatchRequestFailed { reason: i64 },

    MatchCancelled,

    /// The server refused the cancel; the match may still start.
    CancelRejected,

    MatchStarted(MatchStart),

    /// The server echoed back the oldest outstanding local action.
    LocalActionConfirmed { message_id: MessageId },

    /// An opponent action for the rules engine to apply.
    ActionApplied(Action),

    /// The opponent sent the header sentinel.
    OpponentTimedOut { message_id: MessageId },

    MatchListReceived(MatchList),

    /// A relayed action was dropped because its id went backwards.
    SequenceAnomaly { last: MessageId, got: MessageId },

    MatchEnded { reason: EndReason },
}
