//! Session states and the data each one carries.
//!
//! ```text
//!   Disconnected ──greet──→ Greeting ──server greet──→ Lobby
//!                                                       │  ↑
//!                                         create/join   │  │ failed / cancelled
//!                                                       ↓  │
//!                                                  MatchPending
//!                                                       │
//!                                                  match start
//!                                                       ↓
//!                                                    InMatch
//!                                                       │
//!                             opponent left / forfeit / conclusion
//!                                                       ↓
//!                                                     Ended ──return_to_lobby──→ Lobby
//! ```
//!
//! `Ended` caused by a protocol violation or a closed connection is
//! terminal: the connection cannot be reused.

use std::fmt;

use fivedc_protocol::{Clock, Color, MatchId, MatchRequest, MatchSettings, Passcode, Variant};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Connected at the transport level, nothing sent yet.
    Disconnected,
    /// Client greet sent, waiting for the server's.
    Greeting,
    /// Greeted; free to create, join or browse matches.
    Lobby,
    /// A create or join request is outstanding or waiting for an opponent.
    MatchPending(PendingMatch),
    /// Playing.
    InMatch(ActiveMatch),
    /// The match (or the whole session) is over.
    Ended(EndReason),
}

impl SessionState {
    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Greeting => "Greeting",
            Self::Lobby => "Lobby",
            Self::MatchPending(_) => "MatchPending",
            Self::InMatch(_) => "InMatch",
            Self::Ended(_) => "Ended",
        }
    }

    /// Returns `true` once the greet exchange has completed.
    pub fn is_greeted(&self) -> bool {
        !matches!(self, Self::Disconnected | Self::Greeting)
    }

    /// Returns `true` if nothing more can happen on this connection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended(reason) if reason.is_terminal())
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchPending(pending) => write!(f, "MatchPending({:?})", pending.role),
            Self::InMatch(active) => {
                write!(f, "InMatch({}, {:?})", active.match_id, active.color)
            }
            Self::Ended(reason) => write!(f, "Ended({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchPending
// ---------------------------------------------------------------------------

/// Which side of matchmaking this client is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Created the match and waits for someone to join.
    Host,
    /// Asked to join an existing match.
    Joiner,
}

/// What the server confirmed about a pending match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedMatch {
    pub settings: MatchSettings,
    pub passcode: Passcode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMatch {
    pub role: Role,
    /// The request as sent.
    pub request: MatchRequest,
    /// Filled in by a successful create/join result.
    pub accepted: Option<AcceptedMatch>,
    /// A cancel was sent and has not been answered.
    pub cancel_requested: bool,
}

// ---------------------------------------------------------------------------
// InMatch
// ---------------------------------------------------------------------------

/// The match as fixed by the server's start message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMatch {
    pub match_id: MatchId,
    /// The side this client plays.
    pub color: Color,
    pub clock: Clock,
    pub variant: Variant,
}

// ---------------------------------------------------------------------------
// Ended
// ---------------------------------------------------------------------------

/// How a game ended, as judged by the local rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conclusion {
    Checkmate,
    Stalemate,
    Draw,
    Resignation,
    ClockOut,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    OpponentLeft,
    /// This client forfeited.
    Forfeited,
    Concluded(Conclusion),
    /// A violation ended the session; holds the error text.
    ProtocolError(String),
    ConnectionClosed,
}

impl EndReason {
    /// Returns `true` if the connection cannot go back to the lobby.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ProtocolError(_) | Self::ConnectionClosed)
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpponentLeft => f.write_str("opponent left"),
            Self::Forfeited => f.write_str("forfeited"),
            Self::Concluded(conclusion) => write!(f, "concluded by {conclusion:?}"),
            Self::ProtocolError(detail) => write!(f, "protocol error: {detail}"),
            Self::ConnectionClosed => f.write_str("connection closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_reason_is_terminal() {
        assert!(EndReason::ConnectionClosed.is_terminal());
        assert!(EndReason::ProtocolError("x".into()).is_terminal());
        assert!(!EndReason::OpponentLeft.is_terminal());
        assert!(!EndReason::Forfeited.is_terminal());
        assert!(!EndReason::Concluded(Conclusion::Checkmate).is_terminal());
    }

    #[test]
    fn test_session_state_is_greeted() {
        assert!(!SessionState::Disconnected.is_greeted());
        assert!(!SessionState::Greeting.is_greeted());
        assert!(SessionState::Lobby.is_greeted());
        assert!(SessionState::Ended(EndReason::OpponentLeft).is_greeted());
    }

    #[test]
    fn test_session_state_display() {
        let state = SessionState::InMatch(ActiveMatch {
            match_id: MatchId(77),
            color: Color::White,
            clock: Clock::Short,
            variant: Variant::STANDARD,
        });
        assert_eq!(state.to_string(), "InMatch(M-77, White)");
        assert_eq!(SessionState::Lobby.to_string(), "Lobby");
        assert_eq!(
            SessionState::Ended(EndReason::Forfeited).to_string(),
            "Ended(forfeited)"
        );
    }

    #[test]
    fn test_session_state_is_terminal() {
        assert!(SessionState::Ended(EndReason::ConnectionClosed).is_terminal());
        assert!(!SessionState::Ended(EndReason::OpponentLeft).is_terminal());
        assert!(!SessionState::Lobby.is_terminal());
    }
}
