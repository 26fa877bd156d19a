//! Error types for the session layer.

use fivedc_protocol::{ActionType, MessageId, MessageType};

use crate::EndReason;

/// Errors raised by the session state machine.
///
/// Errors from sending are refusals: the state is left untouched and the
/// caller may try something else. Errors from receiving are protocol
/// violations; see [`is_fatal`](Self::is_fatal).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Something other than the greet was sent before the greet exchange
    /// completed.
    #[error("cannot send {0} before the greet exchange completes")]
    GreetRequired(&'static str),

    /// The message or operation is not allowed in the current state.
    #[error("cannot send {what} while {state}")]
    IllegalSend {
        what: &'static str,
        state: &'static str,
    },

    /// A well-formed message arrived in a state where it makes no sense.
    #[error("received {message:?} while {state}")]
    IllegalTransition {
        message: MessageType,
        state: &'static str,
    },

    /// A message travelled against its direction in the catalog.
    #[error("{0:?} cannot travel in this direction")]
    WrongDirection(MessageType),

    /// The command's content is invalid regardless of state.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// An own-color action came back that does not match the oldest
    /// outstanding local action.
    #[error("echo mismatch: expected {expected:?}, got {got:?}")]
    EchoMismatch {
        expected: Option<ActionType>,
        got: ActionType,
    },

    /// A relayed action id did not move forward.
    #[error("message id {got} does not follow {last}")]
    SequenceRegression { last: MessageId, got: MessageId },

    /// The opponent sent an action type from the legacy revision.
    #[error("legacy action {0:?} received")]
    LegacyAction(ActionType),

    /// The session is over for good.
    #[error("session has ended: {0}")]
    Ended(EndReason),
}

impl SessionError {
    /// Returns `true` if this error, raised by a received message, ends the
    /// session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransition { .. }
                | Self::WrongDirection(_)
                | Self::EchoMismatch { .. }
                | Self::LegacyAction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fatal_regression_is_not() {
        let err = SessionError::SequenceRegression {
            last: MessageId(4),
            got: MessageId(3),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "message id #3 does not follow #4");
    }

    #[test]
    fn test_is_fatal_for_violations() {
        assert!(
            SessionError::IllegalTransition {
                message: MessageType::MatchStart,
                state: "Lobby"
            }
            .is_fatal()
        );
        assert!(
            SessionError::EchoMismatch {
                expected: None,
                got: ActionType::Move
            }
            .is_fatal()
        );
        assert!(!SessionError::GreetRequired("MatchCreateOrJoin").is_fatal());
    }
}
