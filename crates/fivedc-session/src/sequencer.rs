//! Matching relayed actions against what this client sent.
//!
//! The server relays every action to *both* players, stamped with a fresh
//! message id. So each action this client sends comes back exactly once,
//! in order, and everything else in the stream is the opponent's. The
//! sequencer keeps the local actions waiting for their echo in a FIFO and
//! checks that remote ids keep moving forward.

use std::collections::VecDeque;

use fivedc_protocol::{Action, ActionKind, ActionType, Color, MessageId};

use crate::{SessionError, SessionEvent};

#[derive(Debug, Clone)]
pub struct ActionSequencer {
    color: Color,
    last_seen: MessageId,
    strict: bool,
    outstanding: VecDeque<ActionKind>,
}

impl ActionSequencer {
    /// Starts sequencing for a match in which this client plays `color`.
    /// `start_id` is the message id of the match start.
    pub fn new(color: Color, start_id: MessageId, strict: bool) -> Self {
        Self {
            color,
            last_seen: start_id,
            strict,
            outstanding: VecDeque::new(),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// The highest remote id accepted so far.
    pub fn last_seen(&self) -> MessageId {
        self.last_seen
    }

    /// Local actions still waiting for their echo.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Records an action just sent by this client.
    pub fn record_local(&mut self, action: &Action) {
        self.outstanding.push_back(action.kind);
    }

    /// Classifies a relayed action.
    ///
    /// # Errors
    /// [`SessionError::SequenceRegression`] if the id did not move forward.
    /// The action is not relayed, but an own-color echo that matches the
    /// oldest outstanding action still consumes it, so later echoes line up.
    /// [`SessionError::EchoMismatch`] if an own-color action does not match
    /// the oldest outstanding one.
    pub fn on_remote(&mut self, action: Action) -> Result<SessionEvent, SessionError> {
        let advanced = if self.strict {
            action.message_id > self.last_seen
        } else {
            action.message_id >= self.last_seen
        };
        if !advanced {
            if action.color == self.color && self.outstanding.front() == Some(&action.kind) {
                self.outstanding.pop_front();
            }
            return Err(SessionError::SequenceRegression {
                last: self.last_seen,
                got: action.message_id,
            });
        }

        if action.color == self.color {
            let expected = self.outstanding.pop_front();
            if expected != Some(action.kind) {
                return Err(SessionError::EchoMismatch {
                    expected: expected.map(|kind| kind.action_type()),
                    got: action.action_type(),
                });
            }
            self.last_seen = action.message_id;
            return Ok(SessionEvent::LocalActionConfirmed {
                message_id: action.message_id,
            });
        }

        self.last_seen = action.message_id;
        if action.action_type() == ActionType::Header {
            Ok(SessionEvent::OpponentTimedOut {
                message_id: action.message_id,
            })
        } else {
            Ok(SessionEvent::ActionApplied(action))
        }
    }
}

#[cfg(test)]
mod tests {
    use fivedc_protocol::{Coordinate, Move};

    use super::*;

    fn mv(x: i64) -> ActionKind {
        let src = Coordinate {
            l: 0,
            t: 1,
            board_color: Color::White,
            y: 1,
            x,
        };
        ActionKind::Move(Move {
            src,
            dst: Coordinate { y: 3, ..src },
        })
    }

    fn relayed(kind: ActionKind, color: Color, id: u64) -> Action {
        Action {
            kind,
            color,
            message_id: MessageId(id),
        }
    }

    // =====================================================================
    // Echo matching
    // =====================================================================

    #[test]
    fn test_on_remote_echo_confirms_in_fifo_order() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(1), true);
        seq.record_local(&Action::local(mv(4), Color::White));
        seq.record_local(&Action::local(ActionKind::SubmitMoves, Color::White));
        assert_eq!(seq.outstanding(), 2);

        assert_eq!(
            seq.on_remote(relayed(mv(4), Color::White, 2)),
            Ok(SessionEvent::LocalActionConfirmed {
                message_id: MessageId(2)
            })
        );
        assert_eq!(
            seq.on_remote(relayed(ActionKind::SubmitMoves, Color::White, 3)),
            Ok(SessionEvent::LocalActionConfirmed {
                message_id: MessageId(3)
            })
        );
        assert_eq!(seq.outstanding(), 0);
        assert_eq!(seq.last_seen(), MessageId(3));
    }

    #[test]
    fn test_on_remote_out_of_order_echo_is_mismatch() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(1), true);
        seq.record_local(&Action::local(mv(4), Color::White));
        seq.record_local(&Action::local(ActionKind::SubmitMoves, Color::White));

        let err = seq
            .on_remote(relayed(ActionKind::SubmitMoves, Color::White, 2))
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::EchoMismatch {
                expected: Some(ActionType::Move),
                got: ActionType::SubmitMoves,
            }
        );
    }

    #[test]
    fn test_on_remote_own_color_with_nothing_outstanding_is_mismatch() {
        let mut seq = ActionSequencer::new(Color::Black, MessageId(1), true);
        let err = seq
            .on_remote(relayed(ActionKind::UndoMove, Color::Black, 2))
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::EchoMismatch {
                expected: None,
                got: ActionType::UndoMove,
            }
        );
    }

    // =====================================================================
    // Opponent actions
    // =====================================================================

    #[test]
    fn test_on_remote_opponent_move_is_applied() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(1), true);
        let action = relayed(mv(2), Color::Black, 5);
        assert_eq!(seq.on_remote(action), Ok(SessionEvent::ActionApplied(action)));
    }

    #[test]
    fn test_on_remote_opponent_header_is_timeout() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(1), true);
        assert_eq!(
            seq.on_remote(relayed(ActionKind::Header, Color::Black, 2)),
            Ok(SessionEvent::OpponentTimedOut {
                message_id: MessageId(2)
            })
        );
    }

    #[test]
    fn test_on_remote_own_header_echo_is_confirmation() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(1), true);
        seq.record_local(&Action::local(ActionKind::Header, Color::White));
        assert_eq!(
            seq.on_remote(relayed(ActionKind::Header, Color::White, 2)),
            Ok(SessionEvent::LocalActionConfirmed {
                message_id: MessageId(2)
            })
        );
    }

    // =====================================================================
    // Id ordering
    // =====================================================================

    #[test]
    fn test_on_remote_duplicate_id_is_regression_when_strict() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(1), true);
        seq.on_remote(relayed(mv(1), Color::Black, 4)).unwrap();

        let err = seq
            .on_remote(relayed(mv(2), Color::Black, 4))
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::SequenceRegression {
                last: MessageId(4),
                got: MessageId(4),
            }
        );
        assert_eq!(seq.last_seen(), MessageId(4));
    }

    #[test]
    fn test_on_remote_regressed_echo_still_consumes_outstanding() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(7), true);
        seq.record_local(&Action::local(mv(4), Color::White));
        seq.record_local(&Action::local(ActionKind::SubmitMoves, Color::White));

        assert!(seq.on_remote(relayed(mv(4), Color::White, 6)).is_err());
        assert_eq!(seq.outstanding(), 1);
        assert_eq!(
            seq.on_remote(relayed(ActionKind::SubmitMoves, Color::White, 8)),
            Ok(SessionEvent::LocalActionConfirmed {
                message_id: MessageId(8)
            })
        );
        assert_eq!(seq.outstanding(), 0);
    }

    #[test]
    fn test_on_remote_regressed_stray_echo_keeps_outstanding() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(7), true);
        seq.record_local(&Action::local(mv(4), Color::White));

        assert!(seq.on_remote(relayed(ActionKind::UndoMove, Color::White, 6)).is_err());
        assert_eq!(seq.outstanding(), 1);
        assert_eq!(seq.last_seen(), MessageId(7));
    }

    #[test]
    fn test_on_remote_equal_id_allowed_when_lenient() {
        let mut seq = ActionSequencer::new(Color::White, MessageId(3), false);
        assert!(seq.on_remote(relayed(mv(1), Color::Black, 3)).is_ok());
        assert!(seq.on_remote(relayed(mv(1), Color::Black, 2)).is_err());
    }
}
