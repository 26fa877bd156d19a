//! The client-side session state machine.
//!
//! [`SessionStateMachine`] sees every message in both directions. Outbound
//! messages are checked before they leave ([`prepare`] / [`on_send`]) and
//! refused synchronously when illegal. Inbound messages drive the state
//! forward and come out as [`SessionEvent`]s.
//!
//! Received messages that arrive in the wrong state fall into two groups.
//! Informational ones (a second server greet, a cancel result nobody is
//! waiting for, a match list before greeting) are logged and dropped.
//! Match-critical ones (create/join result, match start, action, opponent
//! left) end the session with [`EndReason::ProtocolError`], unless the
//! session has already ended, in which case they are late and harmless.
//!
//! [`prepare`]: SessionStateMachine::prepare
//! [`on_send`]: SessionStateMachine::on_send

use fivedc_protocol::{
    Action, ActionKind, ClientGreet, ColorChoice, Clock, MatchRequest, MatchRequestResult,
    MatchStart, Message, MessageId, MessageType, ResultCode, ServerGreet, Variant, Visibility,
};

use crate::{
    AcceptedMatch, ActionSequencer, ActiveMatch, Command, Conclusion, EndReason, PendingMatch,
    Role, SessionConfig, SessionError, SessionEvent, SessionState,
};

/// A message ready to send, plus anything sending it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub message: Message,
    pub events: Vec<SessionEvent>,
}

pub struct SessionStateMachine {
    config: SessionConfig,
    state: SessionState,
    sequencer: Option<ActionSequencer>,
}

impl SessionStateMachine {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
            sequencer: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The sequencer of the running match, if any.
    pub fn sequencer(&self) -> Option<&ActionSequencer> {
        self.sequencer.as_ref()
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Builds the message for `command` and applies its transition.
    ///
    /// # Errors
    /// Refuses commands that are illegal in the current state or malformed;
    /// the state is unchanged in that case.
    pub fn prepare(&mut self, command: Command) -> Result<Outgoing, SessionError> {
        let message = self.build(command)?;
        let events = self.on_send(&message)?;
        Ok(Outgoing { message, events })
    }

    fn build(&self, command: Command) -> Result<Message, SessionError> {
        let message = match command {
            Command::Greet => {
                let (v1, v2) = self.config.client_version;
                Message::ClientGreet(ClientGreet::new(v1, v2))
            }
            Command::CreateMatch(settings) => {
                if settings.color == ColorChoice::None
                    || settings.clock == Clock::None
                    || settings.visibility == Visibility::None
                    || settings.variant == Variant::NONE
                {
                    return Err(SessionError::InvalidCommand(format!(
                        "match settings must all be chosen: {settings:?}"
                    )));
                }
                Message::MatchCreateOrJoin(MatchRequest::create(settings))
            }
            Command::JoinMatch(passcode) => {
                if !passcode.is_valid() {
                    return Err(SessionError::InvalidCommand(format!(
                        "cannot join passcode {passcode}"
                    )));
                }
                Message::MatchCreateOrJoin(MatchRequest::join(passcode))
            }
            Command::CancelMatch => Message::match_cancel(),
            Command::SubmitMove(mv) => self.local_action(ActionKind::Move(mv))?,
            Command::UndoMove => self.local_action(ActionKind::UndoMove)?,
            Command::SubmitMoves => self.local_action(ActionKind::SubmitMoves)?,
            Command::Header => self.local_action(ActionKind::Header)?,
            Command::Forfeit => Message::forfeit(),
            Command::RequestMatchList => Message::match_list_request(),
        };
        Ok(message)
    }

    fn local_action(&self, kind: ActionKind) -> Result<Message, SessionError> {
        match &self.state {
            SessionState::InMatch(active) => {
                Ok(Message::Action(Action::local(kind, active.color)))
            }
            _ => Err(self.refuse("Action")),
        }
    }

    /// Checks an outbound message and applies its transition.
    ///
    /// [`prepare`](Self::prepare) goes through here; call it directly only
    /// for messages built by hand.
    pub fn on_send(&mut self, message: &Message) -> Result<Vec<SessionEvent>, SessionError> {
        let schema = message.schema();
        if !schema.direction.from_client() {
            return Err(SessionError::WrongDirection(schema.message_type));
        }

        match message {
            Message::ClientGreet(_) => {
                if self.state != SessionState::Disconnected {
                    return Err(match &self.state {
                        SessionState::Ended(reason) if reason.is_terminal() => {
                            SessionError::Ended(reason.clone())
                        }
                        state => SessionError::IllegalSend {
                            what: schema.name,
                            state: state.name(),
                        },
                    });
                }
                self.transition(SessionState::Greeting);
            }
            Message::MatchCreateOrJoin(request) => {
                if self.state != SessionState::Lobby {
                    return Err(self.refuse(schema.name));
                }
                let role = if request.is_create() {
                    Role::Host
                } else {
                    Role::Joiner
                };
                tracing::info!(?role, passcode = %request.passcode, "requesting match");
                self.transition(SessionState::MatchPending(PendingMatch {
                    role,
                    request: *request,
                    accepted: None,
                    cancel_requested: false,
                }));
            }
            Message::MatchCancel { .. } => match &mut self.state {
                SessionState::MatchPending(pending) if !pending.cancel_requested => {
                    pending.cancel_requested = true;
                }
                SessionState::MatchPending(_) => {
                    return Err(SessionError::InvalidCommand(
                        "cancel already requested".into(),
                    ));
                }
                _ => return Err(self.refuse(schema.name)),
            },
            Message::Forfeit { .. } => {
                if !matches!(self.state, SessionState::InMatch(_)) {
                    return Err(self.refuse(schema.name));
                }
                tracing::info!("forfeiting match");
                return Ok(vec![self.end(EndReason::Forfeited)]);
            }
            Message::Action(action) => self.send_action(action)?,
            Message::MatchListRequest { .. } => {
                let allowed = match &self.state {
                    SessionState::Lobby
                    | SessionState::MatchPending(_)
                    | SessionState::InMatch(_) => true,
                    SessionState::Ended(reason) => !reason.is_terminal(),
                    _ => false,
                };
                if !allowed {
                    return Err(self.refuse(schema.name));
                }
            }
            other => return Err(SessionError::WrongDirection(other.message_type())),
        }
        Ok(Vec::new())
    }

    fn send_action(&mut self, action: &Action) -> Result<(), SessionError> {
        let SessionState::InMatch(active) = &self.state else {
            return Err(self.refuse("Action"));
        };
        if action.color != active.color {
            return Err(SessionError::InvalidCommand(format!(
                "action color {:?} is not ours ({:?})",
                action.color, active.color
            )));
        }
        if action.message_id != MessageId::UNASSIGNED {
            return Err(SessionError::InvalidCommand(format!(
                "client actions carry message id 0, not {}",
                action.message_id.0
            )));
        }
        if action.action_type().is_deprecated() {
            return Err(SessionError::InvalidCommand(format!(
                "{:?} is a legacy action",
                action.action_type()
            )));
        }
        if let Some(sequencer) = self.sequencer.as_mut() {
            sequencer.record_local(action);
        }
        tracing::debug!(action = ?action.action_type(), "action sent");
        Ok(())
    }

    /// The error for an outbound message or operation the state forbids.
    fn refuse(&self, what: &'static str) -> SessionError {
        match &self.state {
            SessionState::Disconnected | SessionState::Greeting => {
                SessionError::GreetRequired(what)
            }
            SessionState::Ended(reason) if reason.is_terminal() => {
                SessionError::Ended(reason.clone())
            }
            state => SessionError::IllegalSend {
                what,
                state: state.name(),
            },
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Applies a message received from the server.
    ///
    /// # Errors
    /// A protocol violation. When [`SessionError::is_fatal`] holds, the
    /// session has already moved to [`EndReason::ProtocolError`].
    pub fn on_receive(&mut self, message: Message) -> Result<Vec<SessionEvent>, SessionError> {
        if self.state.is_terminal() {
            tracing::debug!(message = ?message.message_type(), "session over, ignoring message");
            return Ok(Vec::new());
        }

        let schema = message.schema();
        if !schema.direction.reaches_client() {
            return self.unexpected_direction(schema.message_type);
        }

        match message {
            Message::ServerGreet(greet) => Ok(self.on_server_greet(greet)),
            Message::MatchCreateOrJoinResult(result) => self.on_request_result(result),
            Message::MatchCancelResult { result } => Ok(self.on_cancel_result(result)),
            Message::MatchStart(start) => self.on_match_start(start),
            Message::OpponentLeft { .. } => self.on_opponent_left(),
            Message::Action(action) => self.on_action(action),
            Message::MatchList(list) => {
                let listening = self.state.is_greeted();
                if !listening {
                    tracing::debug!(state = self.state.name(), "match list before greet ignored");
                    return Ok(Vec::new());
                }
                tracing::debug!(
                    public = list.public_matches.len(),
                    history = list.history.len(),
                    "match list received"
                );
                Ok(vec![SessionEvent::MatchListReceived(list)])
            }
            other => self.unexpected_direction(other.message_type()),
        }
    }

    fn on_server_greet(&mut self, greet: ServerGreet) -> Vec<SessionEvent> {
        if self.state != SessionState::Greeting {
            tracing::warn!(state = self.state.name(), "duplicate server greet ignored");
            return Vec::new();
        }
        tracing::info!(version = greet.version, "greeted by server");
        self.transition(SessionState::Lobby);
        vec![SessionEvent::Greeted(greet)]
    }

    fn on_request_result(
        &mut self,
        result: MatchRequestResult,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        let role = match &self.state {
            SessionState::MatchPending(pending) if pending.accepted.is_none() => pending.role,
            _ => return self.unexpected(MessageType::MatchCreateOrJoinResult),
        };

        if !result.is_success() {
            tracing::info!(reason = result.reason, "match request failed");
            self.transition(SessionState::Lobby);
            return Ok(vec![SessionEvent::MatchRequestFailed {
                reason: result.reason,
            }]);
        }

        if let SessionState::MatchPending(pending) = &mut self.state {
            pending.accepted = Some(AcceptedMatch {
                settings: result.settings,
                passcode: result.passcode,
            });
        }
        tracing::info!(?role, passcode = %result.passcode, "match request accepted");
        Ok(vec![SessionEvent::MatchFound {
            role,
            passcode: result.passcode,
            settings: result.settings,
        }])
    }

    fn on_cancel_result(&mut self, result: ResultCode) -> Vec<SessionEvent> {
        let waiting = matches!(
            &self.state,
            SessionState::MatchPending(pending) if pending.cancel_requested
        );
        if !waiting {
            tracing::debug!(state = self.state.name(), "stale cancel result ignored");
            return Vec::new();
        }

        match result {
            ResultCode::Success => {
                tracing::info!("match cancelled");
                self.transition(SessionState::Lobby);
                vec![SessionEvent::MatchCancelled]
            }
            ResultCode::Failed => {
                if let SessionState::MatchPending(pending) = &mut self.state {
                    pending.cancel_requested = false;
                }
                tracing::info!("cancel rejected by server");
                vec![SessionEvent::CancelRejected]
            }
        }
    }

    fn on_match_start(&mut self, start: MatchStart) -> Result<Vec<SessionEvent>, SessionError> {
        let cancel_requested = match &self.state {
            SessionState::MatchPending(pending) => pending.cancel_requested,
            _ => return self.unexpected(MessageType::MatchStart),
        };
        if cancel_requested {
            tracing::debug!("match start supersedes pending cancel");
        }

        tracing::info!(
            match_id = %start.match_id,
            color = ?start.color,
            variant = %start.variant,
            "match started"
        );
        self.sequencer = Some(ActionSequencer::new(
            start.color,
            start.message_id,
            self.config.strict_message_ids,
        ));
        self.transition(SessionState::InMatch(ActiveMatch {
            match_id: start.match_id,
            color: start.color,
            clock: start.clock,
            variant: start.variant,
        }));
        Ok(vec![SessionEvent::MatchStarted(start)])
    }

    fn on_opponent_left(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        if !matches!(self.state, SessionState::InMatch(_)) {
            return self.unexpected(MessageType::OpponentLeft);
        }
        tracing::info!("opponent left the match");
        Ok(vec![self.end(EndReason::OpponentLeft)])
    }

    fn on_action(&mut self, action: Action) -> Result<Vec<SessionEvent>, SessionError> {
        if !matches!(self.state, SessionState::InMatch(_)) {
            return self.unexpected(MessageType::Action);
        }
        let action_type = action.action_type();
        if action_type.is_deprecated() && !self.config.accept_legacy_actions {
            return Err(self.fail(SessionError::LegacyAction(action_type)));
        }
        let Some(sequencer) = self.sequencer.as_mut() else {
            return self.unexpected(MessageType::Action);
        };

        match sequencer.on_remote(action) {
            Ok(event) => {
                tracing::debug!(?action_type, id = %action.message_id, "action relayed");
                Ok(vec![event])
            }
            Err(SessionError::SequenceRegression { last, got }) => {
                tracing::warn!(%last, %got, "relayed action id did not advance, not relaying it");
                Ok(vec![SessionEvent::SequenceAnomaly { last, got }])
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// A match-critical message in the wrong state.
    fn unexpected(&mut self, message: MessageType) -> Result<Vec<SessionEvent>, SessionError> {
        if matches!(self.state, SessionState::Ended(_)) {
            tracing::debug!(?message, "late message after match end ignored");
            return Ok(Vec::new());
        }
        let err = SessionError::IllegalTransition {
            message,
            state: self.state.name(),
        };
        Err(self.fail(err))
    }

    fn unexpected_direction(
        &mut self,
        message: MessageType,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        if matches!(self.state, SessionState::Ended(_)) {
            tracing::debug!(?message, "late message after match end ignored");
            return Ok(Vec::new());
        }
        Err(self.fail(SessionError::WrongDirection(message)))
    }

    // -----------------------------------------------------------------------
    // Local lifecycle
    // -----------------------------------------------------------------------

    /// Ends the running match on the rules engine's verdict.
    pub fn conclude(&mut self, conclusion: Conclusion) -> Result<SessionEvent, SessionError> {
        if !matches!(self.state, SessionState::InMatch(_)) {
            return Err(self.refuse("conclude"));
        }
        tracing::info!(?conclusion, "match concluded");
        Ok(self.end(EndReason::Concluded(conclusion)))
    }

    /// Goes back to the lobby after a match ended normally.
    pub fn return_to_lobby(&mut self) -> Result<(), SessionError> {
        match &self.state {
            SessionState::Ended(reason) if !reason.is_terminal() => {
                self.transition(SessionState::Lobby);
                Ok(())
            }
            _ => Err(self.refuse("return_to_lobby")),
        }
    }

    /// Records that the transport closed.
    ///
    /// Returns the end event unless the session had already ended.
    pub fn close(&mut self) -> Option<SessionEvent> {
        match &self.state {
            SessionState::Ended(reason) if reason.is_terminal() => None,
            SessionState::Ended(_) => {
                self.transition(SessionState::Ended(EndReason::ConnectionClosed));
                None
            }
            _ => Some(self.end(EndReason::ConnectionClosed)),
        }
    }

    /// Ends the session because the byte stream itself is broken.
    pub fn abort(&mut self, detail: String) -> Option<SessionEvent> {
        if self.state.is_terminal() {
            return None;
        }
        tracing::error!(%detail, state = self.state.name(), "session aborted");
        Some(self.end(EndReason::ProtocolError(detail)))
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        tracing::error!(error = %err, state = self.state.name(), "protocol violation, ending session");
        self.end(EndReason::ProtocolError(err.to_string()));
        err
    }

    fn end(&mut self, reason: EndReason) -> SessionEvent {
        self.sequencer = None;
        self.transition(SessionState::Ended(reason.clone()));
        SessionEvent::MatchEnded { reason }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state, to = %next, "session transition");
        self.state = next;
    }
}

// =========================================================================
// Tests
// =========================================================================
