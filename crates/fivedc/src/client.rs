//! Client actor: one Tokio task that owns the connection and the session.
//!
//! Everything that touches session state happens inside this task, so a
//! command and an incoming frame can never interleave half-way through a
//! transition. The outside world talks to it through a [`ClientHandle`]
//! (commands with `oneshot` replies) and listens on an unbounded channel of
//! [`SessionEvent`]s.

use fivedc_protocol::{MatchSettings, Message, Move, Passcode, ProtocolError};
use fivedc_session::{
    Command, Conclusion, EndReason, SessionEvent, SessionState, SessionStateMachine,
};
use fivedc_transport::{Connection, ConnectionId};
use tokio::sync::{mpsc, oneshot};

use crate::{ClientConfig, FivedcError};

/// Channel on which the client delivers session events.
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Requests sent to the client actor.
pub(crate) enum ClientCommand {
    /// Build, check and send one outbound message.
    Send {
        command: Command,
        reply: oneshot::Sender<Result<(), FivedcError>>,
    },

    /// End the match on the rules engine's verdict.
    Conclude {
        conclusion: Conclusion,
        reply: oneshot::Sender<Result<(), FivedcError>>,
    },

    ReturnToLobby {
        reply: oneshot::Sender<Result<(), FivedcError>>,
    },

    GetState {
        reply: oneshot::Sender<SessionState>,
    },

    /// Close the connection and stop the task.
    Shutdown,
}

// ---------------------------------------------------------------------------
// ClientHandle
// ---------------------------------------------------------------------------

/// Handle to a running client. Cheap to clone.
///
/// Every method resolves once the client task has dealt with the request.
/// For sends that means the bytes were written, not that the server
/// answered; answers arrive as events.
#[derive(Clone)]
pub struct ClientHandle {
    connection_id: ConnectionId,
    sender: mpsc::Sender<ClientCommand>,
}

impl ClientHandle {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Sends the client greet.
    pub async fn greet(&self) -> Result<(), FivedcError> {
        self.send(Command::Greet).await
    }

    /// Asks the server to host a new match.
    pub async fn create_match(&self, settings: MatchSettings) -> Result<(), FivedcError> {
        self.send(Command::CreateMatch(settings)).await
    }

    /// Asks to join the match behind `passcode`.
    pub async fn join_match(&self, passcode: Passcode) -> Result<(), FivedcError> {
        self.send(Command::JoinMatch(passcode)).await
    }

    pub async fn cancel_match(&self) -> Result<(), FivedcError> {
        self.send(Command::CancelMatch).await
    }

    pub async fn submit_move(&self, mv: Move) -> Result<(), FivedcError> {
        self.send(Command::SubmitMove(mv)).await
    }

    pub async fn undo_move(&self) -> Result<(), FivedcError> {
        self.send(Command::UndoMove).await
    }

    /// Ends the current turn.
    pub async fn submit_moves(&self) -> Result<(), FivedcError> {
        self.send(Command::SubmitMoves).await
    }

    /// Sends the header action, which the opponent's client reads as
    /// "this player timed out".
    pub async fn send_header(&self) -> Result<(), FivedcError> {
        self.send(Command::Header).await
    }

    pub async fn forfeit(&self) -> Result<(), FivedcError> {
        self.send(Command::Forfeit).await
    }

    pub async fn request_match_list(&self) -> Result<(), FivedcError> {
        self.send(Command::RequestMatchList).await
    }

    /// Ends the running match with the rules engine's verdict.
    pub async fn conclude(&self, conclusion: Conclusion) -> Result<(), FivedcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request(ClientCommand::Conclude {
            conclusion,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| FivedcError::Unavailable)?
    }

    /// Goes back to the lobby after a match ended normally.
    pub async fn return_to_lobby(&self) -> Result<(), FivedcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request(ClientCommand::ReturnToLobby { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| FivedcError::Unavailable)?
    }

    /// A snapshot of the session state.
    pub async fn state(&self) -> Result<SessionState, FivedcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request(ClientCommand::GetState { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| FivedcError::Unavailable)
    }

    /// Closes the connection and stops the client task.
    pub async fn shutdown(&self) -> Result<(), FivedcError> {
        self.request(ClientCommand::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), FivedcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request(ClientCommand::Send {
            command,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| FivedcError::Unavailable)?
    }

    async fn request(&self, command: ClientCommand) -> Result<(), FivedcError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| FivedcError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// ClientActor
// ---------------------------------------------------------------------------

struct ClientActor<C> {
    conn: C,
    machine: SessionStateMachine,
    events: EventSender,
    receiver: mpsc::Receiver<ClientCommand>,
}

impl<C> ClientActor<C>
where
    C: Connection<Message = Message, Error = ProtocolError>,
{
    /// Runs until shut down or every handle is dropped.
    ///
    /// Reading stops once the session is terminally ended; the task keeps
    /// answering commands so callers can still see the final state.
    async fn run(mut self) {
        let conn_id = self.conn.id();
        tracing::info!(%conn_id, "client started");

        loop {
            let reading = !self.machine.state().is_terminal();
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(ClientCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                frame = self.conn.recv(), if reading => match frame {
                    Some(Ok(message)) => self.dispatch(message),
                    Some(Err(err)) if err.is_io() => {
                        tracing::warn!(%conn_id, error = %err, "receive failed");
                        self.close_session();
                    }
                    Some(Err(err)) => self.abort(err),
                    None => {
                        tracing::info!(%conn_id, "server closed the connection");
                        self.close_session();
                    }
                },
            }
        }

        if let Err(e) = self.conn.close().await {
            tracing::debug!(%conn_id, error = %e, "close failed");
        }
        tracing::info!(%conn_id, "client stopped");
    }

    async fn handle_command(&mut self, cmd: ClientCommand) {
        match cmd {
            ClientCommand::Send { command, reply } => {
                let result = self.send_command(command).await;
                let _ = reply.send(result);
            }
            ClientCommand::Conclude { conclusion, reply } => {
                let result = self
                    .machine
                    .conclude(conclusion)
                    .map(|event| self.emit(event))
                    .map_err(FivedcError::from);
                let _ = reply.send(result);
            }
            ClientCommand::ReturnToLobby { reply } => {
                let _ = reply.send(self.machine.return_to_lobby().map_err(FivedcError::from));
            }
            ClientCommand::GetState { reply } => {
                let _ = reply.send(self.machine.state().clone());
            }
            // Handled by the run loop.
            ClientCommand::Shutdown => {}
        }
    }

    async fn send_command(&mut self, command: Command) -> Result<(), FivedcError> {
        let outgoing = self.machine.prepare(command)?;
        let message_type = outgoing.message.message_type();

        if let Err(err) = self.conn.send(outgoing.message).await {
            if err.is_io() {
                tracing::warn!(conn_id = %self.conn.id(), error = %err, "send failed");
                self.close_session();
            } else {
                // The transition already happened; the session cannot be
                // trusted to match the server any more.
                self.abort(err.clone());
            }
            return Err(err.into());
        }
        tracing::debug!(message = ?message_type, "sent");
        for event in outgoing.events {
            self.emit(event);
        }
        Ok(())
    }

    fn dispatch(&mut self, message: Message) {
        tracing::trace!(message = ?message.message_type(), "received");
        match self.machine.on_receive(message) {
            Ok(events) => events.into_iter().for_each(|event| self.emit(event)),
            Err(err) if err.is_fatal() => self.emit(SessionEvent::MatchEnded {
                reason: EndReason::ProtocolError(err.to_string()),
            }),
            Err(err) => tracing::warn!(error = %err, "message rejected"),
        }
    }

    fn close_session(&mut self) {
        if let Some(event) = self.machine.close() {
            self.emit(event);
        }
    }

    fn abort(&mut self, err: ProtocolError) {
        if let Some(event) = self.machine.abort(err.to_string()) {
            self.emit(event);
        }
    }

    /// Delivers an event. A dropped receiver only means nobody listens.
    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Spawns the client task for `conn` and returns its handle and events.
pub(crate) fn spawn_client<C>(conn: C, config: ClientConfig) -> (ClientHandle, EventReceiver)
where
    C: Connection<Message = Message, Error = ProtocolError>,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer.max(1));
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let connection_id = conn.id();

    let actor = ClientActor {
        conn,
        machine: SessionStateMachine::new(config.session),
        events: event_tx,
        receiver: cmd_rx,
    };
    tokio::spawn(actor.run());

    (
        ClientHandle {
            connection_id,
            sender: cmd_tx,
        },
        event_rx,
    )
}
