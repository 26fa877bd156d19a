//! Session layer for the fivedc match client.
//!
//! This crate decides what a message *means* given everything that came
//! before it:
//!
//! 1. **State machine** ([`SessionStateMachine`]): greet, matchmaking,
//!    the match itself and how it ended.
//! 2. **Action sequencing** ([`ActionSequencer`]): telling echoes of our
//!    own actions from the opponent's, and checking relayed ids.
//! 3. **Commands and events** ([`Command`], [`SessionEvent`]): the
//!    vocabulary shared with the rules engine and UI.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client actor (above)  ← owns the connection, feeds messages both ways
//!     ↕
//! Session Layer (this crate)  ← state, legality, events
//!     ↕
//! Protocol Layer (below)  ← typed messages
//! ```
//!
//! Nothing here does I/O; every method is synchronous and deterministic, so
//! the whole lifecycle can be tested without a socket.

mod command;
mod config;
mod error;
mod machine;
mod sequencer;
mod state;

pub use command::{Command, SessionEvent};
pub use config::SessionConfig;
pub use error::SessionError;
pub use machine::{Outgoing, SessionStateMachine};
pub use sequencer::ActionSequencer;
pub use state::{
    AcceptedMatch, ActiveMatch, Conclusion, EndReason, PendingMatch, Role, SessionState,
};
