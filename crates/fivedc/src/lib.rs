//! # fivedc
//!
//! Async client for the match server of a multiverse chess game.
//!
//! fivedc speaks the server's binary protocol over TCP, tracks where the
//! session stands (greeting, lobby, pending match, in match, ended) and
//! turns the byte stream into [`SessionEvent`]s for a rules engine or UI.
//! Chess rules are not its business: moves go out and come back, and the
//! caller decides what they mean.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fivedc::prelude::*;
//!
//! # async fn run() -> Result<(), FivedcError> {
//! let (client, mut events) = Client::builder().connect("127.0.0.1:39005").await?;
//! client.greet().await?;
//! client.request_match_list().await?;
//! while let Some(event) = events.recv().await {
//!     if let SessionEvent::MatchListReceived(list) = event {
//!         println!("{} open matches", list.public_matches.len());
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod client;
mod config;
mod error;

pub use builder::{Client, ClientBuilder};
pub use client::{ClientHandle, EventReceiver};
pub use config::ClientConfig;
pub use error::FivedcError;

pub use fivedc_protocol as protocol;
pub use fivedc_session as session;
pub use fivedc_transport as transport;

pub use fivedc_session::SessionEvent;

/// The types most callers need.
pub mod prelude {
    pub use crate::{Client, ClientBuilder, ClientConfig, ClientHandle, EventReceiver, FivedcError};
    pub use fivedc_protocol::{
        Action, ActionKind, Clock, Color, ColorChoice, Coordinate, MatchId, MatchList,
        MatchSettings, Move, Passcode, Variant, Visibility,
    };
    pub use fivedc_session::{
        Conclusion, EndReason, Role, SessionConfig, SessionEvent, SessionState,
    };
}
