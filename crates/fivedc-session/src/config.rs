//! Session configuration.

use serde::{Deserialize, Serialize};

use fivedc_protocol::ClientGreet;

/// Tunables for a single session.
///
/// Defaults match what current game clients do against the public server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Version pair sent in the client greet.
    pub client_version: (i64, i64),

    /// Require every relayed action id to be strictly greater than the last.
    ///
    /// The reference server stamps ids with whole seconds since it started,
    /// so two actions within one second can share an id. Set to `false` to
    /// accept equal ids and only flag actual decreases.
    pub strict_message_ids: bool,

    /// Accept the legacy `ResetPuzzle` and `DisplayCheckReason` actions
    /// from the opponent instead of treating them as a protocol violation.
    pub accept_legacy_actions: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_version: ClientGreet::CURRENT_VERSION,
            strict_message_ids: true,
            accept_legacy_actions: false,
        }
    }
}
