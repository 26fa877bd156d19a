//! Client configuration.

use fivedc_protocol::DEFAULT_MAX_FRAME_LENGTH;
use fivedc_session::SessionConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a client instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Session behaviour (greet version, id checking, legacy actions).
    pub session: SessionConfig,

    /// Largest length prefix accepted from the server.
    pub max_frame_length: u64,

    /// Capacity of the command channel into the client task.
    pub command_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            command_buffer: 32,
        }
    }
}
