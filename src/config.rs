//! Relay configuration
//!
//! Every context of one host has to agree on the broadcast channel name
//! and the shared store key, otherwise they cannot hear each other. The
//! defaults match the constants all lecturer and student views use.

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants::relay::{CHANNEL_NAME, STORAGE_KEY};

/// Identifiers the relay uses on its cross-context transports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RelayConfig {
    /// Name of the broadcast channel to join
    #[garde(length(min = 1))]
    pub channel_name: String,
    /// Key in the shared store that carries serialized events
    #[garde(length(min = 1))]
    pub storage_key: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_name: CHANNEL_NAME.to_owned(),
            storage_key: STORAGE_KEY.to_owned(),
        }
    }
}
