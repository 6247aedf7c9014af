use std::{collections::HashSet, default::Default};

use warden_shared::{internal_events::TAKE_CONTROL_SUCCESS, EventCode, SessionConfig};

/// Contains Config properties which will be used by a Client
#[derive(Clone)]
pub struct ClientConfig {
    /// Network mode, ownership defaults and ping settings
    pub session: SessionConfig,
    /// Codes sent straight over available peer-to-peer links when broadcast.
    /// Must match the relay's broadcast set, which skips linked pairs.
    pub broadcast_events: HashSet<EventCode>,
}

impl ClientConfig {
    pub fn direct() -> Self {
        Self {
            session: SessionConfig::direct(),
            ..Default::default()
        }
    }

    pub fn relay() -> Self {
        Self {
            session: SessionConfig::relay(),
            ..Default::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::direct(),
            broadcast_events: HashSet::from([TAKE_CONTROL_SUCCESS]),
        }
    }
}
