use std::{collections::HashSet, default::Default, ops::Range};

use warden_shared::{internal_events::TAKE_CONTROL_SUCCESS, EventCode, PingConfig};

/// Contains Config properties which will be used by the Relay
#[derive(Clone)]
pub struct RelayConfig {
    /// Players create and join lobbies. When false everyone shares one global lobby.
    pub lobbies_enabled: bool,
    /// Broker direct links between players of the same lobby
    pub peer_to_peer_enabled: bool,
    /// Codes fanned out to the sender's whole lobby instead of going through
    /// the master. Applications add their state update codes here.
    pub broadcast_events: HashSet<EventCode>,
    /// Ports handed out to players for peer link listeners
    pub peer_port_range: Range<u16>,
    /// Configuration used to monitor the ping & jitter on the network
    pub ping: PingConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            lobbies_enabled: true,
            peer_to_peer_enabled: false,
            broadcast_events: HashSet::from([TAKE_CONTROL_SUCCESS]),
            peer_port_range: 42_000..43_000,
            ping: PingConfig::default(),
        }
    }
}
