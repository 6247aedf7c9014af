use crate::{latency::PingConfig, types::NetworkMode, world::OwnershipAccessLevel};

/// Contains Config properties shared by every node of a session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Direct client/server, or relay-mediated
    pub mode: NetworkMode,
    /// Scope relay broadcasts to the sender's lobby instead of every client
    pub lobbies_enabled: bool,
    /// Allow clients to negotiate direct links through the relay
    pub peer_to_peer_enabled: bool,
    /// Access level applied to every entity when the ownership policy does not
    /// use per-prefab levels
    pub default_access_level: OwnershipAccessLevel,
    /// Configuration used to monitor the ping & jitter on the network
    pub ping: PingConfig,
}

impl SessionConfig {
    pub fn direct() -> Self {
        Self::default()
    }

    pub fn relay() -> Self {
        Self {
            mode: NetworkMode::Relay,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: NetworkMode::Direct,
            lobbies_enabled: true,
            peer_to_peer_enabled: false,
            default_access_level: OwnershipAccessLevel::Full,
            ping: PingConfig::default(),
        }
    }
}
