use std::default::Default;

use warden_shared::SessionConfig;

/// Contains Config properties which will be used by the Server
#[derive(Clone)]
pub struct ServerConfig {
    /// Ownership defaults and ping settings shared with the clients
    pub session: SessionConfig,
    /// Send a SPAWN_ENTITY for every live entity to each new connection
    pub replay_spawns_on_connect: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::direct(),
            replay_spawns_on_connect: true,
        }
    }
}
