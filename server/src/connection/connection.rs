use std::net::SocketAddr;

use warden_shared::{PingConfig, PingManager};

/// Server-side state of one connected client
pub struct Connection {
    address: Option<SocketAddr>,
    pub ping_manager: PingManager,
}

impl Connection {
    pub fn new(address: Option<SocketAddr>, ping_config: &PingConfig) -> Self {
        Self {
            address,
            ping_manager: PingManager::new(ping_config),
        }
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }
}
