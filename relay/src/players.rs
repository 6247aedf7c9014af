use std::{collections::HashMap, net::SocketAddr};

use warden_shared::{ConnectionId, PingConfig, PingManager};

/// A transport connection to the relay. It becomes a player once it sends
/// REGISTER_PLAYER; until then everything else it sends is refused.
pub struct Player {
    address: Option<SocketAddr>,
    registered: bool,
    pub ping_manager: PingManager,
}

impl Player {
    fn new(address: Option<SocketAddr>, ping_config: &PingConfig) -> Self {
        Self {
            address,
            registered: false,
            ping_manager: PingManager::new(ping_config),
        }
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }
}

#[derive(Default)]
pub struct Players {
    players: HashMap<ConnectionId, Player>,
}

impl Players {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the connection was already known
    pub fn connect(&mut self, connection: ConnectionId, address: Option<SocketAddr>, ping_config: &PingConfig) -> bool {
        if self.players.contains_key(&connection) {
            return false;
        }
        self.players
            .insert(connection, Player::new(address, ping_config));
        true
    }

    /// Returns false if the connection is unknown or already registered
    pub fn register(&mut self, connection: ConnectionId) -> bool {
        match self.players.get_mut(&connection) {
            Some(player) if !player.registered => {
                player.registered = true;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, connection: ConnectionId) -> Option<Player> {
        self.players.remove(&connection)
    }

    pub fn get(&self, connection: ConnectionId) -> Option<&Player> {
        self.players.get(&connection)
    }

    pub fn get_mut(&mut self, connection: ConnectionId) -> Option<&mut Player> {
        self.players.get_mut(&connection)
    }

    pub fn is_registered(&self, connection: ConnectionId) -> bool {
        self.players
            .get(&connection)
            .map(Player::is_registered)
            .unwrap_or(false)
    }

    /// Registered players, in id order
    pub fn registered(&self) -> Vec<ConnectionId> {
        let mut registered: Vec<ConnectionId> = self
            .players
            .iter()
            .filter(|(_, player)| player.registered)
            .map(|(connection, _)| *connection)
            .collect();
        registered.sort_unstable();
        registered
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ConnectionId, &mut Player)> {
        self.players.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
