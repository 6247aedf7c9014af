use std::{collections::HashMap, net::SocketAddr};

use log::debug;

use crate::{
    directory::{error::DirectoryError, peer_record::PeerRecord},
    types::{ConnectionId, EntityId, LobbyId},
};

/// Maps connection ids to peers and peers to the entities they control.
/// Entities never store their controller; it is always looked up here, and
/// an entity is listed under at most one controller.
#[derive(Default)]
pub struct ConnectionDirectory {
    peers: HashMap<ConnectionId, PeerRecord>,
    controllers: HashMap<EntityId, ConnectionId>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, connection: ConnectionId, address: Option<SocketAddr>) -> Result<(), DirectoryError> {
        if self.peers.contains_key(&connection) {
            return Err(DirectoryError::AlreadyConnected { connection });
        }
        self.peers.insert(connection, PeerRecord::new(connection, address));
        Ok(())
    }

    /// Removes the peer and returns the entities it was controlling, ascending.
    /// The caller must hand each one to a live peer.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<Vec<EntityId>, DirectoryError> {
        let mut peer = self
            .peers
            .remove(&connection)
            .ok_or(DirectoryError::UnknownConnection { connection })?;
        let orphaned = peer.take_controls();
        for entity in &orphaned {
            self.controllers.remove(entity);
        }
        Ok(orphaned)
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.peers.contains_key(&connection)
    }

    pub fn peer(&self, connection: ConnectionId) -> Option<&PeerRecord> {
        self.peers.get(&connection)
    }

    /// Records `connection` as the controller of `entity`, removing it from any
    /// previous controller. Unknown connections are added on the fly, since
    /// relay-mode peers only learn about each other through traffic.
    /// Returns the previous controller if it was another connection.
    pub fn register_control(&mut self, connection: ConnectionId, entity: EntityId) -> Option<ConnectionId> {
        let previous = self.controllers.insert(entity, connection);
        if let Some(previous) = previous {
            if previous != connection {
                if let Some(peer) = self.peers.get_mut(&previous) {
                    peer.remove_control(entity);
                }
                debug!(
                    "Entity {} control moved from connection {} to {}",
                    entity, previous, connection
                );
            }
        }
        self.entry(connection).insert_control(entity);
        previous.filter(|previous| *previous != connection)
    }

    /// Returns whether `connection` was listed as the controller of `entity`
    pub fn release_control(&mut self, connection: ConnectionId, entity: EntityId) -> bool {
        if self.controllers.get(&entity) != Some(&connection) {
            return false;
        }
        self.controllers.remove(&entity);
        if let Some(peer) = self.peers.get_mut(&connection) {
            peer.remove_control(entity);
        }
        true
    }

    /// Entities `connection` controls, ascending
    pub fn controls(&self, connection: ConnectionId) -> Vec<EntityId> {
        self.peers
            .get(&connection)
            .map(|peer| peer.controls().collect())
            .unwrap_or_default()
    }

    pub fn controller_of(&self, entity: EntityId) -> Option<ConnectionId> {
        self.controllers.get(&entity).copied()
    }

    /// Forgets every trace of a despawned entity, returning who controlled it
    pub fn purge_entity(&mut self, entity: EntityId) -> Option<ConnectionId> {
        let controller = self.controllers.remove(&entity)?;
        if let Some(peer) = self.peers.get_mut(&controller) {
            peer.remove_control(entity);
        }
        Some(controller)
    }

    /// Notes the lobby of `connection`, adding it if unseen. Clearing the
    /// lobby also clears the master flag, and never adds a peer.
    pub fn set_lobby(&mut self, connection: ConnectionId, lobby: Option<LobbyId>) {
        match lobby {
            Some(lobby) => self.entry(connection).set_lobby(Some(lobby)),
            None => {
                if let Some(peer) = self.peers.get_mut(&connection) {
                    peer.set_lobby(None);
                    peer.set_master(false);
                }
            }
        }
    }

    /// Flags `master` as the only master of `lobby`
    pub fn assign_master(&mut self, lobby: LobbyId, master: ConnectionId) {
        for peer in self.peers.values_mut() {
            if peer.lobby() == Some(lobby) {
                peer.set_master(false);
            }
        }
        let record = self.entry(master);
        record.set_lobby(Some(lobby));
        record.set_master(true);
    }

    pub fn master_of(&self, lobby: LobbyId) -> Option<ConnectionId> {
        self.peers
            .values()
            .find(|peer| peer.lobby() == Some(lobby) && peer.is_master())
            .map(PeerRecord::connection)
    }

    /// Known members of `lobby`, ascending
    pub fn lobby_members(&self, lobby: LobbyId) -> Vec<ConnectionId> {
        let mut members: Vec<ConnectionId> = self
            .peers
            .values()
            .filter(|peer| peer.lobby() == Some(lobby))
            .map(PeerRecord::connection)
            .collect();
        members.sort_unstable();
        members
    }

    fn entry(&mut self, connection: ConnectionId) -> &mut PeerRecord {
        self.peers
            .entry(connection)
            .or_insert_with(|| PeerRecord::new(connection, None))
    }

    /// Known connection ids, ascending
    pub fn connections(&self) -> Vec<ConnectionId> {
        let mut connections: Vec<ConnectionId> = self.peers.keys().copied().collect();
        connections.sort_unstable();
        connections
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
