use std::{collections::BTreeSet, net::SocketAddr};

use crate::types::{ConnectionId, EntityId, LobbyId};

/// One known peer and the entities it is Active for
#[derive(Clone, Debug)]
pub struct PeerRecord {
    connection: ConnectionId,
    address: Option<SocketAddr>,
    controls: BTreeSet<EntityId>,
    lobby: Option<LobbyId>,
    is_master: bool,
}

impl PeerRecord {
    pub fn new(connection: ConnectionId, address: Option<SocketAddr>) -> Self {
        Self {
            connection,
            address,
            controls: BTreeSet::new(),
            lobby: None,
            is_master: false,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    pub fn controls(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.controls.iter().copied()
    }

    pub fn controls_entity(&self, entity: EntityId) -> bool {
        self.controls.contains(&entity)
    }

    pub fn lobby(&self) -> Option<LobbyId> {
        self.lobby
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub(crate) fn insert_control(&mut self, entity: EntityId) {
        self.controls.insert(entity);
    }

    pub(crate) fn remove_control(&mut self, entity: EntityId) -> bool {
        self.controls.remove(&entity)
    }

    pub(crate) fn take_controls(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.controls).into_iter().collect()
    }

    pub(crate) fn set_lobby(&mut self, lobby: Option<LobbyId>) {
        self.lobby = lobby;
    }

    pub(crate) fn set_master(&mut self, is_master: bool) {
        self.is_master = is_master;
    }
}
