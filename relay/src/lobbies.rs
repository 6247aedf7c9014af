use std::collections::{BTreeMap, HashMap};

use log::info;

use warden_shared::{relay::LobbySummary, ConnectionId, LobbyId};

use crate::error::RelayError;

/// Lobby every player joins when lobbies are disabled
pub const GLOBAL_LOBBY: LobbyId = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lobby {
    id: LobbyId,
    name: String,
    members: Vec<ConnectionId>,
}

impl Lobby {
    fn new(id: LobbyId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> LobbyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in join order
    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    /// The longest-standing member
    pub fn master(&self) -> Option<ConnectionId> {
        self.members.first().copied()
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.members.contains(&connection)
    }

    pub fn summary(&self) -> LobbySummary {
        LobbySummary {
            lobby: self.id,
            name: self.name.clone(),
            members: self.members.len() as u32,
        }
    }
}

/// Result of a player leaving its lobby
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Departure {
    pub lobby: LobbyId,
    /// Set when the departed player was master and someone remains
    pub new_master: Option<ConnectionId>,
    /// Members still in the lobby
    pub remaining: Vec<ConnectionId>,
}

/// Lobby membership. A player is in at most one lobby; the first member is
/// the master, and when the master leaves the next in join order takes over.
pub struct Lobbies {
    lobbies: BTreeMap<LobbyId, Lobby>,
    membership: HashMap<ConnectionId, LobbyId>,
    next_id: LobbyId,
}

impl Default for Lobbies {
    fn default() -> Self {
        Self::new()
    }
}

impl Lobbies {
    pub fn new() -> Self {
        Self {
            lobbies: BTreeMap::new(),
            membership: HashMap::new(),
            next_id: GLOBAL_LOBBY + 1,
        }
    }

    pub fn create(&mut self, name: &str) -> LobbyId {
        let id = self.next_id;
        self.next_id += 1;
        self.lobbies.insert(id, Lobby::new(id, name));
        info!("Lobby {} ({}) created", id, name);
        id
    }

    /// Creates the global lobby if it does not exist yet
    pub fn ensure_global(&mut self) -> LobbyId {
        self.lobbies
            .entry(GLOBAL_LOBBY)
            .or_insert_with(|| Lobby::new(GLOBAL_LOBBY, "global"));
        GLOBAL_LOBBY
    }

    /// Adds `connection` to `lobby`, leaving any other lobby first.
    /// Returns the departure from the previous lobby, if there was one.
    pub fn join(&mut self, connection: ConnectionId, lobby: LobbyId) -> Result<Option<Departure>, RelayError> {
        if !self.lobbies.contains_key(&lobby) {
            return Err(RelayError::UnknownLobby { lobby });
        }
        if self.membership.get(&connection) == Some(&lobby) {
            return Ok(None);
        }
        let departure = self.leave(connection);
        if let Some(target) = self.lobbies.get_mut(&lobby) {
            target.members.push(connection);
        }
        self.membership.insert(connection, lobby);
        Ok(departure)
    }

    /// Removes `connection` from its lobby. Empty lobbies other than the
    /// global one are closed.
    pub fn leave(&mut self, connection: ConnectionId) -> Option<Departure> {
        let lobby_id = self.membership.remove(&connection)?;
        let lobby = self.lobbies.get_mut(&lobby_id)?;
        let was_master = lobby.master() == Some(connection);
        lobby.members.retain(|member| *member != connection);

        let new_master = if was_master { lobby.master() } else { None };
        let remaining = lobby.members.clone();
        if remaining.is_empty() && lobby_id != GLOBAL_LOBBY {
            self.lobbies.remove(&lobby_id);
            info!("Lobby {} closed", lobby_id);
        }
        Some(Departure {
            lobby: lobby_id,
            new_master,
            remaining,
        })
    }

    pub fn get(&self, lobby: LobbyId) -> Option<&Lobby> {
        self.lobbies.get(&lobby)
    }

    pub fn lobby_of(&self, connection: ConnectionId) -> Option<&Lobby> {
        self.membership
            .get(&connection)
            .and_then(|lobby| self.lobbies.get(lobby))
    }

    /// Master of the lobby `connection` is in
    pub fn master_of(&self, connection: ConnectionId) -> Option<ConnectionId> {
        self.lobby_of(connection).and_then(Lobby::master)
    }

    pub fn summaries(&self) -> Vec<LobbySummary> {
        self.lobbies.values().map(Lobby::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }
}
