use std::{mem, vec::IntoIter};

use warden_shared::{relay::LobbySummary, ConnectionId, LobbyId};

use crate::ClientError;

/// Why the session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The transport closed the connection
    Transport,
    /// The relay did not recognize this client and dropped it
    Forced,
}

/// Everything that happened during one call to `Client::receive`
pub struct ClientEvents {
    connections: Vec<ConnectionId>,
    disconnections: Vec<DisconnectReason>,
    peer_disconnections: Vec<ConnectionId>,
    masters: Vec<ConnectionId>,
    lobby_joins: Vec<(LobbyId, String)>,
    lobby_leaves: Vec<LobbyId>,
    lobby_lists: Vec<Vec<LobbySummary>>,
    peer_links: Vec<(ConnectionId, bool)>,
    errors: Vec<ClientError>,

    empty: bool,
}

impl Default for ClientEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            peer_disconnections: Vec::new(),
            masters: Vec::new(),
            lobby_joins: Vec::new(),
            lobby_leaves: Vec::new(),
            lobby_lists: Vec::new(),
            peer_links: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: ClientEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: ClientEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, connection: ConnectionId) {
        self.connections.push(connection);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, reason: DisconnectReason) {
        self.disconnections.push(reason);
        self.empty = false;
    }

    pub(crate) fn push_peer_disconnection(&mut self, connection: ConnectionId) {
        self.peer_disconnections.push(connection);
        self.empty = false;
    }

    pub(crate) fn push_master(&mut self, master: ConnectionId) {
        self.masters.push(master);
        self.empty = false;
    }

    pub(crate) fn push_lobby_join(&mut self, lobby: LobbyId, name: String) {
        self.lobby_joins.push((lobby, name));
        self.empty = false;
    }

    pub(crate) fn push_lobby_leave(&mut self, lobby: LobbyId) {
        self.lobby_leaves.push(lobby);
        self.empty = false;
    }

    pub(crate) fn push_lobby_list(&mut self, lobbies: Vec<LobbySummary>) {
        self.lobby_lists.push(lobbies);
        self.empty = false;
    }

    pub(crate) fn push_peer_link(&mut self, peer: ConnectionId, available: bool) {
        self.peer_links.push((peer, available));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ClientError) {
        self.errors.push(error);
        self.empty = false;
    }

    pub(crate) fn take(&mut self) -> Self {
        mem::take(self)
    }
}

// Event Trait
pub trait ClientEvent {
    type Iter;

    fn iter(events: &mut ClientEvents) -> Self::Iter;

    fn has(events: &ClientEvents) -> bool;
}

macro_rules! client_event {
    ($(#[$meta:meta])* $name:ident, $field:ident, $item:ty) => {
        $(#[$meta])*
        pub struct $name;
        impl ClientEvent for $name {
            type Iter = IntoIter<$item>;

            fn iter(events: &mut ClientEvents) -> Self::Iter {
                let list = mem::take(&mut events.$field);
                IntoIterator::into_iter(list)
            }

            fn has(events: &ClientEvents) -> bool {
                !events.$field.is_empty()
            }
        }
    };
}

client_event!(
    /// This client's connection id, once the server or relay accepted it
    ConnectEvent, connections, ConnectionId
);
client_event!(DisconnectEvent, disconnections, DisconnectReason);
client_event!(
    /// Another peer left the session
    PeerDisconnectEvent, peer_disconnections, ConnectionId
);
client_event!(
    /// The relay named a new lobby master
    MasterAssignedEvent, masters, ConnectionId
);
client_event!(LobbyJoinedEvent, lobby_joins, (LobbyId, String));
client_event!(LobbyLeftEvent, lobby_leaves, LobbyId);
client_event!(LobbyListEvent, lobby_lists, Vec<LobbySummary>);
client_event!(
    /// A peer-to-peer link became available, or went away
    PeerToPeerEvent, peer_links, (ConnectionId, bool)
);
client_event!(ErrorEvent, errors, ClientError);
