use std::time::Instant;

use warden_client::{Client, ClientConfig, ClientEvents};
use warden_relay::{Relay, RelayConfig, RelayEvents};
use warden_shared::{ConnectionId, EntityId, OwnershipPolicy};

use crate::{
    helpers::{direct_session::is_active, SETTLE_TICKS, TICK},
    local_hub::LocalHub,
};

/// Everything one tick produced
pub struct RelayTick {
    pub relay: RelayEvents,
    pub clients: Vec<ClientEvents>,
}

/// A Relay and its players wired through a LocalHub. Every client gets a
/// peer connector on the same hub.
pub struct RelaySession {
    pub hub: LocalHub,
    pub relay: Relay,
    pub clients: Vec<Client>,
    client_config: ClientConfig,
    now: Instant,
}

impl RelaySession {
    pub fn new(relay_config: RelayConfig, client_count: usize) -> Self {
        let mut session = Self::empty(relay_config);
        for _ in 0..client_count {
            session.add_client(None);
        }
        session.settle();
        session
    }

    /// A relay with no players yet
    pub fn empty(relay_config: RelayConfig) -> Self {
        let mut client_config = ClientConfig::relay();
        client_config.session.lobbies_enabled = relay_config.lobbies_enabled;
        client_config.session.peer_to_peer_enabled = relay_config.peer_to_peer_enabled;
        client_config.broadcast_events = relay_config.broadcast_events.clone();

        let hub = LocalHub::new();
        let mut relay = Relay::new(relay_config);
        relay.listen(hub.host_socket());

        Self {
            hub,
            relay,
            clients: Vec::new(),
            client_config,
            now: Instant::now(),
        }
    }

    /// Connects one more player, returning its index in `clients`
    pub fn add_client(&mut self, policy: Option<Box<dyn OwnershipPolicy>>) -> usize {
        let mut client = match policy {
            Some(policy) => Client::with_policy(self.client_config.clone(), policy),
            None => Client::new(self.client_config.clone()),
        };
        let (connection, socket) = self.hub.connect_client();
        client.connect(socket);
        client.set_peer_connector(self.hub.peer_connector(connection));
        self.clients.push(client);
        self.clients.len() - 1
    }

    pub fn tick(&mut self) -> RelayTick {
        self.now += TICK;
        let relay = self.relay.receive(self.now);
        self.relay.send_all_packets();

        let mut clients = Vec::new();
        for (index, client) in self.clients.iter_mut().enumerate() {
            if !self.hub.is_open(index as ConnectionId + 1) {
                clients.push(ClientEvents::default());
                continue;
            }
            clients.push(client.receive(self.now));
            client.send_all_packets();
        }
        RelayTick { relay, clients }
    }

    pub fn settle(&mut self) -> Vec<RelayTick> {
        (0..SETTLE_TICKS).map(|_| self.tick()).collect()
    }

    /// Cuts a client off at the transport. It stops ticking.
    pub fn drop_client(&mut self, index: usize) {
        self.hub.drop_client(self.client_id(index));
    }

    pub fn client_id(&self, index: usize) -> ConnectionId {
        index as ConnectionId + 1
    }

    /// Players Active for `entity`
    pub fn active_holders(&self, entity: EntityId) -> Vec<ConnectionId> {
        self.clients
            .iter()
            .enumerate()
            .filter(|(_, client)| is_active(client.session(), entity))
            .map(|(index, _)| self.client_id(index))
            .collect()
    }
}
