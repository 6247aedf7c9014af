use std::time::Instant;

use warden_client::{Client, ClientConfig, ClientEvents};
use warden_server::{Server, ServerConfig, ServerEvents};
use warden_shared::{ConnectionId, EntityId, OwnershipPolicy, Session};

use crate::{
    helpers::{SETTLE_TICKS, TICK},
    local_hub::LocalHub,
};

/// Everything one tick produced
pub struct DirectTick {
    pub server: ServerEvents,
    pub clients: Vec<ClientEvents>,
}

/// A Server and its clients wired through a LocalHub
pub struct DirectSession {
    pub hub: LocalHub,
    pub server: Server,
    pub clients: Vec<Client>,
    now: Instant,
}

impl DirectSession {
    pub fn new(client_count: usize) -> Self {
        let policies = (0..client_count).map(|_| None).collect();
        Self::build(Server::new(ServerConfig::default()), policies)
    }

    /// One policy per client, in connection order
    pub fn with_policies(
        server_policy: Box<dyn OwnershipPolicy>,
        client_policies: Vec<Box<dyn OwnershipPolicy>>,
    ) -> Self {
        let server = Server::with_policy(ServerConfig::default(), server_policy);
        Self::build(server, client_policies.into_iter().map(Some).collect())
    }

    fn build(mut server: Server, client_policies: Vec<Option<Box<dyn OwnershipPolicy>>>) -> Self {
        let hub = LocalHub::new();
        server.listen(hub.host_socket());

        let mut clients = Vec::new();
        for policy in client_policies {
            let mut client = match policy {
                Some(policy) => Client::with_policy(ClientConfig::direct(), policy),
                None => Client::new(ClientConfig::direct()),
            };
            let (_, socket) = hub.connect_client();
            client.connect(socket);
            clients.push(client);
        }

        let mut session = Self {
            hub,
            server,
            clients,
            now: Instant::now(),
        };
        session.settle();
        session
    }

    pub fn tick(&mut self) -> DirectTick {
        self.now += TICK;
        let server = self.server.receive(self.now);
        self.server.send_all_packets();

        let mut clients = Vec::new();
        for (index, client) in self.clients.iter_mut().enumerate() {
            if !self.hub.is_open(index as ConnectionId + 1) {
                clients.push(ClientEvents::default());
                continue;
            }
            clients.push(client.receive(self.now));
            client.send_all_packets();
        }
        DirectTick { server, clients }
    }

    /// Ticks until every in-flight exchange completes, returning each tick's events
    pub fn settle(&mut self) -> Vec<DirectTick> {
        (0..SETTLE_TICKS).map(|_| self.tick()).collect()
    }

    /// Cuts a client off at the transport. It stops ticking.
    pub fn drop_client(&mut self, index: usize) {
        self.hub.drop_client(self.client_id(index));
    }

    pub fn client_id(&self, index: usize) -> ConnectionId {
        index as ConnectionId + 1
    }

    /// Nodes, the server first, that are Active for `entity`
    pub fn active_holders(&self, entity: EntityId) -> Vec<ConnectionId> {
        let mut holders = Vec::new();
        if is_active(self.server.session(), entity) {
            holders.push(0);
        }
        for (index, client) in self.clients.iter().enumerate() {
            if is_active(client.session(), entity) {
                holders.push(self.client_id(index));
            }
        }
        holders
    }
}

pub(crate) fn is_active(session: &Session, entity: EntityId) -> bool {
    session
        .entity(entity)
        .map(|record| record.is_active())
        .unwrap_or(false)
}
