use std::{net::SocketAddr, time::Instant};

use log::{debug, info, warn};

use warden_shared::{
    core_events::{CONNECTION_ACCEPTED, DESPAWN_ENTITY, PEER_DISCONNECTED, PING, SPAWN_ENTITY},
    ConnectionId, ControlOutcome, DeliveryMode, EntityId, EnvelopeError, EventCategory, EventCode,
    HandlerError, Handlers, IncomingMessage, MessageHeader, OutgoingMessage, Outbox,
    OwnershipPolicy, PacketReceiver, PacketSender, Recipient, RpcTable, Serde, Session,
    SessionContext, Socket, SpawnInfo, TransportEvent, HOST_CONNECTION_ID,
};

use crate::{
    connection::Connection,
    error::ServerError,
    events::ServerEvents,
    server::{
        server_config::ServerConfig,
        server_state::{install_handlers, ServerState},
    },
};

struct Io {
    sender: Box<dyn PacketSender>,
    receiver: Box<dyn PacketReceiver>,
}

/// The authority of a direct session. Accepts client connections, keeps a
/// latency sampler per connection, spawns entities and arbitrates every
/// ownership request.
pub struct Server {
    config: ServerConfig,
    handlers: Handlers<ServerState>,
    state: ServerState,
    io: Option<Io>,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig) -> Self {
        let session = Session::new(SessionContext::for_authority(config.session.clone()));
        Self::with_session(config, session)
    }

    /// Create a new Server whose ownership decisions go through `policy`
    pub fn with_policy(config: ServerConfig, policy: Box<dyn OwnershipPolicy>) -> Self {
        let session = Session::with_policy(
            SessionContext::for_authority(config.session.clone()),
            policy,
        );
        Self::with_session(config, session)
    }

    fn with_session(config: ServerConfig, session: Session) -> Self {
        let mut handlers = Handlers::new();
        install_handlers(&mut handlers);

        Self {
            config,
            handlers,
            state: ServerState::new(session),
            io: None,
        }
    }

    /// Listen through the given Socket
    pub fn listen(&mut self, socket: Box<dyn Socket>) {
        let (sender, receiver) = socket.listen();
        self.io = Some(Io { sender, receiver });
    }

    pub fn is_listening(&self) -> bool {
        self.io.is_some()
    }

    /// Must be called regularly, drains the transport, runs every handler and
    /// queues the pings that are due. Returns the events of this tick.
    pub fn receive(&mut self, now: Instant) -> ServerEvents {
        self.state.now = now;

        loop {
            let received = match self.io.as_mut() {
                Some(io) => io.receiver.receive(),
                None => {
                    self.state.events.push_error(ServerError::NotListening);
                    break;
                }
            };
            match received {
                Ok(Some(event)) => self.process_transport_event(event),
                Ok(None) => break,
                Err(error) => {
                    self.state.events.push_error(error.into());
                    break;
                }
            }
        }

        self.queue_pings(now);
        self.state.events.take()
    }

    /// Sends every message queued by handlers and local operations
    pub fn send_all_packets(&mut self) {
        let Some(io) = self.io.as_ref() else {
            if !self.state.session.outbox().is_empty() {
                self.state.events.push_error(ServerError::NotListening);
            }
            return;
        };

        let mut connections: Vec<ConnectionId> = self.state.connections.keys().copied().collect();
        connections.sort_unstable();

        let packets: Vec<_> = self.state.session.outbox_mut().drain().collect();
        for packet in packets {
            let targets: Vec<ConnectionId> = match packet.recipient {
                Recipient::Connection(connection) => vec![connection],
                Recipient::Broadcast { except } => connections
                    .iter()
                    .copied()
                    .filter(|connection| Some(*connection) != except)
                    .collect(),
                Recipient::Authority => {
                    debug!("Dropping packet addressed to the authority: this Server is the authority");
                    continue;
                }
            };

            for connection in targets {
                if !self.state.connections.contains_key(&connection) {
                    debug!("Dropping packet for closed connection {}", connection);
                    continue;
                }
                if let Err(error) = io.sender.send(connection, &packet.payload, packet.delivery) {
                    self.state.events.push_error(error.into());
                }
            }
        }
    }

    /// Closes a connection. The disconnect is processed when the transport reports it.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<(), ServerError> {
        if !self.state.connections.contains_key(&connection) {
            return Err(ServerError::UnknownConnection { connection });
        }
        let io = self.io.as_ref().ok_or(ServerError::NotListening)?;
        io.sender.disconnect(connection)?;
        Ok(())
    }

    // Entities

    /// Spawns an entity the Server controls, using the configured default
    /// access level, and announces it to every connection
    pub fn spawn_entity(&mut self, prefab: u32) -> Result<EntityId, ServerError> {
        let entity = self.state.session.entities_mut().allocate_id();
        let info = SpawnInfo::new(entity, prefab, HOST_CONNECTION_ID)
            .with_access(self.config.session.default_access_level);
        self.try_spawn(info)
    }

    /// Spawns a player entity bound to `owner`. Its authority never moves.
    pub fn spawn_player(&mut self, owner: ConnectionId, prefab: u32) -> Result<EntityId, ServerError> {
        if !self.state.connections.contains_key(&owner) {
            return Err(ServerError::UnknownConnection { connection: owner });
        }
        let entity = self.state.session.entities_mut().allocate_id();
        self.try_spawn(SpawnInfo::player(entity, prefab, owner))
    }

    /// Spawns an entity from a full description
    pub fn try_spawn(&mut self, info: SpawnInfo) -> Result<EntityId, ServerError> {
        let entity = info.entity;
        let announcement = OutgoingMessage::event(SPAWN_ENTITY).write(&info).to_bytes();
        self.state.session.spawn(info)?;
        self.state
            .session
            .outbox_mut()
            .broadcast(None, announcement, DeliveryMode::Reliable);
        info!("Spawned entity {}", entity);
        Ok(entity)
    }

    pub fn despawn_entity(&mut self, entity: EntityId) -> Result<(), ServerError> {
        self.state.session.despawn(entity)?;
        let announcement = OutgoingMessage::event(DESPAWN_ENTITY).write(&entity).to_bytes();
        self.state
            .session
            .outbox_mut()
            .broadcast(None, announcement, DeliveryMode::Reliable);
        info!("Despawned entity {}", entity);
        Ok(())
    }

    // Ownership

    pub fn take_control(&mut self, entity: EntityId) -> Result<ControlOutcome, ServerError> {
        Ok(self.state.session.take_control(entity)?)
    }

    /// Always refused: there is no higher authority to release to
    pub fn release_control(&mut self, entity: EntityId) -> Result<ControlOutcome, ServerError> {
        Ok(self.state.session.release_control(entity)?)
    }

    /// Hands `entity` to the owner of the player entity `target`
    pub fn transfer_control(
        &mut self,
        entity: EntityId,
        target: EntityId,
    ) -> Result<ControlOutcome, ServerError> {
        Ok(self.state.session.transfer_control(entity, target)?)
    }

    // Messages

    /// Queues a Core, Relay, Lobby or User event
    pub fn send_event<T: Serde>(
        &mut self,
        recipient: Recipient,
        event_code: EventCode,
        payload: &T,
        delivery: DeliveryMode,
    ) -> Result<(), ServerError> {
        let bytes = OutgoingMessage::try_event(event_code)?.write(payload).to_bytes();
        self.state.session.outbox_mut().push(recipient, bytes, delivery);
        Ok(())
    }

    /// Queues an Object or UserObject event for `entity` to every connection
    pub fn send_object_message<T: Serde>(
        &mut self,
        entity: EntityId,
        event_code: EventCode,
        payload: &T,
        delivery: DeliveryMode,
    ) -> Result<(), ServerError> {
        match EventCategory::of(event_code) {
            Some(EventCategory::Object) | Some(EventCategory::UserObject) => {}
            Some(other) => {
                return Err(EnvelopeError::WrongCategory {
                    code: event_code,
                    expected: "Object or UserObject",
                    actual: other.name(),
                }
                .into())
            }
            None => return Err(EnvelopeError::UnknownEventCode { code: event_code }.into()),
        }
        self.state.session.entities().try_get(entity)?;

        let header = MessageHeader::try_new(event_code, Some(entity))?;
        let bytes = OutgoingMessage::new(header).write(payload).to_bytes();
        self.state.session.outbox_mut().broadcast(None, bytes, delivery);
        Ok(())
    }

    /// Registers an application handler for a Core, Relay, Lobby or User code
    pub fn register_handler<F>(&mut self, event_code: EventCode, handler: F) -> Result<(), ServerError>
    where
        F: FnMut(&mut ServerState, &mut IncomingMessage<'_>) -> Result<(), HandlerError> + 'static,
    {
        self.handlers.try_register(event_code, handler)?;
        Ok(())
    }

    /// Registers a handler on one entity for an Object or UserObject code
    pub fn register_object_handler<F>(
        &mut self,
        entity: EntityId,
        event_code: EventCode,
        handler: F,
    ) -> Result<(), ServerError>
    where
        F: FnMut(&mut Outbox, &mut IncomingMessage<'_>) -> Result<(), HandlerError> + 'static,
    {
        self.state
            .session
            .entities_mut()
            .try_get_mut(entity)?
            .handlers_mut()
            .try_register(event_code, handler)?;
        Ok(())
    }

    /// Moves every procedure of `table` into the User registry
    pub fn install_rpc_table(&mut self, table: &mut RpcTable<ServerState>) -> Result<(), ServerError> {
        table.install(self.handlers.user_mut())?;
        Ok(())
    }

    // Connections

    /// Connections in id order
    pub fn connections(&self) -> Vec<ConnectionId> {
        let mut connections: Vec<ConnectionId> = self.state.connections.keys().copied().collect();
        connections.sort_unstable();
        connections
    }

    pub fn connection_address(&self, connection: ConnectionId) -> Option<SocketAddr> {
        self.state
            .connections
            .get(&connection)
            .and_then(|record| record.address())
    }

    /// Average round trip to `connection` in milliseconds
    pub fn latency_ms(&self, connection: ConnectionId) -> Option<f32> {
        self.state
            .connections
            .get(&connection)
            .map(|record| record.ping_manager.latency_ms())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.state.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.state.session
    }

    // Private methods

    fn process_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected {
                connection,
                address,
            } => self.on_connect(connection, address),
            TransportEvent::Disconnected { connection } => self.on_disconnect(connection),
            TransportEvent::Packet {
                connection,
                payload,
            } => {
                if !self.state.connections.contains_key(&connection) {
                    warn!("Dropping packet from unknown connection {}", connection);
                    return;
                }
                Session::dispatch(&mut self.handlers, &mut self.state, connection, &payload);
            }
        }
    }

    fn on_connect(&mut self, connection: ConnectionId, address: Option<SocketAddr>) {
        if let Err(error) = self.state.session.directory_mut().connect(connection, address) {
            self.state.events.push_error(error.into());
            return;
        }
        self.state
            .connections
            .insert(connection, Connection::new(address, &self.config.session.ping));

        let accepted = OutgoingMessage::event(CONNECTION_ACCEPTED)
            .write(&connection)
            .to_bytes();
        self.state
            .session
            .outbox_mut()
            .send_to(connection, accepted, DeliveryMode::Reliable);

        if self.config.replay_spawns_on_connect {
            for entity in self.state.session.entities().ids() {
                let Some(info) = self.state.session.spawn_info(entity) else {
                    continue;
                };
                let spawn = OutgoingMessage::event(SPAWN_ENTITY).write(&info).to_bytes();
                self.state
                    .session
                    .outbox_mut()
                    .send_to(connection, spawn, DeliveryMode::Reliable);
            }
        }

        info!("Connection {} accepted", connection);
        self.state.events.push_connection(connection);
    }

    fn on_disconnect(&mut self, connection: ConnectionId) {
        if self.state.connections.remove(&connection).is_none() {
            warn!("Disconnect from unknown connection {}", connection);
            return;
        }

        let reclaimed = self.state.session.handle_peer_disconnect(connection, &[]);
        let notice = OutgoingMessage::event(PEER_DISCONNECTED)
            .write(&connection)
            .to_bytes();
        self.state
            .session
            .outbox_mut()
            .broadcast(Some(connection), notice, DeliveryMode::Reliable);

        info!("Connection {} disconnected", connection);
        self.state.events.push_disconnection(connection, reclaimed);
    }

    fn queue_pings(&mut self, now: Instant) {
        for (connection, record) in self.state.connections.iter_mut() {
            record.ping_manager.purge_stale(now);
            if !record.ping_manager.should_send_ping(now) {
                continue;
            }
            let index = record.ping_manager.next_ping(now);
            let ping = OutgoingMessage::event(PING).write(&index).to_bytes();
            self.state
                .session
                .outbox_mut()
                .send_to(*connection, ping, DeliveryMode::Unreliable);
        }
    }
}
