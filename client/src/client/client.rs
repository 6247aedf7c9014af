use std::time::Instant;

use log::{debug, info, warn};

use warden_shared::{
    core_events::{DESPAWN_ENTITY, PING, SPAWN_ENTITY},
    lobby_events::{CREATE_LOBBY, JOIN_LOBBY, LEAVE_LOBBY, LIST_LOBBIES},
    relay::{CreateLobby, JoinLobby, P2pRequest, P2pResult},
    relay_events::{P2P_REQUEST, P2P_RESULT, REGISTER_PLAYER},
    ConnectionId, ControlOutcome, DeliveryMode, EntityId, EnvelopeError, EventCategory, EventCode,
    HandlerError, Handlers, IncomingMessage, LobbyId, MessageHeader, NetworkMode, OutgoingMessage,
    OutgoingPacket, Outbox, OwnershipPolicy, PacketReceiver, PacketSender, Recipient, RelayHeader,
    RpcTable, Serde, Session, SessionContext, Socket, SpawnInfo, TransportEvent, ALL_CONNECTIONS,
    HOST_CONNECTION_ID,
};

use crate::{
    client::{
        client_config::ClientConfig,
        client_state::{install_handlers, ClientState, LobbyMembership},
    },
    connection::PeerLinks,
    error::ClientError,
    events::{ClientEvents, DisconnectReason},
    transport::P2pConnector,
};

struct Io {
    sender: Box<dyn PacketSender>,
    receiver: Box<dyn PacketReceiver>,
}

/// A peer of a session. Connects directly to a Server, or to a Relay where
/// it may be named lobby master and become the authority itself.
pub struct Client {
    config: ClientConfig,
    handlers: Handlers<ClientState>,
    state: ClientState,
    io: Option<Io>,
}

impl Client {
    /// Create a new Client
    pub fn new(config: ClientConfig) -> Self {
        let session = Session::new(SessionContext::for_peer(config.session.clone()));
        Self::with_session(config, session)
    }

    /// Create a new Client whose ownership decisions go through `policy`,
    /// which matters once this client is the lobby master
    pub fn with_policy(config: ClientConfig, policy: Box<dyn OwnershipPolicy>) -> Self {
        let session = Session::with_policy(SessionContext::for_peer(config.session.clone()), policy);
        Self::with_session(config, session)
    }

    fn with_session(config: ClientConfig, session: Session) -> Self {
        let mut handlers = Handlers::new();
        install_handlers(&mut handlers);

        Self {
            config,
            handlers,
            state: ClientState::new(session),
            io: None,
        }
    }

    /// Connect through the given Socket
    pub fn connect(&mut self, socket: Box<dyn Socket>) {
        let (sender, receiver) = socket.listen();
        self.io = Some(Io { sender, receiver });
    }

    /// Installs the application's peer-to-peer link provider
    pub fn set_peer_connector(&mut self, connector: Box<dyn P2pConnector>) {
        self.state.connector = Some(connector);
    }

    /// Must be called regularly, drains the transport and every peer link,
    /// runs the handlers and queues a ping when one is due
    pub fn receive(&mut self, now: Instant) -> ClientEvents {
        self.state.now = now;

        loop {
            let received = match self.io.as_mut() {
                Some(io) => io.receiver.receive(),
                None => {
                    self.state.events.push_error(ClientError::NotConnected);
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

        self.receive_peer_links();
        self.queue_ping(now);
        self.state.events.take()
    }

    /// Sends every queued message, straight over a peer link where one is
    /// available and through the server or relay otherwise
    pub fn send_all_packets(&mut self) {
        if self.io.is_none() {
            if !self.state.session.outbox().is_empty() {
                self.state.events.push_error(ClientError::NotConnected);
            }
            return;
        }

        let packets: Vec<OutgoingPacket> = self.state.session.outbox_mut().drain().collect();
        for packet in packets {
            match self.config.session.mode {
                NetworkMode::Direct => self.send_direct(packet),
                NetworkMode::Relay => self.send_relayed(packet),
            }
        }
    }

    // Entities

    /// Spawns an entity this client controls. Only the lobby master may spawn.
    pub fn spawn_entity(&mut self, prefab: u32) -> Result<EntityId, ClientError> {
        let local = self.authority_id()?;
        let entity = self.state.session.entities_mut().allocate_id();
        let info = SpawnInfo::new(entity, prefab, local)
            .with_access(self.config.session.default_access_level);
        self.try_spawn(info)
    }

    /// Spawns a player entity bound to `owner`
    pub fn spawn_player(&mut self, owner: ConnectionId, prefab: u32) -> Result<EntityId, ClientError> {
        self.authority_id()?;
        let entity = self.state.session.entities_mut().allocate_id();
        self.try_spawn(SpawnInfo::player(entity, prefab, owner))
    }

    pub fn try_spawn(&mut self, info: SpawnInfo) -> Result<EntityId, ClientError> {
        self.authority_id()?;
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

    pub fn despawn_entity(&mut self, entity: EntityId) -> Result<(), ClientError> {
        self.authority_id()?;
        self.state.session.despawn(entity)?;
        let announcement = OutgoingMessage::event(DESPAWN_ENTITY).write(&entity).to_bytes();
        self.state
            .session
            .outbox_mut()
            .broadcast(None, announcement, DeliveryMode::Reliable);
        Ok(())
    }

    // Ownership

    pub fn take_control(&mut self, entity: EntityId) -> Result<ControlOutcome, ClientError> {
        Ok(self.state.session.take_control(entity)?)
    }

    pub fn release_control(&mut self, entity: EntityId) -> Result<ControlOutcome, ClientError> {
        Ok(self.state.session.release_control(entity)?)
    }

    /// Hands `entity` to the owner of the player entity `target`
    pub fn transfer_control(
        &mut self,
        entity: EntityId,
        target: EntityId,
    ) -> Result<ControlOutcome, ClientError> {
        Ok(self.state.session.transfer_control(entity, target)?)
    }

    // Lobbies

    pub fn create_lobby(&mut self, name: &str) -> Result<(), ClientError> {
        self.check_lobbies()?;
        let bytes = OutgoingMessage::event(CREATE_LOBBY)
            .write(&CreateLobby {
                name: name.to_string(),
            })
            .to_bytes();
        self.send_to_relay(bytes);
        Ok(())
    }

    pub fn join_lobby(&mut self, lobby: LobbyId) -> Result<(), ClientError> {
        self.check_lobbies()?;
        let bytes = OutgoingMessage::event(JOIN_LOBBY)
            .write(&JoinLobby { lobby })
            .to_bytes();
        self.send_to_relay(bytes);
        Ok(())
    }

    pub fn leave_lobby(&mut self) -> Result<(), ClientError> {
        self.check_lobbies()?;
        self.send_to_relay(OutgoingMessage::event(LEAVE_LOBBY).to_bytes());
        Ok(())
    }

    /// Asks the relay for every open lobby. The answer arrives as a LobbyListEvent.
    pub fn list_lobbies(&mut self) -> Result<(), ClientError> {
        self.check_lobbies()?;
        self.send_to_relay(OutgoingMessage::event(LIST_LOBBIES).to_bytes());
        Ok(())
    }

    pub fn lobby(&self) -> Option<&LobbyMembership> {
        self.state.lobby()
    }

    // Peer to peer

    /// Asks the relay to negotiate a direct link with `peer`
    pub fn request_peer_to_peer(&mut self, peer: ConnectionId) -> Result<(), ClientError> {
        self.check_mode(NetworkMode::Relay)?;
        if !self.config.session.peer_to_peer_enabled {
            return Err(ClientError::FeatureDisabled {
                feature: "peer_to_peer",
            });
        }
        if self.state.connector.is_none() {
            return Err(ClientError::NoPeerConnector);
        }
        let bytes = OutgoingMessage::event(P2P_REQUEST)
            .write(&P2pRequest { peer })
            .to_bytes();
        self.send_to_relay(bytes);
        Ok(())
    }

    pub fn peer_links(&self) -> &PeerLinks {
        self.state.peer_links()
    }

    pub fn is_peer_link_available(&self, peer: ConnectionId) -> bool {
        self.state.peer_links.is_available(peer)
    }

    // Messages

    /// Queues a Core, Relay, Lobby or User event
    pub fn send_event<T: Serde>(
        &mut self,
        recipient: Recipient,
        event_code: EventCode,
        payload: &T,
        delivery: DeliveryMode,
    ) -> Result<(), ClientError> {
        let bytes = OutgoingMessage::try_event(event_code)?.write(payload).to_bytes();
        self.state.session.outbox_mut().push(recipient, bytes, delivery);
        Ok(())
    }

    /// Queues an Object or UserObject event for `entity` to every peer
    pub fn send_object_message<T: Serde>(
        &mut self,
        entity: EntityId,
        event_code: EventCode,
        payload: &T,
        delivery: DeliveryMode,
    ) -> Result<(), ClientError> {
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
    pub fn register_handler<F>(&mut self, event_code: EventCode, handler: F) -> Result<(), ClientError>
    where
        F: FnMut(&mut ClientState, &mut IncomingMessage<'_>) -> Result<(), HandlerError> + 'static,
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
    ) -> Result<(), ClientError>
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
    pub fn install_rpc_table(&mut self, table: &mut RpcTable<ClientState>) -> Result<(), ClientError> {
        table.install(self.handlers.user_mut())?;
        Ok(())
    }

    // Status

    /// Average round trip to the server or relay in milliseconds
    pub fn latency_ms(&self) -> f32 {
        self.state.ping_manager.latency_ms()
    }

    /// Id assigned by the server or relay, once accepted
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.state.session.context().local_connection()
    }

    pub fn is_connected(&self) -> bool {
        self.io.is_some() && self.state.accepted
    }

    /// Whether the relay named this client master of its lobby
    pub fn is_master(&self) -> bool {
        self.config.session.mode == NetworkMode::Relay && self.state.session.context().is_authority()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.state.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.state.session
    }

    // Private methods

    fn authority_id(&self) -> Result<ConnectionId, ClientError> {
        let context = self.state.session.context();
        match context.local_connection() {
            Some(local) if context.is_authority() => Ok(local),
            _ => Err(ClientError::NotAuthority),
        }
    }

    fn check_mode(&self, expected: NetworkMode) -> Result<(), ClientError> {
        if self.config.session.mode != expected {
            return Err(ClientError::WrongMode { expected });
        }
        Ok(())
    }

    fn check_lobbies(&self) -> Result<(), ClientError> {
        self.check_mode(NetworkMode::Relay)?;
        if !self.config.session.lobbies_enabled {
            return Err(ClientError::FeatureDisabled { feature: "lobbies" });
        }
        Ok(())
    }

    fn send_to_relay(&mut self, bytes: Box<[u8]>) {
        self.state
            .session
            .outbox_mut()
            .send_to(HOST_CONNECTION_ID, bytes, DeliveryMode::Reliable);
    }

    fn process_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected { connection, .. } => {
                debug!("Transport connected to {}", connection);
                if self.config.session.mode == NetworkMode::Relay {
                    self.send_to_relay(OutgoingMessage::event(REGISTER_PLAYER).to_bytes());
                }
            }
            TransportEvent::Disconnected { .. } => {
                info!("Disconnected from the host");
                self.state.accepted = false;
                self.state.events.push_disconnection(DisconnectReason::Transport);
            }
            TransportEvent::Packet { payload, .. } => match self.config.session.mode {
                NetworkMode::Direct => {
                    Session::dispatch(&mut self.handlers, &mut self.state, HOST_CONNECTION_ID, &payload);
                }
                NetworkMode::Relay => match RelayHeader::split(&payload) {
                    Ok((header, message)) => {
                        Session::dispatch(&mut self.handlers, &mut self.state, header.origin, message);
                    }
                    Err(error) => {
                        warn!("Dropping relay frame: {}", error);
                    }
                },
            },
        }
    }

    fn receive_peer_links(&mut self) {
        loop {
            let received = match self.state.connector.as_mut() {
                Some(connector) => connector.receive(),
                None => return,
            };
            match received {
                Ok(Some((peer, payload))) => {
                    Session::dispatch(&mut self.handlers, &mut self.state, peer, &payload);
                }
                Ok(None) => return,
                Err(error) => {
                    self.state.events.push_error(error.into());
                    return;
                }
            }
        }
    }

    fn queue_ping(&mut self, now: Instant) {
        if !self.state.accepted {
            return;
        }
        self.state.ping_manager.purge_stale(now);
        if !self.state.ping_manager.should_send_ping(now) {
            return;
        }
        let index = self.state.ping_manager.next_ping(now);
        let ping = OutgoingMessage::event(PING).write(&index).to_bytes();
        self.state
            .session
            .outbox_mut()
            .send_to(HOST_CONNECTION_ID, ping, DeliveryMode::Unreliable);
    }

    fn transmit(&mut self, connection: ConnectionId, payload: &[u8], delivery: DeliveryMode) {
        let Some(io) = self.io.as_ref() else {
            return;
        };
        if let Err(error) = io.sender.send(connection, payload, delivery) {
            self.state.events.push_error(error.into());
        }
    }

    fn send_direct(&mut self, packet: OutgoingPacket) {
        match packet.recipient {
            Recipient::Authority
            | Recipient::Broadcast { .. }
            | Recipient::Connection(HOST_CONNECTION_ID) => {
                self.transmit(HOST_CONNECTION_ID, &packet.payload, packet.delivery);
            }
            Recipient::Connection(connection) => {
                warn!(
                    "Dropping packet for connection {}: clients of a direct session only reach the server",
                    connection
                );
            }
        }
    }

    fn send_relayed(&mut self, packet: OutgoingPacket) {
        let local = self
            .state
            .session
            .context()
            .local_connection()
            .unwrap_or(ALL_CONNECTIONS);

        let destination = match packet.recipient {
            Recipient::Authority => match self.state.session.context().authority_connection() {
                Some(master) if master == local => {
                    debug!("Dropping packet addressed to the authority: this client is the master");
                    return;
                }
                Some(master) => master,
                None => {
                    warn!("Dropping packet for the authority: no master assigned yet");
                    return;
                }
            },
            Recipient::Connection(connection) => connection,
            Recipient::Broadcast { .. } => ALL_CONNECTIONS,
        };

        if destination == ALL_CONNECTIONS {
            self.send_over_peer_links(&packet);
        } else if self.state.peer_links.is_available(destination)
            && self.send_over_peer_link(destination, &packet)
        {
            return;
        }

        let frame = RelayHeader::new(local, destination).wrap(&packet.payload);
        self.transmit(HOST_CONNECTION_ID, &frame, packet.delivery);
    }

    /// Broadcast-set events go straight to every linked peer; the relay skips
    /// those pairs. A failed link is reported before the relayed broadcast
    /// leaves, so the relay delivers to that peer again.
    fn send_over_peer_links(&mut self, packet: &OutgoingPacket) {
        let is_broadcast_event = MessageHeader::peek(&packet.payload)
            .map(|header| self.config.broadcast_events.contains(&header.event_code()))
            .unwrap_or(false);
        if !is_broadcast_event {
            return;
        }

        for peer in self.state.peer_links.available_peers() {
            self.send_over_peer_link(peer, packet);
        }
    }

    /// Returns false, and drops the link, if the send failed
    fn send_over_peer_link(&mut self, peer: ConnectionId, packet: &OutgoingPacket) -> bool {
        let Some(connector) = self.state.connector.as_mut() else {
            return false;
        };
        match connector.send(peer, &packet.payload, packet.delivery) {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    "Peer link to connection {} failed, falling back to the relay: {}",
                    peer, error
                );
                self.state.close_peer_link(peer);
                let report = OutgoingMessage::event(P2P_RESULT)
                    .write(&P2pResult {
                        peer,
                        success: false,
                    })
                    .to_bytes();
                let local = self
                    .state
                    .session
                    .context()
                    .local_connection()
                    .unwrap_or(ALL_CONNECTIONS);
                let frame = RelayHeader::new(local, HOST_CONNECTION_ID).wrap(&report);
                self.transmit(HOST_CONNECTION_ID, &frame, DeliveryMode::Reliable);
                self.state.events.push_peer_link(peer, false);
                false
            }
        }
    }
}
