use std::{collections::VecDeque, net::SocketAddr, time::Instant};

use log::{debug, info, warn};

use warden_shared::{
    core_events::{DESPAWN_ENTITY, PEER_DISCONNECTED, PING, SPAWN_ENTITY},
    internal_events::{RELEASE_CONTROL_SUCCESS, TAKE_CONTROL_SUCCESS},
    lobby_events::{CREATE_LOBBY, JOIN_LOBBY, LEAVE_LOBBY, LIST_LOBBIES, LOBBY_JOINED, LOBBY_LEFT, LOBBY_LIST},
    ownership::TakeControlSuccess,
    relay::{
        CreateLobby, JoinLobby, LobbyJoined, LobbyLeft, LobbyList, MasterAssigned, OwnerDisconnected,
        P2pOpen, P2pRequest, P2pResult, P2pStatus, PlayerRegistered, WireAddress,
    },
    relay_events::{
        FORCE_DISCONNECT, MASTER_ASSIGNED, OWNER_DISCONNECTED, P2P_OPEN, P2P_REQUEST, P2P_RESULT, P2P_STATUS,
        PLAYER_REGISTERED, REGISTER_PLAYER,
    },
    ConnectionDirectory, ConnectionId, DeliveryMode, EntityId, EventCode, HandlerError, Handlers,
    IncomingMessage, LobbyId, OutgoingMessage, PingIndex, PingOutcome, RelayHeader, Serde,
    SpawnInfo, HOST_CONNECTION_ID,
};

use crate::{
    events::RelayEvents,
    lobbies::{Departure, Lobbies, GLOBAL_LOBBY},
    peer_broker::PeerBroker,
    players::Players,
    relay::relay_config::RelayConfig,
};

/// A framed packet waiting for `send_all_packets`
pub(crate) struct Frame {
    pub connection: ConnectionId,
    pub payload: Box<[u8]>,
    pub delivery: DeliveryMode,
}

/// Everything the relay's handlers work on
pub struct RelayState {
    pub(crate) config: RelayConfig,
    pub(crate) players: Players,
    pub(crate) lobbies: Lobbies,
    pub(crate) broker: PeerBroker,
    pub(crate) directory: ConnectionDirectory,
    pub(crate) outgoing: VecDeque<Frame>,
    pub(crate) pending_disconnects: Vec<ConnectionId>,
    pub(crate) events: RelayEvents,
    pub(crate) now: Instant,
}

impl RelayState {
    pub(crate) fn new(config: RelayConfig) -> Self {
        let broker = PeerBroker::new(config.peer_port_range.clone());
        let mut lobbies = Lobbies::new();
        if !config.lobbies_enabled {
            lobbies.ensure_global();
        }
        Self {
            config,
            players: Players::new(),
            lobbies,
            broker,
            directory: ConnectionDirectory::new(),
            outgoing: VecDeque::new(),
            pending_disconnects: Vec::new(),
            events: RelayEvents::new(),
            now: Instant::now(),
        }
    }

    pub fn players(&self) -> &Players {
        &self.players
    }

    pub fn lobbies(&self) -> &Lobbies {
        &self.lobbies
    }

    pub fn directory(&self) -> &ConnectionDirectory {
        &self.directory
    }

    /// Queues a message from the relay itself
    pub(crate) fn send(&mut self, connection: ConnectionId, message: &[u8], delivery: DeliveryMode) {
        self.outgoing.push_back(Frame {
            connection,
            payload: RelayHeader::new(HOST_CONNECTION_ID, connection).wrap(message),
            delivery,
        });
    }

    pub(crate) fn send_event<T: Serde>(&mut self, connection: ConnectionId, event_code: EventCode, payload: &T) {
        let message = OutgoingMessage::event(event_code).write(payload).to_bytes();
        self.send(connection, &message, DeliveryMode::Reliable);
    }

    fn send_event_to_all<T: Serde>(&mut self, connections: &[ConnectionId], event_code: EventCode, payload: &T) {
        let message = OutgoingMessage::event(event_code).write(payload).to_bytes();
        for connection in connections {
            self.send(*connection, &message, DeliveryMode::Reliable);
        }
    }

    /// Queues a frame forwarded from another player, untouched
    pub(crate) fn forward(&mut self, connection: ConnectionId, frame: Box<[u8]>) {
        self.outgoing.push_back(Frame {
            connection,
            payload: frame,
            delivery: DeliveryMode::Reliable,
        });
    }

    pub(crate) fn on_connect(&mut self, connection: ConnectionId, address: Option<SocketAddr>) {
        if !self.players.connect(connection, address, &self.config.ping) {
            warn!("Connection {} opened twice", connection);
            return;
        }
        if let Err(error) = self.directory.connect(connection, address) {
            self.events.push_error(error.into());
        }
        debug!("Connection {} opened", connection);
    }

    pub(crate) fn on_disconnect(&mut self, connection: ConnectionId) {
        if self.players.remove(connection).is_none() {
            warn!("Disconnect from unknown connection {}", connection);
            return;
        }
        let controlled = self.directory.controls(connection);
        if let Some(departure) = self.lobbies.leave(connection) {
            self.announce_departure(connection, departure);
        }
        self.close_peer_links(connection);
        if let Err(error) = self.directory.disconnect(connection) {
            self.events.push_error(error.into());
        }

        info!("Player {} disconnected", connection);
        self.events.push_disconnection(connection, controlled);
    }

    pub(crate) fn force_disconnect(&mut self, connection: ConnectionId) {
        warn!("Forcing connection {} to disconnect: not a registered player", connection);
        let message = OutgoingMessage::event(FORCE_DISCONNECT).to_bytes();
        self.send(connection, &message, DeliveryMode::Reliable);
        if !self.pending_disconnects.contains(&connection) {
            self.pending_disconnects.push(connection);
        }
    }

    /// Tells the rest of the lobby that `connection` is gone: a new master if
    /// needed, the departure itself, and to the master the entities it held
    fn announce_departure(&mut self, connection: ConnectionId, departure: Departure) {
        if departure.remaining.is_empty() {
            return;
        }
        if let Some(master) = departure.new_master {
            info!("Player {} is now master of lobby {}", master, departure.lobby);
            self.directory.assign_master(departure.lobby, master);
            self.send_event_to_all(
                &departure.remaining,
                MASTER_ASSIGNED,
                &MasterAssigned {
                    lobby: departure.lobby,
                    master,
                },
            );
        }
        self.send_event_to_all(&departure.remaining, PEER_DISCONNECTED, &connection);

        let entities = self.directory.controls(connection);
        for entity in &entities {
            self.directory.release_control(connection, *entity);
        }
        let master = departure.new_master.or_else(|| departure.remaining.first().copied());
        if let Some(master) = master {
            self.send_event(
                master,
                OWNER_DISCONNECTED,
                &OwnerDisconnected {
                    connection,
                    entities,
                },
            );
        }
    }

    fn close_peer_links(&mut self, connection: ConnectionId) {
        for counterpart in self.broker.close_all(connection) {
            self.send_event(
                counterpart,
                P2P_STATUS,
                &P2pStatus {
                    peer: connection,
                    available: false,
                },
            );
            if self.players.get(connection).is_some() {
                self.send_event(
                    connection,
                    P2P_STATUS,
                    &P2pStatus {
                        peer: counterpart,
                        available: false,
                    },
                );
            }
        }
    }

    fn join_lobby(&mut self, connection: ConnectionId, lobby: LobbyId) {
        let departure = match self.lobbies.join(connection, lobby) {
            Ok(departure) => departure,
            Err(error) => {
                debug!("Player {} could not join lobby {}: {}", connection, lobby, error);
                return;
            }
        };
        if let Some(departure) = departure {
            self.leave_announced(connection, departure);
        }

        let Some(joined) = self.lobbies.get(lobby) else {
            return;
        };
        let members = joined.members().to_vec();
        let name = joined.name().to_string();
        let Some(master) = joined.master() else {
            return;
        };

        self.directory.set_lobby(connection, Some(lobby));
        self.directory.assign_master(lobby, master);
        let assigned = MasterAssigned { lobby, master };
        if master == connection {
            info!("Player {} is master of lobby {}", master, lobby);
        }
        self.send_event(connection, MASTER_ASSIGNED, &assigned);
        self.send_event_to_all(
            &members,
            LOBBY_JOINED,
            &LobbyJoined {
                lobby,
                name,
                members: members.clone(),
            },
        );
    }

    fn leave_announced(&mut self, connection: ConnectionId, departure: Departure) {
        let lobby = departure.lobby;
        self.directory.set_lobby(connection, None);
        self.announce_departure(connection, departure);
        self.close_peer_links(connection);
        self.send_event(connection, LOBBY_LEFT, &LobbyLeft { lobby });
    }

    /// Keeps the relay's own record of who controls what, from the traffic it forwards
    pub(crate) fn snoop(&mut self, origin: ConnectionId, message: &[u8]) {
        let Ok(mut incoming) = IncomingMessage::decode(origin, message) else {
            return;
        };
        match (incoming.event_code(), incoming.entity_id()) {
            (TAKE_CONTROL_SUCCESS, Some(entity)) => {
                if let Ok(success) = incoming.read::<TakeControlSuccess>() {
                    self.directory.register_control(success.requester, entity);
                }
            }
            (RELEASE_CONTROL_SUCCESS, Some(entity)) => {
                self.directory.register_control(origin, entity);
            }
            (SPAWN_ENTITY, None) => {
                if let Ok(info) = incoming.read::<SpawnInfo>() {
                    self.directory.register_control(info.controller, info.entity);
                }
            }
            (DESPAWN_ENTITY, None) => {
                if let Ok(entity) = incoming.read::<EntityId>() {
                    self.directory.purge_entity(entity);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn queue_pings(&mut self, now: Instant) {
        let mut due = Vec::new();
        for (connection, player) in self.players.iter_mut() {
            if !player.is_registered() {
                continue;
            }
            player.ping_manager.purge_stale(now);
            if player.ping_manager.should_send_ping(now) {
                due.push((*connection, player.ping_manager.next_ping(now)));
            }
        }
        for (connection, index) in due {
            let ping = OutgoingMessage::event(PING).write(&index).to_bytes();
            self.send(connection, &ping, DeliveryMode::Unreliable);
        }
    }

    // Handlers

    fn on_ping(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let index: PingIndex = message.read()?;
        let origin = message.origin();
        let now = self.now;
        let Some(player) = self.players.get_mut(origin) else {
            return Ok(());
        };
        if player.ping_manager.on_ping(index, now) == PingOutcome::Echo {
            self.send(origin, message.raw(), DeliveryMode::Unreliable);
        }
        Ok(())
    }

    fn on_register_player(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let connection = message.origin();
        let is_new = self.players.register(connection);
        self.send_event(connection, PLAYER_REGISTERED, &PlayerRegistered { connection });
        if !is_new {
            return Ok(());
        }

        info!("Player {} registered", connection);
        self.events.push_registration(connection);
        if !self.config.lobbies_enabled {
            self.join_lobby(connection, GLOBAL_LOBBY);
        }
        Ok(())
    }

    fn check_lobbies(&self, connection: ConnectionId) -> bool {
        if !self.config.lobbies_enabled {
            warn!("Ignoring lobby request from {}: lobbies are disabled", connection);
        }
        self.config.lobbies_enabled
    }

    fn on_create_lobby(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let request: CreateLobby = message.read()?;
        if !self.check_lobbies(message.origin()) {
            return Ok(());
        }
        let lobby = self.lobbies.create(&request.name);
        self.join_lobby(message.origin(), lobby);
        Ok(())
    }

    fn on_join_lobby(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let request: JoinLobby = message.read()?;
        if !self.check_lobbies(message.origin()) {
            return Ok(());
        }
        self.join_lobby(message.origin(), request.lobby);
        Ok(())
    }

    fn on_leave_lobby(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let connection = message.origin();
        if !self.check_lobbies(connection) {
            return Ok(());
        }
        if let Some(departure) = self.lobbies.leave(connection) {
            self.leave_announced(connection, departure);
        }
        Ok(())
    }

    fn on_list_lobbies(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let list = LobbyList {
            lobbies: self.lobbies.summaries(),
        };
        self.send_event(message.origin(), LOBBY_LIST, &list);
        Ok(())
    }

    /// Reserves a port on each side and tells both players to listen and dial
    fn on_p2p_request(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let request: P2pRequest = message.read()?;
        let (origin, peer) = (message.origin(), request.peer);
        if !self.config.peer_to_peer_enabled {
            warn!("Ignoring peer link request from {}: peer-to-peer is disabled", origin);
            return Ok(());
        }

        let same_lobby = match (self.lobbies.lobby_of(origin), self.lobbies.lobby_of(peer)) {
            (Some(a), Some(b)) => a.id() == b.id(),
            _ => false,
        };
        let addresses = (
            self.players.get(origin).and_then(|player| player.address()),
            self.players.get(peer).and_then(|player| player.address()),
        );
        let (Some(origin_address), Some(peer_address)) = addresses else {
            debug!("Refusing peer link {} <-> {}: unknown address", origin, peer);
            return Ok(());
        };
        if !same_lobby || !self.players.is_registered(peer) {
            debug!("Refusing peer link {} <-> {}: not in the same lobby", origin, peer);
            return Ok(());
        }

        let ports = match self.broker.open(origin, peer) {
            Ok(ports) => ports,
            Err(error) => {
                debug!("Refusing peer link {} <-> {}: {}", origin, peer, error);
                return Ok(());
            }
        };
        self.send_event(
            origin,
            P2P_OPEN,
            &P2pOpen {
                peer,
                address: WireAddress(SocketAddr::new(peer_address.ip(), ports.second)),
                local_port: ports.first,
            },
        );
        self.send_event(
            peer,
            P2P_OPEN,
            &P2pOpen {
                peer: origin,
                address: WireAddress(SocketAddr::new(origin_address.ip(), ports.first)),
                local_port: ports.second,
            },
        );
        Ok(())
    }

    fn on_p2p_result(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let result: P2pResult = message.read()?;
        let reporter = message.origin();
        let Some(available) = self.broker.report(reporter, result.peer, result.success) else {
            return Ok(());
        };
        for (to, peer) in [(reporter, result.peer), (result.peer, reporter)] {
            self.send_event(to, P2P_STATUS, &P2pStatus { peer, available });
        }
        Ok(())
    }
}

macro_rules! handler {
    ($method:ident) => {
        |state: &mut RelayState, message: &mut IncomingMessage<'_>| state.$method(message)
    };
}

/// Handlers for every code the relay answers itself
pub(crate) fn install_handlers(handlers: &mut Handlers<RelayState>) {
    handlers.core_mut().register(PING, handler!(on_ping));

    let relay = handlers.relay_mut();
    relay.register(REGISTER_PLAYER, handler!(on_register_player));
    relay.register(P2P_REQUEST, handler!(on_p2p_request));
    relay.register(P2P_RESULT, handler!(on_p2p_result));

    let lobby = handlers.lobby_mut();
    lobby.register(CREATE_LOBBY, handler!(on_create_lobby));
    lobby.register(JOIN_LOBBY, handler!(on_join_lobby));
    lobby.register(LEAVE_LOBBY, handler!(on_leave_lobby));
    lobby.register(LIST_LOBBIES, handler!(on_list_lobbies));
}
