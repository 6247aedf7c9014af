use std::time::Instant;

use log::{debug, info, warn};

use warden_shared::{
    core_events::{CONNECTION_ACCEPTED, DESPAWN_ENTITY, PEER_DISCONNECTED, PING, SPAWN_ENTITY},
    internal_events::TAKE_CONTROL_SUCCESS,
    lobby_events::{LOBBY_JOINED, LOBBY_LEFT, LOBBY_LIST},
    ownership::{self, TakeControlSuccess},
    relay::{
        LobbyJoined, LobbyLeft, LobbyList, MasterAssigned, OwnerDisconnected, P2pOpen, P2pResult,
        P2pStatus, PlayerRegistered,
    },
    relay_events::{
        FORCE_DISCONNECT, MASTER_ASSIGNED, OWNER_DISCONNECTED, P2P_OPEN, P2P_RESULT, P2P_STATUS,
        PLAYER_REGISTERED,
    },
    ConnectionId, DeliveryMode, EntityId, HandlerError, Handlers, IncomingMessage, LobbyId,
    OutgoingMessage, PingIndex, PingManager, PingOutcome, Recipient, Session, SpawnInfo,
    HOST_CONNECTION_ID,
};

use crate::{
    connection::PeerLinks,
    events::{ClientEvents, DisconnectReason},
    transport::P2pConnector,
};

/// Lobby this client is a member of, as last reported by the relay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LobbyMembership {
    pub lobby: LobbyId,
    pub name: String,
    /// Members in join order, the first one is the master
    pub members: Vec<ConnectionId>,
}

/// The part of the Client that event handlers may touch
pub struct ClientState {
    pub(crate) session: Session,
    pub(crate) ping_manager: PingManager,
    pub(crate) events: ClientEvents,
    pub(crate) lobby: Option<LobbyMembership>,
    pub(crate) peer_links: PeerLinks,
    pub(crate) connector: Option<Box<dyn P2pConnector>>,
    pub(crate) accepted: bool,
    pub(crate) now: Instant,
}

impl AsMut<Session> for ClientState {
    fn as_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl ClientState {
    pub(crate) fn new(session: Session) -> Self {
        let ping_manager = PingManager::new(&session.context().config().ping);
        Self {
            session,
            ping_manager,
            events: ClientEvents::new(),
            lobby: None,
            peer_links: PeerLinks::new(),
            connector: None,
            accepted: false,
            now: Instant::now(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn lobby(&self) -> Option<&LobbyMembership> {
        self.lobby.as_ref()
    }

    pub fn peer_links(&self) -> &PeerLinks {
        &self.peer_links
    }

    /// Time passed to the current `Client::receive`
    pub fn now(&self) -> Instant {
        self.now
    }

    fn accept(&mut self, connection: ConnectionId) {
        self.session.context_mut().set_local_connection(connection);
        if !self.accepted {
            self.accepted = true;
            info!("Connected as connection {}", connection);
            self.events.push_connection(connection);
        }
    }

    // Core

    fn on_connection_accepted(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let connection: ConnectionId = message.read()?;
        self.accept(connection);
        Ok(())
    }

    fn on_ping(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let index: PingIndex = message.read()?;
        match self.ping_manager.on_ping(index, self.now) {
            PingOutcome::Measured(rtt_ms) => {
                debug!("Round trip to the host: {:.1}ms", rtt_ms);
            }
            PingOutcome::Late => {}
            PingOutcome::Echo => {
                self.session.outbox_mut().send_to(
                    message.origin(),
                    message.raw().into(),
                    DeliveryMode::Unreliable,
                );
            }
        }
        Ok(())
    }

    fn on_spawn_entity(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let info: SpawnInfo = message.read()?;
        let entity = info.entity;
        if self.session.entities().contains(entity) {
            debug!("Ignoring spawn of entity {}: already present", entity);
            return Ok(());
        }
        self.session
            .spawn(info)
            .map_err(|_| HandlerError::Custom(format!("could not spawn entity {}", entity)))?;
        debug!("Spawned entity {} from connection {}", entity, message.origin());
        Ok(())
    }

    fn on_despawn_entity(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let entity: EntityId = message.read()?;
        if self.session.despawn(entity).is_err() {
            debug!("Ignoring despawn of unknown entity {}", entity);
        }
        Ok(())
    }

    fn on_peer_disconnected(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let connection: ConnectionId = message.read()?;
        let released = self
            .session
            .directory_mut()
            .disconnect(connection)
            .unwrap_or_default();
        debug!(
            "Connection {} left, it controlled {:?}",
            connection, released
        );
        self.close_peer_link(connection);
        if let Some(lobby) = self.lobby.as_mut() {
            lobby.members.retain(|member| *member != connection);
        }
        self.events.push_peer_disconnection(connection);
        Ok(())
    }

    // Relay

    fn on_player_registered(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let registered: PlayerRegistered = message.read()?;
        self.accept(registered.connection);
        Ok(())
    }

    fn on_master_assigned(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let assigned: MasterAssigned = message.read()?;
        self.session
            .context_mut()
            .set_authority_connection(assigned.master);
        self.session
            .directory_mut()
            .assign_master(assigned.lobby, assigned.master);

        if self.session.context().is_local(assigned.master) {
            info!("Became master of lobby {}", assigned.lobby);
        }
        self.events.push_master(assigned.master);
        Ok(())
    }

    fn on_force_disconnect(&mut self, _message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        warn!("Relay forced this client to disconnect");
        self.accepted = false;
        self.events.push_disconnection(DisconnectReason::Forced);
        Ok(())
    }

    /// Master side: takes over what the departed connection was holding and
    /// tells everyone else who holds it now
    fn on_owner_disconnected(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let notice: OwnerDisconnected = message.read()?;
        if !self.session.context().is_authority() {
            if let Err(error) = self.session.directory_mut().disconnect(notice.connection) {
                debug!("Owner disconnect notice for a peer already gone: {}", error);
            }
            return Ok(());
        }
        let Some(local) = self.session.context().local_connection() else {
            return Ok(());
        };

        let reclaimed = self
            .session
            .handle_peer_disconnect(notice.connection, &notice.entities);
        for entity in reclaimed {
            let success = OutgoingMessage::object(entity, TAKE_CONTROL_SUCCESS)
                .write(&TakeControlSuccess { requester: local })
                .to_bytes();
            self.session
                .outbox_mut()
                .broadcast(None, success, DeliveryMode::Reliable);
        }
        Ok(())
    }

    /// The relay reserved ports for a link with `peer`: listen, dial, report back
    fn on_p2p_open(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let open: P2pOpen = message.read()?;
        let success = match self.connector.as_mut() {
            Some(connector) => {
                let listening = connector.open_listener(open.local_port);
                let dialed = listening.and_then(|_| connector.connect(open.peer, open.address.0));
                match dialed {
                    Ok(()) => true,
                    Err(error) => {
                        warn!("Peer link to connection {} failed: {}", open.peer, error);
                        false
                    }
                }
            }
            None => {
                warn!("Relay offered a peer link but no P2pConnector is installed");
                false
            }
        };
        if success {
            self.peer_links.insert(open.peer, open.address.0);
        }

        let result = OutgoingMessage::event(P2P_RESULT)
            .write(&P2pResult {
                peer: open.peer,
                success,
            })
            .to_bytes();
        self.session
            .outbox_mut()
            .send_to(HOST_CONNECTION_ID, result, DeliveryMode::Reliable);
        Ok(())
    }

    fn on_p2p_status(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let status: P2pStatus = message.read()?;
        if status.available {
            if !self.peer_links.set_available(status.peer, true) {
                debug!("Relay published a link to {} that this client never opened", status.peer);
                return Ok(());
            }
            info!("Peer link to connection {} is available", status.peer);
        } else {
            self.close_peer_link(status.peer);
        }
        self.events.push_peer_link(status.peer, status.available);
        Ok(())
    }

    pub(crate) fn close_peer_link(&mut self, peer: ConnectionId) {
        if self.peer_links.remove(peer).is_some() {
            if let Some(connector) = self.connector.as_mut() {
                connector.close(peer);
            }
        }
    }

    // Lobby

    fn on_lobby_joined(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let joined: LobbyJoined = message.read()?;
        let previous_members = match self.lobby.as_ref() {
            Some(lobby) if lobby.lobby == joined.lobby => lobby.members.clone(),
            _ => {
                info!("Joined lobby {} ({})", joined.lobby, joined.name);
                self.events.push_lobby_join(joined.lobby, joined.name.clone());
                Vec::new()
            }
        };

        // the master brings newcomers up to date
        if self.session.context().is_authority() {
            let newcomers: Vec<ConnectionId> = joined
                .members
                .iter()
                .copied()
                .filter(|member| {
                    !previous_members.contains(member) && !self.session.context().is_local(*member)
                })
                .collect();
            for newcomer in newcomers {
                self.replay_spawns(newcomer);
            }
        }

        for member in &joined.members {
            self.session
                .directory_mut()
                .set_lobby(*member, Some(joined.lobby));
        }
        self.lobby = Some(LobbyMembership {
            lobby: joined.lobby,
            name: joined.name,
            members: joined.members,
        });
        Ok(())
    }

    fn on_lobby_left(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let left: LobbyLeft = message.read()?;
        if self.lobby.as_ref().map(|lobby| lobby.lobby) == Some(left.lobby) {
            if let Some(membership) = self.lobby.take() {
                for member in membership.members {
                    self.session.directory_mut().set_lobby(member, None);
                }
            }
        }
        self.events.push_lobby_leave(left.lobby);
        Ok(())
    }

    fn on_lobby_list(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let list: LobbyList = message.read()?;
        self.events.push_lobby_list(list.lobbies);
        Ok(())
    }

    pub(crate) fn replay_spawns(&mut self, connection: ConnectionId) {
        for entity in self.session.entities().ids() {
            let Some(info) = self.session.spawn_info(entity) else {
                continue;
            };
            let spawn = OutgoingMessage::event(SPAWN_ENTITY).write(&info).to_bytes();
            self.session
                .outbox_mut()
                .push(Recipient::Connection(connection), spawn, DeliveryMode::Reliable);
        }
    }
}

macro_rules! handler {
    ($method:ident) => {
        |state: &mut ClientState, message: &mut IncomingMessage<'_>| state.$method(message)
    };
}

/// Built-in handlers every Client carries
pub(crate) fn install_handlers(handlers: &mut Handlers<ClientState>) {
    let core = handlers.core_mut();
    core.register(CONNECTION_ACCEPTED, handler!(on_connection_accepted));
    core.register(PING, handler!(on_ping));
    core.register(SPAWN_ENTITY, handler!(on_spawn_entity));
    core.register(DESPAWN_ENTITY, handler!(on_despawn_entity));
    core.register(PEER_DISCONNECTED, handler!(on_peer_disconnected));

    ownership::install(handlers.internal_mut());

    let relay = handlers.relay_mut();
    relay.register(PLAYER_REGISTERED, handler!(on_player_registered));
    relay.register(MASTER_ASSIGNED, handler!(on_master_assigned));
    relay.register(FORCE_DISCONNECT, handler!(on_force_disconnect));
    relay.register(OWNER_DISCONNECTED, handler!(on_owner_disconnected));
    relay.register(P2P_OPEN, handler!(on_p2p_open));
    relay.register(P2P_STATUS, handler!(on_p2p_status));

    let lobby = handlers.lobby_mut();
    lobby.register(LOBBY_JOINED, handler!(on_lobby_joined));
    lobby.register(LOBBY_LEFT, handler!(on_lobby_left));
    lobby.register(LOBBY_LIST, handler!(on_lobby_list));
}
