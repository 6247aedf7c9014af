use std::{collections::HashSet, net::SocketAddr, time::Instant};

use log::{debug, warn};

use warden_shared::{
    ConnectionId, EntityId, EventCategory, EventCode, Handlers, IncomingMessage, InvokeOutcome,
    MessageHeader, PacketReceiver, PacketSender, RelayHeader, Socket, TransportEvent,
};

use crate::{
    error::RelayError,
    events::RelayEvents,
    lobbies::Lobbies,
    players::Players,
    relay::{
        relay_config::RelayConfig,
        relay_state::{install_handlers, RelayState},
    },
    router::{Route, Router, RoutingTable},
};

struct Io {
    sender: Box<dyn PacketSender>,
    receiver: Box<dyn PacketReceiver>,
}

/// Central router of a relay session. Holds no game state: it registers
/// players, groups them into lobbies, forwards frames between them, brokers
/// direct links and reports the departures the lobby master must clean up.
pub struct Relay {
    router: Router,
    handlers: Handlers<RelayState>,
    state: RelayState,
    io: Option<Io>,
}

impl Relay {
    /// Create a new Relay
    pub fn new(config: RelayConfig) -> Self {
        let mut handlers = Handlers::new();
        install_handlers(&mut handlers);

        let interpreted: HashSet<EventCode> = [EventCategory::Core, EventCategory::Relay, EventCategory::Lobby]
            .into_iter()
            .filter_map(|category| handlers.registry(category))
            .flat_map(|registry| registry.codes())
            .collect();
        let router = Router::new(config.broadcast_events.clone(), interpreted);

        Self {
            router,
            handlers,
            state: RelayState::new(config),
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

    /// Must be called regularly, drains the transport, routes every frame and
    /// queues the pings that are due. Returns the events of this tick.
    pub fn receive(&mut self, now: Instant) -> RelayEvents {
        self.state.now = now;

        loop {
            let received = match self.io.as_mut() {
                Some(io) => io.receiver.receive(),
                None => {
                    self.state.events.push_error(RelayError::NotListening);
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

        self.state.queue_pings(now);
        self.state.events.take()
    }

    /// Sends every queued frame, then closes the connections that were
    /// forced out
    pub fn send_all_packets(&mut self) {
        let Some(io) = self.io.as_ref() else {
            if !self.state.outgoing.is_empty() {
                self.state.events.push_error(RelayError::NotListening);
            }
            return;
        };

        while let Some(frame) = self.state.outgoing.pop_front() {
            if self.state.players.get(frame.connection).is_none() {
                debug!("Dropping frame for closed connection {}", frame.connection);
                continue;
            }
            if let Err(error) = io.sender.send(frame.connection, &frame.payload, frame.delivery) {
                self.state.events.push_error(error.into());
            }
        }

        for connection in std::mem::take(&mut self.state.pending_disconnects) {
            if let Err(error) = io.sender.disconnect(connection) {
                self.state.events.push_error(error.into());
            }
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.state.config
    }

    pub fn players(&self) -> &Players {
        self.state.players()
    }

    pub fn lobbies(&self) -> &Lobbies {
        self.state.lobbies()
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    pub fn is_peer_link_available(&self, a: ConnectionId, b: ConnectionId) -> bool {
        self.state.broker.is_available(a, b)
    }

    pub fn latency_ms(&self, connection: ConnectionId) -> Option<f32> {
        self.state
            .players
            .get(connection)
            .map(|player| player.ping_manager.latency_ms())
    }

    /// Who the relay last saw take control of `entity`
    pub fn controller_of(&self, entity: EntityId) -> Option<ConnectionId> {
        self.state.directory.controller_of(entity)
    }

    // Private methods

    fn process_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected {
                connection,
                address,
            } => self.on_connect(connection, address),
            TransportEvent::Disconnected { connection } => self.state.on_disconnect(connection),
            TransportEvent::Packet {
                connection,
                payload,
            } => self.on_packet(connection, &payload),
        }
    }

    fn on_connect(&mut self, connection: ConnectionId, address: Option<SocketAddr>) {
        self.state.on_connect(connection, address);
    }

    /// The frame's origin field is ignored, senders are identified by their
    /// transport connection. Frames from connections never opened, or already
    /// closed, are dropped before routing.
    fn on_packet(&mut self, origin: ConnectionId, frame: &[u8]) {
        if self.state.players.get(origin).is_none() {
            warn!("Dropping frame from unknown connection {}", origin);
            return;
        }
        let (header, message) = match RelayHeader::split(frame) {
            Ok(split) => split,
            Err(error) => {
                warn!("Dropping frame from connection {}: {}", origin, error);
                return;
            }
        };
        let event_code = match MessageHeader::peek(message) {
            Ok(message_header) => message_header.event_code(),
            Err(error) => {
                warn!("Dropping frame from connection {}: {}", origin, error);
                return;
            }
        };

        let route = self.router.route(
            origin,
            header.destination,
            event_code,
            &RoutingTable {
                players: &self.state.players,
                lobbies: &self.state.lobbies,
                broker: &self.state.broker,
            },
        );

        match route {
            Route::Interpret => self.interpret(origin, message),
            Route::Forward(targets) => {
                self.state.snoop(origin, message);
                for target in targets {
                    let forwarded = RelayHeader::new(origin, target).wrap(message);
                    self.state.forward(target, forwarded);
                }
            }
            Route::ForceDisconnect => self.state.force_disconnect(origin),
            Route::Drop => {
                debug!(
                    "Dropping event {} from {} addressed to {}",
                    event_code, origin, header.destination
                );
            }
        }
    }

    fn interpret(&mut self, origin: ConnectionId, message: &[u8]) {
        let mut incoming = match IncomingMessage::decode(origin, message) {
            Ok(incoming) => incoming,
            Err(error) => {
                warn!("Dropping message from connection {}: {}", origin, error);
                return;
            }
        };
        if self.handlers.invoke(&mut self.state, &mut incoming) == InvokeOutcome::Unknown {
            warn!(
                "No handler for event {} from connection {}",
                incoming.event_code(),
                origin
            );
        }
    }
}
