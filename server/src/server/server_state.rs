use std::{collections::HashMap, time::Instant};

use log::debug;

use warden_shared::{
    core_events::PING, ownership, ConnectionId, DeliveryMode, HandlerError, Handlers,
    IncomingMessage, PingIndex, PingOutcome, Session,
};

use crate::{connection::Connection, events::ServerEvents};

/// The part of the Server that event handlers may touch: the session, the
/// open connections and the events being collected for this tick
pub struct ServerState {
    pub(crate) session: Session,
    pub(crate) connections: HashMap<ConnectionId, Connection>,
    pub(crate) events: ServerEvents,
    pub(crate) now: Instant,
}

impl AsMut<Session> for ServerState {
    fn as_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl ServerState {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            connections: HashMap::new(),
            events: ServerEvents::new(),
            now: Instant::now(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn is_connected(&self, connection: ConnectionId) -> bool {
        self.connections.contains_key(&connection)
    }

    /// Time passed to the current `Server::receive`
    pub fn now(&self) -> Instant {
        self.now
    }

    fn on_ping(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let index: PingIndex = message.read()?;
        let origin = message.origin();
        let Some(connection) = self.connections.get_mut(&origin) else {
            return Err(HandlerError::Custom(format!(
                "ping from unknown connection {}",
                origin
            )));
        };

        match connection.ping_manager.on_ping(index, self.now) {
            PingOutcome::Measured(rtt_ms) => {
                debug!("Round trip to connection {}: {:.1}ms", origin, rtt_ms);
            }
            PingOutcome::Late => {}
            PingOutcome::Echo => {
                self.session
                    .outbox_mut()
                    .send_to(origin, message.raw().into(), DeliveryMode::Unreliable);
            }
        }
        Ok(())
    }
}

/// Built-in handlers every Server carries
pub(crate) fn install_handlers(handlers: &mut Handlers<ServerState>) {
    handlers
        .core_mut()
        .register(PING, |state: &mut ServerState, message: &mut IncomingMessage<'_>| {
            state.on_ping(message)
        });
    ownership::install(handlers.internal_mut());
}
