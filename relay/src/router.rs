use std::collections::HashSet;

use warden_shared::{
    relay_events::REGISTER_PLAYER, ConnectionId, EventCode, ALL_CONNECTIONS, HOST_CONNECTION_ID,
};

use crate::{lobbies::Lobbies, peer_broker::PeerBroker, players::Players};

/// What the relay does with one inbound frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Handled by the relay's own registries
    Interpret,
    /// Copied verbatim to these connections
    Forward(Vec<ConnectionId>),
    /// Sender is not a registered player
    ForceDisconnect,
    Drop,
}

/// Routing rules of the relay, for frames from open connections:
/// - unregistered senders may only register
/// - codes the relay handles itself are interpreted
/// - broadcast codes reach the sender's lobby, skipping peers it has a direct link with
/// - the master's traffic goes where it is addressed, or to the whole lobby
/// - everyone else's traffic goes to the master
pub struct Router {
    broadcast_events: HashSet<EventCode>,
    interpreted: HashSet<EventCode>,
}

pub struct RoutingTable<'a> {
    pub players: &'a Players,
    pub lobbies: &'a Lobbies,
    pub broker: &'a PeerBroker,
}

impl Router {
    pub fn new(broadcast_events: HashSet<EventCode>, interpreted: HashSet<EventCode>) -> Self {
        Self {
            broadcast_events,
            interpreted,
        }
    }

    pub fn is_broadcast(&self, event_code: EventCode) -> bool {
        self.broadcast_events.contains(&event_code)
    }

    pub fn route(
        &self,
        origin: ConnectionId,
        destination: ConnectionId,
        event_code: EventCode,
        table: &RoutingTable<'_>,
    ) -> Route {
        if !table.players.is_registered(origin) {
            return if event_code == REGISTER_PLAYER {
                Route::Interpret
            } else {
                Route::ForceDisconnect
            };
        }
        if self.interpreted.contains(&event_code) {
            return Route::Interpret;
        }
        if destination == HOST_CONNECTION_ID {
            return Route::Drop;
        }

        let Some(lobby) = table.lobbies.lobby_of(origin) else {
            return Route::Drop;
        };
        let Some(master) = lobby.master() else {
            return Route::Drop;
        };
        let everyone_else = || -> Vec<ConnectionId> {
            lobby
                .members()
                .iter()
                .copied()
                .filter(|member| *member != origin)
                .collect()
        };

        if self.is_broadcast(event_code) {
            if destination == ALL_CONNECTIONS {
                let targets = everyone_else()
                    .into_iter()
                    .filter(|member| !table.broker.is_available(origin, *member))
                    .collect();
                return Route::Forward(targets);
            }
            return if lobby.contains(destination) && destination != origin {
                Route::Forward(vec![destination])
            } else {
                Route::Drop
            };
        }

        if origin == master {
            if destination == ALL_CONNECTIONS || destination == master {
                return Route::Forward(everyone_else());
            }
            return if lobby.contains(destination) {
                Route::Forward(vec![destination])
            } else {
                Route::Drop
            };
        }

        Route::Forward(vec![master])
    }
}
