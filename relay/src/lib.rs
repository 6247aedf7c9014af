//! # Warden Relay
//! Routes frames between the players of a relay session. Players register,
//! gather in lobbies whose first member is the master, and either talk
//! through the relay or over direct links the relay brokers for them.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod error;
mod events;
mod lobbies;
mod peer_broker;
mod players;
mod relay;
mod router;

pub use error::RelayError;
pub use events::{DisconnectEvent, ErrorEvent, RegisterEvent, RelayEvent, RelayEvents};
pub use lobbies::{Departure, Lobbies, Lobby, GLOBAL_LOBBY};
pub use peer_broker::{PeerBroker, PortPair};
pub use players::{Player, Players};
pub use relay::{Relay, RelayConfig, RelayState};
pub use router::{Route, Router, RoutingTable};
