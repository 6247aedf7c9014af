//! # Warden Client
//! A peer of a warden session. Connects directly to a server, or to a relay
//! where it joins lobbies, may be named lobby master, and can negotiate
//! direct links with other peers.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use warden_shared::{
        core_events, relay::LobbySummary, BitReader, BitWrite, ConstBitLength, DeliveryMode,
        EntityId, EventCode, LobbyId, OwnershipAccessLevel, Recipient, Serde, SerdeErr, SpawnInfo,
        UnsignedInteger,
    };
}

mod client;
mod connection;
mod error;
mod events;
mod transport;

pub use client::{Client, ClientConfig, ClientState, LobbyMembership};
pub use connection::{PeerLink, PeerLinks};
pub use error::ClientError;
pub use events::{
    ClientEvent, ClientEvents, ConnectEvent, DisconnectEvent, DisconnectReason, ErrorEvent,
    LobbyJoinedEvent, LobbyLeftEvent, LobbyListEvent, MasterAssignedEvent, PeerDisconnectEvent,
    PeerToPeerEvent,
};
pub use transport::P2pConnector;
