//! # Warden Server
//! The authority of a direct session. Accepts connections through any
//! `Socket`, samples latency to every client, spawns entities and arbitrates
//! the ownership handshakes that move authority between peers.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use warden_shared::{
        core_events, BitReader, BitWrite, ConstBitLength, DeliveryMode, EntityId,
        EventCode, OwnershipAccessLevel, Recipient, Serde, SerdeErr, SpawnInfo, UnsignedInteger,
    };
}

mod connection;
mod error;
mod events;
mod server;

pub use error::ServerError;
pub use events::{ConnectEvent, DisconnectEvent, ErrorEvent, ServerEvent, ServerEvents};
pub use server::{Server, ServerConfig, ServerState};
