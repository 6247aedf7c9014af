//! # Warden Shared
//! Authority protocol and event routing shared between the warden server,
//! client and relay crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use naia_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};

pub mod directory;
pub mod events;
pub mod latency;
pub mod messages;
pub mod ownership;
pub mod relay;
pub mod session;
pub mod transport;
pub mod world;

mod types;

pub use directory::{ConnectionDirectory, DirectoryError, PeerRecord};
pub use events::{
    EventHandler, EventRegistry, HandlerError, Handlers, InvokeOutcome, ObjectHandlers,
    RegistryError, RpcError, RpcSignature, RpcTable,
};
pub use latency::{PingConfig, PingManager, PingStore, PingOutcome};
pub use messages::{
    encode_object_message, event_code::core_events, event_code::internal_events,
    event_code::lobby_events, event_code::relay_events, EnvelopeError, EventCategory,
    IncomingMessage, MessageHeader, MessageWriter, OutgoingMessage, RelayHeader,
    OBJECT_EVENT_TAG, RELAY_HEADER_BYTES,
};
pub use ownership::{ControlOutcome, DefaultOwnershipPolicy, OwnershipPolicy, Refusal};
pub use session::{
    DispatchOutcome, OutgoingPacket, Outbox, PendingTransfer, Recipient, Session, SessionConfig,
    SessionContext,
};
pub use transport::{PacketReceiver, PacketSender, Socket, TransportError, TransportEvent};
pub use types::{
    ConnectionId, DeliveryMode, EntityId, EventCode, LobbyId, NetworkMode, PingIndex,
    ALL_CONNECTIONS, HOST_CONNECTION_ID,
};
pub use world::{
    BehaviorMode, EntityRecord, EntityStore, Handshake, OwnershipAccessLevel, SpawnInfo,
    WorldError,
};
