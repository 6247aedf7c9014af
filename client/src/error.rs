use thiserror::Error;

use warden_shared::{
    ConnectionId, EnvelopeError, NetworkMode, RegistryError, TransportError, WorldError,
};

/// Errors surfaced by the Client, either returned or pushed as ErrorEvents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Underlying transport or peer link failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Event code or payload could not be framed
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Entity operation on an unknown or duplicate entity
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Handler registration failed
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Packets were flushed before `connect` was called
    #[error("Client is not connected. Call connect() with a Socket first")]
    NotConnected,

    /// Operation only the session authority may perform
    #[error("Only the session authority can do this")]
    NotAuthority,

    /// Operation that needs another network mode
    #[error("Operation requires {expected:?} mode")]
    WrongMode {
        expected: NetworkMode,
    },

    /// Lobbies or peer-to-peer links are switched off in the config
    #[error("{feature} is disabled in the ClientConfig")]
    FeatureDisabled {
        feature: &'static str,
    },

    /// Peer-to-peer was requested without a P2pConnector installed
    #[error("No P2pConnector installed. Call set_peer_connector() first")]
    NoPeerConnector,

    /// Peer link to this connection is not open
    #[error("No peer link to connection {connection}")]
    NoPeerLink {
        connection: ConnectionId,
    },
}
