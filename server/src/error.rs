use thiserror::Error;

use warden_shared::{
    ConnectionId, DirectoryError, EnvelopeError, RegistryError, TransportError, WorldError,
};

/// Errors surfaced by the Server, either returned or pushed as ErrorEvents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// Underlying transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Event code or payload could not be framed
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Entity operation on an unknown or duplicate entity
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Connection bookkeeping rejected an open or close
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Handler registration failed
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Operation addressed a connection that is not open
    #[error("Connection {connection} is not connected to this Server")]
    UnknownConnection {
        connection: ConnectionId,
    },

    /// Packets were flushed before `listen` was called
    #[error("Server is not listening. Call listen() with a Socket first")]
    NotListening,
}
