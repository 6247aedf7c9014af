use thiserror::Error;

use warden_shared::{ConnectionId, DirectoryError, LobbyId, RegistryError, TransportError};

/// Errors surfaced by the Relay, either returned or pushed as ErrorEvents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Underlying transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Connection bookkeeping rejected an open or close
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Handler registration failed
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Packets were flushed before `listen` was called
    #[error("Relay is not listening. Call listen() with a Socket first")]
    NotListening,

    /// No lobby has this id
    #[error("Lobby {lobby} does not exist")]
    UnknownLobby {
        lobby: LobbyId,
    },

    /// Connection is not a registered player
    #[error("Connection {connection} is not a registered player")]
    UnknownPlayer {
        connection: ConnectionId,
    },

    /// A link between these two players exists or is being negotiated
    #[error("Peer link between {a} and {b} already exists")]
    PeerLinkExists {
        a: ConnectionId,
        b: ConnectionId,
    },

    /// Peer-to-peer needs both players in the same lobby with known addresses
    #[error("Players {a} and {b} cannot be linked")]
    PeerLinkRefused {
        a: ConnectionId,
        b: ConnectionId,
    },

    /// Every port in the configured range is reserved
    #[error("No free port left for peer links")]
    NoFreePort,
}
