use thiserror::Error;

use crate::types::ConnectionId;

/// Errors reported by a transport implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Packet could not be handed to the connection
    #[error("Failed to send packet to connection {connection}. The connection may be closed")]
    Send {
        connection: ConnectionId,
    },

    /// Underlying socket failed while receiving
    #[error("Failed to receive from transport: {reason}")]
    Receive {
        reason: String,
    },

    /// Connection is not open on this transport
    #[error("Connection {connection} is not open on this transport")]
    UnknownConnection {
        connection: ConnectionId,
    },

    /// Listener for a direct link could not be opened
    #[error("Could not open a listener on port {port}")]
    Listen {
        port: u16,
    },

    /// Direct link to a peer could not be established
    #[error("Could not reach peer {peer}")]
    Connect {
        peer: ConnectionId,
    },
}
