use thiserror::Error;

use crate::types::ConnectionId;

/// Errors that can occur during connection directory operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// Connection is not in the directory
    #[error("Connection {connection} is not known. It never connected or has already disconnected")]
    UnknownConnection {
        connection: ConnectionId,
    },

    /// Connection id reported connected twice
    #[error("Connection {connection} is already registered")]
    AlreadyConnected {
        connection: ConnectionId,
    },
}
