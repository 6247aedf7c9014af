use crate::{
    session::session_config::SessionConfig,
    types::{ConnectionId, NetworkMode, HOST_CONNECTION_ID},
};

/// Who this node is within the session and who holds authority.
/// Passed by reference to every component instead of a global.
#[derive(Clone, Debug)]
pub struct SessionContext {
    config: SessionConfig,
    local_connection: Option<ConnectionId>,
    authority_connection: Option<ConnectionId>,
}

impl SessionContext {
    /// The server of a direct session
    pub fn for_authority(config: SessionConfig) -> Self {
        Self {
            config,
            local_connection: Some(HOST_CONNECTION_ID),
            authority_connection: Some(HOST_CONNECTION_ID),
        }
    }

    /// A client. Its own connection id arrives with the connection handshake,
    /// and in relay mode the authority is whichever peer the relay names master.
    pub fn for_peer(config: SessionConfig) -> Self {
        let authority_connection = match config.mode {
            NetworkMode::Direct => Some(HOST_CONNECTION_ID),
            NetworkMode::Relay => None,
        };
        Self {
            config,
            local_connection: None,
            authority_connection,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> NetworkMode {
        self.config.mode
    }

    pub fn local_connection(&self) -> Option<ConnectionId> {
        self.local_connection
    }

    pub fn set_local_connection(&mut self, connection: ConnectionId) {
        self.local_connection = Some(connection);
    }

    pub fn authority_connection(&self) -> Option<ConnectionId> {
        self.authority_connection
    }

    pub fn set_authority_connection(&mut self, connection: ConnectionId) {
        self.authority_connection = Some(connection);
    }

    pub fn is_authority(&self) -> bool {
        self.local_connection.is_some() && self.local_connection == self.authority_connection
    }

    pub fn is_local(&self, connection: ConnectionId) -> bool {
        self.local_connection == Some(connection)
    }
}
