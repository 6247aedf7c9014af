use std::net::SocketAddr;

use warden_shared::{ConnectionId, DeliveryMode, TransportError};

/// Direct peer-to-peer links, supplied by the application. The relay picks
/// the ports and addresses; the connector only opens sockets and moves bytes.
pub trait P2pConnector {
    /// Starts accepting the peer's connection on `local_port`
    fn open_listener(&mut self, local_port: u16) -> Result<(), TransportError>;
    /// Dials `peer` at `address`
    fn connect(&mut self, peer: ConnectionId, address: SocketAddr) -> Result<(), TransportError>;
    /// Sends one message over the link to `peer`
    fn send(
        &mut self,
        peer: ConnectionId,
        payload: &[u8],
        delivery: DeliveryMode,
    ) -> Result<(), TransportError>;
    /// Returns the next message that arrived over any link, or None once drained
    fn receive(&mut self) -> Result<Option<(ConnectionId, Box<[u8]>)>, TransportError>;
    /// Tears down the link to `peer`
    fn close(&mut self, peer: ConnectionId);
}
