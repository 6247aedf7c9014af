mod error;

use std::net::SocketAddr;

pub use error::TransportError;

use crate::types::{ConnectionId, DeliveryMode};

/// What the transport reports each time it is polled
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Connected {
        connection: ConnectionId,
        address: Option<SocketAddr>,
    },
    Disconnected {
        connection: ConnectionId,
    },
    Packet {
        connection: ConnectionId,
        payload: Box<[u8]>,
    },
}

/// Opens the endpoint and splits it into its two halves
pub trait Socket {
    fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>);
}

pub trait PacketSender: Send + Sync {
    /// Sends a packet to one connection with the requested guarantee
    fn send(
        &self,
        connection: ConnectionId,
        payload: &[u8],
        delivery: DeliveryMode,
    ) -> Result<(), TransportError>;
    /// Closes a connection from this side
    fn disconnect(&self, connection: ConnectionId) -> Result<(), TransportError>;
}

pub trait PacketReceiver: Send + Sync {
    /// Returns the next event, or None once the queue is drained for this tick
    fn receive(&mut self) -> Result<Option<TransportEvent>, TransportError>;
}
