use naia_serde::{BitReader, BitWrite, Serde, SerdeErr};

pub type EntityId = i32;
pub type ConnectionId = i32;
pub type EventCode = i32;
pub type LobbyId = i32;
pub type PingIndex = u32;

/// Connection id of the server in direct mode, and of the relay in relay mode
pub const HOST_CONNECTION_ID: ConnectionId = 0;
/// Destination meaning "everyone in scope" (the lobby, or every client)
pub const ALL_CONNECTIONS: ConnectionId = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// Guaranteed, ordered per sender
    Reliable,
    /// Best effort, no ordering
    Unreliable,
}

impl DeliveryMode {
    pub fn is_reliable(self) -> bool {
        self == DeliveryMode::Reliable
    }
}

impl Serde for DeliveryMode {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.is_reliable().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(DeliveryMode::Reliable)
        } else {
            Ok(DeliveryMode::Unreliable)
        }
    }

    fn bit_length(&self) -> u32 {
        self.is_reliable().bit_length()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkMode {
    /// Clients talk to an authoritative server
    Direct,
    /// Clients talk through a relay; the lobby master is authoritative
    Relay,
}
