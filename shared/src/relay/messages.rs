use naia_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    relay::wire_address::WireAddress,
    types::{ConnectionId, EntityId, LobbyId},
};

/// Relay to client: the connection id the relay assigned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerRegistered {
    pub connection: ConnectionId,
}

impl Serde for PlayerRegistered {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.connection.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            connection: ConnectionId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.connection.bit_length()
    }
}

/// Relay to lobby members: who arbitrates addressed traffic
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MasterAssigned {
    pub lobby: LobbyId,
    pub master: ConnectionId,
}

impl Serde for MasterAssigned {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.lobby.ser(writer);
        self.master.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            lobby: LobbyId::de(reader)?,
            master: ConnectionId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.lobby.bit_length() + self.master.bit_length()
    }
}

/// Relay to master: a peer left while controlling these entities
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerDisconnected {
    pub connection: ConnectionId,
    pub entities: Vec<EntityId>,
}

impl Serde for OwnerDisconnected {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.connection.ser(writer);
        self.entities.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            connection: ConnectionId::de(reader)?,
            entities: Vec::<EntityId>::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.connection.bit_length() + self.entities.bit_length()
    }
}

/// Client to relay: negotiate a direct link with `peer`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct P2pRequest {
    pub peer: ConnectionId,
}

impl Serde for P2pRequest {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.peer.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            peer: ConnectionId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.peer.bit_length()
    }
}

/// Relay to client: listen on `local_port` and connect to `peer` at `address`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct P2pOpen {
    pub peer: ConnectionId,
    pub address: WireAddress,
    pub local_port: u16,
}

impl Serde for P2pOpen {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.peer.ser(writer);
        self.address.ser(writer);
        self.local_port.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            peer: ConnectionId::de(reader)?,
            address: WireAddress::de(reader)?,
            local_port: u16::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.peer.bit_length() + self.address.bit_length() + self.local_port.bit_length()
    }
}

/// Client to relay: whether the direct link to `peer` came up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct P2pResult {
    pub peer: ConnectionId,
    pub success: bool,
}

impl Serde for P2pResult {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.peer.ser(writer);
        self.success.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            peer: ConnectionId::de(reader)?,
            success: bool::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.peer.bit_length() + self.success.bit_length()
    }
}

/// Relay to client: final state of the direct link to `peer`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct P2pStatus {
    pub peer: ConnectionId,
    pub available: bool,
}

impl Serde for P2pStatus {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.peer.ser(writer);
        self.available.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            peer: ConnectionId::de(reader)?,
            available: bool::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.peer.bit_length() + self.available.bit_length()
    }
}
