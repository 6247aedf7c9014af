use naia_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::types::{ConnectionId, EntityId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TakeControl {
    pub requester: ConnectionId,
    /// Sent by the authority to make every other peer drop a stale Active claim
    pub requested_by_server: bool,
}

impl Serde for TakeControl {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.requester.ser(writer);
        self.requested_by_server.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            requester: ConnectionId::de(reader)?,
            requested_by_server: bool::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.requester.bit_length() + self.requested_by_server.bit_length()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TakeControlSuccess {
    pub requester: ConnectionId,
}

impl Serde for TakeControlSuccess {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.requester.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            requester: ConnectionId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.requester.bit_length()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseControl {
    pub releaser: ConnectionId,
}

impl Serde for ReleaseControl {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.releaser.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            releaser: ConnectionId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.releaser.bit_length()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseControlSuccess {
    pub releaser: ConnectionId,
}

impl Serde for ReleaseControlSuccess {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.releaser.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            releaser: ConnectionId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.releaser.bit_length()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferControl {
    /// Peer handing the entity over
    pub sender: ConnectionId,
    /// Player entity receiving it
    pub target_entity: EntityId,
    /// Connection owning the target player entity
    pub target_connection: ConnectionId,
}

impl Serde for TransferControl {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.sender.ser(writer);
        self.target_entity.ser(writer);
        self.target_connection.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            sender: ConnectionId::de(reader)?,
            target_entity: EntityId::de(reader)?,
            target_connection: ConnectionId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.sender.bit_length() + self.target_entity.bit_length() + self.target_connection.bit_length()
    }
}
