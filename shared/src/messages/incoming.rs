use naia_serde::{BitReader, Serde};

use crate::{
    messages::{error::EnvelopeError, event_code::EventCategory, header::MessageHeader},
    types::{ConnectionId, EntityId, EventCode},
};

const MAX_BYTES_LENGTH: u32 = 1 << 20;

/// A decoded inbound message: its header, who sent it, and a cursor over the payload.
pub struct IncomingMessage<'b> {
    header: MessageHeader,
    origin: ConnectionId,
    raw: &'b [u8],
    reader: BitReader<'b>,
}

impl<'b> IncomingMessage<'b> {
    pub fn decode(origin: ConnectionId, raw: &'b [u8]) -> Result<Self, EnvelopeError> {
        let mut reader = BitReader::new(raw);
        let header = MessageHeader::read(&mut reader)?;
        Ok(Self {
            header,
            origin,
            raw,
            reader,
        })
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn category(&self) -> EventCategory {
        self.header.category()
    }

    pub fn event_code(&self) -> EventCode {
        self.header.event_code()
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        self.header.entity_id()
    }

    /// Connection the message arrived from (the relay-reported origin in relay mode)
    pub fn origin(&self) -> ConnectionId {
        self.origin
    }

    /// The whole encoded message, header included, for verbatim forwarding
    pub fn raw(&self) -> &'b [u8] {
        self.raw
    }

    pub fn read<T: Serde>(&mut self) -> Result<T, EnvelopeError> {
        T::de(&mut self.reader).map_err(|_| EnvelopeError::Truncated { field: "payload" })
    }

    /// Reads a length-prefixed byte string
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, EnvelopeError> {
        let length: u32 = self.read()?;
        if length > MAX_BYTES_LENGTH {
            return Err(EnvelopeError::Truncated { field: "byte string" });
        }
        let mut output = Vec::with_capacity(length as usize);
        for _ in 0..length {
            output.push(self.read::<u8>()?);
        }
        Ok(output)
    }
}
