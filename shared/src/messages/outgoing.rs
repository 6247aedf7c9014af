use naia_serde::{BitWrite, Serde};

use crate::{
    messages::{error::EnvelopeError, header::MessageHeader, writer::MessageWriter},
    types::{EntityId, EventCode},
};

/// Builds one encoded message: header first, then payload fields in call order.
pub struct OutgoingMessage {
    header: MessageHeader,
    writer: MessageWriter,
}

impl OutgoingMessage {
    pub fn new(header: MessageHeader) -> Self {
        let mut writer = MessageWriter::new();
        header.write(&mut writer);
        Self { header, writer }
    }

    pub fn try_event(event_code: EventCode) -> Result<Self, EnvelopeError> {
        Ok(Self::new(MessageHeader::try_event(event_code)?))
    }

    pub fn try_object(entity_id: EntityId, event_code: EventCode) -> Result<Self, EnvelopeError> {
        Ok(Self::new(MessageHeader::try_object(entity_id, event_code)?))
    }

    pub fn try_user_object(entity_id: EntityId, event_code: EventCode) -> Result<Self, EnvelopeError> {
        Ok(Self::new(MessageHeader::try_user_object(entity_id, event_code)?))
    }

    /// # Panics
    ///
    /// If `event_code` is not a Core, Relay, Lobby or User code
    pub fn event(event_code: EventCode) -> Self {
        Self::new(MessageHeader::event(event_code))
    }

    /// # Panics
    ///
    /// If `event_code` is not an Internal or Object code
    pub fn object(entity_id: EntityId, event_code: EventCode) -> Self {
        Self::new(MessageHeader::object(entity_id, event_code))
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn write<T: Serde>(mut self, value: &T) -> Self {
        value.ser(&mut self.writer);
        self
    }

    /// Writes a length-prefixed byte string
    pub fn write_bytes(mut self, bytes: &[u8]) -> Self {
        write_bytes(&mut self.writer, bytes);
        self
    }

    pub fn to_bytes(self) -> Box<[u8]> {
        self.writer.to_bytes()
    }
}

pub(crate) fn write_bytes(writer: &mut dyn BitWrite, bytes: &[u8]) {
    (bytes.len() as u32).ser(writer);
    for byte in bytes {
        byte.ser(writer);
    }
}

/// Frames an opaque payload for an entity: `[OBJECT_EVENT_TAG][code][entity][payload]`.
/// The payload is written as a length-prefixed byte string.
pub fn encode_object_message(
    entity_id: EntityId,
    event_code: EventCode,
    payload: &[u8],
) -> Result<Box<[u8]>, EnvelopeError> {
    Ok(OutgoingMessage::try_object(entity_id, event_code)?
        .write_bytes(payload)
        .to_bytes())
}
