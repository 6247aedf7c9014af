use naia_serde::{BitReader, BitWrite, Serde};

use crate::{
    messages::{
        error::EnvelopeError,
        event_code::{EventCategory, OBJECT_EVENT_TAG},
    },
    types::{EntityId, EventCode},
};

/// The routing header that precedes every payload.
///
/// Wire layout:
/// - Core, Relay, Lobby, User: `[code]`
/// - Internal, Object: `[OBJECT_EVENT_TAG][code][entity]`
/// - UserObject: `[code][entity]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    category: EventCategory,
    event_code: EventCode,
    entity_id: Option<EntityId>,
}

impl MessageHeader {
    /// Header for any code, with the entity id required exactly when the
    /// code's category is entity-scoped.
    pub fn try_new(event_code: EventCode, entity_id: Option<EntityId>) -> Result<Self, EnvelopeError> {
        let category = EventCategory::of(event_code)
            .ok_or(EnvelopeError::UnknownEventCode { code: event_code })?;

        match (category.is_entity_scoped(), entity_id) {
            (true, Some(_)) | (false, None) => Ok(Self {
                category,
                event_code,
                entity_id,
            }),
            (true, None) => Err(EnvelopeError::MissingEntity { code: event_code }),
            (false, Some(_)) => Err(EnvelopeError::WrongCategory {
                code: event_code,
                expected: "entity-scoped",
                actual: category.name(),
            }),
        }
    }

    /// Header for a Core, Relay, Lobby or User event
    pub fn try_event(event_code: EventCode) -> Result<Self, EnvelopeError> {
        Self::try_new(event_code, None)
    }

    /// Header for an Internal or Object event addressed to an entity
    pub fn try_object(entity_id: EntityId, event_code: EventCode) -> Result<Self, EnvelopeError> {
        let header = Self::try_new(event_code, Some(entity_id))?;
        if !header.category.uses_object_tag() {
            return Err(EnvelopeError::NotTaggable { code: event_code });
        }
        Ok(header)
    }

    /// Header for an application per-entity event
    pub fn try_user_object(entity_id: EntityId, event_code: EventCode) -> Result<Self, EnvelopeError> {
        let header = Self::try_new(event_code, Some(entity_id))?;
        if header.category != EventCategory::UserObject {
            return Err(EnvelopeError::WrongCategory {
                code: event_code,
                expected: EventCategory::UserObject.name(),
                actual: header.category.name(),
            });
        }
        Ok(header)
    }

    /// # Panics
    ///
    /// If `event_code` is not a Core, Relay, Lobby or User code
    pub fn event(event_code: EventCode) -> Self {
        Self::try_event(event_code).unwrap_or_else(|error| panic!("{}", error))
    }

    /// # Panics
    ///
    /// If `event_code` is not an Internal or Object code
    pub fn object(entity_id: EntityId, event_code: EventCode) -> Self {
        Self::try_object(entity_id, event_code).unwrap_or_else(|error| panic!("{}", error))
    }

    /// # Panics
    ///
    /// If `event_code` is not a UserObject code
    pub fn user_object(entity_id: EntityId, event_code: EventCode) -> Self {
        Self::try_user_object(entity_id, event_code).unwrap_or_else(|error| panic!("{}", error))
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    pub fn event_code(&self) -> EventCode {
        self.event_code
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity_id
    }

    pub fn write(&self, writer: &mut dyn BitWrite) {
        if self.category.uses_object_tag() {
            OBJECT_EVENT_TAG.ser(writer);
        }
        self.event_code.ser(writer);
        if let Some(entity_id) = self.entity_id {
            entity_id.ser(writer);
        }
    }

    pub fn read(reader: &mut BitReader) -> Result<Self, EnvelopeError> {
        let outer = i32::de(reader).map_err(|_| EnvelopeError::Truncated {
            field: "event code",
        })?;

        if outer == OBJECT_EVENT_TAG {
            let inner = i32::de(reader).map_err(|_| EnvelopeError::Truncated {
                field: "inner event code",
            })?;
            let category =
                EventCategory::of(inner).ok_or(EnvelopeError::UnknownEventCode { code: inner })?;
            if !category.uses_object_tag() {
                return Err(EnvelopeError::NotTaggable { code: inner });
            }
            let entity_id =
                i32::de(reader).map_err(|_| EnvelopeError::MissingEntity { code: inner })?;
            return Ok(Self {
                category,
                event_code: inner,
                entity_id: Some(entity_id),
            });
        }

        let category =
            EventCategory::of(outer).ok_or(EnvelopeError::UnknownEventCode { code: outer })?;
        if category.uses_object_tag() {
            return Err(EnvelopeError::MissingObjectTag { code: outer });
        }

        let entity_id = if category.is_entity_scoped() {
            Some(i32::de(reader).map_err(|_| EnvelopeError::MissingEntity { code: outer })?)
        } else {
            None
        };

        Ok(Self {
            category,
            event_code: outer,
            entity_id,
        })
    }

    /// Reads only the header of an encoded message
    pub fn peek(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let mut reader = BitReader::new(bytes);
        Self::read(&mut reader)
    }

    pub fn bit_length(&self) -> u32 {
        let mut output = self.event_code.bit_length();
        if self.category.uses_object_tag() {
            output += OBJECT_EVENT_TAG.bit_length();
        }
        if let Some(entity_id) = self.entity_id {
            output += entity_id.bit_length();
        }
        output
    }
}
