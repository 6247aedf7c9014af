use crate::{messages::error::EnvelopeError, types::ConnectionId};

pub const RELAY_HEADER_BYTES: usize = 8;

/// Routing prefix of every relay-mode frame: `[origin][destination]` as
/// little-endian `i32`s, followed by the untouched message bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayHeader {
    pub origin: ConnectionId,
    pub destination: ConnectionId,
}

impl RelayHeader {
    pub fn new(origin: ConnectionId, destination: ConnectionId) -> Self {
        Self {
            origin,
            destination,
        }
    }

    pub fn wrap(&self, message: &[u8]) -> Box<[u8]> {
        let mut frame = Vec::with_capacity(RELAY_HEADER_BYTES + message.len());
        frame.extend_from_slice(&self.origin.to_le_bytes());
        frame.extend_from_slice(&self.destination.to_le_bytes());
        frame.extend_from_slice(message);
        frame.into_boxed_slice()
    }

    pub fn split(frame: &[u8]) -> Result<(RelayHeader, &[u8]), EnvelopeError> {
        if frame.len() < RELAY_HEADER_BYTES {
            return Err(EnvelopeError::RelayFrameTooShort {
                length: frame.len(),
                expected: RELAY_HEADER_BYTES,
            });
        }
        let mut origin = [0_u8; 4];
        let mut destination = [0_u8; 4];
        origin.copy_from_slice(&frame[0..4]);
        destination.copy_from_slice(&frame[4..8]);
        let header = RelayHeader {
            origin: i32::from_le_bytes(origin),
            destination: i32::from_le_bytes(destination),
        };
        Ok((header, &frame[RELAY_HEADER_BYTES..]))
    }
}
