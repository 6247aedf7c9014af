use thiserror::Error;

use crate::types::EventCode;

/// Errors that can occur while encoding or decoding a message envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Event code falls outside every known range
    #[error("Event code {code} does not belong to any event range")]
    UnknownEventCode {
        code: EventCode,
    },

    /// Message ended before the header or payload was complete
    #[error("Message truncated while reading {field}. Sender and receiver disagree on the payload layout")]
    Truncated {
        field: &'static str,
    },

    /// Object-tagged envelope carried a code that is not entity-scoped
    #[error("Event code {code} cannot travel inside the object envelope. Only Internal and Object codes are tagged")]
    NotTaggable {
        code: EventCode,
    },

    /// Entity-scoped code sent without the object tag
    #[error("Event code {code} must travel inside the object envelope")]
    MissingObjectTag {
        code: EventCode,
    },

    /// Header constructor used with a code from the wrong range
    #[error("Event code {code} is a {actual} code, expected a {expected} code")]
    WrongCategory {
        code: EventCode,
        expected: &'static str,
        actual: &'static str,
    },

    /// Relay frame shorter than its routing prefix
    #[error("Relay frame of {length} bytes is shorter than the {expected} byte routing prefix")]
    RelayFrameTooShort {
        length: usize,
        expected: usize,
    },

    /// Entity id could not be read for an entity-scoped code
    #[error("Entity id missing for entity-scoped event {code}")]
    MissingEntity {
        code: EventCode,
    },
}

