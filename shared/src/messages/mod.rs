mod error;
pub mod event_code;
mod header;
mod incoming;
mod outgoing;
mod relay_header;
mod writer;

pub use error::EnvelopeError;
pub use event_code::{EventCategory, OBJECT_EVENT_TAG};
pub use header::MessageHeader;
pub use incoming::IncomingMessage;
pub use outgoing::{encode_object_message, OutgoingMessage};
pub use relay_header::{RelayHeader, RELAY_HEADER_BYTES};
pub use writer::MessageWriter;
