mod outbox;
#[allow(clippy::module_inception)]
mod session;
mod session_config;
mod session_context;

pub use outbox::{OutgoingPacket, Outbox, Recipient};
pub use session::{DispatchOutcome, PendingTransfer, Session};
pub use session_config::SessionConfig;
pub use session_context::SessionContext;
