mod error;
mod handlers;
mod object_handlers;
mod registry;
mod rpc;

pub use error::{HandlerError, RegistryError, RpcError};
pub use handlers::Handlers;
pub use object_handlers::ObjectHandlers;
pub use registry::{EventHandler, EventRegistry, InvokeOutcome};
pub use rpc::{RpcSignature, RpcTable};
