use thiserror::Error;

use crate::{
    messages::EnvelopeError,
    types::{EntityId, EventCode},
};

/// Errors a handler can return. They are logged by the registry and never
/// tear down the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Payload did not match the layout the handler expected
    #[error("Malformed payload: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Handler needed an entity that is not in the local store
    #[error("Entity {entity} not found in the local entity store")]
    EntityNotFound {
        entity: EntityId,
    },

    /// Application-defined failure
    #[error("{0}")]
    Custom(String),
}

/// Errors that can occur while registering handlers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Code registered in a registry of another category
    #[error("Event code {code} is a {actual} code and cannot be registered in the {expected} registry")]
    WrongCategory {
        code: EventCode,
        expected: &'static str,
        actual: &'static str,
    },

    /// Code is outside every known range
    #[error("Event code {code} does not belong to any event range")]
    UnknownEventCode {
        code: EventCode,
    },

    /// Code already has a handler in this registry
    #[error("Event code {code} already has a handler. Unregister it first")]
    AlreadyRegistered {
        code: EventCode,
    },

    /// Entity-scoped codes live in the per-entity registry, not the session one
    #[error("Event code {code} is entity-scoped. Register it on the entity's ObjectHandlers")]
    EntityScoped {
        code: EventCode,
    },
}

/// Errors that can occur while building or calling through an RpcTable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// Table was modified after being locked
    #[error("RpcTable already locked. Add every RPC before installing the table")]
    Locked,

    /// RPC id outside the User range
    #[error("RPC id {id} is outside the User event range")]
    OutOfRange {
        id: EventCode,
    },

    /// RPC id registered twice
    #[error("RPC id {id} is already registered")]
    DuplicateId {
        id: EventCode,
    },

    /// RPC name registered twice
    #[error("RPC name '{name}' is already registered")]
    DuplicateName {
        name: String,
    },

    /// No RPC with this name
    #[error("No RPC named '{name}' in the table")]
    UnknownRpc {
        name: String,
    },

    /// Call site argument type differs from the registered one
    #[error("RPC '{name}' takes {expected}, called with {actual}")]
    ArgumentMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}
