use thiserror::Error;

use crate::types::EntityId;

/// Errors that can occur during entity store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// Entity was not found in the local store
    #[error("Entity {entity} not found. It was never spawned here or has been despawned")]
    EntityNotFound {
        entity: EntityId,
    },

    /// Entity id is already live
    #[error("Entity {entity} already exists. Despawn it before spawning the id again")]
    EntityAlreadyExists {
        entity: EntityId,
    },
}
