use crate::{
    types::{ConnectionId, EntityId},
    world::EntityRecord,
};

/// Application hooks consulted by the ownership protocol.
/// Predicates are evaluated on the peer holding authority.
pub trait OwnershipPolicy {
    /// Master switch, when false every ownership operation is refused
    fn ownership_allowed(&self) -> bool {
        true
    }

    /// When true each entity's own access level applies, otherwise the
    /// session's default access level does
    fn per_prefab_policy(&self) -> bool {
        true
    }

    fn accept_take(&mut self, _entity: &EntityRecord, _requester: ConnectionId) -> bool {
        true
    }

    fn accept_release(&mut self, _entity: &EntityRecord, _releaser: ConnectionId) -> bool {
        true
    }

    /// This peer became Active for `entity`
    fn on_take(&mut self, _entity: EntityId) {}

    /// This peer stopped being Active for `entity`
    fn on_release(&mut self, _entity: EntityId) {}

    fn on_spawn(&mut self, _entity: &EntityRecord) {}

    fn on_despawn(&mut self, _entity: EntityId) {}
}

/// Accepts every request and ignores lifecycle callbacks
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultOwnershipPolicy;

impl OwnershipPolicy for DefaultOwnershipPolicy {}
