use std::{mem, vec::IntoIter};

use warden_shared::{ConnectionId, EntityId};

use crate::RelayError;

/// Everything that happened during one call to `Relay::receive`
pub struct RelayEvents {
    registrations: Vec<ConnectionId>,
    disconnections: Vec<(ConnectionId, Vec<EntityId>)>,
    errors: Vec<RelayError>,

    empty: bool,
}

impl Default for RelayEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayEvents {
    pub(crate) fn new() -> Self {
        Self {
            registrations: Vec::new(),
            disconnections: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: RelayEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: RelayEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_registration(&mut self, connection: ConnectionId) {
        self.registrations.push(connection);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, connection: ConnectionId, controlled: Vec<EntityId>) {
        self.disconnections.push((connection, controlled));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: RelayError) {
        self.errors.push(error);
        self.empty = false;
    }

    pub(crate) fn take(&mut self) -> Self {
        mem::take(self)
    }
}

// Event Trait
pub trait RelayEvent {
    type Iter;

    fn iter(events: &mut RelayEvents) -> Self::Iter;

    fn has(events: &RelayEvents) -> bool;
}

// RegisterEvent
pub struct RegisterEvent;
impl RelayEvent for RegisterEvent {
    type Iter = IntoIter<ConnectionId>;

    fn iter(events: &mut RelayEvents) -> Self::Iter {
        let list = mem::take(&mut events.registrations);
        IntoIterator::into_iter(list)
    }

    fn has(events: &RelayEvents) -> bool {
        !events.registrations.is_empty()
    }
}

// DisconnectEvent, with the entities the player controlled when it left
pub struct DisconnectEvent;
impl RelayEvent for DisconnectEvent {
    type Iter = IntoIter<(ConnectionId, Vec<EntityId>)>;

    fn iter(events: &mut RelayEvents) -> Self::Iter {
        let list = mem::take(&mut events.disconnections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &RelayEvents) -> bool {
        !events.disconnections.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl RelayEvent for ErrorEvent {
    type Iter = IntoIter<RelayError>;

    fn iter(events: &mut RelayEvents) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &RelayEvents) -> bool {
        !events.errors.is_empty()
    }
}
