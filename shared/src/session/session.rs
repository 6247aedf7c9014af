use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    directory::ConnectionDirectory,
    events::{Handlers, InvokeOutcome},
    messages::{EventCategory, IncomingMessage},
    ownership::{DefaultOwnershipPolicy, OwnershipPolicy},
    session::{outbox::Outbox, session_context::SessionContext},
    types::{ConnectionId, EntityId, NetworkMode, ALL_CONNECTIONS},
    world::{EntityRecord, EntityStore, OwnershipAccessLevel, SpawnInfo, WorldError},
};

/// A transfer the authority forwarded and is waiting to see completed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTransfer {
    pub from: ConnectionId,
    pub to: ConnectionId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// No handler for the code, dropped
    Unknown,
    /// Handler failed, already logged
    Failed,
    /// Buffer could not be decoded, dropped
    Malformed,
    /// Entity-scoped message for an entity that is not here, dropped
    StaleEntity,
}

impl From<InvokeOutcome> for DispatchOutcome {
    fn from(outcome: InvokeOutcome) -> Self {
        match outcome {
            InvokeOutcome::Handled => DispatchOutcome::Handled,
            InvokeOutcome::Unknown => DispatchOutcome::Unknown,
            InvokeOutcome::Failed => DispatchOutcome::Failed,
        }
    }
}

/// Per-endpoint protocol state: the local entity views, the directory of peers
/// and their controls, the ownership policy, and the queue of outgoing messages.
pub struct Session {
    pub(crate) context: SessionContext,
    pub(crate) entities: EntityStore,
    pub(crate) directory: ConnectionDirectory,
    pub(crate) outbox: Outbox,
    pub(crate) policy: Box<dyn OwnershipPolicy>,
    pub(crate) transfers: HashMap<EntityId, PendingTransfer>,
}

impl AsMut<Session> for Session {
    fn as_mut(&mut self) -> &mut Session {
        self
    }
}

impl Session {
    pub fn new(context: SessionContext) -> Self {
        Self::with_policy(context, Box::new(DefaultOwnershipPolicy))
    }

    pub fn with_policy(context: SessionContext, policy: Box<dyn OwnershipPolicy>) -> Self {
        Self {
            context,
            entities: EntityStore::new(),
            directory: ConnectionDirectory::new(),
            outbox: Outbox::new(),
            policy,
            transfers: HashMap::new(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    pub fn entity(&self, entity: EntityId) -> Option<&EntityRecord> {
        self.entities.get(entity)
    }

    pub fn directory(&self) -> &ConnectionDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut ConnectionDirectory {
        &mut self.directory
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    pub fn set_policy(&mut self, policy: Box<dyn OwnershipPolicy>) {
        self.policy = policy;
    }

    pub fn pending_transfer(&self, entity: EntityId) -> Option<PendingTransfer> {
        self.transfers.get(&entity).copied()
    }

    /// Access level the protocol enforces for `record`, None when ownership
    /// is disabled altogether
    pub fn effective_access(&self, record: &EntityRecord) -> Option<OwnershipAccessLevel> {
        if !self.policy.ownership_allowed() {
            return None;
        }
        if self.policy.per_prefab_policy() {
            Some(record.access_level())
        } else {
            Some(self.context.config().default_access_level)
        }
    }

    /// Adds the local view of an entity and records its controller
    pub fn spawn(&mut self, info: SpawnInfo) -> Result<(), WorldError> {
        let local = self.context.local_connection().unwrap_or(ALL_CONNECTIONS);
        let controller = info.controller;
        let entity = info.entity;
        let record = self.entities.spawn(info, local)?;
        if Some(controller) != self.context.authority_connection() {
            self.directory.register_control(controller, entity);
        }
        self.policy.on_spawn(record);
        Ok(())
    }

    /// Removes an entity, its directory entry and any transfer in flight for it
    pub fn despawn(&mut self, entity: EntityId) -> Result<EntityRecord, WorldError> {
        let record = self.entities.despawn(entity)?;
        self.directory.purge_entity(entity);
        self.transfers.remove(&entity);
        self.policy.on_despawn(entity);
        Ok(record)
    }

    /// Spawn description of a live entity, naming its current controller
    pub fn spawn_info(&self, entity: EntityId) -> Option<SpawnInfo> {
        let record = self.entities.get(entity)?;
        let mut info = record.info().clone();
        info.controller = match self.directory.controller_of(entity) {
            Some(controller) => controller,
            None => self
                .context
                .authority_connection()
                .unwrap_or(info.controller),
        };
        Some(info)
    }

    /// Decodes one inbound message and routes it: entity-scoped application
    /// events to the entity's own handlers, everything else through `handlers`.
    /// Nothing here escapes as an error, failures are logged and reported.
    pub fn dispatch<C: AsMut<Session>>(
        handlers: &mut Handlers<C>,
        context: &mut C,
        origin: ConnectionId,
        bytes: &[u8],
    ) -> DispatchOutcome {
        let mut message = match IncomingMessage::decode(origin, bytes) {
            Ok(message) => message,
            Err(error) => {
                warn!("Dropping message from connection {}: {}", origin, error);
                return DispatchOutcome::Malformed;
            }
        };

        if let Some(entity) = message.entity_id() {
            if !context.as_mut().entities.contains(entity) {
                warn!(
                    "Dropping event {} for entity {} from connection {}: entity not found",
                    message.event_code(),
                    entity,
                    origin
                );
                return DispatchOutcome::StaleEntity;
            }
        }

        let outcome = match message.category() {
            EventCategory::Object | EventCategory::UserObject => {
                context.as_mut().dispatch_to_entity(&mut message)
            }
            _ => handlers.invoke(context, &mut message).into(),
        };

        if outcome == DispatchOutcome::Unknown {
            warn!(
                "No {} handler for event {} from connection {}",
                message.category().name(),
                message.event_code(),
                origin
            );
        }
        outcome
    }

    fn dispatch_to_entity(&mut self, message: &mut IncomingMessage<'_>) -> DispatchOutcome {
        let Some(entity) = message.entity_id() else {
            return DispatchOutcome::Malformed;
        };
        let Some(record) = self.entities.get_mut(entity) else {
            return DispatchOutcome::StaleEntity;
        };

        let delivery = record.delivery();
        let has_handler = record.handlers().has(message.event_code());
        let outcome: DispatchOutcome = record.handlers_mut().invoke(&mut self.outbox, message).into();

        // the server relays the controller's updates to everyone else
        let relayed = self.context.mode() == NetworkMode::Direct
            && self.context.is_authority()
            && self.directory.controller_of(entity) == Some(message.origin());
        if relayed {
            self.outbox
                .broadcast(Some(message.origin()), message.raw().into(), delivery);
        }

        if !has_handler && relayed {
            debug!(
                "Relayed event {} for entity {} without a local handler",
                message.event_code(),
                entity
            );
            return DispatchOutcome::Handled;
        }
        outcome
    }
}
