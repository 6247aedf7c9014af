use crate::{
    events::ObjectHandlers,
    session::Outbox,
    types::{ConnectionId, DeliveryMode, EntityId},
    world::{access_level::OwnershipAccessLevel, behavior_mode::BehaviorMode, spawn_info::SpawnInfo},
};

/// An ownership request this peer sent and has not seen confirmed yet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handshake {
    Take,
    Release,
    Transfer { to: ConnectionId },
}

/// A peer's local view of one replicated entity
pub struct EntityRecord {
    info: SpawnInfo,
    mode: BehaviorMode,
    pending: Option<Handshake>,
    is_respawned: bool,
    handlers: ObjectHandlers<Outbox>,
}

impl EntityRecord {
    pub fn new(info: SpawnInfo, mode: BehaviorMode, is_respawned: bool) -> Self {
        Self {
            info,
            mode,
            pending: None,
            is_respawned,
            handlers: ObjectHandlers::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.info.entity
    }

    pub fn info(&self) -> &SpawnInfo {
        &self.info
    }

    pub fn mode(&self) -> BehaviorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BehaviorMode) {
        self.mode = mode;
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_active()
    }

    pub fn is_passive(&self) -> bool {
        self.mode.is_passive()
    }

    pub fn pending(&self) -> Option<Handshake> {
        self.pending
    }

    pub fn set_pending(&mut self, handshake: Handshake) {
        self.pending = Some(handshake);
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    pub fn is_player(&self) -> bool {
        self.info.is_player
    }

    pub fn owner(&self) -> Option<ConnectionId> {
        self.info.owner
    }

    pub fn access_level(&self) -> OwnershipAccessLevel {
        self.info.access
    }

    pub fn delivery(&self) -> DeliveryMode {
        self.info.delivery
    }

    pub fn prefab(&self) -> u32 {
        self.info.prefab
    }

    pub fn is_respawned(&self) -> bool {
        self.is_respawned
    }

    pub fn handlers(&self) -> &ObjectHandlers<Outbox> {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut ObjectHandlers<Outbox> {
        &mut self.handlers
    }
}
