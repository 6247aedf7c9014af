use naia_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    types::{ConnectionId, DeliveryMode, EntityId},
    world::{access_level::OwnershipAccessLevel, behavior_mode::BehaviorMode},
};

/// Everything a peer needs to create its local view of an entity
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnInfo {
    pub entity: EntityId,
    /// Application prefab id, opaque to the middleware
    pub prefab: u32,
    pub behavior: BehaviorMode,
    pub delivery: DeliveryMode,
    pub access: OwnershipAccessLevel,
    /// Player-bound entities never change authority
    pub is_player: bool,
    /// Connection the player entity belongs to
    pub owner: Option<ConnectionId>,
    /// Connection that is Active for the entity when the spawn is sent
    pub controller: ConnectionId,
}

impl SpawnInfo {
    pub fn new(entity: EntityId, prefab: u32, controller: ConnectionId) -> Self {
        Self {
            entity,
            prefab,
            behavior: BehaviorMode::ActiveOnly,
            delivery: DeliveryMode::Reliable,
            access: OwnershipAccessLevel::Full,
            is_player: false,
            owner: None,
            controller,
        }
    }

    /// A player entity owned and controlled by `owner`
    pub fn player(entity: EntityId, prefab: u32, owner: ConnectionId) -> Self {
        Self {
            is_player: true,
            owner: Some(owner),
            ..Self::new(entity, prefab, owner)
        }
    }

    pub fn with_access(mut self, access: OwnershipAccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorMode) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Mode the peer at `local` starts in
    pub fn initial_mode(&self, local: ConnectionId) -> BehaviorMode {
        match self.behavior {
            BehaviorMode::Both => BehaviorMode::Both,
            _ if self.controller == local => BehaviorMode::ActiveOnly,
            _ => BehaviorMode::PassiveOnly,
        }
    }
}

impl Serde for SpawnInfo {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.entity.ser(writer);
        self.prefab.ser(writer);
        self.behavior.ser(writer);
        self.delivery.ser(writer);
        self.access.ser(writer);
        self.is_player.ser(writer);
        self.owner.ser(writer);
        self.controller.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            entity: EntityId::de(reader)?,
            prefab: u32::de(reader)?,
            behavior: BehaviorMode::de(reader)?,
            delivery: DeliveryMode::de(reader)?,
            access: OwnershipAccessLevel::de(reader)?,
            is_player: bool::de(reader)?,
            owner: Option::<ConnectionId>::de(reader)?,
            controller: ConnectionId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.entity.bit_length()
            + self.prefab.bit_length()
            + self.behavior.bit_length()
            + self.delivery.bit_length()
            + self.access.bit_length()
            + self.is_player.bit_length()
            + self.owner.bit_length()
            + self.controller.bit_length()
    }
}
