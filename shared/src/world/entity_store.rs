use std::collections::{HashMap, HashSet};

use crate::{
    types::{ConnectionId, EntityId},
    world::{entity_record::EntityRecord, error::WorldError, spawn_info::SpawnInfo},
};

/// Every entity this peer knows about, keyed by id
pub struct EntityStore {
    entities: HashMap<EntityId, EntityRecord>,
    retired: HashSet<EntityId>,
    next_id: EntityId,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            retired: HashSet::new(),
            next_id: 1,
        }
    }

    /// Hands out the next id that is not live. Only the authority allocates.
    pub fn allocate_id(&mut self) -> EntityId {
        while self.entities.contains_key(&self.next_id) {
            self.next_id = self.next_id.wrapping_add(1).max(1);
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Creates the local view of an entity as seen from connection `local`.
    /// Reusing a despawned id marks the record as respawned.
    pub fn spawn(&mut self, info: SpawnInfo, local: ConnectionId) -> Result<&mut EntityRecord, WorldError> {
        let entity = info.entity;
        if self.entities.contains_key(&entity) {
            return Err(WorldError::EntityAlreadyExists { entity });
        }
        let is_respawned = self.retired.remove(&entity);
        let mode = info.initial_mode(local);
        Ok(self
            .entities
            .entry(entity)
            .or_insert(EntityRecord::new(info, mode, is_respawned)))
    }

    pub fn despawn(&mut self, entity: EntityId) -> Result<EntityRecord, WorldError> {
        let record = self
            .entities
            .remove(&entity)
            .ok_or(WorldError::EntityNotFound { entity })?;
        self.retired.insert(entity);
        Ok(record)
    }

    pub fn get(&self, entity: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&entity)
    }

    pub fn try_get(&self, entity: EntityId) -> Result<&EntityRecord, WorldError> {
        self.get(entity).ok_or(WorldError::EntityNotFound { entity })
    }

    pub fn try_get_mut(&mut self, entity: EntityId) -> Result<&mut EntityRecord, WorldError> {
        self.get_mut(entity).ok_or(WorldError::EntityNotFound { entity })
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Live ids in ascending order
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Ids this peer is currently Active for, ascending
    pub fn active_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|record| record.is_active())
            .map(EntityRecord::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
