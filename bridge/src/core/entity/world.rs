//! World wrapper providing helper methods for entity management

use super::components::{BaseObjectType, EntityId, Meta, Name, SyncedMeta};
use crate::meta::{write_store, MetaData, SharedStore, SyncedMetaData};
use crate::net::{MetaOwner, OutboundQueue};
use hecs::Entity;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// World shared between the host and script modules
pub type SharedWorld = Arc<RwLock<World>>;

/// Errors from world bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("Entity id {0} is already in use")]
    DuplicateId(EntityId),
}

/// Wrapper around hecs::World that owns entity identity and metadata
///
/// Every entity gets an [`EntityId`], a [`BaseObjectType`], and two metadata
/// stores created empty at spawn time and closed at despawn.
pub struct World {
    inner: hecs::World,
    index: HashMap<EntityId, Entity>,
    next_id: u64,
    outbox: OutboundQueue,
}

impl World {
    /// Create a new empty world whose synced stores queue into `outbox`
    pub fn new(outbox: OutboundQueue) -> Self {
        Self {
            inner: hecs::World::new(),
            index: HashMap::new(),
            next_id: 1,
            outbox,
        }
    }

    /// Wrap the world for sharing with script modules
    pub fn into_shared(self) -> SharedWorld {
        Arc::new(RwLock::new(self))
    }

    /// Spawn a new entity with a freshly allocated id
    pub fn spawn(&mut self, kind: BaseObjectType) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.spawn_entity(id, kind);
        id
    }

    /// Spawn an entity under an id chosen elsewhere, e.g. mirrored from a peer
    pub fn spawn_with_id(
        &mut self,
        id: EntityId,
        kind: BaseObjectType,
    ) -> Result<EntityId, WorldError> {
        if self.index.contains_key(&id) {
            return Err(WorldError::DuplicateId(id));
        }
        self.next_id = self.next_id.max(id.0 + 1);
        self.spawn_entity(id, kind);
        Ok(id)
    }

    fn spawn_entity(&mut self, id: EntityId, kind: BaseObjectType) {
        let meta = Meta(MetaData::shared());
        let synced = SyncedMeta(SyncedMetaData::shared(
            MetaOwner::Entity(id),
            self.outbox.clone(),
        ));
        let entity = self.inner.spawn((id, kind, meta, synced));
        self.index.insert(id, entity);
        debug!(entity = id.0, kind = kind.as_str(), "Spawned entity");
    }

    /// Despawn an entity, destroying its metadata
    ///
    /// Script objects may still hold the stores; they are closed so nothing
    /// can be read, written or replicated through them afterwards.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.index.remove(&id) else {
            return false;
        };

        if let Ok(meta) = self.inner.get::<&Meta>(entity) {
            write_store(&meta.0).close();
        }
        if let Ok(synced) = self.inner.get::<&SyncedMeta>(entity) {
            write_store(&synced.0).close();
        }

        let removed = self.inner.despawn(entity).is_ok();
        debug!(entity = id.0, "Despawned entity");
        removed
    }

    /// Check if an entity exists
    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All live entity ids in ascending order
    pub fn entities(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.index.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn kind(&self, id: EntityId) -> Option<BaseObjectType> {
        let entity = *self.index.get(&id)?;
        self.inner
            .get::<&BaseObjectType>(entity)
            .ok()
            .map(|kind| *kind)
    }

    /// Local metadata store of an entity
    pub fn meta(&self, id: EntityId) -> Option<SharedStore<MetaData>> {
        let entity = *self.index.get(&id)?;
        self.inner
            .get::<&Meta>(entity)
            .ok()
            .map(|meta| meta.0.clone())
    }

    /// Replicated metadata store of an entity
    pub fn synced_meta(&self, id: EntityId) -> Option<SharedStore<SyncedMetaData>> {
        let entity = *self.index.get(&id)?;
        self.inner
            .get::<&SyncedMeta>(entity)
            .ok()
            .map(|synced| synced.0.clone())
    }

    pub fn set_name(&mut self, id: EntityId, name: impl Into<String>) -> bool {
        match self.index.get(&id) {
            Some(&entity) => self.inner.insert_one(entity, Name::new(name)).is_ok(),
            None => false,
        }
    }

    pub fn name(&self, id: EntityId) -> Option<String> {
        let entity = *self.index.get(&id)?;
        self.inner
            .get::<&Name>(entity)
            .ok()
            .map(|name| name.0.clone())
    }

    /// Get access to the inner hecs::World for advanced operations
    pub fn inner(&self) -> &hecs::World {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{read_store, PropertyStore};
    use crate::value::Value;

    fn world() -> (World, OutboundQueue) {
        let outbox = OutboundQueue::default();
        (World::new(outbox.clone()), outbox)
    }

    #[test]
    fn test_world_spawn() {
        let (mut world, _) = world();
        let a = world.spawn(BaseObjectType::Vehicle);
        let b = world.spawn(BaseObjectType::Ped);

        assert_ne!(a, b);
        assert!(world.contains(a));
        assert_eq!(world.kind(b), Some(BaseObjectType::Ped));
        assert_eq!(world.entities(), vec![a, b]);
    }

    #[test]
    fn test_new_entity_has_empty_stores() {
        let (mut world, _) = world();
        let id = world.spawn(BaseObjectType::Object);

        assert!(read_store(&world.meta(id).unwrap()).is_empty());
        assert!(read_store(&world.synced_meta(id).unwrap()).is_empty());
    }

    #[test]
    fn test_spawn_with_id_rejects_duplicates() {
        let (mut world, _) = world();
        let id = world.spawn_with_id(EntityId(10), BaseObjectType::Player).unwrap();
        assert_eq!(
            world.spawn_with_id(id, BaseObjectType::Player),
            Err(WorldError::DuplicateId(id))
        );

        // Allocation continues past mirrored ids
        assert_eq!(world.spawn(BaseObjectType::Player), EntityId(11));
    }

    #[test]
    fn test_despawn_clears_metadata() {
        let (mut world, outbox) = world();
        let id = world.spawn(BaseObjectType::Object);
        let meta = world.meta(id).unwrap();
        let synced = world.synced_meta(id).unwrap();
        write_store(&meta).set("a", Value::Bool(true)).unwrap();
        write_store(&synced).set("b", Value::Bool(true)).unwrap();

        assert!(world.despawn(id));
        assert!(!world.contains(id));
        assert!(world.meta(id).is_none());
        assert!(read_store(&meta).is_closed());
        assert!(read_store(&synced).is_closed());
        assert!(write_store(&synced).set("b", Value::Bool(false)).is_err());

        // Only the set was queued, despawn does not broadcast deletes
        assert_eq!(outbox.lock().unwrap().len(), 1);
        assert!(!world.despawn(id));
    }

    #[test]
    fn test_entity_names() {
        let (mut world, _) = world();
        let id = world.spawn(BaseObjectType::Player);
        assert_eq!(world.name(id), None);
        assert!(world.set_name(id, "Alice"));
        assert_eq!(world.name(id), Some("Alice".to_string()));
        assert!(!world.set_name(EntityId(999), "Nobody"));
    }
}
