//! Replicated metadata store

use super::store::{check_write, MetaError, PropertyStore, SharedStore};
use crate::net::{MetaOwner, MetaUpdate, OutboundQueue, PeerId};
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

/// Where the value currently held for a key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote(PeerId),
}

#[derive(Debug, Clone)]
struct SyncedEntry {
    value: Value,
    origin: Origin,
}

/// Metadata that is mirrored to every connected peer
///
/// Local writes are applied immediately and queued for broadcast; remote
/// writes are applied in arrival order and never queued again.
pub struct SyncedMetaData {
    owner: MetaOwner,
    entries: IndexMap<String, SyncedEntry>,
    outbox: OutboundQueue,
    closed: bool,
}

impl SyncedMetaData {
    pub fn new(owner: MetaOwner, outbox: OutboundQueue) -> Self {
        Self {
            owner,
            entries: IndexMap::new(),
            outbox,
            closed: false,
        }
    }

    /// Wrap a fresh store for sharing
    pub fn shared(owner: MetaOwner, outbox: OutboundQueue) -> SharedStore<SyncedMetaData> {
        Arc::new(RwLock::new(Self::new(owner, outbox)))
    }

    pub fn owner(&self) -> MetaOwner {
        self.owner
    }

    /// Origin of the value currently stored under `key`
    pub fn origin(&self, key: &str) -> Option<Origin> {
        self.entries.get(key).map(|entry| entry.origin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroy the store along with its owner
    ///
    /// Entries are dropped without notifying peers. Later local writes fail
    /// with [`MetaError::Destroyed`] and queue nothing; remote updates are
    /// ignored.
    pub fn close(&mut self) {
        self.entries.clear();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Apply an update received from `peer`
    ///
    /// `None` is a tombstone. Remote updates are last-writer-wins by arrival
    /// order and are not re-broadcast.
    pub fn apply_remote(&mut self, key: &str, value: Option<Value>, peer: PeerId) {
        if self.closed {
            trace!(owner = ?self.owner, key, ?peer, "Ignored update for destroyed store");
            return;
        }
        match value {
            Some(value) => {
                trace!(owner = ?self.owner, key, ?peer, "Applied remote metadata update");
                self.entries.insert(
                    key.to_string(),
                    SyncedEntry {
                        value,
                        origin: Origin::Remote(peer),
                    },
                );
            }
            None => {
                let removed = self.entries.shift_remove(key).is_some();
                trace!(owner = ?self.owner, key, ?peer, removed, "Applied remote metadata delete");
            }
        }
    }

    fn enqueue(&self, key: &str, value: Option<Value>) {
        let update = MetaUpdate {
            owner: self.owner,
            key: key.to_string(),
            value,
        };
        debug!(owner = ?self.owner, key, "Queued metadata replication");
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(update);
    }
}

impl PropertyStore for SyncedMetaData {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), MetaError> {
        check_write(key, self.closed)?;
        self.entries.insert(
            key.to_string(),
            SyncedEntry {
                value: value.clone(),
                origin: Origin::Local,
            },
        );
        self.enqueue(key, Some(value));
        Ok(())
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn delete(&mut self, key: &str) -> Result<bool, MetaError> {
        check_write(key, self.closed)?;
        let removed = self.entries.shift_remove(key).is_some();
        if removed {
            self.enqueue(key, None);
        }
        Ok(removed)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityId;

    fn store() -> (SyncedMetaData, OutboundQueue) {
        let outbox = OutboundQueue::default();
        (
            SyncedMetaData::new(MetaOwner::Entity(EntityId(1)), outbox.clone()),
            outbox,
        )
    }

    #[test]
    fn test_set_is_visible_before_replication() {
        let (mut store, outbox) = store();
        store.set("score", Value::Number(5.0)).unwrap();

        assert_eq!(store.get("score"), Some(Value::Number(5.0)));
        assert_eq!(store.origin("score"), Some(Origin::Local));

        let queued = outbox.lock().unwrap();
        assert_eq!(
            *queued,
            vec![MetaUpdate {
                owner: MetaOwner::Entity(EntityId(1)),
                key: "score".into(),
                value: Some(Value::Number(5.0)),
            }]
        );
    }

    #[test]
    fn test_delete_queues_tombstone_only_when_present() {
        let (mut store, outbox) = store();
        assert_eq!(store.delete("missing"), Ok(false));
        assert!(outbox.lock().unwrap().is_empty());

        store.set("score", Value::Number(1.0)).unwrap();
        assert_eq!(store.delete("score"), Ok(true));

        let queued = outbox.lock().unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[1].value, None);
    }

    #[test]
    fn test_remote_updates_are_not_requeued() {
        let (mut store, outbox) = store();
        store.apply_remote("score", Some(Value::Number(3.0)), PeerId(2));

        assert_eq!(store.get("score"), Some(Value::Number(3.0)));
        assert_eq!(store.origin("score"), Some(Origin::Remote(PeerId(2))));
        assert!(outbox.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remote_updates_apply_in_arrival_order() {
        let (mut store, _outbox) = store();
        store.apply_remote("score", Some(Value::Number(2.0)), PeerId(2));
        store.apply_remote("score", Some(Value::Number(1.0)), PeerId(3));

        assert_eq!(store.get("score"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_remote_tombstone_removes_entry() {
        let (mut store, outbox) = store();
        store.set("flag", Value::Bool(true)).unwrap();
        store.apply_remote("flag", None, PeerId(2));

        assert!(!store.has("flag"));
        assert_eq!(outbox.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_key_is_rejected_without_queueing() {
        let (mut store, outbox) = store();
        assert_eq!(store.set("", Value::Null), Err(MetaError::EmptyKey));
        assert!(outbox.lock().unwrap().is_empty());
    }

    #[test]
    fn test_closed_store_queues_nothing() {
        let (mut store, outbox) = store();
        store.set("score", Value::Number(1.0)).unwrap();
        store.close();

        assert_eq!(store.get("score"), None);
        assert_eq!(store.set("score", Value::Number(9.0)), Err(MetaError::Destroyed));
        assert_eq!(store.delete("score"), Err(MetaError::Destroyed));
        store.apply_remote("score", Some(Value::Number(2.0)), PeerId(2));

        assert!(store.is_empty());
        assert_eq!(outbox.lock().unwrap().len(), 1);
    }
}
