//! Local metadata store and the store capability trait

use crate::value::Value;
use indexmap::IndexMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Errors reported by metadata stores
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetaError {
    #[error("Metadata key must not be empty")]
    EmptyKey,
    #[error("Metadata store was destroyed with its owner")]
    Destroyed,
}

/// The four-operation capability every mountable store provides
pub trait PropertyStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), MetaError>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, returning whether an entry existed
    fn delete(&mut self, key: &str) -> Result<bool, MetaError>;

    /// Snapshot of the present keys in insertion order
    fn keys(&self) -> Vec<String>;
}

/// A store shared between its owner and the script objects mounted on it
pub type SharedStore<S> = Arc<RwLock<S>>;

/// Read-lock a store, recovering the guard if a previous holder panicked
pub fn read_store<S: ?Sized>(store: &RwLock<S>) -> RwLockReadGuard<'_, S> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-lock a store, recovering the guard if a previous holder panicked
pub fn write_store<S: ?Sized>(store: &RwLock<S>) -> RwLockWriteGuard<'_, S> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn check_write(key: &str, closed: bool) -> Result<(), MetaError> {
    if closed {
        Err(MetaError::Destroyed)
    } else if key.is_empty() {
        Err(MetaError::EmptyKey)
    } else {
        Ok(())
    }
}

/// Local-only metadata
#[derive(Debug, Clone, Default)]
pub struct MetaData {
    entries: IndexMap<String, Value>,
    closed: bool,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh store for sharing
    pub fn shared() -> SharedStore<MetaData> {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroy the store along with its owner
    ///
    /// Every entry is dropped and later writes fail with
    /// [`MetaError::Destroyed`].
    pub fn close(&mut self) {
        self.entries.clear();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl PropertyStore for MetaData {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), MetaError> {
        check_write(key, self.closed)?;
        trace!(key, value_type = value.type_name(), "Set metadata");
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn delete(&mut self, key: &str) -> Result<bool, MetaError> {
        check_write(key, self.closed)?;
        Ok(self.entries.shift_remove(key).is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
