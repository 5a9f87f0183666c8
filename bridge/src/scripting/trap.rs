//! Dynamic property trap
//!
//! Mounts any [`PropertyStore`] on a script object with an open-ended set of
//! property names. Rhai falls back to a string indexer when a property has
//! no getter/setter, so `obj.health` and `obj["health"]` both route here.

use crate::meta::{read_store, write_store, MetaError, PropertyStore, SharedStore};
use crate::value::{Value, ValueMap};
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString};
use std::fmt;
use tracing::{debug, trace};

/// Script-visible live view over a metadata store
#[derive(Clone)]
pub struct PropertyTrap {
    store: SharedStore<dyn PropertyStore>,
}

impl PropertyTrap {
    pub fn new(store: SharedStore<dyn PropertyStore>) -> Self {
        Self { store }
    }

    /// Read a property; absent keys read as unit
    pub fn read(&self, key: &str) -> Dynamic {
        match read_store(&self.store).get(key) {
            Some(value) => value.to_dynamic(),
            None => Dynamic::UNIT,
        }
    }

    /// Write a property
    ///
    /// Returns `Ok(false)` when the value has no generic representation; the
    /// store is left untouched in that case.
    pub fn write(&self, key: &str, value: &Dynamic) -> Result<bool, MetaError> {
        let Some(value) = Value::from_dynamic(value) else {
            debug!(key, type_name = value.type_name(), "Ignoring unconvertible property write");
            return Ok(false);
        };
        write_store(&self.store).set(key, value)?;
        trace!(key, "Property written");
        Ok(true)
    }

    pub fn remove(&self, key: &str) -> Result<bool, MetaError> {
        write_store(&self.store).delete(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        read_store(&self.store).has(key)
    }

    /// Snapshot of the property names
    pub fn keys(&self) -> Vec<String> {
        read_store(&self.store).keys()
    }

    /// Copy of every entry as a map value
    pub fn snapshot(&self) -> Value {
        let store = read_store(&self.store);
        let entries: ValueMap = store
            .keys()
            .into_iter()
            .filter_map(|key| store.get(&key).map(|value| (key, value)))
            .collect();
        Value::Map(entries)
    }
}

impl fmt::Debug for PropertyTrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTrap")
            .field("keys", &self.keys())
            .finish()
    }
}

fn precondition(err: MetaError) -> Box<EvalAltResult> {
    err.to_string().into()
}

/// Register the property trap type with a Rhai engine
pub fn register_trap_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<PropertyTrap>("PropertyTrap")
        .register_indexer_get(|trap: &mut PropertyTrap, key: ImmutableString| trap.read(&key))
        .register_indexer_set(
            |trap: &mut PropertyTrap,
             key: ImmutableString,
             value: Dynamic|
             -> Result<(), Box<EvalAltResult>> {
                trap.write(&key, &value).map(|_| ()).map_err(precondition)
            },
        )
        .register_fn(
            "remove",
            |trap: &mut PropertyTrap, key: ImmutableString| -> Result<bool, Box<EvalAltResult>> {
                trap.remove(&key).map_err(precondition)
            },
        )
        .register_fn("contains", |trap: &mut PropertyTrap, key: ImmutableString| {
            trap.contains(&key)
        })
        .register_fn("keys", |trap: &mut PropertyTrap| -> rhai::Array {
            trap.keys().into_iter().map(Dynamic::from).collect()
        })
        .register_fn("len", |trap: &mut PropertyTrap| trap.keys().len() as i64)
        .register_fn("to_string", |trap: &mut PropertyTrap| format!("{trap:?}"))
        .register_fn("to_debug", |trap: &mut PropertyTrap| format!("{trap:?}"));
}
