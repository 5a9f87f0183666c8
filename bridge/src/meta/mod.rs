//! Key/value metadata attached to entities and to the shared scope
//!
//! Two store flavours share one contract, [`PropertyStore`]: the local
//! [`MetaData`] map and the replicated [`SyncedMetaData`] map. Scripts see
//! both through the same property trap.

mod store;
mod synced;

pub use store::{read_store, write_store, MetaData, MetaError, PropertyStore, SharedStore};
pub use synced::{Origin, SyncedMetaData};
