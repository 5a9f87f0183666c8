//! Entity-Component System (ECS) functionality
//!
//! Entities are simulated objects in the shared world. Each one carries a
//! world-stable id, a base object type, and its metadata stores.

pub mod components;
pub mod world;

// Re-export commonly used types
pub use components::{BaseObjectType, EntityId, Meta, Name, SyncedMeta};
pub use world::{SharedWorld, World, WorldError};
