//! Replication plumbing for synced metadata
//!
//! The wire transport itself lives outside this crate. What is defined here
//! is the boundary: the update message, the [`MetaTransport`] trait a
//! transport implements, and the [`Replicator`] that queues outbound updates
//! and buffers inbound ones until the script thread applies them.

pub mod loopback;
pub mod replication;

pub use loopback::{LoopbackHub, LoopbackTransport};
pub use replication::Replicator;

use crate::core::entity::EntityId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Identity of a peer on the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub u32);

/// Who a synced store belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaOwner {
    /// Process-wide metadata not bound to an entity
    Global,
    Entity(EntityId),
}

/// One replicated metadata change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaUpdate {
    pub owner: MetaOwner,
    pub key: String,
    /// `None` is a delete
    pub value: Option<Value>,
}

/// An update as delivered by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUpdate {
    pub update: MetaUpdate,
    pub origin: PeerId,
}

/// Updates waiting to be handed to the transport
pub type OutboundQueue = Arc<Mutex<Vec<MetaUpdate>>>;

/// Updates delivered by the transport, waiting for the script thread
pub type Inbox = Arc<Mutex<VecDeque<RemoteUpdate>>>;

/// Outbound half of a network transport
pub trait MetaTransport: Send + Sync {
    /// Send `update` to every other peer. Must not block on delivery.
    fn broadcast_metadata_update(&self, update: &MetaUpdate);
}
