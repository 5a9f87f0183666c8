//! Outbound queueing and inbound application of synced metadata

use super::{Inbox, MetaOwner, MetaTransport, OutboundQueue, PeerId, RemoteUpdate};
use crate::meta::{write_store, SharedStore, SyncedMetaData};
use std::sync::PoisonError;
use tracing::{debug, trace};

/// Per-peer replication endpoint
///
/// Synced stores push into the outbound queue; the host hands the queue to
/// the transport with [`flush`](Self::flush). Transports push received
/// updates into the inbox from any thread; the host applies them on the
/// script thread with [`pump`](Self::pump).
#[derive(Clone)]
pub struct Replicator {
    peer: PeerId,
    outbox: OutboundQueue,
    inbox: Inbox,
}

impl Replicator {
    pub fn new(peer: PeerId) -> Self {
        Self {
            peer,
            outbox: OutboundQueue::default(),
            inbox: Inbox::default(),
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Queue handle for synced stores owned by this peer
    pub fn outbox(&self) -> OutboundQueue {
        self.outbox.clone()
    }

    /// Number of updates waiting to be flushed
    pub fn pending_outbound(&self) -> usize {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of received updates waiting to be applied
    pub fn pending_inbound(&self) -> usize {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Entry point for transports delivering an update from `origin`
    pub fn on_remote_metadata_update(&self, update: super::MetaUpdate, origin: PeerId) {
        if origin == self.peer {
            trace!(peer = ?self.peer, key = update.key, "Ignoring self-delivered update");
            return;
        }
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(RemoteUpdate { update, origin });
    }

    /// Hand every queued update to `transport`, in the order they were queued
    pub fn flush(&self, transport: &dyn MetaTransport) -> usize {
        let updates = std::mem::take(
            &mut *self.outbox.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for update in &updates {
            transport.broadcast_metadata_update(update);
        }
        if !updates.is_empty() {
            debug!(peer = ?self.peer, count = updates.len(), "Flushed metadata updates");
        }
        updates.len()
    }

    /// Apply every received update in delivery order
    ///
    /// `lookup` maps an owner to its synced store. Updates for owners this
    /// peer does not know are dropped.
    pub fn pump<F>(&self, mut lookup: F) -> usize
    where
        F: FnMut(MetaOwner) -> Option<SharedStore<SyncedMetaData>>,
    {
        let updates: Vec<RemoteUpdate> = self
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        let mut applied = 0;
        for RemoteUpdate { update, origin } in updates {
            match lookup(update.owner) {
                Some(store) => {
                    write_store(&store).apply_remote(&update.key, update.value, origin);
                    applied += 1;
                }
                None => {
                    debug!(owner = ?update.owner, key = update.key, "Dropping update for unknown owner");
                }
            }
        }
        applied
    }
}
