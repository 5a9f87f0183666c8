//! In-process transport connecting several peers

use super::{MetaTransport, MetaUpdate, PeerId, Replicator};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// A fake network: every connected peer receives every other peer's updates
#[derive(Clone, Default)]
pub struct LoopbackHub {
    peers: Arc<RwLock<Vec<Replicator>>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a peer and return the transport it should flush into
    pub fn connect(&self, replicator: &Replicator) -> LoopbackTransport {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(replicator.clone());
        LoopbackTransport {
            hub: self.clone(),
            sender: replicator.peer(),
        }
    }

    pub fn peer_count(&self) -> usize {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One peer's view of a [`LoopbackHub`]
#[derive(Clone)]
pub struct LoopbackTransport {
    hub: LoopbackHub,
    sender: PeerId,
}

impl MetaTransport for LoopbackTransport {
    fn broadcast_metadata_update(&self, update: &MetaUpdate) {
        let peers = self
            .hub
            .peers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for peer in peers.iter().filter(|p| p.peer() != self.sender) {
            trace!(from = ?self.sender, to = ?peer.peer(), key = update.key, "Loopback delivery");
            peer.on_remote_metadata_update(update.clone(), self.sender);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityId;
    use crate::net::MetaOwner;
    use crate::value::Value;

    #[test]
    fn test_broadcast_skips_sender() {
        let hub = LoopbackHub::new();
        let a = Replicator::new(PeerId(1));
        let b = Replicator::new(PeerId(2));
        let c = Replicator::new(PeerId(3));
        let transport_a = hub.connect(&a);
        hub.connect(&b);
        hub.connect(&c);
        assert_eq!(hub.peer_count(), 3);

        transport_a.broadcast_metadata_update(&MetaUpdate {
            owner: MetaOwner::Entity(EntityId(1)),
            key: "score".into(),
            value: Some(Value::Number(5.0)),
        });

        assert_eq!(a.pending_inbound(), 0);
        assert_eq!(b.pending_inbound(), 1);
        assert_eq!(c.pending_inbound(), 1);
    }
}
