//! In-process transport
//!
//! A fully-connected hub wiring peers' delivery hooks together inside one
//! process: broadcast fan-out plus a pairwise anti-entropy pass. Used by
//! convergence tests and by local single-process wiring; a networked
//! mesh transport replaces it in a real deployment.

use driftkv_core::{DriftResult, PeerName};
use driftkv_state::Snapshot;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::delivery::Delivery;
use crate::transport::{Broadcast, SharedBroadcast};

struct HubPeer {
    name: PeerName,
    delivery: Arc<Delivery>,
}

/// Hub connecting every attached peer to every other.
pub struct LocalHub {
    peers: RwLock<Vec<HubPeer>>,
}

impl LocalHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            peers: RwLock::new(Vec::new()),
        })
    }

    /// Attach a peer's delivery hooks and get back the broadcast handle
    /// bound to that peer's identity.
    pub fn attach(
        self: &Arc<Self>,
        name: PeerName,
        delivery: Arc<Delivery>,
    ) -> SharedBroadcast {
        self.peers.write().push(HubPeer {
            name: name.clone(),
            delivery,
        });
        Arc::new(HubBroadcast {
            origin: name,
            hub: Arc::clone(self),
        })
    }

    pub fn peer_count(&self) -> usize {
        self.peers.read().len()
    }

    /// Deliver an encoded snapshot from `origin` to every other peer.
    /// The hub is fully connected, so the broadcast-receipt ack needs no
    /// onward propagation.
    fn broadcast_from(&self, origin: &PeerName, snapshot: &Snapshot) {
        let buf = match snapshot.encode() {
            Ok(buf) => buf,
            Err(e) => {
                warn!(%origin, "dropping broadcast, encode failed: {e}");
                return;
            }
        };

        for peer in self.peers.read().iter() {
            if peer.name == *origin {
                continue;
            }
            match peer.delivery.on_broadcast(origin, &buf) {
                Ok(ack) => debug!(from = %origin, to = %peer.name, changed = ack.len(), "broadcast delivered"),
                Err(e) => warn!(from = %origin, to = %peer.name, "broadcast rejected: {e}"),
            }
        }
    }

    /// One round of pairwise full-state reconciliation: every peer's
    /// complete snapshot is offered to every other peer.
    pub fn anti_entropy(&self) -> DriftResult<()> {
        let peers = self.peers.read();
        for source in peers.iter() {
            let buf = source.delivery.full_state()?;
            for target in peers.iter() {
                if target.name == source.name {
                    continue;
                }
                match target.delivery.on_full_state(&buf)? {
                    Some(delta) => {
                        debug!(from = %source.name, to = %target.name, changed = delta.len(), "anti-entropy applied")
                    }
                    None => {
                        debug!(from = %source.name, to = %target.name, "anti-entropy no delta")
                    }
                }
            }
        }
        Ok(())
    }
}

struct HubBroadcast {
    origin: PeerName,
    hub: Arc<LocalHub>,
}

impl Broadcast for HubBroadcast {
    fn broadcast(&self, snapshot: &Snapshot) {
        self.hub.broadcast_from(&self.origin, snapshot);
    }
}
