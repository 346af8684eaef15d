//! Inbound delivery glue
//!
//! Translates the four transport events into calls against the store's
//! merge entry points. Merges bypass the command actor: the replica's own
//! lock serializes them against local mutations and concurrent reads.

use driftkv_core::{DriftResult, PeerName};
use driftkv_state::{SharedReplica, Snapshot};
use tracing::debug;

/// The hooks a dissemination transport drives on receipt of peer state.
pub struct Delivery {
    replica: SharedReplica,
}

impl Delivery {
    pub fn new(replica: SharedReplica) -> Self {
        Self { replica }
    }

    /// Full-state pull: the encoded complete current snapshot, handed to
    /// the transport for periodic reconciliation with a peer.
    pub fn full_state(&self) -> DriftResult<Vec<u8>> {
        let snapshot = self.replica.snapshot();
        debug!(entries = snapshot.len(), "full state pulled");
        snapshot.encode()
    }

    /// Full-state receipt: merge a peer's complete state. A `Some` result
    /// is the changed subset, to be disseminated onward; `None` means
    /// nothing changed and dissemination stops here.
    pub fn on_full_state(&self, buf: &[u8]) -> DriftResult<Option<Snapshot>> {
        let incoming = Snapshot::decode(buf)?;
        let delta = self.replica.merge_delta(incoming);
        match &delta {
            Some(snapshot) => debug!(changed = snapshot.len(), "full state receipt merged"),
            None => debug!("full state receipt produced no delta"),
        }
        Ok(delta)
    }

    /// Broadcast receipt: merge gossiped state. Always yields a concrete
    /// (possibly empty) snapshot to acknowledge receipt with.
    pub fn on_broadcast(&self, src: &PeerName, buf: &[u8]) -> DriftResult<Snapshot> {
        let incoming = Snapshot::decode(buf)?;
        let received = self.replica.merge_received(incoming);
        debug!(%src, changed = received.len(), "broadcast receipt merged");
        Ok(received)
    }

    /// Direct (unicast) receipt: merge fully; the result is applied
    /// locally and not propagated further.
    pub fn on_unicast(&self, src: &PeerName, buf: &[u8]) -> DriftResult<()> {
        let incoming = Snapshot::decode(buf)?;
        let complete = self.replica.merge_complete(incoming);
        debug!(%src, entries = complete.len(), "unicast receipt merged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use driftkv_core::Timestamp;
    use driftkv_state::{create_replica, Entry};
    use std::collections::BTreeMap;

    fn ts(secs: i64) -> Timestamp {
        Some(Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn encoded(entries: Vec<Entry>) -> Vec<u8> {
        let map: BTreeMap<String, Entry> =
            entries.into_iter().map(|e| (e.key.clone(), e)).collect();
        Snapshot::from_entries(map).encode().unwrap()
    }

    #[test]
    fn test_decode_failure_leaves_state_untouched() {
        let replica = create_replica();
        replica.set("a", "1");
        let delivery = Delivery::new(replica.clone());

        assert!(delivery.on_full_state(b"{garbage").is_err());
        assert!(delivery.on_broadcast(&PeerName::new("b"), b"{garbage").is_err());
        assert!(delivery.on_unicast(&PeerName::new("b"), b"{garbage").is_err());
        assert_eq!(replica.get("a"), Some("1".to_string()));
        assert_eq!(replica.len(), 1);
    }

    #[test]
    fn test_full_state_round_trips_through_pull() {
        let replica = create_replica();
        replica.set("a", "1");
        let delivery = Delivery::new(replica);

        let buf = delivery.full_state().unwrap();
        let decoded = Snapshot::decode(&buf).unwrap();
        assert_eq!(decoded.get("a"), Some("1"));
    }

    #[test]
    fn test_full_state_receipt_signals_no_delta() {
        let replica = create_replica();
        let delivery = Delivery::new(replica);
        let buf = encoded(vec![Entry::new("x", "1", ts(1))]);

        let first = delivery.on_full_state(&buf).unwrap();
        assert_eq!(first.unwrap().get("x"), Some("1"));

        // Same buffer again: dissemination must stop here.
        assert!(delivery.on_full_state(&buf).unwrap().is_none());
    }

    #[test]
    fn test_broadcast_receipt_always_acknowledges() {
        let replica = create_replica();
        let delivery = Delivery::new(replica);
        let src = PeerName::new("remote");
        let buf = encoded(vec![Entry::new("x", "1", ts(1))]);

        let ack = delivery.on_broadcast(&src, &buf).unwrap();
        assert_eq!(ack.len(), 1);

        let duplicate_ack = delivery.on_broadcast(&src, &buf).unwrap();
        assert!(duplicate_ack.is_empty());
    }

    #[test]
    fn test_unicast_receipt_applies_without_result() {
        let replica = create_replica();
        let delivery = Delivery::new(replica.clone());
        let buf = encoded(vec![Entry::new("x", "1", ts(1))]);

        delivery.on_unicast(&PeerName::new("remote"), &buf).unwrap();
        assert_eq!(replica.get("x"), Some("1".to_string()));
    }
}
