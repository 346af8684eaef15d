//! The replicated state store

use driftkv_core::now;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

use crate::entry::Entry;
use crate::snapshot::Snapshot;

/// A peer's full local replica of the key-value mapping.
///
/// Readers take the shared lock and may run concurrently; any mutation
/// (a local set/delete or a transport-triggered merge) takes the
/// exclusive lock. Lock hold time is bounded by the size of the incoming
/// batch; no I/O happens under the lock, broadcasting operates on the
/// snapshot returned after release.
pub struct Replica {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl Replica {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Visible value for a key: present and not tombstoned.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| !entry.is_deleted())
            .map(|entry| entry.value.clone())
    }

    /// All visible key-value pairs.
    pub fn get_all(&self) -> BTreeMap<String, String> {
        self.entries
            .read()
            .values()
            .filter(|entry| !entry.is_deleted())
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }

    /// Total number of entries, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Insert or overwrite a key, stamping `add_time` with the current
    /// wall clock. Any existing `delete_time` is preserved untouched, so
    /// the fresher add wins over the older tombstone everywhere the entry
    /// propagates.
    pub fn set(&self, key: &str, value: &str) -> Snapshot {
        let mut entries = self.entries.write();
        let delete_time = entries.get(key).and_then(|existing| existing.delete_time);
        entries.insert(
            key.to_string(),
            Entry {
                key: key.to_string(),
                value: value.to_string(),
                add_time: now(),
                delete_time,
            },
        );
        Snapshot::from_entries(entries.clone())
    }

    /// Tombstone a key, stamping `delete_time` with the current wall
    /// clock. Prior value and `add_time` are preserved; a key this
    /// replica never saw becomes a pure tombstone.
    pub fn delete(&self, key: &str) -> Snapshot {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(existing) => existing.delete_time = now(),
            None => {
                entries.insert(key.to_string(), Entry::tombstone(key, now()));
            }
        }
        Snapshot::from_entries(entries.clone())
    }

    /// Point-in-time snapshot of the full replica.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_entries(self.entries.read().clone())
    }

    /// Merge every incoming entry, keeping whichever side is fresher per
    /// field. Always returns the full post-merge snapshot. Used for
    /// full-state reconciliation and direct delivery.
    pub fn merge_complete(&self, incoming: Snapshot) -> Snapshot {
        let mut entries = self.entries.write();
        for (key, incoming_entry) in incoming.into_entries() {
            let merged = match entries.get(&key) {
                Some(existing) => existing.merge(&incoming_entry).0,
                None => incoming_entry,
            };
            entries.insert(key, merged);
        }
        Snapshot::from_entries(entries.clone())
    }

    /// Merge incoming entries and return only those that changed this
    /// replica, or `None` when nothing changed. The `None` marker is what
    /// stops redundant re-dissemination.
    pub fn merge_delta(&self, incoming: Snapshot) -> Option<Snapshot> {
        let delta = self.merge_changed(incoming);
        if delta.is_empty() {
            trace!("merge produced no delta");
            return None;
        }
        Some(Snapshot::from_entries(delta))
    }

    /// Merge incoming entries with the same change filtering as
    /// [`Replica::merge_delta`], but always yield a concrete (possibly
    /// empty) snapshot; the caller must acknowledge receipt with a value.
    pub fn merge_received(&self, incoming: Snapshot) -> Snapshot {
        Snapshot::from_entries(self.merge_changed(incoming))
    }

    /// Apply incoming entries under the exclusive lock and collect the
    /// post-merge form of every entry that changed the replica. The
    /// caller's input is never mutated; the changed subset is an explicit
    /// return value.
    fn merge_changed(&self, incoming: Snapshot) -> BTreeMap<String, Entry> {
        let mut entries = self.entries.write();
        let mut delta = BTreeMap::new();
        for (key, incoming_entry) in incoming.into_entries() {
            match entries.get(&key) {
                Some(existing) => {
                    let (merged, changed) = existing.merge(&incoming_entry);
                    if changed {
                        entries.insert(key.clone(), merged.clone());
                        delta.insert(key, merged);
                    }
                }
                None => {
                    entries.insert(key.clone(), incoming_entry.clone());
                    delta.insert(key, incoming_entry);
                }
            }
        }
        delta
    }
}

impl Default for Replica {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared replica handle
pub type SharedReplica = Arc<Replica>;

/// Create a shared replica
pub fn create_replica() -> SharedReplica {
    Arc::new(Replica::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use driftkv_core::Timestamp;
    use std::thread::sleep;
    use std::time::Duration;

    fn ts(secs: i64) -> Timestamp {
        Some(Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn incoming(entries: Vec<Entry>) -> Snapshot {
        Snapshot::from_entries(
            entries
                .into_iter()
                .map(|e| (e.key.clone(), e))
                .collect(),
        )
    }

    // Wall-clock stamps must be strictly ordered between steps.
    fn tick() {
        sleep(Duration::from_millis(2));
    }

    #[test]
    fn test_set_delete_resurrect() {
        let replica = Replica::new();

        replica.set("a", "1");
        assert_eq!(replica.get("a"), Some("1".to_string()));

        tick();
        replica.delete("a");
        assert_eq!(replica.get("a"), None);

        tick();
        replica.set("a", "2");
        assert_eq!(replica.get("a"), Some("2".to_string()));
    }

    #[test]
    fn test_delete_unknown_key_creates_tombstone() {
        let replica = Replica::new();
        let snapshot = replica.delete("ghost");

        assert_eq!(replica.get("ghost"), None);
        assert_eq!(replica.len(), 1);
        assert!(snapshot.entries().get("ghost").unwrap().is_deleted());
    }

    #[test]
    fn test_set_preserves_tombstone_timestamp() {
        let replica = Replica::new();
        replica.delete("a");
        tick();
        let snapshot = replica.set("a", "1");

        let entry = snapshot.entries().get("a").unwrap();
        assert!(entry.delete_time.is_some());
        assert!(entry.add_time > entry.delete_time);
    }

    #[test]
    fn test_get_all_hides_tombstones() {
        let replica = Replica::new();
        replica.set("a", "1");
        replica.set("b", "2");
        tick();
        replica.delete("b");

        let all = replica.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("a"), Some(&"1".to_string()));
        // The tombstone is retained internally.
        assert_eq!(replica.len(), 2);
    }

    #[test]
    fn test_merge_complete_newer_wins() {
        let replica = Replica::new();
        replica.merge_complete(incoming(vec![Entry::new("x", "1", ts(1))]));

        let snapshot =
            replica.merge_complete(incoming(vec![Entry::new("x", "2", ts(2))]));

        assert_eq!(replica.get("x"), Some("2".to_string()));
        assert_eq!(snapshot.get("x"), Some("2"));
    }

    #[test]
    fn test_merge_complete_converges_both_orders() {
        let ops_a = vec![Entry::new("x", "1", ts(1)), Entry::new("y", "only-a", ts(3))];
        let ops_b = vec![Entry::new("x", "2", ts(2)), Entry::tombstone("z", ts(1))];

        let a = Replica::new();
        a.merge_complete(incoming(ops_a.clone()));
        let b = Replica::new();
        b.merge_complete(incoming(ops_b.clone()));

        // Exchange full state in both directions, either replica first.
        a.merge_complete(b.snapshot());
        b.merge_complete(a.snapshot());

        for key in ["x", "y", "z"] {
            assert_eq!(a.get(key), b.get(key), "replicas disagree on {key}");
        }
        assert_eq!(a.get("x"), Some("2".to_string()));
        assert_eq!(a.get("y"), Some("only-a".to_string()));
        assert_eq!(a.get("z"), None);
    }

    #[test]
    fn test_merge_delta_reports_only_changes() {
        let replica = Replica::new();
        replica.merge_complete(incoming(vec![
            Entry::new("fresh", "local", ts(5)),
            Entry::new("stale", "local", ts(1)),
        ]));

        let delta = replica
            .merge_delta(incoming(vec![
                Entry::new("fresh", "remote", ts(2)), // older, no-op
                Entry::new("stale", "remote", ts(3)), // fresher, applied
                Entry::new("new", "remote", ts(1)),   // unseen, applied
            ]))
            .expect("two entries changed");

        assert_eq!(delta.len(), 2);
        assert_eq!(delta.get("stale"), Some("remote"));
        assert_eq!(delta.get("new"), Some("remote"));
        assert!(delta.entries().get("fresh").is_none());
    }

    #[test]
    fn test_merge_delta_idempotent_second_pass_is_none() {
        let replica = Replica::new();
        let batch = incoming(vec![Entry::new("a", "1", ts(1)), Entry::new("b", "2", ts(2))]);

        assert!(replica.merge_delta(batch.clone()).is_some());
        assert!(replica.merge_delta(batch).is_none());
    }

    #[test]
    fn test_merge_received_always_returns_snapshot() {
        let replica = Replica::new();
        let batch = incoming(vec![Entry::new("a", "1", ts(1))]);

        let first = replica.merge_received(batch.clone());
        assert_eq!(first.len(), 1);

        // Duplicate delivery: empty but present, never a "no delta" marker.
        let second = replica.merge_received(batch);
        assert!(second.is_empty());
    }

    #[test]
    fn test_merge_tombstone_precedence() {
        let replica = Replica::new();
        replica.set("a", "1");

        let mut tombstoned = replica.snapshot().into_entries();
        let entry = tombstoned.get_mut("a").unwrap();
        entry.delete_time = entry.add_time.map(|t| t + chrono::Duration::seconds(1));

        replica.merge_complete(Snapshot::from_entries(tombstoned));
        assert_eq!(replica.get("a"), None);
    }

    #[test]
    fn test_snapshot_does_not_alias_live_state() {
        let replica = Replica::new();
        replica.set("a", "1");

        let snapshot = replica.snapshot();
        tick();
        replica.set("a", "2");

        assert_eq!(snapshot.get("a"), Some("1"));
        assert_eq!(replica.get("a"), Some("2".to_string()));
    }
}
