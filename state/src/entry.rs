//! Timestamped, tombstoned replica entries

use driftkv_core::Timestamp;
use serde::{Deserialize, Serialize};

/// A single replicated key-value entry.
///
/// Entries are never physically removed from a replica; a delete only
/// stamps `delete_time`. The entry is visible while `delete_time` is not
/// strictly after `add_time`, so a later set with a fresher `add_time`
/// resurrects a deleted key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub add_time: Timestamp,
    pub delete_time: Timestamp,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, add_time: Timestamp) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            add_time,
            delete_time: None,
        }
    }

    /// A pure tombstone for a key this replica never saw a value for.
    pub fn tombstone(key: impl Into<String>, delete_time: Timestamp) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
            add_time: None,
            delete_time,
        }
    }

    /// Whether the entry is currently tombstoned.
    pub fn is_deleted(&self) -> bool {
        self.delete_time > self.add_time
    }

    /// Merge `incoming` into this entry, producing the merged entry and
    /// whether anything changed.
    ///
    /// Last writer wins per field: value and `add_time` move as one unit,
    /// `delete_time` as another. The incoming side wins a field only when
    /// its timestamp is strictly after the local one; ties keep the local
    /// side.
    ///
    /// # Panics
    ///
    /// Panics if the keys differ. Entries for different keys reaching the
    /// same merge is a routing bug, not a runtime condition.
    pub fn merge(&self, incoming: &Entry) -> (Entry, bool) {
        if self.key != incoming.key {
            panic!(
                "keys {} and {} don't match on merge",
                self.key, incoming.key
            );
        }

        let mut changed = false;
        let mut merged = self.clone();
        if incoming.add_time > self.add_time {
            merged.value = incoming.value.clone();
            merged.add_time = incoming.add_time;
            changed = true;
        }
        if incoming.delete_time > self.delete_time {
            merged.delete_time = incoming.delete_time;
            changed = true;
        }
        (merged, changed)
    }
}
