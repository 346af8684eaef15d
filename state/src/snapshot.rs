//! Immutable replica snapshots and their wire encoding

use driftkv_core::{DriftError, DriftResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entry::Entry;

/// An immutable, point-in-time view of a replica's full entry mapping.
///
/// Snapshots deep-copy the entries under the replica lock, so they never
/// alias live storage: encoding or broadcasting a snapshot is safe while
/// the replica keeps mutating on other threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    entries: BTreeMap<String, Entry>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn from_entries(entries: BTreeMap<String, Entry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &BTreeMap<String, Entry> {
        &self.entries
    }

    pub fn into_entries(self) -> BTreeMap<String, Entry> {
        self.entries
    }

    /// Visible value for a key, if present and not tombstoned.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_deleted())
            .map(|entry| entry.value.as_str())
    }

    /// Number of entries, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combine two snapshots into a new complete snapshot with the same
    /// per-entry rule the replica applies. Used for pairwise full-state
    /// reconciliation between peers.
    pub fn merge(&self, other: &Snapshot) -> Snapshot {
        let mut merged = self.entries.clone();
        for (key, incoming) in &other.entries {
            let next = match merged.get(key) {
                Some(existing) => existing.merge(incoming).0,
                None => incoming.clone(),
            };
            merged.insert(key.clone(), next);
        }
        Snapshot { entries: merged }
    }

    /// Serialize the entry mapping to the self-describing wire format.
    pub fn encode(&self) -> DriftResult<Vec<u8>> {
        serde_json::to_vec(&self.entries).map_err(|e| DriftError::Encode(e.to_string()))
    }

    /// Deserialize a wire buffer back into a snapshot.
    pub fn decode(buf: &[u8]) -> DriftResult<Self> {
        let entries = serde_json::from_slice(buf).map_err(|e| DriftError::Decode(e.to_string()))?;
        Ok(Self { entries })
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
