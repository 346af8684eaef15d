//! Core types for driftkv
//!
//! Defines the small shared data types used across the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wall-clock timestamp attached to replica entries.
///
/// `None` means "never happened" and orders before every concrete instant,
/// so `incoming > local` is exactly the strictly-after merge comparison.
pub type Timestamp = Option<DateTime<Utc>>;

/// Current wall-clock time as an entry timestamp.
pub fn now() -> Timestamp {
    Some(Utc::now())
}

/// Identifier of a peer in the gossip mesh
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerName(String);

impl PeerName {
    pub fn new(name: impl Into<String>) -> Self {
        PeerName(name.into())
    }

    /// Generate a random peer name, for nodes with no configured identity.
    pub fn random() -> Self {
        use rand::Rng;
        let suffix: u32 = rand::thread_rng().gen_range(0..0xffff_ffff);
        PeerName(format!("peer-{suffix:08x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PeerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerName({})", self.0)
    }
}

impl From<&str> for PeerName {
    fn from(s: &str) -> Self {
        PeerName(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_orders_before_any_instant() {
        let t: Timestamp = now();
        assert!(t > None);
        assert!(!(None > t));
    }

    #[test]
    fn test_peer_name_display() {
        let name = PeerName::new("node-a");
        assert_eq!(name.to_string(), "node-a");
        assert_eq!(name.as_str(), "node-a");
    }

    #[test]
    fn test_random_peer_names_differ() {
        assert_ne!(PeerName::random(), PeerName::random());
    }
}
