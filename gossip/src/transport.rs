//! Outbound transport seam

use driftkv_state::Snapshot;
use std::sync::Arc;

/// Handle through which the command actor hands a post-mutation snapshot
/// to the dissemination transport.
///
/// Called after the store lock has been released, against an immutable
/// snapshot. Implementations must queue internally rather than block the
/// actor on network I/O.
pub trait Broadcast: Send + Sync {
    fn broadcast(&self, snapshot: &Snapshot);
}

/// Shared broadcast handle
pub type SharedBroadcast = Arc<dyn Broadcast>;
