//! driftkv State Management
//!
//! Holds a peer's full local replica of the key-value mapping and the
//! conflict-free merge that makes replicas converge: per-entry,
//! last-writer-wins over timestamped, tombstoned entries. The merge is
//! commutative, associative, and idempotent, so delivery order and
//! duplication never affect the converged result.

pub mod entry;
pub mod replica;
pub mod snapshot;

pub use entry::*;
pub use replica::*;
pub use snapshot::*;
