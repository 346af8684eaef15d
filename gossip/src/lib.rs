//! driftkv Gossip Layer
//!
//! Sits between the replica store and whatever transport disseminates
//! state between peers:
//! - the command actor serializes all locally-initiated mutations and
//!   triggers exactly one broadcast per mutation
//! - the delivery glue translates inbound transport events into the
//!   store's three merge entry points
//! - the [`Broadcast`] trait is the outbound seam a transport implements
//! - [`LocalHub`] is an in-process transport for tests and local wiring

pub mod actor;
pub mod delivery;
pub mod local;
pub mod transport;

pub use actor::*;
pub use delivery::*;
pub use local::*;
pub use transport::*;
