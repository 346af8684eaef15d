//! driftkv Node
//!
//! Wires a replica, its command actor, and the delivery glue into a
//! process, and fronts them with an HTTP query facade.

pub mod api;
pub mod node;

pub use api::*;
pub use node::*;
