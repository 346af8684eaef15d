//! driftkv Core Library
//!
//! Shared types, errors, and configuration for the driftkv replicated
//! key-value store. Every other driftkv crate builds on this one.

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
