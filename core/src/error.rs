//! Error types for driftkv

use thiserror::Error;

/// Result type for driftkv operations
pub type DriftResult<T> = Result<T, DriftError>;

/// Main error type for driftkv
#[derive(Error, Debug)]
pub enum DriftError {
    // ============ Wire Errors ============
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),

    // ============ Actor Errors ============
    #[error("command actor has stopped")]
    ActorStopped,

    // ============ Configuration Errors ============
    #[error("configuration error: {0}")]
    Config(String),

    // ============ General Errors ============
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for DriftError {
    fn from(err: std::io::Error) -> Self {
        DriftError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for DriftError {
    fn from(err: serde_json::Error) -> Self {
        DriftError::Decode(err.to_string())
    }
}
