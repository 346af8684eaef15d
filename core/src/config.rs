//! Configuration types for driftkv

use serde::{Deserialize, Serialize};

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name for logging and peer identity
    pub name: String,

    /// Gossip configuration
    pub gossip: GossipConfig,

    /// API configuration
    pub api: ApiConfig,

    /// Logging level
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "driftkv-node".to_string(),
            gossip: GossipConfig::default(),
            api: ApiConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Gossip configuration, consumed by the dissemination transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipConfig {
    /// Listen address for the gossip transport
    pub listen_addr: String,

    /// Initial peers to connect to
    pub peers: Vec<String>,

    /// Gossip channel name
    pub channel: String,

    /// Shared secret guarding the mesh; the only peer authentication
    pub password: Option<String>,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:6783".to_string(),
            peers: vec![],
            channel: "default".to_string(),
            password: None,
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Enable HTTP API
    pub enabled: bool,

    /// API listen address
    pub listen_addr: String,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_cors: true,
        }
    }
}
