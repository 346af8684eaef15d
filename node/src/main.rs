//! driftkv Node Binary

use clap::Parser;
use driftkv_core::NodeConfig;
use driftkv_node::DriftNode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "driftkv-node")]
#[command(about = "driftkv - gossip-replicated key-value store")]
#[command(version)]
struct Cli {
    /// Node name, also the peer identity in the gossip mesh
    #[arg(long)]
    name: Option<String>,

    /// HTTP API listen address
    #[arg(long, default_value = "127.0.0.1:8080")]
    api_addr: String,

    /// Gossip listen address, consumed by the dissemination transport
    #[arg(long, default_value = "0.0.0.0:6783")]
    gossip_addr: String,

    /// Initial peer address (may be repeated)
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Gossip channel name
    #[arg(long, default_value = "default")]
    channel: String,

    /// Shared secret guarding the mesh (optional)
    #[arg(long)]
    password: Option<String>,

    /// Logging level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .init();

    let mut config = NodeConfig::default();
    if let Some(name) = cli.name {
        config.name = name;
    } else {
        config.name = driftkv_core::PeerName::random().to_string();
    }
    config.api.listen_addr = cli.api_addr;
    config.gossip.listen_addr = cli.gossip_addr;
    config.gossip.peers = cli.peers;
    config.gossip.channel = cli.channel;
    config.gossip.password = cli.password;
    config.log_level = cli.log_level;

    info!(name = %config.name, "driftkv node starting");

    let node = Arc::new(DriftNode::new(config));
    node.start().await
}
