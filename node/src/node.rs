//! Node wiring

use driftkv_core::{DriftResult, NodeConfig, PeerName};
use driftkv_gossip::{Delivery, LocalHub, PeerHandle};
use driftkv_state::{create_replica, SharedReplica};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use crate::api::start_api_server;

/// A running driftkv peer: replica, command actor, delivery hooks.
pub struct DriftNode {
    config: NodeConfig,
    name: PeerName,
    replica: SharedReplica,
    handle: PeerHandle,
    delivery: Arc<Delivery>,
    hub: Arc<LocalHub>,
}

impl DriftNode {
    /// Build a node wired to an in-process hub. The transport is bound at
    /// construction, so no local write can precede dissemination wiring.
    pub fn new(config: NodeConfig) -> Self {
        let name = PeerName::new(config.name.clone());
        let replica = create_replica();
        let delivery = Arc::new(Delivery::new(replica.clone()));

        let hub = LocalHub::new();
        let transport = hub.attach(name.clone(), delivery.clone());
        let handle = PeerHandle::spawn_with_transport(replica.clone(), transport);

        Self {
            config,
            name,
            replica,
            handle,
            delivery,
            hub,
        }
    }

    pub fn name(&self) -> &PeerName {
        &self.name
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Actor handle; all externally-initiated mutations go through it.
    pub fn handle(&self) -> &PeerHandle {
        &self.handle
    }

    /// Inbound hooks for an external dissemination transport.
    pub fn delivery(&self) -> &Arc<Delivery> {
        &self.delivery
    }

    /// The in-process hub this node is attached to.
    pub fn hub(&self) -> &Arc<LocalHub> {
        &self.hub
    }

    /// Total entries in the replica, tombstones included.
    pub fn entry_count(&self) -> usize {
        self.replica.len()
    }

    /// Peers reachable through the hub, this node excluded.
    pub fn peer_count(&self) -> usize {
        self.hub.peer_count().saturating_sub(1)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.handle.get(key)
    }

    pub fn get_all(&self) -> BTreeMap<String, String> {
        self.handle.get_all()
    }

    pub async fn set(&self, key: &str, value: &str) -> DriftResult<String> {
        self.handle.set(key, value).await
    }

    pub async fn delete(&self, key: &str) -> DriftResult<()> {
        self.handle.delete(key).await
    }

    /// Serve the HTTP facade until ctrl-c, then stop the actor.
    pub async fn start(self: Arc<Self>) -> anyhow::Result<()> {
        info!(name = %self.name, "starting driftkv node");

        let api_handle = if self.config.api.enabled {
            let api_node = self.clone();
            let api_addr = self.config.api.listen_addr.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = start_api_server(api_node, &api_addr).await {
                    error!("API server error: {e}");
                }
            }))
        } else {
            None
        };

        match signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received, stopping node"),
            Err(e) => error!("error waiting for shutdown signal: {e}"),
        }

        self.handle.stop();
        if let Some(api) = api_handle {
            api.abort();
        }

        info!("node stopped");
        Ok(())
    }
}
