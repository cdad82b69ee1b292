//! # Peer Discovery Loop
//!
//! Grows the outgoing mesh toward its target. Each tick lists the registry,
//! computes the target and, when under it, dials one random candidate. The
//! next tick comes after the fast interval while under target and after the
//! slow interval once converged. A failed registry query counts as an empty
//! registry for that tick.

use super::manager::ConnectionManager;
use crate::domain::{
    needs_more_peers, screen_candidate, target_peer_count, CandidateRejection, GossipConfig,
    NodeRecord,
};
use crate::ports::NodeRegistry;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// A dial to this host was started
    Dialed(String),
    /// Under target, but the drawn candidate was unusable
    Skipped(CandidateRejection),
    /// Target met, nothing to do
    Converged,
}

/// Result of one discovery tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryTick {
    /// Registry size seen by the tick
    pub node_count: usize,
    /// Computed peer target
    pub target: f64,
    /// Outgoing links before the tick acted
    pub connections: usize,
    /// Action taken
    pub action: TickAction,
    /// Delay before the next tick
    pub next_delay: Duration,
}

/// The discovery control loop.
pub struct DiscoveryLoop {
    registry: Arc<dyn NodeRegistry>,
    manager: Arc<ConnectionManager>,
    config: GossipConfig,
}

impl DiscoveryLoop {
    /// Loop dialing through `manager`.
    pub fn new(
        registry: Arc<dyn NodeRegistry>,
        manager: Arc<ConnectionManager>,
        config: GossipConfig,
    ) -> Self {
        Self {
            registry,
            manager,
            config,
        }
    }

    /// Run one iteration.
    pub async fn tick(&self) -> DiscoveryTick {
        let nodes = match self.registry.list_nodes(None).await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(error = %e, "Node registry unavailable, skipping discovery tick");
                Vec::new()
            }
        };

        let node_count = nodes.len();
        let target = target_peer_count(node_count, self.config.min_peers, self.config.network_fraction);
        let connections = self.manager.outgoing().len();

        if !needs_more_peers(connections, target) {
            return DiscoveryTick {
                node_count,
                target,
                connections,
                action: TickAction::Converged,
                next_delay: self.config.slow_interval(),
            };
        }

        let action = match self.pick_candidate(&nodes, &mut rand::thread_rng()) {
            Ok(record) => {
                let host = record.host().to_string();
                match self.manager.connect(&host) {
                    Some(_) => {
                        info!(peer = %host, target, connections, "Adding outgoing peer");
                        TickAction::Dialed(host)
                    }
                    None => TickAction::Skipped(CandidateRejection::AlreadyConnected),
                }
            }
            Err(reason) => {
                debug!(%reason, "No usable candidate this tick");
                TickAction::Skipped(reason)
            }
        };

        DiscoveryTick {
            node_count,
            target,
            connections,
            action,
            next_delay: self.config.fast_interval(),
        }
    }

    /// Draw one node uniformly at random and screen it.
    pub fn pick_candidate<'a, R: Rng + ?Sized>(
        &self,
        nodes: &'a [NodeRecord],
        rng: &mut R,
    ) -> Result<&'a NodeRecord, CandidateRejection> {
        let record = nodes.choose(rng).ok_or(CandidateRejection::EmptyRegistry)?;
        screen_candidate(record, &self.config.own_ip)?;
        if self.manager.outgoing().is_connected_to(record.host()) {
            return Err(CandidateRejection::AlreadyConnected);
        }
        Ok(record)
    }

    /// Tick until `shutdown` fires.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("Peer discovery started");
        loop {
            let tick = self.tick().await;
            tokio::select! {
                _ = tokio::time::sleep(tick.next_delay) => {}
                _ = shutdown.changed() => {
                    info!("Peer discovery stopping");
                    return;
                }
            }
        }
    }
}
