//! # Gossip Node
//!
//! Wires the services together and supervises the background loops.

use super::api::GossipApi;
use super::codec::BroadcastCodec;
use super::connections::{ConnectionRegistry, Direction};
use super::discovery::DiscoveryLoop;
use super::inbound::InboundHandler;
use super::keepalive::Keepalive;
use super::manager::ConnectionManager;
use super::verifier::MessageVerifier;
use crate::domain::GossipConfig;
use crate::ports::{NodeRegistry, PeerDialer, PrivilegeChecker, TimeSource};
use shared_crypto::NodeIdentity;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A fully wired gossip core.
pub struct GossipNode {
    config: GossipConfig,
    manager: Arc<ConnectionManager>,
    incoming: Arc<ConnectionRegistry>,
    verifier: MessageVerifier,
    inbound: Arc<InboundHandler>,
    discovery: Arc<DiscoveryLoop>,
    keepalive: Arc<Keepalive>,
}

impl GossipNode {
    /// Build every service from the ports.
    pub fn new(
        config: GossipConfig,
        identity: Arc<NodeIdentity>,
        registry: Arc<dyn NodeRegistry>,
        dialer: Arc<dyn PeerDialer>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let codec = BroadcastCodec::new(identity, Arc::clone(&clock));
        let outgoing = Arc::new(ConnectionRegistry::new(Direction::Outgoing));
        let incoming = Arc::new(ConnectionRegistry::new(Direction::Incoming));
        let manager = Arc::new(ConnectionManager::new(dialer, outgoing, codec));
        let verifier = MessageVerifier::new(Arc::clone(&registry), Arc::clone(&clock));

        let inbound = Arc::new(InboundHandler::new(
            verifier.clone(),
            Arc::clone(&incoming),
            Arc::clone(&manager),
            clock,
            &config,
        ));
        let discovery = Arc::new(DiscoveryLoop::new(
            registry,
            Arc::clone(&manager),
            config.clone(),
        ));
        let keepalive = Arc::new(Keepalive::new(
            Arc::clone(&manager),
            config.keepalive_interval(),
        ));

        Self {
            config,
            manager,
            incoming,
            verifier,
            inbound,
            discovery,
            keepalive,
        }
    }

    /// Effective configuration.
    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    /// Outgoing connection manager.
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Outgoing links.
    pub fn outgoing(&self) -> &Arc<ConnectionRegistry> {
        self.manager.outgoing()
    }

    /// Accepted links.
    pub fn incoming(&self) -> &Arc<ConnectionRegistry> {
        &self.incoming
    }

    /// Envelope verifier.
    pub fn verifier(&self) -> &MessageVerifier {
        &self.verifier
    }

    /// Handler for accepted sockets.
    pub fn inbound(&self) -> &Arc<InboundHandler> {
        &self.inbound
    }

    /// The discovery loop, for manual ticking.
    pub fn discovery(&self) -> &Arc<DiscoveryLoop> {
        &self.discovery
    }

    /// The heartbeat timer, for manual ticking.
    pub fn keepalive(&self) -> &Arc<Keepalive> {
        &self.keepalive
    }

    /// Request handlers bound to this node.
    pub fn api(&self, privileges: Arc<dyn PrivilegeChecker>) -> GossipApi {
        GossipApi::new(
            Arc::clone(&self.manager),
            Arc::clone(&self.incoming),
            privileges,
            &self.config,
        )
    }

    /// Spawn discovery and keepalive.
    pub fn start(&self) -> GossipHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let discovery = tokio::spawn(Arc::clone(&self.discovery).run(shutdown_rx.clone()));
        let keepalive = tokio::spawn(Arc::clone(&self.keepalive).run(shutdown_rx));
        info!("Flux discovery started");

        GossipHandle {
            shutdown_tx,
            tasks: vec![discovery, keepalive],
        }
    }
}

/// Handle on the background loops of a started node.
pub struct GossipHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl GossipHandle {
    /// Stop the loops and wait for them to finish.
    pub async fn shutdown(self) {
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Gossip task ended abnormally: {}", e);
            }
        }
    }
}
