//! # Service Construction
//!
//! Picks an adapter for every gossip port from the configuration:
//!
//! | Port | Adapter |
//! |------|---------|
//! | `NodeRegistry` | `InMemoryNodeRegistry` when `daemon.static_nodes` is set, else `DaemonNodeRegistry` |
//! | `PeerDialer` | `WsDialer` |
//! | `TimeSource` | `SystemTimeSource` |
//! | `PrivilegeChecker` | `StaticPrivilegeChecker` over `auth.tokens` |

use super::config::{ConfigError, NodeConfig};
use flux_gossip::adapters::{
    DaemonNodeRegistry, DaemonRpcConfig, InMemoryNodeRegistry, StaticPrivilegeChecker,
    SystemTimeSource, WsDialer,
};
use flux_gossip::{GossipApi, GossipNode, NodeRegistry, PeerDialer, TimeSource};
use shared_crypto::NodeIdentity;
use std::sync::Arc;
use tracing::info;

/// The wired gossip core.
pub struct ServiceContainer {
    /// Configuration the services were built from.
    pub config: NodeConfig,
    /// Node signing identity.
    pub identity: Arc<NodeIdentity>,
    /// Gossip core.
    pub gossip: Arc<GossipNode>,
    /// Request handlers.
    pub api: Arc<GossipApi>,
}

impl ServiceContainer {
    /// Build with the production adapters.
    pub fn new(config: NodeConfig) -> Result<Self, ConfigError> {
        let registry: Arc<dyn NodeRegistry> = if config.daemon.static_nodes.is_empty() {
            info!(url = %config.daemon.rpc_url, "Using daemon node registry");
            Arc::new(DaemonNodeRegistry::new(DaemonRpcConfig {
                url: config.daemon.rpc_url.clone(),
                user: config.daemon.rpc_user.clone(),
                password: config.daemon.rpc_password.clone(),
                timeout: config.daemon.timeout(),
            }))
        } else {
            info!(
                nodes = config.daemon.static_nodes.len(),
                "Using static node registry"
            );
            Arc::new(InMemoryNodeRegistry::new(config.daemon.static_nodes.clone()))
        };
        let dialer = Arc::new(WsDialer::new(
            config.network.api_port,
            config.network.connect_timeout(),
        ));

        Self::with_ports(config, registry, dialer, Arc::new(SystemTimeSource::new()))
    }

    /// Build with caller supplied registry, dialer and clock.
    pub fn with_ports(
        config: NodeConfig,
        registry: Arc<dyn NodeRegistry>,
        dialer: Arc<dyn PeerDialer>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        let identity = Arc::new(config.node_identity()?);
        let privileges = Arc::new(StaticPrivilegeChecker::new(config.auth.privileges()?));

        let gossip = Arc::new(GossipNode::new(
            config.effective_gossip(),
            Arc::clone(&identity),
            registry,
            dialer,
            clock,
        ));
        let api = Arc::new(gossip.api(privileges));

        Ok(Self {
            config,
            identity,
            gossip,
            api,
        })
    }
}
