//! Gossip tunables.

use super::protocol::DEFAULT_API_PORT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of the gossip core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GossipConfig {
    /// Floor of the outgoing peer target
    pub min_peers: usize,
    /// Divisor applied to the registry size (50 = 2%)
    pub network_fraction: usize,
    /// Discovery delay while under target (ms)
    pub fast_interval_ms: u64,
    /// Discovery delay once converged (ms)
    pub slow_interval_ms: u64,
    /// Heartbeat period (ms)
    pub keepalive_interval_ms: u64,
    /// Port peers listen on
    pub api_port: u16,
    /// This node's public address, excluded from discovery
    pub own_ip: String,
    /// Re-dispatch accepted original broadcasts to outgoing peers
    pub rebroadcast: bool,
    /// Run privileged requests on the "not authorized" branch
    pub legacy_inverted_authorization: bool,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            min_peers: 5,
            network_fraction: 50,
            fast_interval_ms: 1_000,
            slow_interval_ms: 30_000,
            keepalive_interval_ms: 30_000,
            api_port: DEFAULT_API_PORT,
            own_ip: String::new(),
            rebroadcast: false,
            legacy_inverted_authorization: true,
        }
    }
}

impl GossipConfig {
    /// Config for tests: fixed own address, everything else default.
    pub fn for_testing() -> Self {
        Self {
            own_ip: "127.0.0.1".to_string(),
            ..Self::default()
        }
    }

    /// Discovery delay while under target.
    pub fn fast_interval(&self) -> Duration {
        Duration::from_millis(self.fast_interval_ms)
    }

    /// Discovery delay once converged.
    pub fn slow_interval(&self) -> Duration {
        Duration::from_millis(self.slow_interval_ms)
    }

    /// Heartbeat period.
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}
