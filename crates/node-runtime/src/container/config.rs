//! # Node Configuration
//!
//! TOML file (every section optional) with environment overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FLUX_PRIVATE_KEY` | `identity.private_key` |
//! | `FLUX_IP_ADDRESS` | `network.ip_address` |
//! | `FLUX_API_PORT` | `network.api_port` |
//! | `FLUX_DAEMON_RPC_URL` | `daemon.rpc_url` |
//! | `FLUX_DAEMON_RPC_USER` | `daemon.rpc_user` |
//! | `FLUX_DAEMON_RPC_PASSWORD` | `daemon.rpc_password` |
//!
//! ## Security Requirements
//!
//! - The identity key MUST be set and parse as WIF before the node starts
//! - Secrets are never printed by `Debug`

use flux_gossip::domain::DEFAULT_API_PORT;
use flux_gossip::{GossipConfig, NodeRecord, Privilege};
use serde::{Deserialize, Serialize};
use shared_crypto::NodeIdentity;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node identity.
    pub identity: IdentityConfig,
    /// Listening and public address.
    pub network: NetworkConfig,
    /// Node registry backend.
    pub daemon: DaemonConfig,
    /// Gossip tunables.
    pub gossip: GossipConfig,
    /// Request authorization.
    pub auth: AuthConfig,
}

/// Identity configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// WIF private key of the node.
    pub private_key: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Public IP of this node, as published in the registry.
    pub ip_address: String,
    /// API / websocket port, shared by every node.
    pub api_port: u16,
    /// Local bind address.
    pub bind_address: String,
    /// Outgoing websocket connect timeout (ms).
    pub connect_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ip_address: String::new(),
            api_port: DEFAULT_API_PORT,
            bind_address: "0.0.0.0".to_string(),
            connect_timeout_ms: 10_000,
        }
    }
}

impl NetworkConfig {
    /// Outgoing connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Node registry configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Daemon JSON-RPC endpoint.
    pub rpc_url: String,
    /// RPC user.
    pub rpc_user: String,
    /// RPC password.
    pub rpc_password: String,
    /// RPC timeout (ms).
    pub timeout_ms: u64,
    /// Fixed node list; when non-empty the daemon is not queried.
    pub static_nodes: Vec<NodeRecord>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:16124".to_string(),
            rpc_user: String::new(),
            rpc_password: String::new(),
            timeout_ms: 10_000,
            static_nodes: Vec::new(),
        }
    }
}

impl std::fmt::Debug for DaemonConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonConfig")
            .field("rpc_url", &self.rpc_url)
            .field("rpc_user", &self.rpc_user)
            .field("rpc_password", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .field("static_nodes", &self.static_nodes.len())
            .finish()
    }
}

impl DaemonConfig {
    /// RPC timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Request authorization configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// `zelidauth` token to privilege level (`user`, `zelteam`, `admin`).
    pub tokens: HashMap<String, String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl AuthConfig {
    /// Parsed token table.
    pub fn privileges(&self) -> Result<HashMap<String, Privilege>, ConfigError> {
        self.tokens
            .iter()
            .map(|(token, level)| {
                level
                    .parse::<Privilege>()
                    .map(|level| (token.clone(), level))
                    .map_err(ConfigError::InvalidPrivilege)
            })
            .collect()
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file unreadable.
    #[error("Cannot read config file {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`NodeConfig`].
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// No identity key configured.
    #[error("No private key configured. Set identity.private_key or FLUX_PRIVATE_KEY.")]
    MissingPrivateKey,

    /// Identity key does not parse.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// An environment override has the wrong format.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },

    /// Unknown privilege level in the token table.
    #[error("Invalid auth token level: {0}")]
    InvalidPrivilege(String),

    /// Port 0 configured for the API.
    #[error("network.api_port must not be 0")]
    InvalidPort,
}

impl NodeConfig {
    /// Load from an optional TOML file, apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                info!(path = %path.display(), "Loaded configuration file");
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(key) = lookup("FLUX_PRIVATE_KEY") {
            self.identity.private_key = key;
            info!("Loaded private key from environment");
        }
        if let Some(ip) = lookup("FLUX_IP_ADDRESS") {
            self.network.ip_address = ip;
        }
        if let Some(port) = lookup("FLUX_API_PORT") {
            self.network.api_port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "FLUX_API_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(url) = lookup("FLUX_DAEMON_RPC_URL") {
            self.daemon.rpc_url = url;
        }
        if let Some(user) = lookup("FLUX_DAEMON_RPC_USER") {
            self.daemon.rpc_user = user;
        }
        if let Some(password) = lookup("FLUX_DAEMON_RPC_PASSWORD") {
            self.daemon.rpc_password = password;
        }
        Ok(())
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.private_key.trim().is_empty() {
            return Err(ConfigError::MissingPrivateKey);
        }
        self.node_identity()?;
        if self.network.api_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        self.auth.privileges()?;
        if self.network.ip_address.is_empty() {
            warn!("network.ip_address not set; discovery may dial this node itself");
        }
        Ok(())
    }

    /// The parsed identity key.
    pub fn node_identity(&self) -> Result<NodeIdentity, ConfigError> {
        NodeIdentity::from_wif(&self.identity.private_key)
            .map_err(|e| ConfigError::InvalidPrivateKey(e.to_string()))
    }

    /// Gossip settings with the network section applied.
    pub fn effective_gossip(&self) -> GossipConfig {
        GossipConfig {
            own_ip: self.network.ip_address.clone(),
            api_port: self.network.api_port,
            ..self.gossip.clone()
        }
    }
}
