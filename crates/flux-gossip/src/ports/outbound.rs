//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the gossip core requires from its host: the node registry,
//! the socket transport, a clock and the authorization subsystem.

use crate::domain::{GossipError, NodeRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

/// The authoritative list of nodes.
///
/// Backends may ignore the filter; callers must cope with zero, one or many
/// records coming back for a filtered query.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// List nodes, optionally filtered by hex public key.
    async fn list_nodes(&self, filter: Option<&str>) -> Result<Vec<NodeRecord>, RegistryError>;
}

/// Errors from the node registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The backend could not be reached
    #[error("registry unreachable: {0}")]
    Unreachable(String),
    /// The backend answered with something unusable
    #[error("invalid registry response: {0}")]
    InvalidResponse(String),
}

impl From<RegistryError> for GossipError {
    fn from(err: RegistryError) -> Self {
        GossipError::RegistryUnavailable(err.to_string())
    }
}

/// Sending half of a live socket.
///
/// `send` only queues the frame; it fails once the socket is gone, which is
/// how dead links are detected.
pub trait PeerLink: Send + Sync {
    /// Queue a text frame.
    fn send(&self, text: &str) -> Result<(), GossipError>;

    /// Close the socket with a close code and reason.
    fn close(&self, code: u16, reason: &str);

    /// Remote address (host) of the peer.
    fn remote_address(&self) -> &str;
}

/// Something that happened on the receiving half of a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A text frame arrived
    Message(String),
    /// The socket closed
    Closed {
        /// Close code, if the peer sent one
        code: Option<u16>,
        /// Close reason
        reason: String,
    },
    /// The socket failed
    Error(String),
}

/// An opened outgoing socket.
pub struct DialedPeer {
    /// Sending half
    pub link: Arc<dyn PeerLink>,
    /// Receiving half
    pub events: UnboundedReceiver<LinkEvent>,
}

/// Opens outgoing sockets.
#[async_trait]
pub trait PeerDialer: Send + Sync {
    /// Connect to `host` on the mesh port.
    async fn dial(&self, host: &str) -> Result<DialedPeer, GossipError>;
}

/// Wall clock in milliseconds since the epoch.
pub trait TimeSource: Send + Sync {
    /// Current time.
    fn now_ms(&self) -> i64;
}

/// Privilege levels known to the authorization subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    /// Any authenticated user
    User,
    /// Team member
    ZelTeam,
    /// Node operator
    Admin,
}

impl Privilege {
    /// Wire name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ZelTeam => "zelteam",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Privilege {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "zelteam" => Ok(Self::ZelTeam),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown privilege level '{other}'")),
        }
    }
}

/// Request metadata handed to the authorization subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Lowercased header names to values
    pub headers: HashMap<String, String>,
}

impl RequestContext {
    /// Context with a single header.
    pub fn with_header(name: &str, value: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert(name.to_ascii_lowercase(), value.to_string());
        Self { headers }
    }

    /// Add a header, replacing any value under the same name.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// Header value by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Decides whether a caller holds a privilege level.
#[async_trait]
pub trait PrivilegeChecker: Send + Sync {
    /// True when the caller holds at least `level`.
    async fn check_privilege(&self, level: Privilege, ctx: &RequestContext) -> bool;
}
