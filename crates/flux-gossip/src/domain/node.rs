//! Node records as published by the external node registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry status of a node. Only `ENABLED` nodes may authenticate traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeStatus {
    /// Node is active and trusted
    Enabled,
    /// Any other registry state (expired, banned, pending start, ...)
    Other(String),
}

impl From<String> for NodeStatus {
    fn from(s: String) -> Self {
        if s == "ENABLED" {
            Self::Enabled
        } else {
            Self::Other(s)
        }
    }
}

impl From<NodeStatus> for String {
    fn from(status: NodeStatus) -> Self {
        match status {
            NodeStatus::Enabled => "ENABLED".to_string(),
            NodeStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "ENABLED"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One registry entry. Immutable snapshot of a single query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Hex public key of the node identity
    pub pubkey: String,
    /// `host` or `host:port`
    #[serde(default)]
    pub ipaddress: String,
    /// Registry status
    pub status: NodeStatus,
}

impl NodeRecord {
    /// Convenience constructor.
    pub fn new(pubkey: impl Into<String>, ipaddress: impl Into<String>, status: NodeStatus) -> Self {
        Self {
            pubkey: pubkey.into(),
            ipaddress: ipaddress.into(),
            status,
        }
    }

    /// Whether this node may authenticate gossip.
    pub fn is_enabled(&self) -> bool {
        self.status == NodeStatus::Enabled
    }

    /// Dialable host: `ipaddress` without a trailing `:port`.
    ///
    /// IPv6 literals (more than one colon) are returned unchanged.
    pub fn host(&self) -> &str {
        let addr = self.ipaddress.trim();
        match addr.rsplit_once(':') {
            Some((host, port))
                if !host.contains(':')
                    && !port.is_empty()
                    && port.bytes().all(|b| b.is_ascii_digit()) =>
            {
                host
            }
            _ => addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        let record: NodeRecord = serde_json::from_str(
            r#"{"pubkey":"02ab","ipaddress":"1.2.3.4:16125","status":"ENABLED","lastpaid":"0"}"#,
        )
        .unwrap();
        assert!(record.is_enabled());

        let record: NodeRecord =
            serde_json::from_str(r#"{"pubkey":"02ab","ipaddress":"1.2.3.4","status":"EXPIRED"}"#)
                .unwrap();
        assert!(!record.is_enabled());
        assert_eq!(record.status, NodeStatus::Other("EXPIRED".into()));
    }

    #[test]
    fn test_host_strips_port() {
        let record = NodeRecord::new("k", "1.2.3.4:16125", NodeStatus::Enabled);
        assert_eq!(record.host(), "1.2.3.4");

        let record = NodeRecord::new("k", "1.2.3.4", NodeStatus::Enabled);
        assert_eq!(record.host(), "1.2.3.4");

        let record = NodeRecord::new("k", "abcdef.onion:16125", NodeStatus::Enabled);
        assert_eq!(record.host(), "abcdef.onion");

        let record = NodeRecord::new("k", "2001:db8::1", NodeStatus::Enabled);
        assert_eq!(record.host(), "2001:db8::1");
    }

    #[test]
    fn test_status_serialises_back() {
        let json = serde_json::to_string(&NodeStatus::Enabled).unwrap();
        assert_eq!(json, "\"ENABLED\"");
    }
}
