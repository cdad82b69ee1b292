//! Peer target arithmetic and candidate screening for the discovery loop.

use crate::domain::NodeRecord;
use std::fmt;

/// Target number of outgoing peers for a registry of `node_count` nodes.
///
/// This is `min(min_peers, node_count / network_fraction)`. On large networks
/// the floor caps the target rather than raising it; the deployed mesh
/// converges with this formula so it is kept as is.
pub fn target_peer_count(node_count: usize, min_peers: usize, network_fraction: usize) -> f64 {
    if network_fraction == 0 {
        return min_peers as f64;
    }
    let share = node_count as f64 / network_fraction as f64;
    (min_peers as f64).min(share)
}

/// Whether the loop is still under its target.
pub fn needs_more_peers(current: usize, target: f64) -> bool {
    (current as f64) < target
}

/// Why a drawn candidate was not dialed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateRejection {
    /// Registry listing was empty
    EmptyRegistry,
    /// Onion transport is not supported
    Onion,
    /// The candidate is this node
    OwnAddress,
    /// An outgoing link (or dial) to the host already exists
    AlreadyConnected,
}

impl fmt::Display for CandidateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRegistry => write!(f, "empty registry"),
            Self::Onion => write!(f, "onion address"),
            Self::OwnAddress => write!(f, "own address"),
            Self::AlreadyConnected => write!(f, "already connected"),
        }
    }
}

/// Static checks on a candidate. The connection check is done separately,
/// under the registry lock.
pub fn screen_candidate(record: &NodeRecord, own_ip: &str) -> Result<(), CandidateRejection> {
    let host = record.host();
    if record.ipaddress.contains(".onion") {
        return Err(CandidateRejection::Onion);
    }
    if !own_ip.is_empty() && host == own_ip {
        return Err(CandidateRejection::OwnAddress);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeStatus;

    #[test]
    fn test_target_small_network() {
        let target = target_peer_count(10, 5, 50);
        assert!((target - 0.2).abs() < f64::EPSILON);
        assert!(needs_more_peers(0, target));
        assert!(!needs_more_peers(1, target));
    }

    #[test]
    fn test_target_large_network_capped() {
        assert_eq!(target_peer_count(1000, 5, 50), 5.0);
        assert!(needs_more_peers(4, 5.0));
        assert!(!needs_more_peers(5, 5.0));
    }

    #[test]
    fn test_target_empty_registry() {
        assert_eq!(target_peer_count(0, 5, 50), 0.0);
        assert!(!needs_more_peers(0, 0.0));
    }

    #[test]
    fn test_screen_candidate() {
        let onion = NodeRecord::new("k", "abc.onion:16125", NodeStatus::Enabled);
        assert_eq!(screen_candidate(&onion, "1.1.1.1"), Err(CandidateRejection::Onion));

        let own = NodeRecord::new("k", "1.1.1.1:16125", NodeStatus::Enabled);
        assert_eq!(screen_candidate(&own, "1.1.1.1"), Err(CandidateRejection::OwnAddress));

        let other = NodeRecord::new("k", "2.2.2.2:16125", NodeStatus::Enabled);
        assert_eq!(screen_candidate(&other, "1.1.1.1"), Ok(()));
    }
}
