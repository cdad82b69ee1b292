//! # Broadcast Dispatcher
//!
//! Best-effort fan-out of one frame to every registered link. A link that
//! refuses the frame is pruned; the pass itself never fails.

use super::connections::{ConnectionId, ConnectionRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Links that accepted the frame
    pub delivered: usize,
    /// Links removed because the send failed
    pub pruned: usize,
}

/// Sends frames to every link of a registry.
#[derive(Debug, Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastDispatcher {
    /// Dispatcher over `registry`.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Registry this dispatcher sends to.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send `frame` to a snapshot of the registry, then remove every link
    /// whose send failed.
    pub fn dispatch(&self, frame: &str) -> DispatchReport {
        let mut failed: Vec<ConnectionId> = Vec::new();
        let mut report = DispatchReport::default();

        for entry in self.registry.snapshot() {
            match entry.send(frame) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(peer = %entry.address(), error = %e, "Send failed, pruning link");
                    failed.push(entry.id());
                }
            }
        }

        for id in failed {
            if self.registry.remove(id) {
                report.pruned += 1;
            }
        }

        debug!(
            delivered = report.delivered,
            pruned = report.pruned,
            "Dispatch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::connections::Direction;
    use crate::testing::MockLink;

    #[test]
    fn test_dispatch_prunes_failing_link() {
        let registry = Arc::new(ConnectionRegistry::new(Direction::Outgoing));
        let a = MockLink::new("1.1.1.1");
        let bad = MockLink::failing("2.2.2.2");
        let c = MockLink::new("3.3.3.3");
        registry.add(a.clone());
        registry.add(bad.clone());
        registry.add(c.clone());

        let report = BroadcastDispatcher::new(Arc::clone(&registry)).dispatch("frame");

        assert_eq!(report, DispatchReport { delivered: 2, pruned: 1 });
        assert_eq!(registry.addresses(), vec!["1.1.1.1", "3.3.3.3"]);
        assert_eq!(a.sent(), vec!["frame"]);
        assert_eq!(c.sent(), vec!["frame"]);
        assert!(bad.sent().is_empty());
    }

    #[test]
    fn test_dispatch_on_empty_registry() {
        let registry = Arc::new(ConnectionRegistry::new(Direction::Outgoing));
        let report = BroadcastDispatcher::new(registry).dispatch("frame");
        assert_eq!(report, DispatchReport::default());
    }

    #[test]
    fn test_entry_removed_concurrently_not_double_counted() {
        let registry = Arc::new(ConnectionRegistry::new(Direction::Outgoing));
        let bad = MockLink::failing("2.2.2.2");
        let entry = registry.add(bad);
        // Close handler wins the race
        registry.remove(entry.id());
        let report = BroadcastDispatcher::new(Arc::clone(&registry)).dispatch("frame");
        assert_eq!(report.pruned, 0);
    }
}
