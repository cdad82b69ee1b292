//! In-memory node registry.
//!
//! Backs tests and standalone deployments with a static node list. It can
//! emulate a backend without filter support and an outage.

use crate::domain::NodeRecord;
use crate::ports::{NodeRegistry, RegistryError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Node list held in memory.
#[derive(Debug)]
pub struct InMemoryNodeRegistry {
    nodes: RwLock<Vec<NodeRecord>>,
    supports_filter: AtomicBool,
    unavailable: AtomicBool,
    queries: AtomicUsize,
}

impl Default for InMemoryNodeRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryNodeRegistry {
    /// Registry serving `nodes`.
    pub fn new(nodes: Vec<NodeRecord>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
            supports_filter: AtomicBool::new(true),
            unavailable: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
        }
    }

    /// Replace the node list.
    pub fn set_nodes(&self, nodes: Vec<NodeRecord>) {
        *self.nodes.write() = nodes;
    }

    /// Append a node.
    pub fn push(&self, node: NodeRecord) {
        self.nodes.write().push(node);
    }

    /// When false, filtered queries return the whole list.
    pub fn set_supports_filter(&self, supported: bool) {
        self.supports_filter.store(supported, Ordering::SeqCst);
    }

    /// When true, every query fails.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Queries answered or refused so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeRegistry for InMemoryNodeRegistry {
    async fn list_nodes(&self, filter: Option<&str>) -> Result<Vec<NodeRecord>, RegistryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::Unreachable("in-memory registry offline".into()));
        }

        let nodes = self.nodes.read();
        match filter {
            Some(key) if self.supports_filter.load(Ordering::SeqCst) => {
                Ok(nodes.iter().filter(|n| n.pubkey == key).cloned().collect())
            }
            _ => Ok(nodes.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeStatus;

    fn registry() -> InMemoryNodeRegistry {
        InMemoryNodeRegistry::new(vec![
            NodeRecord::new("02aa", "1.1.1.1", NodeStatus::Enabled),
            NodeRecord::new("02bb", "2.2.2.2", NodeStatus::Enabled),
        ])
    }

    #[tokio::test]
    async fn test_filter() {
        let registry = registry();
        assert_eq!(registry.list_nodes(Some("02bb")).await.unwrap().len(), 1);
        assert_eq!(registry.list_nodes(Some("02cc")).await.unwrap().len(), 0);
        assert_eq!(registry.list_nodes(None).await.unwrap().len(), 2);
        assert_eq!(registry.query_count(), 3);
    }

    #[tokio::test]
    async fn test_filter_unsupported() {
        let registry = registry();
        registry.set_supports_filter(false);
        assert_eq!(registry.list_nodes(Some("02bb")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_outage() {
        let registry = registry();
        registry.set_unavailable(true);
        assert!(registry.list_nodes(None).await.is_err());
    }
}
