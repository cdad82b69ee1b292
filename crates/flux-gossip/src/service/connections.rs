//! # Connection Registry
//!
//! The set of live links in one direction. This is the only shared mutable
//! state of the core, so every mutation goes through one mutex, including
//! the "not already connected" check that precedes a dial.

use crate::domain::GossipError;
use crate::ports::PeerLink;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of one registered link. Two links to the same host get
/// different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who opened the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Dialed by this node
    Outgoing,
    /// Accepted from a peer
    Incoming,
}

/// A registered link.
#[derive(Clone)]
pub struct ConnectionEntry {
    id: ConnectionId,
    direction: Direction,
    link: Arc<dyn PeerLink>,
}

impl fmt::Debug for ConnectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionEntry")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("address", &self.address())
            .finish()
    }
}

impl ConnectionEntry {
    /// Registry id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Who opened the socket.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Remote address of the peer.
    pub fn address(&self) -> &str {
        self.link.remote_address()
    }

    /// Queue a frame on the link.
    pub fn send(&self, text: &str) -> Result<(), GossipError> {
        self.link.send(text)
    }

    /// Close the underlying socket.
    pub fn close(&self, code: u16, reason: &str) {
        self.link.close(code, reason)
    }
}

#[derive(Default)]
struct Inner {
    entries: Vec<ConnectionEntry>,
    dialing: HashSet<String>,
}

/// Ordered set of live links in one direction.
pub struct ConnectionRegistry {
    direction: Direction,
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("direction", &self.direction)
            .field("len", &self.len())
            .finish()
    }
}

impl ConnectionRegistry {
    /// Empty registry.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            inner: Mutex::new(Inner::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Direction of the links held here.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn make_entry(&self, link: Arc<dyn PeerLink>) -> ConnectionEntry {
        ConnectionEntry {
            id: ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            direction: self.direction,
            link,
        }
    }

    /// Register a link. No address dedup happens here.
    pub fn add(&self, link: Arc<dyn PeerLink>) -> ConnectionEntry {
        let entry = self.make_entry(link);
        self.inner.lock().entries.push(entry.clone());
        entry
    }

    /// Remove by id. Removing an absent entry is a no-op returning `false`.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        match inner.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                inner.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Stable copy of the current entries, in insertion order.
    pub fn snapshot(&self) -> Vec<ConnectionEntry> {
        self.inner.lock().entries.clone()
    }

    /// Number of live links.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True when no link is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remote addresses, in insertion order.
    pub fn addresses(&self) -> Vec<String> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|e| e.address().to_string())
            .collect()
    }

    /// True when a link to `host` is registered or being dialed.
    pub fn is_connected_to(&self, host: &str) -> bool {
        let inner = self.inner.lock();
        inner.dialing.contains(host) || inner.entries.iter().any(|e| e.address() == host)
    }

    /// Reserve `host` for a dial. Returns `None` when a link to `host` exists
    /// or another dial is in flight; check and reservation are atomic.
    pub fn begin_dial(self: &Arc<Self>, host: &str) -> Option<DialReservation> {
        let mut inner = self.inner.lock();
        if inner.dialing.contains(host) || inner.entries.iter().any(|e| e.address() == host) {
            return None;
        }
        inner.dialing.insert(host.to_string());
        Some(DialReservation {
            registry: Arc::clone(self),
            host: host.to_string(),
            completed: false,
        })
    }
}

/// An in-flight dial. Dropping it without [`complete`](Self::complete)
/// releases the host.
pub struct DialReservation {
    registry: Arc<ConnectionRegistry>,
    host: String,
    completed: bool,
}

impl fmt::Debug for DialReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialReservation").field("host", &self.host).finish()
    }
}

impl DialReservation {
    /// Host being dialed.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The dial opened: register the link and release the reservation in
    /// one step.
    pub fn complete(mut self, link: Arc<dyn PeerLink>) -> ConnectionEntry {
        let entry = self.registry.make_entry(link);
        {
            let mut inner = self.registry.inner.lock();
            inner.dialing.remove(&self.host);
            inner.entries.push(entry.clone());
        }
        self.completed = true;
        entry
    }
}

impl Drop for DialReservation {
    fn drop(&mut self) {
        if !self.completed {
            self.registry.inner.lock().dialing.remove(&self.host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLink;

    fn registry() -> Arc<ConnectionRegistry> {
        Arc::new(ConnectionRegistry::new(Direction::Outgoing))
    }

    #[test]
    fn test_add_snapshot_preserves_order() {
        let registry = registry();
        registry.add(MockLink::new("1.1.1.1"));
        registry.add(MockLink::new("2.2.2.2"));
        registry.add(MockLink::new("3.3.3.3"));
        assert_eq!(registry.addresses(), vec!["1.1.1.1", "2.2.2.2", "3.3.3.3"]);
        assert_eq!(registry.snapshot()[1].direction(), Direction::Outgoing);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = registry();
        let entry = registry.add(MockLink::new("1.1.1.1"));
        assert!(registry.remove(entry.id()));
        assert!(!registry.remove(entry.id()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_only_matching_entry() {
        let registry = registry();
        // Same host twice (e.g. a manual add racing discovery)
        let a = registry.add(MockLink::new("1.1.1.1"));
        let b = registry.add(MockLink::new("1.1.1.1"));
        assert_ne!(a.id(), b.id());
        registry.remove(a.id());
        assert_eq!(registry.snapshot()[0].id(), b.id());
    }

    #[test]
    fn test_begin_dial_dedups() {
        let registry = registry();
        registry.add(MockLink::new("1.1.1.1"));
        assert!(registry.begin_dial("1.1.1.1").is_none());

        let reservation = registry.begin_dial("2.2.2.2").unwrap();
        assert!(registry.is_connected_to("2.2.2.2"));
        assert!(registry.begin_dial("2.2.2.2").is_none());

        reservation.complete(MockLink::new("2.2.2.2"));
        assert_eq!(registry.len(), 2);
        assert!(registry.begin_dial("2.2.2.2").is_none());
    }

    #[test]
    fn test_dropped_reservation_releases_host() {
        let registry = registry();
        let reservation = registry.begin_dial("2.2.2.2").unwrap();
        drop(reservation);
        assert!(!registry.is_connected_to("2.2.2.2"));
        assert!(registry.begin_dial("2.2.2.2").is_some());
    }

    #[test]
    fn test_concurrent_dials_only_one_wins() {
        let registry = registry();
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    s.spawn(move || registry.begin_dial("9.9.9.9").map(std::mem::forget).is_some())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap() as usize)
                .sum()
        });
        assert_eq!(winners, 1);
    }
}
