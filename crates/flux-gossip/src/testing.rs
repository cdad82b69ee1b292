//! Test doubles for the gossip ports.
//!
//! Available to unit tests and, with the `test-utils` feature, to
//! integration tests and downstream crates.

use crate::domain::GossipError;
use crate::ports::{DialedPeer, LinkEvent, PeerDialer, PeerLink, TimeSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedTimeSource {
    now: AtomicI64,
}

impl FixedTimeSource {
    /// Clock reading `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    /// Move the clock to `now_ms`.
    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Move the clock forward.
    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Link that records frames instead of sending them.
#[derive(Debug)]
pub struct MockLink {
    address: String,
    failing: AtomicBool,
    sent: Mutex<Vec<String>>,
    closed: Mutex<Option<(u16, String)>>,
}

impl MockLink {
    /// Healthy link to `address`.
    pub fn new(address: &str) -> Arc<Self> {
        Arc::new(Self {
            address: address.to_string(),
            failing: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            closed: Mutex::new(None),
        })
    }

    /// Link whose every send fails.
    pub fn failing(address: &str) -> Arc<Self> {
        let link = Self::new(address);
        link.set_failing(true);
        link
    }

    /// Make sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Frames sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Close code and reason, if closed.
    pub fn closed(&self) -> Option<(u16, String)> {
        self.closed.lock().clone()
    }
}

impl PeerLink for MockLink {
    fn send(&self, text: &str) -> Result<(), GossipError> {
        if self.failing.load(Ordering::SeqCst) || self.closed.lock().is_some() {
            return Err(GossipError::SendFailure {
                peer: self.address.clone(),
                reason: "link closed".to_string(),
            });
        }
        self.sent.lock().push(text.to_string());
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) {
        *self.closed.lock() = Some((code, reason.to_string()));
    }

    fn remote_address(&self) -> &str {
        &self.address
    }
}

/// Dialer handing out [`MockLink`]s.
#[derive(Debug, Default)]
pub struct MockDialer {
    failing: Mutex<HashSet<String>>,
    dialed: Mutex<Vec<String>>,
    links: Mutex<HashMap<String, (Arc<MockLink>, UnboundedSender<LinkEvent>)>>,
}

impl MockDialer {
    /// Dialer where every host answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make dials to `host` fail.
    pub fn fail_host(&self, host: &str) {
        self.failing.lock().insert(host.to_string());
    }

    /// Hosts dialed so far, in order.
    pub fn dialed(&self) -> Vec<String> {
        self.dialed.lock().clone()
    }

    /// The most recent link opened to `host`.
    pub fn link(&self, host: &str) -> Option<Arc<MockLink>> {
        self.links.lock().get(host).map(|(link, _)| Arc::clone(link))
    }

    /// Deliver an inbound frame on the link to `host`.
    pub fn deliver(&self, host: &str, frame: &str) {
        self.emit(host, LinkEvent::Message(frame.to_string()));
    }

    /// Close the link to `host` from the remote side.
    pub fn close(&self, host: &str, code: u16, reason: &str) {
        if let Some(link) = self.link(host) {
            link.close(code, reason);
        }
        self.emit(
            host,
            LinkEvent::Closed {
                code: Some(code),
                reason: reason.to_string(),
            },
        );
    }

    /// Fail the link to `host`.
    pub fn error(&self, host: &str, reason: &str) {
        self.emit(host, LinkEvent::Error(reason.to_string()));
    }

    fn emit(&self, host: &str, event: LinkEvent) {
        if let Some((_, events)) = self.links.lock().get(host) {
            let _ = events.send(event);
        }
    }

    /// Wait until at least `count` dials were attempted.
    pub async fn wait_for_dials(&self, count: usize) {
        wait_until(|| self.dialed.lock().len() >= count).await;
    }
}

#[async_trait]
impl PeerDialer for MockDialer {
    async fn dial(&self, host: &str) -> Result<DialedPeer, GossipError> {
        self.dialed.lock().push(host.to_string());
        if self.failing.lock().contains(host) {
            return Err(GossipError::ConnectFailed {
                peer: host.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let link = MockLink::new(host);
        let (tx, rx) = unbounded_channel();
        self.links
            .lock()
            .insert(host.to_string(), (Arc::clone(&link), tx));
        Ok(DialedPeer { link, events: rx })
    }
}

/// Poll `condition` until it holds. Panics after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
