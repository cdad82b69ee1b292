//! # Inbound Handler
//!
//! Handles sockets accepted by the host's listener. Each frame is verified;
//! authenticated senders get an acknowledgement, unauthenticated ones are
//! disconnected with a policy-violation close.

use super::connections::ConnectionRegistry;
use super::manager::ConnectionManager;
use super::verifier::MessageVerifier;
use crate::domain::{
    outdated_ack, received_ack, GossipConfig, POLICY_VIOLATION_CODE, POLICY_VIOLATION_REASON,
};
use crate::ports::{LinkEvent, PeerLink, TimeSource};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVerdict {
    /// Authenticated and fresh
    Accepted,
    /// Authenticated but older than five minutes
    Outdated,
    /// Not authenticated; the link is closed
    Rejected,
}

/// Verifies frames arriving on accepted sockets.
pub struct InboundHandler {
    verifier: MessageVerifier,
    incoming: Arc<ConnectionRegistry>,
    manager: Arc<ConnectionManager>,
    clock: Arc<dyn TimeSource>,
    own_ip: String,
    rebroadcast: bool,
}

impl InboundHandler {
    /// Handler registering accepted links into `incoming`.
    pub fn new(
        verifier: MessageVerifier,
        incoming: Arc<ConnectionRegistry>,
        manager: Arc<ConnectionManager>,
        clock: Arc<dyn TimeSource>,
        config: &GossipConfig,
    ) -> Self {
        Self {
            verifier,
            incoming,
            manager,
            clock,
            own_ip: config.own_ip.clone(),
            rebroadcast: config.rebroadcast,
        }
    }

    /// Accepted links.
    pub fn incoming(&self) -> &Arc<ConnectionRegistry> {
        &self.incoming
    }

    /// Classify a frame. Both checks run against the same `now`.
    pub async fn classify(&self, frame: &str, now: i64) -> FrameVerdict {
        let authentic = self
            .verifier
            .verify_broadcast(frame.into(), None, Some(now))
            .await;
        let fresh = self.verifier.verify_freshness(frame.into(), Some(now));

        match (authentic, fresh) {
            (true, true) => FrameVerdict::Accepted,
            (true, false) => FrameVerdict::Outdated,
            (false, _) => FrameVerdict::Rejected,
        }
    }

    /// Classify a frame and answer on `link`.
    pub async fn handle_frame(&self, link: &dyn PeerLink, frame: &str) -> FrameVerdict {
        let now = self.clock.now_ms();
        let verdict = self.classify(frame, now).await;
        let peer = link.remote_address();

        match verdict {
            FrameVerdict::Accepted => {
                if let Err(e) = link.send(&received_ack(&self.own_ip)) {
                    warn!(peer = %peer, error = %e, "Acknowledgement not sent");
                }
                if self.rebroadcast {
                    self.rebroadcast_original(frame, now).await;
                }
            }
            FrameVerdict::Outdated => {
                if let Err(e) = link.send(&outdated_ack(&self.own_ip)) {
                    warn!(peer = %peer, error = %e, "Acknowledgement not sent");
                }
            }
            FrameVerdict::Rejected => {
                info!(peer = %peer, "Unauthenticated frame, closing connection");
                link.close(POLICY_VIOLATION_CODE, POLICY_VIOLATION_REASON);
            }
        }
        verdict
    }

    async fn rebroadcast_original(&self, frame: &str, now: i64) {
        if !self
            .verifier
            .verify_original_broadcast(frame.into(), None, Some(now))
            .await
        {
            debug!("Frame not original, not rebroadcasting");
            return;
        }
        let report = self.manager.relay(frame);
        debug!(delivered = report.delivered, "Rebroadcast frame");
    }

    /// Serve one accepted socket until it closes or is rejected.
    pub async fn serve(&self, link: Arc<dyn PeerLink>, mut events: UnboundedReceiver<LinkEvent>) {
        let entry = self.incoming.add(Arc::clone(&link));
        let peer = link.remote_address().to_string();
        info!(
            peer = %peer,
            connections_in = self.incoming.len(),
            "Incoming connection"
        );

        while let Some(event) = events.recv().await {
            match event {
                LinkEvent::Message(frame) => {
                    if self.handle_frame(link.as_ref(), &frame).await == FrameVerdict::Rejected {
                        break;
                    }
                }
                LinkEvent::Closed { code, reason } => {
                    debug!(peer = %peer, code = ?code, reason = %reason, "Incoming connection closed");
                    break;
                }
                LinkEvent::Error(e) => {
                    warn!(peer = %peer, error = %e, "Incoming connection errored");
                    break;
                }
            }
        }

        self.incoming.remove(entry.id());
        info!(
            peer = %peer,
            connections_in = self.incoming.len(),
            "Incoming connection gone"
        );
    }
}
