//! # Connection Manager
//!
//! Owns the lifecycle of outgoing links:
//!
//! ```text
//! Connecting ──open──▶ Open ──close/error──▶ Closed
//!      │
//!      └──dial error──▶ Failed
//! ```
//!
//! On open the link is registered and a signed greeting is dispatched to the
//! mesh. Frames received on outgoing links are only logged.

use super::codec::BroadcastCodec;
use super::connections::ConnectionRegistry;
use super::dispatcher::{BroadcastDispatcher, DispatchReport};
use crate::domain::{GossipError, GREETING};
use crate::ports::{DialedPeer, LinkEvent, PeerDialer};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// State of one outgoing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Dial in progress
    Connecting,
    /// Registered and live
    Open,
    /// Was open, now removed
    Closed,
    /// Dial failed, never registered
    Failed,
}

/// Dials peers and keeps the outgoing registry in sync with socket state.
pub struct ConnectionManager {
    dialer: Arc<dyn PeerDialer>,
    dispatcher: BroadcastDispatcher,
    codec: BroadcastCodec,
}

impl ConnectionManager {
    /// Manager registering links into `outgoing`.
    pub fn new(
        dialer: Arc<dyn PeerDialer>,
        outgoing: Arc<ConnectionRegistry>,
        codec: BroadcastCodec,
    ) -> Self {
        Self {
            dialer,
            dispatcher: BroadcastDispatcher::new(outgoing),
            codec,
        }
    }

    /// The outgoing registry.
    pub fn outgoing(&self) -> &Arc<ConnectionRegistry> {
        self.dispatcher.registry()
    }

    /// The codec used for greetings and broadcasts.
    pub fn codec(&self) -> &BroadcastCodec {
        &self.codec
    }

    /// Start an outgoing connection to `host`.
    ///
    /// Returns `None` without dialing when a link to `host` exists or is
    /// being dialed. The task resolves to the terminal state of the link.
    pub fn connect(self: &Arc<Self>, host: &str) -> Option<JoinHandle<ConnectionState>> {
        let reservation = match self.outgoing().begin_dial(host) {
            Some(reservation) => reservation,
            None => {
                debug!(peer = %host, "Already connected, not dialing");
                return None;
            }
        };

        let manager = Arc::clone(self);
        Some(tokio::spawn(async move {
            let host = reservation.host().to_string();
            let DialedPeer { link, mut events } = match manager.dialer.dial(&host).await {
                Ok(peer) => peer,
                Err(e) => {
                    warn!(peer = %host, error = %e, "Outgoing connection failed");
                    return ConnectionState::Failed;
                }
            };

            let entry = reservation.complete(link);
            info!(
                peer = %host,
                connections_out = manager.outgoing().len(),
                "Outgoing connection open"
            );

            if let Err(e) = manager.broadcast_text(GREETING) {
                warn!(error = %e, "Greeting not sent");
            }

            loop {
                match events.recv().await {
                    Some(LinkEvent::Message(text)) => {
                        debug!(peer = %host, len = text.len(), "Frame on outgoing link");
                    }
                    Some(LinkEvent::Closed { code, reason }) => {
                        manager.outgoing().remove(entry.id());
                        info!(
                            peer = %host,
                            code = ?code,
                            reason = %reason,
                            connections_out = manager.outgoing().len(),
                            "Outgoing connection closed"
                        );
                        return ConnectionState::Closed;
                    }
                    Some(LinkEvent::Error(e)) => {
                        manager.outgoing().remove(entry.id());
                        warn!(
                            peer = %host,
                            error = %e,
                            connections_out = manager.outgoing().len(),
                            "Outgoing connection errored"
                        );
                        return ConnectionState::Closed;
                    }
                    None => {
                        manager.outgoing().remove(entry.id());
                        debug!(peer = %host, "Outgoing link event stream ended");
                        return ConnectionState::Closed;
                    }
                }
            }
        }))
    }

    /// Sign `payload` with the node identity and dispatch it.
    pub fn broadcast(&self, payload: &Value) -> Result<DispatchReport, GossipError> {
        self.broadcast_as(payload, None)
    }

    /// Sign `payload` with `private_key` (or the node identity) and dispatch it.
    pub fn broadcast_as(
        &self,
        payload: &Value,
        private_key: Option<&str>,
    ) -> Result<DispatchReport, GossipError> {
        let frame = self.codec.encode(payload, private_key)?;
        Ok(self.dispatcher.dispatch(&frame))
    }

    /// Sign a text payload and dispatch it.
    pub fn broadcast_text(&self, payload: &str) -> Result<DispatchReport, GossipError> {
        self.broadcast(&Value::String(payload.to_string()))
    }

    /// Dispatch an already signed frame unchanged.
    pub fn relay(&self, frame: &str) -> DispatchReport {
        self.dispatcher.dispatch(frame)
    }
}
