//! Channel-backed [`PeerLink`].
//!
//! The link queues frames on an unbounded channel drained by a per-socket
//! writer task. Once the writer is gone every send fails.

use crate::domain::GossipError;
use crate::ports::PeerLink;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Command for a socket writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write a text frame
    Text(String),
    /// Send a close frame and stop
    Close {
        /// Close code
        code: u16,
        /// Close reason
        reason: String,
    },
}

/// Sending half of a socket served by a writer task.
#[derive(Debug)]
pub struct ChannelLink {
    address: String,
    tx: UnboundedSender<Outbound>,
}

impl ChannelLink {
    /// New link and the receiver its writer task drains.
    pub fn new(address: impl Into<String>) -> (Arc<Self>, UnboundedReceiver<Outbound>) {
        let (tx, rx) = unbounded_channel();
        (
            Arc::new(Self {
                address: address.into(),
                tx,
            }),
            rx,
        )
    }
}

impl PeerLink for ChannelLink {
    fn send(&self, text: &str) -> Result<(), GossipError> {
        self.tx
            .send(Outbound::Text(text.to_string()))
            .map_err(|_| GossipError::SendFailure {
                peer: self.address.clone(),
                reason: "socket writer gone".to_string(),
            })
    }

    fn close(&self, code: u16, reason: &str) {
        let _ = self.tx.send(Outbound::Close {
            code,
            reason: reason.to_string(),
        });
    }

    fn remote_address(&self) -> &str {
        &self.address
    }
}
