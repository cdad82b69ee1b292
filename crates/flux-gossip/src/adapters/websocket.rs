//! Outgoing websocket transport (tokio-tungstenite).
//!
//! Each dialed socket is split into a writer task draining the link's
//! channel and a reader task turning frames into [`LinkEvent`]s.

use super::channel::{ChannelLink, Outbound};
use crate::domain::{peer_url, GossipError};
use crate::ports::{DialedPeer, LinkEvent, PeerDialer};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

/// Dials `ws://<host>:<api_port>/ws/zelflux/`.
#[derive(Debug, Clone)]
pub struct WsDialer {
    api_port: u16,
    connect_timeout: Duration,
}

impl WsDialer {
    /// Dialer for peers listening on `api_port`.
    pub fn new(api_port: u16, connect_timeout: Duration) -> Self {
        Self {
            api_port,
            connect_timeout,
        }
    }
}

#[async_trait]
impl PeerDialer for WsDialer {
    async fn dial(&self, host: &str) -> Result<DialedPeer, GossipError> {
        let url = peer_url(host, self.api_port);
        let connect_failed = |reason: String| GossipError::ConnectFailed {
            peer: host.to_string(),
            reason,
        };

        let (ws_stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| connect_failed("connect timed out".to_string()))?
            .map_err(|e| connect_failed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();
        let (link, mut outbound) = ChannelLink::new(host);
        let (events_tx, events_rx) = unbounded_channel();

        let peer = host.to_string();
        tokio::spawn(async move {
            while let Some(command) = outbound.recv().await {
                let result = match command {
                    Outbound::Text(text) => write.send(Message::Text(text.into())).await,
                    Outbound::Close { code, reason } => {
                        let frame = CloseFrame {
                            code: CloseCode::from(code),
                            reason: reason.into(),
                        };
                        let _ = write.send(Message::Close(Some(frame))).await;
                        break;
                    }
                };
                if let Err(e) = result {
                    debug!(peer = %peer, error = %e, "Websocket write failed");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                let event = match msg {
                    Ok(Message::Text(text)) => LinkEvent::Message(text.as_str().to_string()),
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = match frame {
                            Some(frame) => (Some(u16::from(frame.code)), frame.reason.as_str().to_string()),
                            None => (None, String::new()),
                        };
                        let _ = events_tx.send(LinkEvent::Closed { code, reason });
                        return;
                    }
                    Err(e) => {
                        let _ = events_tx.send(LinkEvent::Error(e.to_string()));
                        return;
                    }
                    Ok(_) => continue,
                };
                if events_tx.send(event).is_err() {
                    return;
                }
            }
            let _ = events_tx.send(LinkEvent::Closed {
                code: None,
                reason: "stream ended".to_string(),
            });
        });

        Ok(DialedPeer {
            link,
            events: events_rx,
        })
    }
}
