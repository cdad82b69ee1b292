//! Accepting side of the peer websocket.
//!
//! The upgraded socket is split like an outgoing one: a writer task drains
//! a [`ChannelLink`], a reader task turns frames into [`LinkEvent`]s, and
//! the gossip core's [`InboundHandler`] serves the pair.

use super::AppState;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use flux_gossip::adapters::{ChannelLink, Outbound};
use flux_gossip::{InboundHandler, LinkEvent};
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tracing::debug;

/// `/ws/zelflux/`
pub async fn accept(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, remote, state.inbound))
}

/// Serve an upgraded socket until the peer leaves or is rejected.
pub async fn serve_socket(socket: WebSocket, remote: SocketAddr, inbound: Arc<InboundHandler>) {
    let peer = remote.ip().to_canonical().to_string();
    let (mut write, mut read) = socket.split();
    let (link, mut outbound) = ChannelLink::new(peer.clone());
    let (events_tx, events_rx) = unbounded_channel();

    let writer_peer = peer.clone();
    let writer = tokio::spawn(async move {
        while let Some(command) = outbound.recv().await {
            let result = match command {
                Outbound::Text(text) => write.send(Message::Text(text)).await,
                Outbound::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: Cow::Owned(reason),
                    };
                    let _ = write.send(Message::Close(Some(frame))).await;
                    break;
                }
            };
            if let Err(e) = result {
                debug!(peer = %writer_peer, error = %e, "Websocket write failed");
                break;
            }
        }
    });

    let reader = tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            let event = match msg {
                Ok(Message::Text(text)) => LinkEvent::Message(text),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = match frame {
                        Some(frame) => (Some(frame.code), frame.reason.into_owned()),
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

    inbound.serve(link, events_rx).await;

    // The link is gone once serve returns, so the writer flushes any close
    // frame and exits on its own.
    reader.abort();
    let _ = writer.await;
    debug!(peer = %peer, "Socket tasks finished");
}
