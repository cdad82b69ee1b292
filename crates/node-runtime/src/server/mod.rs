//! # HTTP + Websocket Server
//!
//! | Route | Method | Handler |
//! |-------|--------|---------|
//! | `/zelflux/broadcast[/:data]` | GET, POST | [`http::broadcast`] |
//! | `/zelflux/addpeer[/:ip]` | GET, POST | [`http::add_peer`] |
//! | `/zelflux/connectedpeers` | GET | [`http::connected_peers`] |
//! | `/zelflux/incomingconnections` | GET | [`http::incoming_connections`] |
//! | `/ws/zelflux/` | GET (upgrade) | [`ws::accept`] |

pub mod http;
pub mod ws;

use axum::routing::get;
use axum::Router;
use flux_gossip::{GossipApi, InboundHandler};
use std::sync::Arc;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Request handlers of the gossip core.
    pub api: Arc<GossipApi>,
    /// Handler for accepted peer sockets.
    pub inbound: Arc<InboundHandler>,
}

/// Build the node router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/zelflux/broadcast",
            get(http::broadcast).post(http::broadcast),
        )
        .route(
            "/zelflux/broadcast/:data",
            get(http::broadcast).post(http::broadcast),
        )
        .route("/zelflux/addpeer", get(http::add_peer).post(http::add_peer))
        .route(
            "/zelflux/addpeer/:ip",
            get(http::add_peer).post(http::add_peer),
        )
        .route("/zelflux/connectedpeers", get(http::connected_peers))
        .route(
            "/zelflux/incomingconnections",
            get(http::incoming_connections),
        )
        .route("/ws/zelflux/", get(ws::accept))
        .with_state(state)
}
