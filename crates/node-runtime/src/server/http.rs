//! JSON request handlers.
//!
//! Route parameters win over the query string, so `/zelflux/addpeer/1.2.3.4`
//! and `/zelflux/addpeer?ip=1.2.3.4` are equivalent.

use super::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use flux_gossip::{ApiResponse, RequestContext};
use std::collections::HashMap;
use tracing::debug;

/// Request headers as a privilege context.
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    let mut ctx = RequestContext::default();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            ctx.insert(name.as_str(), value);
        }
    }
    ctx
}

fn param(
    path: Option<Path<String>>,
    query: &HashMap<String, String>,
    name: &str,
) -> Option<String> {
    path.map(|Path(value)| value)
        .or_else(|| query.get(name).cloned())
}

/// `/zelflux/broadcast[/:data]`
pub async fn broadcast(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Option<Path<String>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<ApiResponse> {
    let data = param(path, &query, "data");
    debug!(has_data = data.is_some(), "Broadcast requested");
    Json(state.api.broadcast(data, &request_context(&headers)).await)
}

/// `/zelflux/addpeer[/:ip]`
pub async fn add_peer(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Option<Path<String>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<ApiResponse> {
    let ip = param(path, &query, "ip");
    Json(state.api.add_peer(ip, &request_context(&headers)).await)
}

/// `/zelflux/connectedpeers`
pub async fn connected_peers(State(state): State<AppState>) -> Json<ApiResponse> {
    Json(state.api.connected_peers())
}

/// `/zelflux/incomingconnections`
pub async fn incoming_connections(State(state): State<AppState>) -> Json<ApiResponse> {
    Json(state.api.incoming_peers())
}
