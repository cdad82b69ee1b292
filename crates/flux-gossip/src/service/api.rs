//! # Request Surface
//!
//! Framework-independent handlers behind the node's HTTP endpoints. Every
//! operation answers `{status, data: {message}}` and never fails.

use super::connections::ConnectionRegistry;
use super::manager::ConnectionManager;
use crate::domain::GossipConfig;
use crate::ports::{Privilege, PrivilegeChecker, RequestContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Message when `broadcast` has no payload.
pub const NO_MESSAGE: &str = "No message to broadcast attached.";
/// Message after a successful broadcast.
pub const BROADCAST_OK: &str = "Message successfully broadcasted to ZelFlux network";
/// Message when `add_peer` has no address.
pub const NO_IP: &str = "No IP address specified.";
/// Message when the privilege gate refuses the caller.
pub const UNAUTHORIZED: &str = "Unauthorized. Access denied.";

/// Outcome tag of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    /// Operation ran
    Success,
    /// Operation refused or failed
    Error,
}

/// `message` body: a sentence or an address list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiMessage {
    /// Human readable sentence
    Text(String),
    /// Peer addresses
    Peers(Vec<String>),
}

/// `data` object of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiData {
    /// Payload
    pub message: ApiMessage,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Outcome
    pub status: ApiStatus,
    /// Body
    pub data: ApiData,
}

impl ApiResponse {
    /// Success with a sentence.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Success,
            data: ApiData {
                message: ApiMessage::Text(message.into()),
            },
        }
    }

    /// Success with an address list.
    pub fn peers(peers: Vec<String>) -> Self {
        Self {
            status: ApiStatus::Success,
            data: ApiData {
                message: ApiMessage::Peers(peers),
            },
        }
    }

    /// Error with a sentence.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Error,
            data: ApiData {
                message: ApiMessage::Text(message.into()),
            },
        }
    }

    /// True for `status: success`.
    pub fn is_success(&self) -> bool {
        self.status == ApiStatus::Success
    }
}

/// Handlers for broadcast and peer management requests.
pub struct GossipApi {
    manager: Arc<ConnectionManager>,
    incoming: Arc<ConnectionRegistry>,
    privileges: Arc<dyn PrivilegeChecker>,
    inverted_authorization: bool,
}

impl GossipApi {
    /// API over a running node.
    pub fn new(
        manager: Arc<ConnectionManager>,
        incoming: Arc<ConnectionRegistry>,
        privileges: Arc<dyn PrivilegeChecker>,
        config: &GossipConfig,
    ) -> Self {
        Self {
            manager,
            incoming,
            privileges,
            inverted_authorization: config.legacy_inverted_authorization,
        }
    }

    /// Whether the privileged branch runs for this caller.
    ///
    /// In legacy mode the action runs when the check answers "not authorized".
    async fn may_run(&self, ctx: &RequestContext) -> bool {
        let authorized = self.privileges.check_privilege(Privilege::ZelTeam, ctx).await;
        authorized != self.inverted_authorization
    }

    /// Sign `data` with the node identity and send it to every outgoing peer.
    pub async fn broadcast(&self, data: Option<String>, ctx: &RequestContext) -> ApiResponse {
        let Some(data) = data else {
            return ApiResponse::error(NO_MESSAGE);
        };
        if !self.may_run(ctx).await {
            return ApiResponse::error(UNAUTHORIZED);
        }

        match self.manager.broadcast(&Value::String(data)) {
            Ok(report) => {
                info!(delivered = report.delivered, "User broadcast sent");
                ApiResponse::success(BROADCAST_OK)
            }
            Err(e) => {
                warn!(error = %e, "User broadcast not sent");
                ApiResponse::error("Unknown error")
            }
        }
    }

    /// Start an outgoing connection to `ip`.
    pub async fn add_peer(&self, ip: Option<String>, ctx: &RequestContext) -> ApiResponse {
        let Some(ip) = ip else {
            return ApiResponse::error(NO_IP);
        };
        if !self.may_run(ctx).await {
            return ApiResponse::error(UNAUTHORIZED);
        }

        if self.manager.connect(&ip).is_none() {
            info!(peer = %ip, "Peer already connected, dial skipped");
        }
        ApiResponse::success(format!("Outgoing connection to {ip} initiated"))
    }

    /// Addresses of outgoing peers.
    pub fn connected_peers(&self) -> ApiResponse {
        ApiResponse::peers(self.manager.outgoing().addresses())
    }

    /// Addresses of accepted peers.
    pub fn incoming_peers(&self) -> ApiResponse {
        ApiResponse::peers(self.incoming.addresses())
    }
}
