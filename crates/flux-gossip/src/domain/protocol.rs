//! Protocol constants shared by every node on the mesh.

/// Payload of the greeting sent on every new outgoing link.
pub const GREETING: &str = "Hello ZelFlux";

/// Payload of the periodic keepalive. Spelling matches the deployed network.
pub const HEARTBEAT: &str = "HearthBeat";

/// Websocket path on the API port.
pub const WS_PATH: &str = "/ws/zelflux/";

/// Websocket close code for unauthenticated senders.
pub const POLICY_VIOLATION_CODE: u16 = 1008;

/// Close reason sent with [`POLICY_VIOLATION_CODE`].
pub const POLICY_VIOLATION_REASON: &str = "invalid message, disconnect";

/// Default node API port.
pub const DEFAULT_API_PORT: u16 = 16127;

/// Reply for an authenticated, fresh frame.
pub fn received_ack(own_ip: &str) -> String {
    format!("ZelFlux {own_ip} says message received!")
}

/// Reply for an authenticated but outdated frame.
pub fn outdated_ack(own_ip: &str) -> String {
    format!("ZelFlux {own_ip} says message received but your message is outdated!")
}

/// Websocket URL of a peer.
pub fn peer_url(host: &str, api_port: u16) -> String {
    format!("ws://{host}:{api_port}{WS_PATH}")
}
