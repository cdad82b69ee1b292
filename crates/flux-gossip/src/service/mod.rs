//! Service Layer - wires the domain to the ports
//!
//! | Service | Role |
//! |---------|------|
//! | `codec` | Signs payloads into envelopes |
//! | `verifier` | Two-tier envelope validation |
//! | `connections` | Registry of live links |
//! | `dispatcher` | Fan-out with failure pruning |
//! | `manager` | Outgoing connection lifecycle |
//! | `inbound` | Accepted connection handling |
//! | `discovery` | Peer target control loop |
//! | `keepalive` | Heartbeat timer |
//! | `api` | Request handlers |
//! | `node` | Wiring and supervision |

pub mod api;
pub mod codec;
pub mod connections;
pub mod discovery;
pub mod dispatcher;
pub mod inbound;
pub mod keepalive;
pub mod manager;
pub mod node;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use api::{ApiData, ApiMessage, ApiResponse, ApiStatus, GossipApi};
pub use codec::BroadcastCodec;
pub use connections::{ConnectionEntry, ConnectionId, ConnectionRegistry, DialReservation, Direction};
pub use discovery::{DiscoveryLoop, DiscoveryTick, TickAction};
pub use dispatcher::{BroadcastDispatcher, DispatchReport};
pub use inbound::{FrameVerdict, InboundHandler};
pub use keepalive::Keepalive;
pub use manager::{ConnectionManager, ConnectionState};
pub use node::{GossipHandle, GossipNode};
pub use verifier::MessageVerifier;
