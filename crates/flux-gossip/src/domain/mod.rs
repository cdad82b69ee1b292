//! Domain Layer - pure gossip types and predicates, no I/O
//!
//! - Node records as published by the registry
//! - The broadcast envelope and its canonical payload
//! - Timestamp windows
//! - Peer target arithmetic

pub mod config;
pub mod discovery;
pub mod envelope;
pub mod errors;
pub mod freshness;
pub mod node;
pub mod protocol;

pub use config::GossipConfig;
pub use discovery::{needs_more_peers, screen_candidate, target_peer_count, CandidateRejection};
pub use envelope::{canonical_payload, BroadcastEnvelope, RawEnvelope, MESSAGE_TYPE};
pub use errors::GossipError;
pub use freshness::{
    is_beyond_clock_skew, is_fresh, is_stale_for_rebroadcast, MAX_FUTURE_SKEW_MS,
    ORIGINAL_WINDOW_MS,
};
pub use node::{NodeRecord, NodeStatus};
pub use protocol::*;
