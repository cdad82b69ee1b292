//! # Flux Gossip - Authenticated Websocket Mesh
//!
//! The peer-to-peer gossip layer of a ZelFlux node. It keeps a mesh of
//! outgoing and incoming websocket links to other nodes, authenticates every
//! broadcast with the sender's node key, and grows the outgoing mesh toward
//! a target size derived from the node registry.
//!
//! ## Architecture
//!
//! Hexagonal layout:
//! - **Domain:** envelope, node records, timestamp windows, peer target math
//! - **Ports:** node registry, dialer/link, clock, privilege checker
//! - **Service:** codec, verifier, connection registry, dispatcher,
//!   connection manager, inbound handler, discovery loop, keepalive, API
//! - **Adapters:** websocket dialer and daemon RPC client (feature
//!   `network`), plus in-memory and static implementations
//!
//! ## Example
//!
//! ```rust
//! use flux_gossip::adapters::{InMemoryNodeRegistry, SystemTimeSource};
//! use flux_gossip::{BroadcastCodec, MessageVerifier, NodeRecord, NodeStatus};
//! use shared_crypto::NodeIdentity;
//! use std::sync::Arc;
//!
//! # tokio_test_block_on(async {
//! let identity = Arc::new(NodeIdentity::generate());
//! let pubkey = identity.public_key(None).unwrap();
//! let clock = Arc::new(SystemTimeSource::new());
//! let registry = Arc::new(InMemoryNodeRegistry::new(vec![
//!     NodeRecord::new(pubkey, "10.0.0.1:16125", NodeStatus::Enabled),
//! ]));
//!
//! let codec = BroadcastCodec::new(identity, clock.clone());
//! let verifier = MessageVerifier::new(registry, clock);
//!
//! let frame = codec.encode_text("Hello ZelFlux", None).unwrap();
//! assert!(verifier.verify_broadcast(frame.as_str().into(), None, None).await);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// ADAPTERS (network transports are feature-gated inside)
// =============================================================================

pub mod adapters;

/// Test doubles (FixedTimeSource, MockLink, MockDialer).
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use domain::{
    canonical_payload, BroadcastEnvelope, CandidateRejection, GossipConfig, GossipError,
    NodeRecord, NodeStatus, RawEnvelope,
};
pub use ports::{
    DialedPeer, LinkEvent, NodeRegistry, PeerDialer, PeerLink, Privilege, PrivilegeChecker,
    RegistryError, RequestContext, TimeSource,
};
pub use service::{
    ApiResponse, ApiStatus, BroadcastCodec, BroadcastDispatcher, ConnectionManager,
    ConnectionRegistry, ConnectionState, DiscoveryLoop, DiscoveryTick, DispatchReport,
    FrameVerdict, GossipApi, GossipHandle, GossipNode, InboundHandler, Keepalive,
    MessageVerifier, TickAction,
};
