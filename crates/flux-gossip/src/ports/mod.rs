//! # Ports Layer
//!
//! Trait boundaries between the gossip core and its host. Everything with
//! I/O (registry queries, sockets, time, authorization) sits behind one of
//! these traits so the services can be driven by in-memory doubles.

pub mod outbound;

pub use outbound::{
    DialedPeer, LinkEvent, NodeRegistry, PeerDialer, PeerLink, Privilege, PrivilegeChecker,
    RegistryError, RequestContext, TimeSource,
};
