//! Adapters - concrete implementations of the ports
//!
//! | Adapter | Port | Feature |
//! |---------|------|---------|
//! | `SystemTimeSource` | `TimeSource` | - |
//! | `ChannelLink` | `PeerLink` | - |
//! | `InMemoryNodeRegistry` | `NodeRegistry` | - |
//! | `StaticPrivilegeChecker` | `PrivilegeChecker` | - |
//! | `DaemonNodeRegistry` | `NodeRegistry` | `network` |
//! | `WsDialer` | `PeerDialer` | `network` |

pub mod channel;
pub mod privilege;
pub mod registry;
pub mod time;

#[cfg(feature = "network")]
pub mod daemon;
#[cfg(feature = "network")]
pub mod websocket;

pub use channel::{ChannelLink, Outbound};
pub use privilege::{StaticPrivilegeChecker, AUTH_HEADER};
pub use registry::InMemoryNodeRegistry;
pub use time::SystemTimeSource;

#[cfg(feature = "network")]
pub use daemon::{DaemonNodeRegistry, DaemonRpcConfig};
#[cfg(feature = "network")]
pub use websocket::WsDialer;
