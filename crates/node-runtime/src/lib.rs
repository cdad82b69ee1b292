//! # Flux Node Runtime Library
//!
//! Everything `fluxd` does, exposed for embedding and integration tests.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and construction of the gossip core
//! - `server/` - axum routes for the request surface and the peer websocket
//! - `runtime` - startup, listening and graceful shutdown

#![warn(missing_docs)]

pub mod container;
pub mod runtime;
pub mod server;

pub use container::{ConfigError, NodeConfig, ServiceContainer};
pub use runtime::NodeRuntime;
