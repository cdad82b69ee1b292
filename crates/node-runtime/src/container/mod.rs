//! # Service Container
//!
//! Holds the configured gossip core and the adapters it was wired with.
//!
//! - `config` - TOML + environment configuration
//! - `services` - port selection and construction of the gossip node

pub mod config;
pub mod services;

pub use config::{ConfigError, NodeConfig};
pub use services::ServiceContainer;
