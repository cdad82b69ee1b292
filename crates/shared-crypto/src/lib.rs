//! # Shared Crypto - Node Identity & Message Signing
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `ecdsa` | secp256k1 keys in WIF / SEC1-hex form |
//! | `hashing` | Double SHA-256 signed-message digest |
//! | `message` | Compact recoverable signatures (base64) |
//! | `identity` | The node's configured key with per-call override |
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces, low-S normalisation
//! - Verification is infallible: malformed input yields `false`
//! - Decoded secret material is zeroized after parsing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod identity;
pub mod message;

// Re-exports
pub use ecdsa::{derive_public_key, PrivateKey, PublicKey};
pub use errors::CryptoError;
pub use identity::NodeIdentity;
pub use message::{recover_public_key, sign_message, sign_with_key, verify_message};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
