//! Crypto error types.

use thiserror::Error;

/// Identity and signing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The private key is not a valid WIF string or not a valid scalar
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// Producing a signature failed
    #[error("Signing failed: {0}")]
    SigningError(String),

    /// The public key is not valid hex or not a point on the curve
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// The signature is not valid base64 or has the wrong shape
    #[error("Invalid signature")]
    InvalidSignature,
}
