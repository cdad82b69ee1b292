//! Domain errors for the gossip mesh.

use shared_crypto::CryptoError;
use thiserror::Error;

/// Errors raised by gossip operations.
///
/// None of these are fatal to the node: every failure degrades to
/// "this operation did not happen" and is logged by the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GossipError {
    /// Inbound frame is not a parseable envelope
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Identity key could not be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signature could not be produced
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A single link refused a frame
    #[error("Send to {peer} failed: {reason}")]
    SendFailure {
        /// Remote address of the link
        peer: String,
        /// Transport-level reason
        reason: String,
    },

    /// The node registry could not be queried
    #[error("Node registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// An outgoing socket could not be opened
    #[error("Connection to {peer} failed: {reason}")]
    ConnectFailed {
        /// Host that was dialed
        peer: String,
        /// Transport-level reason
        reason: String,
    },
}

impl From<CryptoError> for GossipError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKey(reason) => Self::InvalidKey(reason),
            other => Self::Signing(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_error_mapping() {
        let err: GossipError = CryptoError::InvalidKey("bad".into()).into();
        assert_eq!(err, GossipError::InvalidKey("bad".into()));

        let err: GossipError = CryptoError::SigningError("nonce".into()).into();
        assert!(matches!(err, GossipError::Signing(_)));
    }

    #[test]
    fn test_display() {
        let err = GossipError::SendFailure {
            peer: "10.0.0.1".into(),
            reason: "closed".into(),
        };
        assert_eq!(err.to_string(), "Send to 10.0.0.1 failed: closed");
    }
}
