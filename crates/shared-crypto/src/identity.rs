//! # Node Identity
//!
//! The node's own signing key, with per-call override.
//!
//! Every operation takes an optional WIF key; when it is `None` the node's
//! configured key is used.

use crate::ecdsa::PrivateKey;
use crate::message::sign_with_key;
use crate::CryptoError;

/// The node's configured identity key.
#[derive(Clone, Debug)]
pub struct NodeIdentity {
    key: PrivateKey,
}

impl NodeIdentity {
    /// Build from the configured WIF key.
    pub fn from_wif(wif: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            key: PrivateKey::from_wif(wif)?,
        })
    }

    /// Build from an already parsed key.
    pub fn from_key(key: PrivateKey) -> Self {
        Self { key }
    }

    /// Fresh random identity.
    pub fn generate() -> Self {
        Self::from_key(PrivateKey::generate())
    }

    /// The configured key as WIF.
    pub fn wif(&self) -> String {
        self.key.to_wif()
    }

    /// Hex public key of `override_key`, or of the configured key.
    pub fn public_key(&self, override_key: Option<&str>) -> Result<String, CryptoError> {
        match override_key {
            Some(wif) => Ok(PrivateKey::from_wif(wif)?.public_key().to_hex()),
            None => Ok(self.key.public_key().to_hex()),
        }
    }

    /// Sign `message` with `override_key`, or with the configured key.
    pub fn sign(&self, message: &str, override_key: Option<&str>) -> Result<String, CryptoError> {
        match override_key {
            Some(wif) => sign_with_key(message, &PrivateKey::from_wif(wif)?),
            None => sign_with_key(message, &self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::verify_message;

    #[test]
    fn test_default_key_used_without_override() {
        let identity = NodeIdentity::generate();
        let public = identity.public_key(None).unwrap();
        let signature = identity.sign("payload", None).unwrap();
        assert!(verify_message("payload", &public, &signature));
    }

    #[test]
    fn test_override_key_takes_precedence() {
        let identity = NodeIdentity::generate();
        let other = PrivateKey::generate();
        let wif = other.to_wif();

        let public = identity.public_key(Some(&wif)).unwrap();
        assert_eq!(public, other.public_key().to_hex());
        assert_ne!(public, identity.public_key(None).unwrap());

        let signature = identity.sign("payload", Some(&wif)).unwrap();
        assert!(verify_message("payload", &public, &signature));
    }

    #[test]
    fn test_bad_override_fails_closed() {
        let identity = NodeIdentity::generate();
        assert!(identity.sign("payload", Some("garbage")).is_err());
        assert!(identity.public_key(Some("garbage")).is_err());
    }

    #[test]
    fn test_wif_reload() {
        let identity = NodeIdentity::generate();
        let reloaded = NodeIdentity::from_wif(&identity.wif()).unwrap();
        assert_eq!(
            identity.public_key(None).unwrap(),
            reloaded.public_key(None).unwrap()
        );
    }
}
