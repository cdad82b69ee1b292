//! # Signed Messages
//!
//! Compact recoverable signatures over the coin's signed-message digest.
//!
//! Wire form is base64 of 65 bytes: `header || r || s` where
//! `header = 27 + recovery_id + (compressed ? 4 : 0)`.
//!
//! Verification recovers the signer from the signature and compares its
//! serialisation with the claimed public key. It never errors: anything
//! malformed is simply not a valid signature.

use crate::ecdsa::{PrivateKey, PublicKey};
use crate::hashing::message_hash;
use crate::CryptoError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// Length of a compact recoverable signature.
pub const COMPACT_SIGNATURE_LEN: usize = 65;

/// Base value of the compact signature header byte.
const HEADER_BASE: u8 = 27;

/// Header offset marking a compressed public key.
const HEADER_COMPRESSED: u8 = 4;

/// Sign `message` with an already parsed key, returning base64.
pub fn sign_with_key(message: &str, key: &PrivateKey) -> Result<String, CryptoError> {
    let digest = message_hash(message.as_bytes());
    let (signature, recovery_id): (Signature, RecoveryId) = key
        .signing_key()
        .sign_prehash_recoverable(&digest)
        .map_err(|e| CryptoError::SigningError(e.to_string()))?;

    let mut header = HEADER_BASE + recovery_id.to_byte();
    if key.is_compressed() {
        header += HEADER_COMPRESSED;
    }

    let mut compact = [0u8; COMPACT_SIGNATURE_LEN];
    compact[0] = header;
    compact[1..].copy_from_slice(&signature.to_bytes());
    Ok(STANDARD.encode(compact))
}

/// Sign `message` with a WIF private key, returning base64.
pub fn sign_message(message: &str, wif: &str) -> Result<String, CryptoError> {
    let key = PrivateKey::from_wif(wif)?;
    sign_with_key(message, &key)
}

/// Recover the public key that produced `signature` over `message`.
pub fn recover_public_key(message: &str, signature: &str) -> Result<PublicKey, CryptoError> {
    let compact = STANDARD
        .decode(signature.trim())
        .map_err(|_| CryptoError::InvalidSignature)?;
    if compact.len() != COMPACT_SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature);
    }

    let flag = compact[0]
        .checked_sub(HEADER_BASE)
        .filter(|flag| *flag < 8)
        .ok_or(CryptoError::InvalidSignature)?;
    let compressed = flag & HEADER_COMPRESSED != 0;
    let recovery_id = RecoveryId::from_byte(flag & 3).ok_or(CryptoError::InvalidSignature)?;

    let sig = Signature::from_slice(&compact[1..]).map_err(|_| CryptoError::InvalidSignature)?;
    let digest = message_hash(message.as_bytes());
    let verifying_key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| CryptoError::InvalidSignature)?;

    Ok(PublicKey::new(verifying_key, compressed))
}

/// Check that `signature` over `message` was made by `public_key` (hex).
pub fn verify_message(message: &str, public_key: &str, signature: &str) -> bool {
    match recover_public_key(message, signature) {
        Ok(recovered) => recovered.to_hex().eq_ignore_ascii_case(public_key.trim()),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sign_verify() {
        let key = PrivateKey::generate();
        let public = key.public_key().to_hex();

        let signature = sign_with_key("Hello ZelFlux", &key).unwrap();
        assert!(verify_message("Hello ZelFlux", &public, &signature));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let key = PrivateKey::generate();
        let a = sign_with_key("deterministic", &key).unwrap();
        let b = sign_with_key("deterministic", &key).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_header_encodes_compression() {
        let key = PrivateKey::generate();
        let signature = sign_with_key("m", &key).unwrap();
        let header = STANDARD.decode(signature).unwrap()[0];
        assert!((31..=34).contains(&header));

        let mut secret = [0u8; 32];
        secret[31] = 7;
        let key = PrivateKey::from_bytes(secret, false).unwrap();
        let signature = sign_with_key("m", &key).unwrap();
        let header = STANDARD.decode(signature).unwrap()[0];
        assert!((27..=30).contains(&header));
        assert!(verify_message("m", &key.public_key().to_hex(), &sign_with_key("m", &key).unwrap()));
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = PrivateKey::generate();
        let other = PrivateKey::generate();
        let signature = sign_with_key("message", &signer).unwrap();
        assert!(!verify_message("message", &other.public_key().to_hex(), &signature));
    }

    #[test]
    fn test_uppercase_public_key_accepted() {
        let key = PrivateKey::generate();
        let signature = sign_with_key("case", &key).unwrap();
        let upper = key.public_key().to_hex().to_uppercase();
        assert!(verify_message("case", &upper, &signature));
    }

    #[test]
    fn test_malformed_signatures_return_false() {
        let key = PrivateKey::generate();
        let public = key.public_key().to_hex();
        assert!(!verify_message("m", &public, ""));
        assert!(!verify_message("m", &public, "%%%not base64%%%"));
        assert!(!verify_message("m", &public, &STANDARD.encode([0u8; 65])));
        assert!(!verify_message("m", &public, &STANDARD.encode([31u8; 12])));
    }

    #[test]
    fn test_sign_with_invalid_wif() {
        assert!(matches!(
            sign_message("m", "5Hinvalid"),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_tampered_message_fails(msg in ".{1,64}", suffix in ".{1,8}") {
            let key = PrivateKey::generate();
            let public = key.public_key().to_hex();
            let signature = sign_with_key(&msg, &key).unwrap();
            let tampered = format!("{msg}{suffix}");
            prop_assert!(!verify_message(&tampered, &public, &signature));
        }
    }
}
