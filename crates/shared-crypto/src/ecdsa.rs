//! # secp256k1 Keys
//!
//! Node identity keys in the coin's wallet formats.
//!
//! - Private keys are WIF: base58check of `version || secret(32) [|| 0x01]`.
//!   The trailing `0x01` marks a key whose public key is used compressed.
//! - Public keys are lowercase hex of the SEC1 encoding (33 bytes compressed,
//!   65 bytes uncompressed).

use crate::CryptoError;
use k256::ecdsa::{SigningKey, VerifyingKey};
use zeroize::Zeroizing;

/// WIF version byte for mainnet secret keys.
pub const WIF_VERSION: u8 = 0x80;

/// Marker byte appended to compressed-key WIF payloads.
const COMPRESSED_FLAG: u8 = 0x01;

/// A parsed node private key.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
    compressed: bool,
    version: u8,
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key().to_hex())
            .field("compressed", &self.compressed)
            .finish()
    }
}

impl PrivateKey {
    /// Generate a random compressed key.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
            compressed: true,
            version: WIF_VERSION,
        }
    }

    /// Create from raw secret bytes.
    pub fn from_bytes(bytes: [u8; 32], compressed: bool) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_bytes((&bytes).into())
            .map_err(|_| CryptoError::InvalidKey("secret is not a valid scalar".into()))?;
        Ok(Self {
            signing_key,
            compressed,
            version: WIF_VERSION,
        })
    }

    /// Parse a WIF string.
    pub fn from_wif(wif: &str) -> Result<Self, CryptoError> {
        let payload = Zeroizing::new(
            bs58::decode(wif.trim())
                .with_check(None)
                .into_vec()
                .map_err(|e| CryptoError::InvalidKey(e.to_string()))?,
        );

        let compressed = match payload.len() {
            33 => false,
            34 if payload[33] == COMPRESSED_FLAG => true,
            34 => return Err(CryptoError::InvalidKey("bad compression flag".into())),
            n => return Err(CryptoError::InvalidKey(format!("unexpected payload length {n}"))),
        };

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&payload[1..33]);
        let signing_key = SigningKey::from_bytes((&*secret).into())
            .map_err(|_| CryptoError::InvalidKey("secret is not a valid scalar".into()))?;

        Ok(Self {
            signing_key,
            compressed,
            version: payload[0],
        })
    }

    /// Encode back to WIF.
    pub fn to_wif(&self) -> String {
        let mut payload = Zeroizing::new(Vec::with_capacity(34));
        payload.push(self.version);
        payload.extend_from_slice(&self.signing_key.to_bytes());
        if self.compressed {
            payload.push(COMPRESSED_FLAG);
        }
        bs58::encode(payload.as_slice()).with_check().into_string()
    }

    /// Whether the public key is used in compressed form.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key().clone(),
            compressed: self.compressed,
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

/// A secp256k1 public key together with its serialisation form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
    compressed: bool,
}

impl PublicKey {
    pub(crate) fn new(verifying_key: VerifyingKey, compressed: bool) -> Self {
        Self {
            verifying_key,
            compressed,
        }
    }

    /// Parse from SEC1 hex (either form).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self {
            verifying_key,
            compressed: bytes.len() == 33,
        })
    }

    /// SEC1 bytes in this key's form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.verifying_key
            .to_encoded_point(self.compressed)
            .as_bytes()
            .to_vec()
    }

    /// Lowercase hex of the SEC1 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Whether this key serialises compressed.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

/// Derive the hex public key of a WIF private key.
pub fn derive_public_key(wif: &str) -> Result<String, CryptoError> {
    Ok(PrivateKey::from_wif(wif)?.public_key().to_hex())
}
