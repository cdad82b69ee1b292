//! # Message Hashing
//!
//! Double SHA-256 over the coin protocol's signed-message framing:
//!
//! ```text
//! SHA256(SHA256( 0x18 || "Bitcoin Signed Message:\n" || varint(len) || message ))
//! ```
//!
//! The framing keeps a message signature from ever being valid as a
//! transaction signature.

use sha2::{Digest, Sha256};

/// 256-bit digest.
pub type Hash = [u8; 32];

/// Prefix prepended to every signed message (length byte included).
pub const MESSAGE_PREFIX: &[u8] = b"\x18Bitcoin Signed Message:\n";

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Append a compact-size integer as used by the coin's serialisation.
fn write_varint(buf: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Digest that is actually signed for `message`.
pub fn message_hash(message: &[u8]) -> Hash {
    let mut buf = Vec::with_capacity(MESSAGE_PREFIX.len() + 9 + message.len());
    buf.extend_from_slice(MESSAGE_PREFIX);
    write_varint(&mut buf, message.len() as u64);
    buf.extend_from_slice(message);
    sha256d(&buf)
}
