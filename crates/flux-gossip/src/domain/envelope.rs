//! # Broadcast Envelope
//!
//! The signed, timestamped unit exchanged between nodes:
//!
//! ```json
//! {"type":"message","timestamp":1700000000000,"pubKey":"02..","signature":"H..","data":..}
//! ```
//!
//! `signature` covers the canonical string form of `data`: the string itself
//! when `data` is a JSON string, its compact JSON serialisation otherwise.

use crate::domain::GossipError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value of the `type` field on every broadcast.
pub const MESSAGE_TYPE: &str = "message";

/// A decoded broadcast envelope. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    /// Envelope kind, always `"message"` for broadcasts
    #[serde(rename = "type")]
    pub kind: String,
    /// Sender clock, milliseconds since the epoch
    pub timestamp: i64,
    /// Hex public key of the sender
    #[serde(rename = "pubKey", alias = "publicKey")]
    pub public_key: String,
    /// Base64 compact signature of the canonical payload
    pub signature: String,
    /// Opaque application payload
    pub data: Value,
}

impl BroadcastEnvelope {
    /// Canonical string the signature covers.
    pub fn signed_payload(&self) -> String {
        canonical_payload(&self.data)
    }

    /// Serialise for the wire.
    pub fn to_wire(&self) -> Result<String, GossipError> {
        serde_json::to_string(self).map_err(|e| GossipError::MalformedEnvelope(e.to_string()))
    }
}

/// Canonical string form of a payload.
pub fn canonical_payload(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Something that can be decoded into an envelope: raw frame text or an
/// already parsed JSON value.
#[derive(Debug, Clone, Copy)]
pub enum RawEnvelope<'a> {
    /// Frame text as received
    Text(&'a str),
    /// Parsed JSON
    Value(&'a Value),
}

impl<'a> From<&'a str> for RawEnvelope<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a String> for RawEnvelope<'a> {
    fn from(s: &'a String) -> Self {
        Self::Text(s.as_str())
    }
}

impl<'a> From<&'a Value> for RawEnvelope<'a> {
    fn from(v: &'a Value) -> Self {
        Self::Value(v)
    }
}

impl<'a> RawEnvelope<'a> {
    /// Parse into an envelope; missing fields are `MalformedEnvelope`.
    pub fn decode(self) -> Result<BroadcastEnvelope, GossipError> {
        let parsed = match self {
            Self::Text(s) => serde_json::from_str(s),
            Self::Value(v) => BroadcastEnvelope::deserialize(v),
        };
        parsed.map_err(|e| GossipError::MalformedEnvelope(e.to_string()))
    }
}
