//! # Broadcast Envelope Codec
//!
//! Builds and signs outgoing envelopes.

use crate::domain::{canonical_payload, BroadcastEnvelope, GossipError, MESSAGE_TYPE};
use crate::ports::TimeSource;
use serde_json::Value;
use shared_crypto::NodeIdentity;
use std::sync::Arc;

/// Signs payloads into wire envelopes.
#[derive(Clone)]
pub struct BroadcastCodec {
    identity: Arc<NodeIdentity>,
    clock: Arc<dyn TimeSource>,
}

impl BroadcastCodec {
    /// Codec signing with `identity` by default.
    pub fn new(identity: Arc<NodeIdentity>, clock: Arc<dyn TimeSource>) -> Self {
        Self { identity, clock }
    }

    /// The configured identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Envelope for `payload`, timestamped now.
    ///
    /// `private_key` overrides the configured identity for this call.
    pub fn encode(&self, payload: &Value, private_key: Option<&str>) -> Result<String, GossipError> {
        self.encode_at(payload, private_key, self.clock.now_ms())
    }

    /// Envelope for a plain text payload.
    pub fn encode_text(&self, payload: &str, private_key: Option<&str>) -> Result<String, GossipError> {
        self.encode(&Value::String(payload.to_string()), private_key)
    }

    /// Envelope for `payload` with an explicit timestamp.
    pub fn encode_at(
        &self,
        payload: &Value,
        private_key: Option<&str>,
        timestamp: i64,
    ) -> Result<String, GossipError> {
        self.envelope_at(payload, private_key, timestamp)?.to_wire()
    }

    /// Signed envelope before serialisation.
    pub fn envelope_at(
        &self,
        payload: &Value,
        private_key: Option<&str>,
        timestamp: i64,
    ) -> Result<BroadcastEnvelope, GossipError> {
        let public_key = self.identity.public_key(private_key)?;
        let message = canonical_payload(payload);
        let signature = self.identity.sign(&message, private_key)?;

        Ok(BroadcastEnvelope {
            kind: MESSAGE_TYPE.to_string(),
            timestamp,
            public_key,
            signature,
            data: payload.clone(),
        })
    }
}
