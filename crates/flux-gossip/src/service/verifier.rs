//! # Message Verifier
//!
//! Stateless validation of incoming envelopes. Two tiers:
//!
//! - [`MessageVerifier::verify_broadcast`]: authenticated, sender enabled,
//!   not from the future. Enough to acknowledge a message.
//! - [`MessageVerifier::verify_original_broadcast`]: additionally not older
//!   than five minutes. Required before rebroadcasting.
//!
//! Every failure, registry outages included, yields `false`.

use crate::domain::{
    is_beyond_clock_skew, is_fresh, is_stale_for_rebroadcast, BroadcastEnvelope, NodeRecord,
    RawEnvelope,
};
use crate::ports::{NodeRegistry, TimeSource};
use shared_crypto::verify_message;
use std::sync::Arc;
use tracing::{debug, warn};

/// Validates envelopes against the node registry.
#[derive(Clone)]
pub struct MessageVerifier {
    registry: Arc<dyn NodeRegistry>,
    clock: Arc<dyn TimeSource>,
}

impl MessageVerifier {
    /// Verifier backed by `registry`.
    pub fn new(registry: Arc<dyn NodeRegistry>, clock: Arc<dyn TimeSource>) -> Self {
        Self { registry, clock }
    }

    fn now_or(&self, now: Option<i64>) -> i64 {
        now.unwrap_or_else(|| self.clock.now_ms())
    }

    /// Accept an envelope signed by an enabled node and not more than two
    /// minutes in the future.
    ///
    /// `known_nodes` is searched before the registry is queried.
    pub async fn verify_broadcast(
        &self,
        raw: RawEnvelope<'_>,
        known_nodes: Option<&[NodeRecord]>,
        now: Option<i64>,
    ) -> bool {
        let envelope = match raw.decode() {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "Rejecting undecodable envelope");
                return false;
            }
        };
        self.authenticate(&envelope, known_nodes, self.now_or(now)).await
    }

    /// [`verify_broadcast`](Self::verify_broadcast) plus a staleness guard:
    /// envelopes older than five minutes are not original.
    pub async fn verify_original_broadcast(
        &self,
        raw: RawEnvelope<'_>,
        known_nodes: Option<&[NodeRecord]>,
        now: Option<i64>,
    ) -> bool {
        let envelope = match raw.decode() {
            Ok(envelope) => envelope,
            Err(_) => return false,
        };
        let now = self.now_or(now);
        if is_stale_for_rebroadcast(envelope.timestamp, now) {
            debug!(timestamp = envelope.timestamp, now, "Envelope too old to rebroadcast");
            return false;
        }
        self.authenticate(&envelope, known_nodes, now).await
    }

    /// Timestamp-only check: the envelope is younger than five minutes.
    pub fn verify_freshness(&self, raw: RawEnvelope<'_>, now: Option<i64>) -> bool {
        match raw.decode() {
            Ok(envelope) => is_fresh(envelope.timestamp, self.now_or(now)),
            Err(_) => false,
        }
    }

    async fn authenticate(
        &self,
        envelope: &BroadcastEnvelope,
        known_nodes: Option<&[NodeRecord]>,
        now: i64,
    ) -> bool {
        if is_beyond_clock_skew(envelope.timestamp, now) {
            debug!(timestamp = envelope.timestamp, now, "Envelope from the future");
            return false;
        }

        let sender = match self.resolve_sender(&envelope.public_key, known_nodes).await {
            Some(sender) => sender,
            None => {
                debug!(pubkey = %envelope.public_key, "Sender not in registry");
                return false;
            }
        };
        if !sender.is_enabled() {
            debug!(pubkey = %sender.pubkey, status = %sender.status, "Sender not enabled");
            return false;
        }

        verify_message(
            &envelope.signed_payload(),
            &envelope.public_key,
            &envelope.signature,
        )
    }

    /// Find the registry record of `public_key`.
    ///
    /// Order: `known_nodes`, then a filtered registry query that must return
    /// exactly the matching node, then a linear search of the full listing
    /// for backends that ignore the filter.
    pub async fn resolve_sender(
        &self,
        public_key: &str,
        known_nodes: Option<&[NodeRecord]>,
    ) -> Option<NodeRecord> {
        if let Some(found) = known_nodes.and_then(|nodes| nodes.iter().find(|n| n.pubkey == public_key)) {
            return Some(found.clone());
        }

        match self.registry.list_nodes(Some(public_key)).await {
            Ok(mut filtered) if filtered.len() == 1 && filtered[0].pubkey == public_key => {
                return filtered.pop();
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Filtered registry query failed"),
        }

        match self.registry.list_nodes(None).await {
            Ok(all) => all.into_iter().find(|n| n.pubkey == public_key),
            Err(e) => {
                warn!(error = %e, "Registry listing failed, rejecting envelope");
                None
            }
        }
    }
}
