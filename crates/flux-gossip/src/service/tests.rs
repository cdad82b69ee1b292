//! Service-level tests wiring several services through the test doubles.

use super::*;
use crate::adapters::{InMemoryNodeRegistry, StaticPrivilegeChecker, AUTH_HEADER};
use crate::domain::{
    outdated_ack, received_ack, CandidateRejection, GossipConfig, NodeRecord, NodeStatus,
    RawEnvelope, GREETING, HEARTBEAT, POLICY_VIOLATION_CODE,
};
use crate::ports::{LinkEvent, Privilege, RequestContext};
use crate::testing::{wait_until, FixedTimeSource, MockDialer, MockLink};
use serde_json::{json, Value};
use shared_crypto::NodeIdentity;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;

const NOW: i64 = 1_700_000_000_000;

struct Harness {
    node: GossipNode,
    identity: Arc<NodeIdentity>,
    registry: Arc<InMemoryNodeRegistry>,
    dialer: Arc<MockDialer>,
    clock: Arc<FixedTimeSource>,
}

fn harness(config: GossipConfig) -> Harness {
    let identity = Arc::new(NodeIdentity::generate());
    let pubkey = identity.public_key(None).unwrap_or_default();
    let registry = Arc::new(InMemoryNodeRegistry::new(vec![NodeRecord::new(
        pubkey,
        "127.0.0.1:16125",
        NodeStatus::Enabled,
    )]));
    let dialer = Arc::new(MockDialer::new());
    let clock = Arc::new(FixedTimeSource::new(NOW));
    let node = GossipNode::new(
        config,
        Arc::clone(&identity),
        registry.clone(),
        dialer.clone(),
        clock.clone(),
    );
    Harness {
        node,
        identity,
        registry,
        dialer,
        clock,
    }
}

fn nodes(count: usize) -> Vec<NodeRecord> {
    (0..count)
        .map(|i| {
            NodeRecord::new(
                format!("02{i:04x}"),
                format!("10.0.{}.{}:16125", i / 256, i % 256),
                NodeStatus::Enabled,
            )
        })
        .collect()
}

// =============================================================================
// Inbound handler
// =============================================================================

#[tokio::test]
async fn test_inbound_accepts_fresh_frame() {
    let h = harness(GossipConfig::for_testing());
    let frame = h.node.manager().codec().encode_text("hi", None).unwrap();
    let link = MockLink::new("8.8.8.8");

    let verdict = h.node.inbound().handle_frame(link.as_ref(), &frame).await;

    assert_eq!(verdict, FrameVerdict::Accepted);
    assert_eq!(link.sent(), vec![received_ack("127.0.0.1")]);
    assert!(link.closed().is_none());
}

#[tokio::test]
async fn test_inbound_outdated_frame_acknowledged() {
    let h = harness(GossipConfig::for_testing());
    let frame = h
        .node
        .manager()
        .codec()
        .encode_at(&json!("old"), None, NOW - 600_000)
        .unwrap();
    let link = MockLink::new("8.8.8.8");

    let verdict = h.node.inbound().handle_frame(link.as_ref(), &frame).await;

    assert_eq!(verdict, FrameVerdict::Outdated);
    assert_eq!(link.sent(), vec![outdated_ack("127.0.0.1")]);
    assert!(link.closed().is_none());
}

#[tokio::test]
async fn test_inbound_rejects_unknown_sender() {
    let h = harness(GossipConfig::for_testing());
    let stranger = BroadcastCodec::new(Arc::new(NodeIdentity::generate()), h.clock.clone());
    let frame = stranger.encode_text("hi", None).unwrap();
    let link = MockLink::new("6.6.6.6");

    let verdict = h.node.inbound().handle_frame(link.as_ref(), &frame).await;

    assert_eq!(verdict, FrameVerdict::Rejected);
    assert!(link.sent().is_empty());
    assert_eq!(link.closed().map(|(code, _)| code), Some(POLICY_VIOLATION_CODE));
}

#[tokio::test]
async fn test_inbound_rejects_garbage() {
    let h = harness(GossipConfig::for_testing());
    let link = MockLink::new("6.6.6.6");
    let verdict = h.node.inbound().handle_frame(link.as_ref(), "not json").await;
    assert_eq!(verdict, FrameVerdict::Rejected);
    assert!(link.closed().is_some());
}

#[tokio::test]
async fn test_serve_tracks_incoming_registry() {
    let h = harness(GossipConfig::for_testing());
    let inbound = Arc::clone(h.node.inbound());
    let link = MockLink::new("7.7.7.7");
    let (tx, rx) = unbounded_channel();

    let task = {
        let link = link.clone();
        tokio::spawn(async move { inbound.serve(link, rx).await })
    };
    wait_until(|| h.node.incoming().len() == 1).await;
    assert_eq!(h.node.api(Arc::new(StaticPrivilegeChecker::default())).incoming_peers(),
        ApiResponse::peers(vec!["7.7.7.7".to_string()]));

    let frame = h.node.manager().codec().encode_text("hi", None).unwrap();
    tx.send(LinkEvent::Message(frame)).unwrap();
    wait_until(|| link.sent().len() == 1).await;

    tx.send(LinkEvent::Closed { code: Some(1000), reason: String::new() }).unwrap();
    task.await.unwrap();
    assert!(h.node.incoming().is_empty());
}

#[tokio::test]
async fn test_serve_drops_rejected_peer() {
    let h = harness(GossipConfig::for_testing());
    let inbound = Arc::clone(h.node.inbound());
    let link = MockLink::new("6.6.6.6");
    let (tx, rx) = unbounded_channel();
    tx.send(LinkEvent::Message("{}".to_string())).unwrap();

    inbound.serve(link.clone(), rx).await;

    assert!(h.node.incoming().is_empty());
    assert_eq!(link.closed().map(|(code, _)| code), Some(POLICY_VIOLATION_CODE));
}

#[tokio::test]
async fn test_rebroadcast_disabled_by_default() {
    let h = harness(GossipConfig::for_testing());
    let peer = MockLink::new("9.9.9.9");
    h.node.outgoing().add(peer.clone());

    let frame = h.node.manager().codec().encode_text("hi", None).unwrap();
    h.node.inbound().handle_frame(MockLink::new("8.8.8.8").as_ref(), &frame).await;

    assert!(peer.sent().is_empty());
}

#[tokio::test]
async fn test_rebroadcast_relays_original_frame() {
    let config = GossipConfig {
        rebroadcast: true,
        ..GossipConfig::for_testing()
    };
    let h = harness(config);
    let peer = MockLink::new("9.9.9.9");
    h.node.outgoing().add(peer.clone());

    let frame = h.node.manager().codec().encode_text("hi", None).unwrap();
    h.node.inbound().handle_frame(MockLink::new("8.8.8.8").as_ref(), &frame).await;

    assert_eq!(peer.sent(), vec![frame]);
}

#[tokio::test]
async fn test_rebroadcast_skips_outdated_frame() {
    let config = GossipConfig {
        rebroadcast: true,
        ..GossipConfig::for_testing()
    };
    let h = harness(config);
    let peer = MockLink::new("9.9.9.9");
    h.node.outgoing().add(peer.clone());

    let frame = h
        .node
        .manager()
        .codec()
        .encode_at(&json!("old"), None, NOW - 600_000)
        .unwrap();
    h.node.inbound().handle_frame(MockLink::new("8.8.8.8").as_ref(), &frame).await;

    assert!(peer.sent().is_empty());
}

// =============================================================================
// Discovery
// =============================================================================

#[tokio::test]
async fn test_discovery_small_network_dials_fast() {
    let h = harness(GossipConfig::for_testing());
    h.registry.set_nodes(nodes(10));

    let tick = h.node.discovery().tick().await;

    assert_eq!(tick.node_count, 10);
    assert!((tick.target - 0.2).abs() < f64::EPSILON);
    assert!(matches!(tick.action, TickAction::Dialed(_)));
    assert_eq!(tick.next_delay, Duration::from_secs(1));
    h.dialer.wait_for_dials(1).await;
}

#[tokio::test]
async fn test_discovery_converged_polls_slowly() {
    let h = harness(GossipConfig::for_testing());
    h.registry.set_nodes(nodes(10));
    h.node.outgoing().add(MockLink::new("10.0.0.1"));

    let tick = h.node.discovery().tick().await;

    assert_eq!(tick.action, TickAction::Converged);
    assert_eq!(tick.next_delay, Duration::from_secs(30));
    assert!(h.dialer.dialed().is_empty());
}

#[tokio::test]
async fn test_discovery_large_network_target_capped() {
    let h = harness(GossipConfig::for_testing());
    h.registry.set_nodes(nodes(1000));
    for i in 0..5 {
        h.node.outgoing().add(MockLink::new(&format!("172.16.0.{i}")));
    }

    let tick = h.node.discovery().tick().await;

    assert_eq!(tick.target, 5.0);
    assert_eq!(tick.action, TickAction::Converged);
}

#[tokio::test]
async fn test_discovery_skips_host_being_dialed() {
    let h = harness(GossipConfig::for_testing());
    h.registry.set_nodes(vec![NodeRecord::new("02aa", "10.0.0.7:16125", NodeStatus::Enabled)]);
    let registry = h.node.outgoing();
    let reservation = registry.begin_dial("10.0.0.7");
    assert!(reservation.is_some());

    let tick = h.node.discovery().tick().await;

    assert_eq!(tick.action, TickAction::Skipped(CandidateRejection::AlreadyConnected));
    assert!(h.dialer.dialed().is_empty());
    assert_eq!(registry.len(), 0);
}

#[tokio::test]
async fn test_discovery_skips_own_and_onion() {
    let h = harness(GossipConfig::for_testing());
    h.registry.set_nodes(vec![NodeRecord::new("02aa", "127.0.0.1:16125", NodeStatus::Enabled)]);
    let tick = h.node.discovery().tick().await;
    assert_eq!(tick.action, TickAction::Skipped(CandidateRejection::OwnAddress));
    assert_eq!(tick.next_delay, Duration::from_secs(1));

    h.registry.set_nodes(vec![NodeRecord::new("02aa", "xyz.onion", NodeStatus::Enabled)]);
    let tick = h.node.discovery().tick().await;
    assert_eq!(tick.action, TickAction::Skipped(CandidateRejection::Onion));
    assert!(h.dialer.dialed().is_empty());
}

#[tokio::test]
async fn test_discovery_registry_outage_skips_tick() {
    let h = harness(GossipConfig::for_testing());
    h.registry.set_unavailable(true);

    let tick = h.node.discovery().tick().await;

    assert_eq!(tick.node_count, 0);
    assert_eq!(tick.action, TickAction::Converged);
    assert_eq!(tick.next_delay, Duration::from_secs(30));
}

#[test]
fn test_pick_candidate_empty_registry() {
    let h = harness(GossipConfig::for_testing());
    let picked = h
        .node
        .discovery()
        .pick_candidate(&[], &mut rand::thread_rng())
        .map(|r| r.host().to_string());
    assert_eq!(picked, Err(CandidateRejection::EmptyRegistry));
}

// =============================================================================
// Keepalive
// =============================================================================

#[tokio::test]
async fn test_keepalive_prunes_dead_links() {
    let h = harness(GossipConfig::for_testing());
    let alive = MockLink::new("1.1.1.1");
    let dead = MockLink::failing("2.2.2.2");
    h.node.outgoing().add(alive.clone());
    h.node.outgoing().add(dead);

    let report = h.node.keepalive().tick().unwrap();

    assert_eq!(report, DispatchReport { delivered: 1, pruned: 1 });
    let envelope = RawEnvelope::from(alive.sent()[0].as_str()).decode().unwrap();
    assert_eq!(envelope.data, Value::String(HEARTBEAT.into()));
    assert_eq!(h.node.outgoing().addresses(), vec!["1.1.1.1"]);
}

#[tokio::test(start_paused = true)]
async fn test_started_node_heartbeats_and_stops() {
    let h = harness(GossipConfig::for_testing());
    let peer = MockLink::new("1.1.1.1");
    h.node.outgoing().add(peer.clone());

    let handle = h.node.start();
    tokio::time::sleep(Duration::from_millis(29_000)).await;
    assert!(peer.sent().is_empty());

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(peer.sent().len(), 1);

    handle.shutdown().await;
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(peer.sent().len(), 1);
}

// =============================================================================
// Connection manager through discovery
// =============================================================================

#[tokio::test]
async fn test_discovered_peer_receives_greeting() {
    let h = harness(GossipConfig::for_testing());
    h.registry.set_nodes(vec![NodeRecord::new("02aa", "10.0.0.9:16125", NodeStatus::Enabled)]);

    h.node.discovery().tick().await;
    wait_until(|| h.node.outgoing().len() == 1).await;
    wait_until(|| h.dialer.link("10.0.0.9").is_some_and(|l| !l.sent().is_empty())).await;

    let link = h.dialer.link("10.0.0.9").unwrap();
    let envelope = RawEnvelope::from(link.sent()[0].as_str()).decode().unwrap();
    assert_eq!(envelope.data, Value::String(GREETING.into()));
    assert_eq!(envelope.public_key, h.identity.public_key(None).unwrap());
}

// =============================================================================
// API
// =============================================================================

fn team_ctx() -> RequestContext {
    RequestContext::with_header(AUTH_HEADER, "team")
}

fn checker() -> Arc<StaticPrivilegeChecker> {
    Arc::new(StaticPrivilegeChecker::default().grant("team", Privilege::ZelTeam))
}

#[tokio::test]
async fn test_api_missing_parameters() {
    let h = harness(GossipConfig::for_testing());
    let api = h.node.api(checker());

    assert_eq!(
        api.broadcast(None, &team_ctx()).await,
        ApiResponse::error("No message to broadcast attached.")
    );
    assert_eq!(
        api.add_peer(None, &team_ctx()).await,
        ApiResponse::error("No IP address specified.")
    );
}

#[tokio::test]
async fn test_api_legacy_authorization_runs_for_unauthorized() {
    let h = harness(GossipConfig::for_testing());
    let api = h.node.api(checker());
    let peer = MockLink::new("1.1.1.1");
    h.node.outgoing().add(peer.clone());

    let response = api.broadcast(Some("news".into()), &RequestContext::default()).await;
    assert_eq!(response, ApiResponse::success("Message successfully broadcasted to ZelFlux network"));
    assert_eq!(peer.sent().len(), 1);

    let response = api.broadcast(Some("news".into()), &team_ctx()).await;
    assert_eq!(response, ApiResponse::error("Unauthorized. Access denied."));
    assert_eq!(peer.sent().len(), 1);
}

#[tokio::test]
async fn test_api_corrected_authorization() {
    let config = GossipConfig {
        legacy_inverted_authorization: false,
        ..GossipConfig::for_testing()
    };
    let h = harness(config);
    let api = h.node.api(checker());

    let response = api.add_peer(Some("10.0.0.3".into()), &team_ctx()).await;
    assert_eq!(response, ApiResponse::success("Outgoing connection to 10.0.0.3 initiated"));
    h.dialer.wait_for_dials(1).await;

    let response = api.add_peer(Some("10.0.0.4".into()), &RequestContext::default()).await;
    assert!(!response.is_success());
    assert_eq!(h.dialer.dialed(), vec!["10.0.0.3"]);
}

#[tokio::test]
async fn test_api_connected_peers_json_shape() {
    let h = harness(GossipConfig::for_testing());
    h.node.outgoing().add(MockLink::new("1.1.1.1"));
    h.node.outgoing().add(MockLink::new("2.2.2.2"));
    let api = h.node.api(checker());

    let json = serde_json::to_value(api.connected_peers()).unwrap();
    assert_eq!(
        json,
        json!({"status": "success", "data": {"message": ["1.1.1.1", "2.2.2.2"]}})
    );
}
