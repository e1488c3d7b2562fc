//! Tests for PeerExplorer

use super::*;
use crate::adapters::{NoBans, StaticBanList};
use crate::domain::{
    DiscoveryConfig, DiscoveryEvent, DiscoveryMessage, ExecState, FindNodeMessage, MessageId,
    MessageType, NeighborsMessage, Node, NodeId, PingMessage, PongMessage,
};
use crate::ports::{PeerDiscoveryApi, PeerScoring};
use crate::test_utils::{ControllableTimeSource, FailingTransport, RecordingTransport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

const NETWORK: u32 = 775;
const START: u64 = 10_000;
const TIMEOUT: u64 = 1_000;

struct Harness {
    explorer: PeerExplorer,
    transport: Arc<RecordingTransport>,
    clock: ControllableTimeSource,
}

fn local_node() -> Node {
    Node::new(NodeId::zero(), "127.0.0.1", 30305)
}

/// Testing config: 1s timeout, buckets of 3.
fn config() -> DiscoveryConfig {
    DiscoveryConfig::for_testing(local_node()).with_network_id(NETWORK)
}

fn harness_with(config: DiscoveryConfig, scoring: Arc<dyn PeerScoring>) -> Harness {
    let transport = Arc::new(RecordingTransport::new());
    let clock = ControllableTimeSource::new(START);
    let explorer = PeerExplorer::new(config, transport.clone(), scoring, Box::new(clock.clone()))
        .with_rng(StdRng::seed_from_u64(7));
    Harness {
        explorer,
        transport,
        clock,
    }
}

fn harness(config: DiscoveryConfig) -> Harness {
    harness_with(config, Arc::new(NoBans))
}

fn running(config: DiscoveryConfig) -> Harness {
    let h = harness(config);
    assert!(h.explorer.start());
    h
}

/// Creates a NodeId with first byte set to `val`, rest zeroed.
fn make_node_id(val: u8) -> NodeId {
    let mut bytes = [0u8; 32];
    bytes[0] = val;
    NodeId::new(bytes)
}

/// Id in bucket 0 relative to the zero local id.
fn make_bucket0_id(i: u8) -> NodeId {
    let mut bytes = [0u8; 32];
    bytes[0] = 0x80;
    bytes[1] = i;
    NodeId::new(bytes)
}

fn addr(i: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, i], 30303))
}

fn message_id(n: u128) -> MessageId {
    MessageId::from_uuid(Uuid::from_u128(n))
}

fn ping_event(id: MessageId, node_id: NodeId, address: SocketAddr) -> DiscoveryEvent {
    DiscoveryEvent::new(
        DiscoveryMessage::Ping(PingMessage {
            message_id: id,
            node_id,
            host: address.ip().to_string(),
            port: address.port(),
            network_id: Some(NETWORK),
        }),
        address,
    )
}

fn pong_event(id: MessageId, node_id: NodeId, address: SocketAddr) -> DiscoveryEvent {
    DiscoveryEvent::new(
        DiscoveryMessage::Pong(PongMessage {
            message_id: id,
            node_id,
            network_id: Some(NETWORK),
        }),
        address,
    )
}

fn find_node_event(id: MessageId, node_id: NodeId, target: NodeId, address: SocketAddr) -> DiscoveryEvent {
    DiscoveryEvent::new(
        DiscoveryMessage::FindNode(FindNodeMessage {
            message_id: id,
            node_id,
            target,
            network_id: Some(NETWORK),
        }),
        address,
    )
}

fn neighbors_event(id: MessageId, node_id: NodeId, nodes: Vec<Node>, address: SocketAddr) -> DiscoveryEvent {
    DiscoveryEvent::new(
        DiscoveryMessage::Neighbors(NeighborsMessage {
            message_id: id,
            node_id,
            nodes,
            network_id: Some(NETWORK),
        }),
        address,
    )
}

fn last_ping_id(h: &Harness, address: SocketAddr) -> MessageId {
    h.transport
        .sent()
        .iter()
        .rev()
        .find_map(|event| match &event.message {
            DiscoveryMessage::Ping(ping) if event.address == address => Some(ping.message_id),
            _ => None,
        })
        .expect("no PING sent to address")
}

fn last_find_node_id(h: &Harness, address: SocketAddr) -> MessageId {
    h.transport
        .sent()
        .iter()
        .rev()
        .find_map(|event| match &event.message {
            DiscoveryMessage::FindNode(find) if event.address == address => Some(find.message_id),
            _ => None,
        })
        .expect("no FIND_NODE sent to address")
}

fn pings_to(h: &Harness, address: SocketAddr) -> usize {
    h.transport
        .sent_of(MessageType::Ping)
        .iter()
        .filter(|event| event.address == address)
        .count()
}

/// Inbound PING, reciprocal PING, PONG: the peer ends up established.
fn handshake(h: &Harness, node_id: NodeId, address: SocketAddr) {
    h.explorer
        .handle_message(ping_event(message_id(1), node_id, address));
    let id = last_ping_id(h, address);
    h.explorer.handle_message(pong_event(id, node_id, address));
}

fn is_established(h: &Harness, node_id: &NodeId) -> bool {
    let state = h.explorer.state.lock();
    state.established.contains_key(node_id)
        && state.table.contains(node_id)
        && state.known_hosts.values().any(|id| id == node_id)
}

fn is_forgotten(h: &Harness, node_id: &NodeId) -> bool {
    let state = h.explorer.state.lock();
    !state.established.contains_key(node_id)
        && !state.table.contains(node_id)
        && !state.known_hosts.values().any(|id| id == node_id)
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_start_only_transitions_from_created() {
    let h = harness(config());
    assert_eq!(h.explorer.state(), ExecState::Created);

    assert!(h.explorer.start());
    assert_eq!(h.explorer.state(), ExecState::Running);
    assert!(!h.explorer.start());

    assert!(h.explorer.dispose());
    assert_eq!(h.explorer.state(), ExecState::Finished);
    assert!(!h.explorer.dispose());
    assert!(!h.explorer.start());
    assert_eq!(h.explorer.state(), ExecState::Finished);
}

#[test]
fn test_dispose_from_created_is_final() {
    let h = harness(config());

    assert!(h.explorer.dispose());
    assert!(!h.explorer.start());
    assert_eq!(h.explorer.state(), ExecState::Finished);
}

#[test]
fn test_guarded_operations_are_noops_unless_running() {
    let h = harness(config().with_bootstrap_nodes(vec!["10.0.0.1:30303".into()]));

    // CREATED
    h.explorer
        .handle_message(ping_event(message_id(1), make_node_id(1), addr(1)));
    h.explorer.clean();
    h.explorer.update();
    assert!(h.transport.sent().is_empty());
    let before = h.explorer.stats();
    assert_eq!(before.pending_pings, 0);

    // RUNNING with one peer and one pending bootstrap ping
    assert!(h.explorer.start());
    handshake(&h, make_node_id(2), addr(2));
    assert!(h.explorer.dispose());
    let frozen = h.explorer.stats();
    h.transport.clear();

    // FINISHED
    h.explorer
        .handle_message(ping_event(message_id(3), make_node_id(3), addr(3)));
    h.clock.advance(10 * TIMEOUT);
    h.explorer.clean();
    h.explorer.update();

    assert!(h.transport.sent().is_empty());
    assert_eq!(
        h.explorer.stats(),
        crate::domain::ExplorerStats {
            state: ExecState::Finished,
            ..frozen
        }
    );
    assert_eq!(frozen.pending_pings, 1);
    assert_eq!(frozen.established_count, 1);
}

// =============================================================================
// Bootstrap
// =============================================================================

#[test]
fn test_start_pings_every_bootstrap_address_once() {
    let h = harness(
        config().with_bootstrap_nodes(vec!["10.0.0.1:30303".into(), "10.0.0.2:30303".into()]),
    );

    assert!(h.explorer.start());

    let pings = h.transport.sent_of(MessageType::Ping);
    assert_eq!(pings.len(), 2);
    let targets: HashSet<SocketAddr> = pings.iter().map(|event| event.address).collect();
    assert_eq!(targets, HashSet::from([addr(1), addr(2)]));
    assert_eq!(h.explorer.pending_pings().len(), 2);
    assert!(h.explorer.state.lock().boot_nodes.is_empty());
}

#[test]
fn test_start_without_bootstrap_pings() {
    let h = harness(config().with_bootstrap_nodes(vec!["10.0.0.1:30303".into()]));

    assert!(h.explorer.start_with(false));

    assert!(h.transport.sent().is_empty());
    assert_eq!(h.explorer.state(), ExecState::Running);
}

#[test]
fn test_unparsable_bootstrap_entries_are_skipped() {
    let h = harness(
        config().with_bootstrap_nodes(vec!["not-an-address".into(), "10.0.0.1:30303".into()]),
    );

    h.explorer.start();

    assert_eq!(h.transport.sent_of(MessageType::Ping).len(), 1);
}

#[test]
fn test_send_failures_do_not_break_the_protocol() {
    let explorer = PeerExplorer::new(
        config().with_bootstrap_nodes(vec!["10.0.0.1:30303".into()]),
        Arc::new(FailingTransport),
        Arc::new(NoBans),
        Box::new(ControllableTimeSource::new(START)),
    );

    assert!(explorer.start());
    assert_eq!(explorer.state(), ExecState::Running);
    assert_eq!(explorer.pending_pings().len(), 1);
}

// =============================================================================
// Inbound dispatch
// =============================================================================

#[test]
fn test_foreign_network_id_is_dropped() {
    let h = running(config());
    let mut event = ping_event(message_id(1), make_node_id(1), addr(1));
    if let DiscoveryMessage::Ping(ping) = &mut event.message {
        ping.network_id = Some(NETWORK + 1);
    }

    h.explorer.handle_message(event);

    assert!(h.transport.sent().is_empty());
    assert_eq!(h.explorer.stats().pending_pings, 0);
}

#[test]
fn test_message_without_network_id_is_accepted() {
    let h = running(config());
    let mut event = ping_event(message_id(1), make_node_id(1), addr(1));
    if let DiscoveryMessage::Ping(ping) = &mut event.message {
        ping.network_id = None;
    }

    h.explorer.handle_message(event);

    assert_eq!(h.transport.sent_of(MessageType::Pong).len(), 1);
}

#[test]
fn test_ping_from_stranger_is_answered_and_pinged_back() {
    let h = running(config());

    h.explorer
        .handle_message(ping_event(message_id(42), make_node_id(1), addr(1)));

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 2);
    match &sent[0].message {
        DiscoveryMessage::Pong(pong) => {
            assert_eq!(pong.message_id, message_id(42));
            assert_eq!(pong.node_id, NodeId::zero());
            assert_eq!(pong.network_id, Some(NETWORK));
        }
        other => panic!("expected PONG, got {:?}", other),
    }
    assert_eq!(sent[0].address, addr(1));
    assert!(matches!(sent[1].message, DiscoveryMessage::Ping(_)));
    assert_eq!(sent[1].address, addr(1));
    assert!(!is_established(&h, &make_node_id(1)));
}

#[test]
fn test_repeated_pings_do_not_duplicate_requests() {
    let h = running(config());

    h.explorer
        .handle_message(ping_event(message_id(1), make_node_id(1), addr(1)));
    h.explorer
        .handle_message(ping_event(message_id(2), make_node_id(1), addr(1)));

    assert_eq!(pings_to(&h, addr(1)), 1);
    assert_eq!(h.explorer.pending_pings().len(), 1);
}

#[test]
fn test_valid_pong_establishes_connection() {
    let h = running(config());

    handshake(&h, make_node_id(1), addr(1));

    assert!(is_established(&h, &make_node_id(1)));
    assert!(h.explorer.pending_pings().is_empty());
    let peers = h.explorer.established_peers();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].host(), "10.0.0.1");
    assert_eq!(peers[0].port(), 30303);
}

#[test]
fn test_ping_from_established_peer_refreshes_its_entry() {
    let h = running(config());
    handshake(&h, make_bucket0_id(1), addr(1));
    handshake(&h, make_bucket0_id(2), addr(2));
    h.transport.clear();

    h.clock.advance(100);
    h.explorer
        .handle_message(ping_event(message_id(9), make_bucket0_id(1), addr(1)));

    // Answered, not pinged back.
    assert_eq!(h.transport.sent_of(MessageType::Pong).len(), 1);
    assert!(h.transport.sent_of(MessageType::Ping).is_empty());
    let state = h.explorer.state.lock();
    assert_eq!(state.table.locate(&make_bucket0_id(1)), Some((0, 1)));
    assert_eq!(state.table.locate(&make_bucket0_id(2)), Some((0, 0)));
}

#[test]
fn test_uncorrelated_pong_is_dropped() {
    let h = running(config());
    h.explorer
        .handle_message(ping_event(message_id(1), make_node_id(1), addr(1)));

    h.explorer
        .handle_message(pong_event(message_id(999), make_node_id(1), addr(1)));

    assert!(!is_established(&h, &make_node_id(1)));
    assert_eq!(h.explorer.pending_pings().len(), 1);
}

#[test]
fn test_pong_from_wrong_address_leaves_request_pending() {
    let h = running(config());
    h.explorer
        .handle_message(ping_event(message_id(1), make_node_id(1), addr(1)));
    let id = last_ping_id(&h, addr(1));

    h.explorer
        .handle_message(pong_event(id, make_node_id(1), addr(2)));

    assert!(!is_established(&h, &make_node_id(1)));
    assert_eq!(h.explorer.pending_pings()[0].message_id(), id);
}

#[test]
fn test_pong_with_local_identity_is_not_admitted() {
    let h = running(config());
    h.explorer
        .handle_message(ping_event(message_id(1), make_node_id(1), addr(1)));
    let id = last_ping_id(&h, addr(1));

    h.explorer.handle_message(pong_event(id, NodeId::zero(), addr(1)));

    assert!(h.explorer.established_peers().is_empty());
    assert_eq!(h.explorer.stats().table_size, 0);
}

#[test]
fn test_find_node_from_unknown_peer_is_ignored() {
    let h = running(config());

    h.explorer.handle_message(find_node_event(
        message_id(5),
        make_node_id(1),
        NodeId::zero(),
        addr(1),
    ));

    assert!(h.transport.sent().is_empty());
}

// =============================================================================
// Identity rotation
// =============================================================================

#[test]
fn test_new_identity_on_same_host_evicts_old_one_when_disallowed() {
    let h = running(config().with_multiple_connections_per_host_port(false));
    handshake(&h, make_node_id(1), addr(1));

    handshake(&h, make_node_id(2), addr(1));

    assert!(is_forgotten(&h, &make_node_id(1)));
    assert!(is_established(&h, &make_node_id(2)));
    assert_eq!(h.explorer.established_peers().len(), 1);
}

#[test]
fn test_multiple_identities_per_host_when_allowed() {
    let h = running(config());
    handshake(&h, make_node_id(1), addr(1));

    handshake(&h, make_node_id(2), addr(1));

    assert!(h.explorer.state.lock().established.contains_key(&make_node_id(1)));
    assert!(is_established(&h, &make_node_id(2)));
    assert_eq!(h.explorer.established_peers().len(), 2);
}

// =============================================================================
// Challenges
// =============================================================================

/// Fill bucket 0 (capacity 3) with peers at addr(1..=3), then let the
/// challenger at addr(9) complete its handshake.
fn full_bucket_with_challenger() -> Harness {
    let h = running(config());
    for i in 1..=3 {
        handshake(&h, make_bucket0_id(i), addr(i));
    }
    h.transport.clear();
    handshake(&h, make_bucket0_id(9), addr(9));
    h
}

#[test]
fn test_full_bucket_challenges_oldest_incumbent() {
    let h = full_bucket_with_challenger();

    assert!(!h.explorer.state.lock().table.contains(&make_bucket0_id(9)));
    assert_eq!(h.explorer.stats().active_challenges, 1);

    let challenge_ping = h.transport.last_to(addr(1));
    assert!(matches!(challenge_ping, Some(DiscoveryMessage::Ping(_))));
    let pending = h.explorer.pending_pings();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].related_node().map(Node::id), Some(&make_bucket0_id(1)));
}

#[test]
fn test_incumbent_answering_keeps_its_slot() {
    let h = full_bucket_with_challenger();
    let challenge_id = last_ping_id(&h, addr(1));

    h.explorer
        .handle_message(pong_event(challenge_id, make_bucket0_id(1), addr(1)));

    assert!(is_established(&h, &make_bucket0_id(1)));
    assert!(!h.explorer.state.lock().table.contains(&make_bucket0_id(9)));
    assert!(!h.explorer.state.lock().established.contains_key(&make_bucket0_id(9)));
    assert_eq!(h.explorer.stats().active_challenges, 0);
    assert_eq!(h.explorer.stats().table_size, 3);

    // The answer refreshed the incumbent to most recently seen.
    assert_eq!(
        h.explorer.state.lock().table.locate(&make_bucket0_id(1)),
        Some((0, 2))
    );
}

#[test]
fn test_challenge_pong_from_other_identity_does_not_resolve_it() {
    let h = full_bucket_with_challenger();
    let challenge_id = last_ping_id(&h, addr(1));

    h.explorer
        .handle_message(pong_event(challenge_id, make_bucket0_id(9), addr(1)));

    assert_eq!(h.explorer.stats().active_challenges, 1);
    assert_eq!(h.explorer.pending_pings().len(), 1);
}

#[test]
fn test_silent_incumbent_is_retried_then_evicted_and_challenger_reverified() {
    let h = full_bucket_with_challenger();
    h.transport.clear();

    // Two lost PINGs are not enough to lose the slot.
    for attempt in 2..=3 {
        h.clock.advance(TIMEOUT);
        h.explorer.clean();

        assert!(is_established(&h, &make_bucket0_id(1)));
        assert_eq!(h.explorer.stats().active_challenges, 1);
        let pending = h.explorer.pending_pings();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].address(), addr(1));
        assert_eq!(pending[0].attempt(), attempt);
        assert_eq!(pending[0].related_node().map(Node::id), Some(&make_bucket0_id(1)));
    }
    assert_eq!(pings_to(&h, addr(1)), 2);
    assert_eq!(pings_to(&h, addr(9)), 0);

    h.clock.advance(TIMEOUT);
    h.explorer.clean();

    assert!(is_forgotten(&h, &make_bucket0_id(1)));
    assert_eq!(h.explorer.stats().active_challenges, 0);
    assert_eq!(pings_to(&h, addr(1)), 2);
    assert_eq!(pings_to(&h, addr(9)), 1);

    let id = last_ping_id(&h, addr(9));
    h.explorer
        .handle_message(pong_event(id, make_bucket0_id(9), addr(9)));

    assert!(is_established(&h, &make_bucket0_id(9)));
    assert_eq!(h.explorer.stats().table_size, 3);
}

#[test]
fn test_incumbent_answering_a_retried_challenge_keeps_its_slot() {
    let h = full_bucket_with_challenger();

    h.clock.advance(TIMEOUT);
    h.explorer.clean();
    let retry_id = last_ping_id(&h, addr(1));
    h.explorer
        .handle_message(pong_event(retry_id, make_bucket0_id(1), addr(1)));

    assert!(is_established(&h, &make_bucket0_id(1)));
    assert!(!h.explorer.state.lock().table.contains(&make_bucket0_id(9)));
    assert_eq!(h.explorer.stats().active_challenges, 0);
    assert!(h.explorer.pending_pings().is_empty());
}

#[test]
fn test_challenge_reusing_an_earlier_ping_still_requires_the_incumbent() {
    let h = running(config());
    for i in 1..=3 {
        handshake(&h, make_bucket0_id(i), addr(i));
    }
    // A stranger pings from the incumbent's address; our PING back to it has
    // no expected identity yet.
    let stranger = make_node_id(0x20);
    h.explorer
        .handle_message(ping_event(message_id(77), stranger, addr(1)));
    let earlier = last_ping_id(&h, addr(1));

    handshake(&h, make_bucket0_id(9), addr(9));

    assert_eq!(h.explorer.stats().active_challenges, 1);
    assert!(h.explorer.state.lock().challenges.get(&earlier).is_some());

    h.explorer
        .handle_message(pong_event(earlier, stranger, addr(1)));

    assert_eq!(h.explorer.stats().active_challenges, 1);
    assert!(h.explorer.state.lock().requests.pending_ping(&earlier).is_some());

    h.explorer
        .handle_message(pong_event(earlier, make_bucket0_id(1), addr(1)));

    assert_eq!(h.explorer.stats().active_challenges, 0);
    assert!(is_established(&h, &make_bucket0_id(1)));
}

#[test]
fn test_incumbent_is_challenged_once_at_a_time() {
    let h = full_bucket_with_challenger();

    handshake(&h, make_bucket0_id(10), addr(10));

    assert_eq!(h.explorer.stats().active_challenges, 1);
    assert!(!h.explorer.state.lock().table.contains(&make_bucket0_id(10)));
}

// =============================================================================
// Cleanup
// =============================================================================

#[test]
fn test_unanswered_liveness_ping_retries_then_evicts() {
    let h = running(config());
    handshake(&h, make_node_id(1), addr(1));
    h.transport.clear();

    h.explorer.update();
    assert_eq!(pings_to(&h, addr(1)), 1);

    for attempt in 2..=3 {
        h.clock.advance(TIMEOUT);
        h.explorer.clean();
        let pending = h.explorer.pending_pings();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempt(), attempt);
        assert_eq!(pending[0].address(), addr(1));
        assert!(is_established(&h, &make_node_id(1)));
    }

    h.clock.advance(TIMEOUT);
    h.explorer.clean();

    assert_eq!(pings_to(&h, addr(1)), 3);
    assert!(h.explorer.pending_pings().is_empty());
    assert!(is_forgotten(&h, &make_node_id(1)));
}

#[test]
fn test_retries_use_fresh_message_ids() {
    let h = running(config().with_bootstrap_nodes(vec!["10.0.0.1:30303".into()]));
    let first = last_ping_id(&h, addr(1));

    h.clock.advance(TIMEOUT);
    h.explorer.clean();

    let second = last_ping_id(&h, addr(1));
    assert_ne!(first, second);
    assert!(h
        .explorer
        .pending_pings()
        .iter()
        .all(|request| request.message_id() == second));
}

#[test]
fn test_requests_within_timeout_are_kept() {
    let h = running(config().with_bootstrap_nodes(vec!["10.0.0.1:30303".into()]));

    h.clock.advance(TIMEOUT - 1);
    h.explorer.clean();

    assert_eq!(pings_to(&h, addr(1)), 1);
    assert_eq!(h.explorer.pending_pings()[0].attempt(), 1);
}

#[test]
fn test_expired_find_node_requests_are_dropped() {
    let h = running(config());
    handshake(&h, make_node_id(1), addr(1));
    h.explorer.update();
    assert_eq!(h.explorer.stats().pending_find_nodes, 1);
    h.transport.clear();

    h.clock.advance(TIMEOUT);
    h.explorer.clean();

    assert_eq!(h.explorer.stats().pending_find_nodes, 0);
    assert!(h.transport.sent_of(MessageType::FindNode).is_empty());
}

#[test]
fn test_bootstrap_scenario_admits_one_and_retries_the_other() {
    let h = running(
        config().with_bootstrap_nodes(vec!["10.0.0.1:30303".into(), "10.0.0.2:30303".into()]),
    );
    assert_eq!(h.transport.sent_of(MessageType::Ping).len(), 2);

    let id = last_ping_id(&h, addr(1));
    h.explorer
        .handle_message(pong_event(id, make_node_id(1), addr(1)));

    assert!(is_established(&h, &make_node_id(1)));
    let pending = h.explorer.pending_pings();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].address(), addr(2));

    h.clock.advance(TIMEOUT);
    h.explorer.clean();

    let pending = h.explorer.pending_pings();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].address(), addr(2));
    assert_eq!(pending[0].attempt(), 2);
    assert_eq!(pings_to(&h, addr(2)), 2);
}

// =============================================================================
// Refresh
// =============================================================================

#[test]
fn test_update_asks_and_probes_known_nodes() {
    let h = running(config());
    handshake(&h, make_node_id(1), addr(1));
    handshake(&h, make_node_id(2), addr(2));
    h.transport.clear();

    h.explorer.update();

    let finds = h.transport.sent_of(MessageType::FindNode);
    assert_eq!(finds.len(), 2);
    for event in &finds {
        match &event.message {
            DiscoveryMessage::FindNode(find) => assert_eq!(find.target, NodeId::zero()),
            other => panic!("expected FIND_NODE, got {:?}", other),
        }
    }
    assert_eq!(h.transport.sent_of(MessageType::Ping).len(), 2);
    assert!(h
        .explorer
        .pending_find_nodes()
        .iter()
        .all(|request| request.related_node().is_some()));
}

/// 100 established peers at 10.0.{i}.1 with ids 1..=100 in the first byte.
fn crowded() -> Harness {
    let h = running(config().with_bucket_size(128));
    for i in 1..=100u8 {
        handshake(&h, make_node_id(i), SocketAddr::from(([10, 0, i, 1], 30303)));
    }
    assert_eq!(h.explorer.established_peers().len(), 100);
    h.transport.clear();
    h
}

#[test]
fn test_update_fan_out_is_capped() {
    let h = crowded();

    h.explorer.update();

    assert_eq!(h.transport.sent_of(MessageType::FindNode).len(), 24);
    assert_eq!(h.transport.sent_of(MessageType::Ping).len(), 16);
}

#[test]
fn test_find_node_reply_is_closest_prefix_plus_random_sample() {
    let h = crowded();
    let requester = make_node_id(1);
    let requester_address = SocketAddr::from(([10, 0, 1, 1], 30303));
    let target = make_node_id(0x30);

    h.explorer.handle_message(find_node_event(
        message_id(77),
        requester,
        target,
        requester_address,
    ));

    let replies = h.transport.sent_of(MessageType::Neighbors);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].address, requester_address);
    let nodes = match &replies[0].message {
        DiscoveryMessage::Neighbors(neighbors) => {
            assert_eq!(neighbors.message_id, message_id(77));
            neighbors.nodes.clone()
        }
        other => panic!("expected NEIGHBORS, got {:?}", other),
    };

    let closest = h.explorer.closest_peers(&target);
    let fixed = 20 - NEIGHBORS_RANDOM_COUNT;
    assert_eq!(nodes.len(), 20);
    assert_eq!(&nodes[..fixed], &closest[..fixed]);

    let rest: HashSet<NodeId> = closest[fixed..].iter().map(|n| *n.id()).collect();
    let sampled: HashSet<NodeId> = nodes[fixed..].iter().map(|n| *n.id()).collect();
    assert_eq!(sampled.len(), NEIGHBORS_RANDOM_COUNT);
    assert!(sampled.is_subset(&rest));
    let next_closest: HashSet<NodeId> = closest[fixed..20].iter().map(|n| *n.id()).collect();
    assert_ne!(sampled, next_closest, "tail should not just be the next closest");
}

#[test]
fn test_find_node_reply_is_reproducible_with_same_seed() {
    let reply = || {
        let h = crowded();
        h.explorer.handle_message(find_node_event(
            message_id(77),
            make_node_id(1),
            make_node_id(0x30),
            SocketAddr::from(([10, 0, 1, 1], 30303)),
        ));
        h.transport.sent_of(MessageType::Neighbors)
    };

    assert_eq!(reply(), reply());
}

// =============================================================================
// NEIGHBORS
// =============================================================================

fn neighbor(i: u8) -> Node {
    let mut bytes = [0u8; 32];
    bytes[0] = 0x40;
    bytes[1] = i;
    Node::new(NodeId::new(bytes), format!("10.1.0.{}", i), 30303)
}

fn neighbor_address(i: u8) -> SocketAddr {
    SocketAddr::from(([10, 1, 0, i], 30303))
}

#[test]
fn test_neighbors_are_truncated_filtered_and_pinged() {
    let bans = StaticBanList::new();
    bans.ban_node(*neighbor(1).id());
    bans.ban_address(neighbor_address(2).ip());
    let h = harness_with(config(), Arc::new(bans));
    h.explorer.start();
    handshake(&h, make_node_id(1), addr(1));
    h.explorer.update();
    let find_id = last_find_node_id(&h, addr(1));
    h.transport.clear();

    let mut nodes = vec![local_node()];
    nodes.extend((1..=24).map(neighbor));
    h.explorer
        .handle_message(neighbors_event(find_id, make_node_id(1), nodes, addr(1)));

    let pinged: HashSet<SocketAddr> = h
        .transport
        .sent_of(MessageType::Ping)
        .iter()
        .map(|event| event.address)
        .collect();
    // Entries 0..20: the local node, a banned id and a banned address are skipped.
    let expected: HashSet<SocketAddr> = (3..=19).map(neighbor_address).collect();
    assert_eq!(pinged, expected);
    assert_eq!(h.explorer.stats().pending_find_nodes, 0);
    assert!(h.explorer.state.lock().boot_nodes.is_empty());
}

#[test]
fn test_neighbors_with_hostnames_are_skipped() {
    let h = running(config());
    handshake(&h, make_node_id(1), addr(1));
    h.explorer.update();
    let find_id = last_find_node_id(&h, addr(1));
    h.transport.clear();
    let cached = h.explorer.stats().cached_addresses;

    let named = Node::new(*neighbor(5).id(), "localhost", 30303);
    h.explorer.handle_message(neighbors_event(
        find_id,
        make_node_id(1),
        vec![named, neighbor(6)],
        addr(1),
    ));

    let pinged: Vec<SocketAddr> = h
        .transport
        .sent_of(MessageType::Ping)
        .iter()
        .map(|event| event.address)
        .collect();
    assert_eq!(pinged, vec![neighbor_address(6)]);
    assert_eq!(h.explorer.stats().cached_addresses, cached + 1);
    assert!(!h.explorer.state.lock().address_cache.contains("localhost", 30303));
}

#[test]
fn test_uncorrelated_neighbors_are_ignored() {
    let h = running(config());
    handshake(&h, make_node_id(1), addr(1));
    h.transport.clear();

    h.explorer.handle_message(neighbors_event(
        message_id(404),
        make_node_id(1),
        vec![neighbor(3)],
        addr(1),
    ));

    assert!(h.transport.sent().is_empty());
}

// =============================================================================
// Stats
// =============================================================================

#[test]
fn test_stats_snapshot() {
    let h = running(config().with_bootstrap_nodes(vec!["10.0.0.2:30303".into()]));
    handshake(&h, make_node_id(1), addr(1));

    let stats = h.explorer.stats();

    assert_eq!(stats.state, ExecState::Running);
    assert_eq!(stats.established_count, 1);
    assert_eq!(stats.table_size, 1);
    assert_eq!(stats.pending_pings, 1);
    assert_eq!(stats.pending_find_nodes, 0);
    assert_eq!(stats.active_challenges, 0);
    assert_eq!(stats.cached_addresses, 1);
}
