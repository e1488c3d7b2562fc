//! Request Tracker
//!
//! Outstanding PING and FIND_NODE requests, keyed by correlation id.
//!
//! # Security (Response Validation)
//!
//! A response resolves a request only if its id, type, source address and,
//! when the request names a related node, its identity all match. Anything
//! else leaves the request untouched so spoofed, delayed or duplicated
//! datagrams cannot cancel it; it still expires and retries normally.

use std::collections::HashMap;
use std::net::SocketAddr;

use super::entities::{Node, Timestamp};
use super::messages::{DiscoveryMessage, DiscoveryPayload, MessageId, MessageType};

/// A request-type message awaiting its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDiscoveryRequest {
    message_id: MessageId,
    message: DiscoveryMessage,
    address: SocketAddr,
    expected_response: MessageType,
    related_node: Option<Node>,
    attempt: u32,
    created_at: Timestamp,
    expiration_ms: u64,
}

impl PeerDiscoveryRequest {
    /// First attempt of `message` towards `address`.
    pub fn new(
        message: DiscoveryMessage,
        address: SocketAddr,
        expected_response: MessageType,
        created_at: Timestamp,
        expiration_ms: u64,
    ) -> Self {
        Self {
            message_id: message.message_id(),
            message,
            address,
            expected_response,
            related_node: None,
            attempt: 1,
            created_at,
            expiration_ms,
        }
    }

    #[must_use]
    pub fn with_related_node(mut self, node: Option<Node>) -> Self {
        self.related_node = node;
        self
    }

    #[must_use]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn message(&self) -> &DiscoveryMessage {
        &self.message
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn expected_response(&self) -> MessageType {
        self.expected_response
    }

    pub fn related_node(&self) -> Option<&Node> {
        self.related_node.as_ref()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn has_expired(&self, now: Timestamp) -> bool {
        now.millis_since(self.created_at) >= self.expiration_ms
    }

    /// Whether `response`, received from `address`, answers this request.
    pub fn validate_response<M: DiscoveryPayload>(&self, address: SocketAddr, response: &M) -> bool {
        response.message_id() == self.message_id
            && M::MESSAGE_TYPE == self.expected_response
            && address == self.address
            && self
                .related_node
                .as_ref()
                .map_or(true, |node| node.id() == response.node_id())
    }
}

/// The two correlation maps.
#[derive(Debug, Default)]
pub struct RequestTracker {
    pending_pings: HashMap<MessageId, PeerDiscoveryRequest>,
    pending_find_nodes: HashMap<MessageId, PeerDiscoveryRequest>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_ping(&mut self, request: PeerDiscoveryRequest) {
        self.pending_pings.insert(request.message_id(), request);
    }

    pub fn track_find_node(&mut self, request: PeerDiscoveryRequest) {
        self.pending_find_nodes.insert(request.message_id(), request);
    }

    /// Outstanding PING towards `address`, if any.
    pub fn ping_to(&self, address: &SocketAddr) -> Option<&PeerDiscoveryRequest> {
        self.pending_pings
            .values()
            .find(|request| &request.address == address)
    }

    /// Require the PONG answering `message_id` to come from `node`.
    ///
    /// Returns `false` if no such PING is pending.
    pub fn bind_related_node(&mut self, message_id: &MessageId, node: Node) -> bool {
        match self.pending_pings.get_mut(message_id) {
            Some(request) => {
                request.related_node = Some(node);
                true
            }
            None => false,
        }
    }

    pub fn pending_ping(&self, message_id: &MessageId) -> Option<&PeerDiscoveryRequest> {
        self.pending_pings.get(message_id)
    }

    pub fn pending_find_node(&self, message_id: &MessageId) -> Option<&PeerDiscoveryRequest> {
        self.pending_find_nodes.get(message_id)
    }

    /// Remove and return the PING request answered by `response`, if valid.
    pub fn take_ping_response<M: DiscoveryPayload>(
        &mut self,
        address: SocketAddr,
        response: &M,
    ) -> Option<PeerDiscoveryRequest> {
        Self::take_valid(&mut self.pending_pings, address, response)
    }

    /// Remove and return the FIND_NODE request answered by `response`, if valid.
    pub fn take_find_node_response<M: DiscoveryPayload>(
        &mut self,
        address: SocketAddr,
        response: &M,
    ) -> Option<PeerDiscoveryRequest> {
        Self::take_valid(&mut self.pending_find_nodes, address, response)
    }

    pub fn drain_expired_pings(&mut self, now: Timestamp) -> Vec<PeerDiscoveryRequest> {
        Self::drain_expired(&mut self.pending_pings, now)
    }

    pub fn drain_expired_find_nodes(&mut self, now: Timestamp) -> Vec<PeerDiscoveryRequest> {
        Self::drain_expired(&mut self.pending_find_nodes, now)
    }

    pub fn pending_pings(&self) -> impl Iterator<Item = &PeerDiscoveryRequest> {
        self.pending_pings.values()
    }

    pub fn pending_find_nodes(&self) -> impl Iterator<Item = &PeerDiscoveryRequest> {
        self.pending_find_nodes.values()
    }

    pub fn pending_ping_addresses(&self) -> impl Iterator<Item = SocketAddr> + '_ {
        self.pending_pings.values().map(PeerDiscoveryRequest::address)
    }

    pub fn pending_ping_count(&self) -> usize {
        self.pending_pings.len()
    }

    pub fn pending_find_node_count(&self) -> usize {
        self.pending_find_nodes.len()
    }

    fn take_valid<M: DiscoveryPayload>(
        pending: &mut HashMap<MessageId, PeerDiscoveryRequest>,
        address: SocketAddr,
        response: &M,
    ) -> Option<PeerDiscoveryRequest> {
        let id = response.message_id();
        if !pending.get(&id)?.validate_response(address, response) {
            return None;
        }
        pending.remove(&id)
    }

    fn drain_expired(
        pending: &mut HashMap<MessageId, PeerDiscoveryRequest>,
        now: Timestamp,
    ) -> Vec<PeerDiscoveryRequest> {
        let expired: Vec<MessageId> = pending
            .values()
            .filter(|request| request.has_expired(now))
            .map(PeerDiscoveryRequest::message_id)
            .collect();

        let mut requests: Vec<PeerDiscoveryRequest> = expired
            .iter()
            .filter_map(|id| pending.remove(id))
            .collect();
        // Oldest first, so replays happen in the order the requests were made.
        requests.sort_by_key(PeerDiscoveryRequest::created_at);
        requests
    }
}
