//! Outbound message construction.
//!
//! Every request sent here is tracked before it is queued, so a response can
//! never arrive for a request the tracker does not know about.

use std::collections::HashSet;
use std::net::SocketAddr;

use tracing::debug;

use crate::domain::{
    DiscoveryEvent, DiscoveryMessage, FindNodeMessage, MessageId, MessageType, NeighborsMessage,
    Node, PeerDiscoveryRequest, PingMessage, PongMessage, Timestamp,
};
use crate::service::core::ExplorerState;
use crate::service::PeerExplorer;

impl PeerExplorer {
    /// PING `address`, or return the id of the PING already in flight to it.
    pub(crate) fn send_ping(
        &self,
        state: &mut ExplorerState,
        now: Timestamp,
        address: SocketAddr,
        attempt: u32,
        related_node: Option<Node>,
    ) -> MessageId {
        if let Some(existing) = state.requests.ping_to(&address) {
            return existing.message_id();
        }

        let message_id = MessageId::random(&mut *state.rng);
        let local = self.local_node();
        let message = DiscoveryMessage::Ping(PingMessage {
            message_id,
            node_id: *local.id(),
            host: local.host().to_string(),
            port: local.port(),
            network_id: Some(self.config.network_id),
        });

        debug!(%address, attempt, %message_id, "sending PING");
        state.requests.track_ping(
            PeerDiscoveryRequest::new(
                message.clone(),
                address,
                MessageType::Pong,
                now,
                self.config.request_timeout_ms,
            )
            .with_related_node(related_node)
            .with_attempt(attempt),
        );
        state.outbox.push(DiscoveryEvent::new(message, address));
        message_id
    }

    pub(crate) fn send_pong(&self, state: &mut ExplorerState, address: SocketAddr, ping: &PingMessage) {
        let message = DiscoveryMessage::Pong(PongMessage {
            message_id: ping.message_id,
            node_id: *self.local_id(),
            network_id: Some(self.config.network_id),
        });
        state.outbox.push(DiscoveryEvent::new(message, address));
    }

    /// Ask `node` for the neighborhood of our own id.
    pub(crate) fn send_find_node(
        &self,
        state: &mut ExplorerState,
        now: Timestamp,
        address: SocketAddr,
        node: Node,
    ) -> MessageId {
        let message_id = MessageId::random(&mut *state.rng);
        let message = DiscoveryMessage::FindNode(FindNodeMessage {
            message_id,
            node_id: *self.local_id(),
            target: *self.local_id(),
            network_id: Some(self.config.network_id),
        });

        debug!(%address, node_id = %node.id(), %message_id, "sending FIND_NODE");
        state.requests.track_find_node(
            PeerDiscoveryRequest::new(
                message.clone(),
                address,
                MessageType::Neighbors,
                now,
                self.config.request_timeout_ms,
            )
            .with_related_node(Some(node)),
        );
        state.outbox.push(DiscoveryEvent::new(message, address));
        message_id
    }

    pub(crate) fn send_neighbors(
        &self,
        state: &mut ExplorerState,
        address: SocketAddr,
        request_id: MessageId,
        nodes: Vec<Node>,
    ) {
        debug!(%address, count = nodes.len(), "sending NEIGHBORS");
        let message = DiscoveryMessage::Neighbors(NeighborsMessage {
            message_id: request_id,
            node_id: *self.local_id(),
            nodes,
            network_id: Some(self.config.network_id),
        });
        state.outbox.push(DiscoveryEvent::new(message, address));
    }

    /// Ping every queued bootstrap address, then forget the ones now in flight.
    pub(crate) fn start_conversation_with_new_nodes(&self, state: &mut ExplorerState, now: Timestamp) {
        let targets: Vec<SocketAddr> = state.boot_nodes.iter().copied().collect();
        for address in targets {
            self.send_ping(state, now, address, 1, None);
        }

        let in_flight: HashSet<SocketAddr> = state.requests.pending_ping_addresses().collect();
        state.boot_nodes.retain(|address| !in_flight.contains(address));
    }
}
