//! Inbound message dispatch.
//!
//! Protocol mismatches are dropped silently: foreign network ids, responses
//! with no matching pending request, and responses whose address or identity
//! do not match what was asked for.

use std::net::SocketAddr;

use tracing::{debug, trace};

use crate::domain::{
    randomized_limited_list, DiscoveryEvent, DiscoveryMessage, FindNodeMessage, NeighborsMessage,
    Node, PingMessage, PongMessage, Timestamp,
};
use crate::service::core::{ExplorerState, NEIGHBORS_RANDOM_COUNT};
use crate::service::PeerExplorer;

impl PeerExplorer {
    pub(crate) fn dispatch(&self, state: &mut ExplorerState, now: Timestamp, event: DiscoveryEvent) {
        let DiscoveryEvent { message, address } = event;

        if let Some(network_id) = message.network_id() {
            if network_id != self.config.network_id {
                trace!(%address, network_id, "dropping message from foreign network");
                return;
            }
        }

        match message {
            DiscoveryMessage::Ping(ping) => self.handle_ping(state, now, address, ping),
            DiscoveryMessage::Pong(pong) => self.handle_pong(state, now, address, pong),
            DiscoveryMessage::FindNode(find) => self.handle_find_node(state, now, address, find),
            DiscoveryMessage::Neighbors(neighbors) => {
                self.handle_neighbors(state, now, address, neighbors)
            }
        }
    }

    /// Always answer. Known peers get refreshed; strangers get pinged back so
    /// their PONG can admit them.
    fn handle_ping(&self, state: &mut ExplorerState, now: Timestamp, address: SocketAddr, ping: PingMessage) {
        self.send_pong(state, address, &ping);

        match state.established.get(&ping.node_id).cloned() {
            Some(node) => {
                state.table.update_entry(&node, now);
            }
            None => {
                self.send_ping(state, now, address, 1, None);
            }
        }
    }

    fn handle_pong(&self, state: &mut ExplorerState, now: Timestamp, address: SocketAddr, pong: PongMessage) {
        let Some(request) = state.requests.take_ping_response(address, &pong) else {
            trace!(%address, message_id = %pong.message_id, "uncorrelated PONG dropped");
            return;
        };

        if let Some(challenge) = state.challenges.remove_challenge(&pong.message_id) {
            debug!(
                incumbent = %challenge.incumbent(),
                challenger = %challenge.challenger(),
                "incumbent answered challenge, keeping it"
            );
            state.table.update_entry(challenge.incumbent(), now);
            return;
        }

        self.add_connection(state, now, pong.node_id, request.address());
    }

    /// Only established peers are served.
    fn handle_find_node(
        &self,
        state: &mut ExplorerState,
        now: Timestamp,
        address: SocketAddr,
        find: FindNodeMessage,
    ) {
        let Some(requester) = state.established.get(&find.node_id).cloned() else {
            trace!(%address, node_id = %find.node_id, "FIND_NODE from unknown peer dropped");
            return;
        };

        let reply_to = match state.address_cache.resolve_node(&requester) {
            Ok(reply_to) => reply_to,
            Err(error) => {
                debug!(node = %requester, %error, "cannot answer FIND_NODE");
                return;
            }
        };

        let closest = state.table.closest_nodes(&find.target);
        let nodes = randomized_limited_list(
            &closest,
            self.config.max_nodes_per_message,
            NEIGHBORS_RANDOM_COUNT,
            &mut *state.rng,
        );
        self.send_neighbors(state, reply_to, find.message_id, nodes);
        state.table.update_entry(&requester, now);
    }

    fn handle_neighbors(
        &self,
        state: &mut ExplorerState,
        now: Timestamp,
        address: SocketAddr,
        neighbors: NeighborsMessage,
    ) {
        if state
            .requests
            .take_find_node_response(address, &neighbors)
            .is_some()
        {
            let learned = neighbors
                .nodes
                .iter()
                .take(self.config.max_nodes_per_message);
            for node in learned {
                self.enqueue_boot_node(state, node);
            }
            self.start_conversation_with_new_nodes(state, now);
        } else {
            trace!(%address, message_id = %neighbors.message_id, "uncorrelated NEIGHBORS dropped");
        }

        if let Some(responder) = state.established.get(&neighbors.node_id).cloned() {
            state.table.update_entry(&responder, now);
        }
    }

    fn enqueue_boot_node(&self, state: &mut ExplorerState, node: &Node) {
        if node.id() == self.local_id() || self.scoring.is_node_banned(node.id()) {
            return;
        }

        match state.address_cache.resolve_node(node) {
            Ok(address) if self.scoring.is_address_banned(&address.ip()) => {
                trace!(%address, "skipping banned address");
            }
            Ok(address) => {
                state.boot_nodes.insert(address);
            }
            Err(error) => debug!(%node, %error, "skipping neighbor without a usable address"),
        }
    }
}
