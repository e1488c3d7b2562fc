//! Admission of verified peers and the challenge protocol.
//!
//! # Security (Eclipse Attack Defense)
//!
//! A full bucket never evicts on arrival. The oldest occupant is challenged
//! with a PING and only loses its slot if that PING goes unanswered.
//!
//! # Security (Identity Rotation)
//!
//! With `allow_multiple_connections_per_host_port` disabled, a socket address
//! that re-announces under a new id loses the old id first.

use std::net::SocketAddr;

use tracing::{debug, warn};

use crate::domain::{ChallengeCommand, MessageId, Node, NodeId, OperationResult, Timestamp};
use crate::service::core::ExplorerState;
use crate::service::PeerExplorer;

impl PeerExplorer {
    /// Admit a peer that just completed a PING/PONG round trip.
    pub(crate) fn add_connection(
        &self,
        state: &mut ExplorerState,
        now: Timestamp,
        node_id: NodeId,
        address: SocketAddr,
    ) {
        if &node_id == self.local_id() {
            return;
        }

        let node = Node::new(node_id, address.ip().to_string(), address.port());
        let key = node.address_key();

        if !self.config.allow_multiple_connections_per_host_port {
            if let Some(prior) = state.known_hosts.get(&key).copied() {
                if prior != node_id {
                    warn!(%address, old = %prior, new = %node_id, "host re-announced with a new id");
                    self.remove_connection(state, &prior);
                }
            }
        }

        match state.table.add_node(node.clone(), now) {
            Ok(OperationResult::Conflict { incumbent }) => {
                if let Some(command) = state.challenges.start_challenge(incumbent, node, now) {
                    self.execute_challenge(state, now, command);
                }
            }
            Ok(_) => {
                // An id seen under a new address keeps only its latest key.
                if let Some(previous) = state.established.get(&node_id) {
                    let previous_key = previous.address_key();
                    if previous_key != key && state.known_hosts.get(&previous_key) == Some(&node_id) {
                        state.known_hosts.remove(&previous_key);
                    }
                }
                debug!(node = %node, "connection established");
                state.known_hosts.insert(key, node_id);
                state.established.insert(node_id, node);
            }
            Err(error) => debug!(node = %node, %error, "admission refused"),
        }
    }

    pub(crate) fn execute_challenge(
        &self,
        state: &mut ExplorerState,
        now: Timestamp,
        command: ChallengeCommand,
    ) {
        match command {
            ChallengeCommand::PingIncumbent {
                incumbent,
                challenger,
                started_at,
            } => match state.address_cache.resolve_node(&incumbent) {
                Ok(address) => {
                    debug!(%incumbent, %challenger, "challenging bucket incumbent");
                    let challenge_id = self.ping_incumbent(state, now, address, 1, &incumbent);
                    state
                        .challenges
                        .register(challenge_id, incumbent, challenger, started_at);
                }
                Err(error) => debug!(%incumbent, %error, "cannot challenge incumbent"),
            },
        }
    }

    /// PING `incumbent` for a challenge.
    ///
    /// A PING already in flight to the same address is reused, so it is bound
    /// to the incumbent: only a PONG carrying the incumbent's id may settle
    /// the challenge.
    pub(crate) fn ping_incumbent(
        &self,
        state: &mut ExplorerState,
        now: Timestamp,
        address: SocketAddr,
        attempt: u32,
        incumbent: &Node,
    ) -> MessageId {
        let challenge_id = self.send_ping(state, now, address, attempt, Some(incumbent.clone()));
        state.requests.bind_related_node(&challenge_id, incumbent.clone());
        challenge_id
    }

    /// Forget a peer everywhere: distance table, established, known hosts.
    pub(crate) fn remove_connection(&self, state: &mut ExplorerState, node_id: &NodeId) {
        state.table.remove_node(node_id);
        if let Some(node) = state.established.remove(node_id) {
            debug!(%node, "connection removed");
        }
        state.known_hosts.retain(|_, id| id != node_id);
    }
}
