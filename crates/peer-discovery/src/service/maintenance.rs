use tracing::debug;

use crate::domain::{randomized_limited_list, PeerDiscoveryRequest, Timestamp};
use crate::service::core::{ExplorerState, FIND_NODE_RANDOM_COUNT, PULSE_RANDOM_COUNT};
use crate::service::PeerExplorer;

impl PeerExplorer {
    /// Expire outstanding requests.
    ///
    /// Call from a timer task every `clean_period_ms`. An expired PING is
    /// resent with a fresh id until `max_ping_attempts`, after which its
    /// related node is evicted. Challenge PINGs follow the same schedule; an
    /// evicted incumbent's challenger is pinged again so it can take the
    /// slot. Expired FIND_NODE requests are dropped.
    pub(crate) fn purge_requests(&self, state: &mut ExplorerState, now: Timestamp) {
        for request in state.requests.drain_expired_pings(now) {
            self.expire_ping(state, now, request);
        }

        let dropped = state.requests.drain_expired_find_nodes(now);
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "expired FIND_NODE requests dropped");
        }
    }

    fn expire_ping(&self, state: &mut ExplorerState, now: Timestamp, request: PeerDiscoveryRequest) {
        let challenge = state.challenges.remove_challenge(&request.message_id());

        if request.attempt() < self.config.max_ping_attempts {
            debug!(
                address = %request.address(),
                attempt = request.attempt() + 1,
                challenged = challenge.is_some(),
                "retrying PING"
            );
            match challenge {
                // The challenge follows the incumbent's retries.
                Some(challenge) => {
                    let retry_id = self.ping_incumbent(
                        state,
                        now,
                        request.address(),
                        request.attempt() + 1,
                        challenge.incumbent(),
                    );
                    state.challenges.register(
                        retry_id,
                        challenge.incumbent().clone(),
                        challenge.challenger().clone(),
                        challenge.started_at(),
                    );
                }
                None => {
                    self.send_ping(
                        state,
                        now,
                        request.address(),
                        request.attempt() + 1,
                        request.related_node().cloned(),
                    );
                }
            }
            return;
        }

        if let Some(node) = request.related_node() {
            debug!(%node, attempts = request.attempt(), "node unreachable, evicting");
            self.remove_connection(state, node.id());
        } else {
            debug!(address = %request.address(), "giving up on unanswered PING");
        }

        if let Some(challenge) = challenge {
            debug!(
                incumbent = %challenge.incumbent(),
                challenger = %challenge.challenger(),
                "incumbent failed challenge, re-verifying challenger"
            );
            match state.address_cache.resolve_node(challenge.challenger()) {
                Ok(address) => {
                    self.send_ping(state, now, address, 1, None);
                }
                Err(error) => debug!(%error, "cannot re-verify challenger"),
            }
        }
    }

    /// Ask the nodes around our own id for more nodes and probe the liveness
    /// of a sample of them.
    ///
    /// Call from a timer task every `refresh_period_ms`.
    pub(crate) fn refresh(&self, state: &mut ExplorerState, now: Timestamp) {
        let closest = state.table.closest_nodes(self.local_id());

        let to_ask = randomized_limited_list(
            &closest,
            self.config.max_nodes_to_ask,
            FIND_NODE_RANDOM_COUNT,
            &mut *state.rng,
        );
        for node in to_ask {
            match state.address_cache.resolve_node(&node) {
                Ok(address) => {
                    self.send_find_node(state, now, address, node);
                }
                Err(error) => debug!(%node, %error, "skipping FIND_NODE"),
            }
        }

        let to_check = randomized_limited_list(
            &closest,
            self.config.max_nodes_to_check,
            PULSE_RANDOM_COUNT,
            &mut *state.rng,
        );
        for node in to_check {
            match state.address_cache.resolve_node(&node) {
                Ok(address) => {
                    self.send_ping(state, now, address, 1, Some(node));
                }
                Err(error) => debug!(%node, %error, "skipping liveness PING"),
            }
        }
    }
}
