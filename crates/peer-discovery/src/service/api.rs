use crate::domain::{DiscoveryEvent, ExecState, ExplorerStats, Node, NodeId};
use crate::ports::PeerDiscoveryApi;
use crate::service::PeerExplorer;

impl PeerDiscoveryApi for PeerExplorer {
    fn start(&self) -> bool {
        self.start_with(true)
    }

    fn dispose(&self) -> bool {
        self.finish()
    }

    fn handle_message(&self, event: DiscoveryEvent) {
        self.when_running("handle_message", |state, now| {
            self.dispatch(state, now, event)
        });
    }

    fn clean(&self) {
        self.when_running("clean", |state, now| self.purge_requests(state, now));
    }

    fn update(&self) {
        self.when_running("update", |state, now| self.refresh(state, now));
    }

    fn established_peers(&self) -> Vec<Node> {
        self.state.lock().established.values().cloned().collect()
    }

    fn closest_peers(&self, target: &NodeId) -> Vec<Node> {
        self.state.lock().table.closest_nodes(target)
    }

    fn state(&self) -> ExecState {
        self.state.lock().exec
    }

    fn stats(&self) -> ExplorerStats {
        let state = self.state.lock();
        ExplorerStats {
            state: state.exec,
            established_count: state.established.len(),
            table_size: state.table.len(),
            pending_pings: state.requests.pending_ping_count(),
            pending_find_nodes: state.requests.pending_find_node_count(),
            active_challenges: state.challenges.len(),
            cached_addresses: state.address_cache.len(),
        }
    }
}
