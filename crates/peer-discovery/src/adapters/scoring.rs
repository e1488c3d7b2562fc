use std::collections::HashSet;
use std::net::IpAddr;

use parking_lot::RwLock;

use crate::domain::NodeId;
use crate::ports::PeerScoring;

/// Ban oracle that trusts everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBans;

impl PeerScoring for NoBans {
    fn is_address_banned(&self, _address: &IpAddr) -> bool {
        false
    }

    fn is_node_banned(&self, _node_id: &NodeId) -> bool {
        false
    }
}

/// Ban oracle backed by explicit sets of addresses and node ids.
///
/// Bans can be added while the explorer is running; lookups take a read lock.
#[derive(Debug, Default)]
pub struct StaticBanList {
    addresses: RwLock<HashSet<IpAddr>>,
    nodes: RwLock<HashSet<NodeId>>,
}

impl StaticBanList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ban_address(&self, address: IpAddr) {
        self.addresses.write().insert(address);
    }

    pub fn ban_node(&self, node_id: NodeId) {
        self.nodes.write().insert(node_id);
    }

    /// Returns whether the address was banned.
    pub fn unban_address(&self, address: &IpAddr) -> bool {
        self.addresses.write().remove(address)
    }

    /// Returns whether the node was banned.
    pub fn unban_node(&self, node_id: &NodeId) -> bool {
        self.nodes.write().remove(node_id)
    }
}

impl PeerScoring for StaticBanList {
    fn is_address_banned(&self, address: &IpAddr) -> bool {
        self.addresses.read().contains(address)
    }

    fn is_node_banned(&self, node_id: &NodeId) -> bool {
        self.nodes.read().contains(node_id)
    }
}
