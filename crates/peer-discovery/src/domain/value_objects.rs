//! Value Objects for Peer Discovery

use std::fmt;

use super::entities::{Node, NodeId, NODE_ID_LEN};

/// Full XOR distance between two node identifiers.
///
/// Ordering is numeric on the 256-bit XOR value, so smaller means closer and
/// two distinct ids never tie against the same target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Distance(pub [u8; NODE_ID_LEN]);

impl Distance {
    /// Number of leading zero bits, i.e. the length of the shared prefix.
    pub fn leading_zeros(&self) -> u32 {
        let mut zeros = 0;
        for byte in self.0 {
            if byte == 0 {
                zeros += 8;
            } else {
                return zeros + byte.leading_zeros();
            }
        }
        zeros
    }

    /// True for the distance of an id to itself.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

/// Lifecycle of the peer explorer: `Created -> Running -> Finished`.
///
/// Transitions are monotonic and never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Created,
    Running,
    Finished,
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

/// Point-in-time snapshot of the explorer's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerStats {
    pub state: ExecState,
    pub established_count: usize,
    pub table_size: usize,
    pub pending_pings: usize,
    pub pending_find_nodes: usize,
    pub active_challenges: usize,
    pub cached_addresses: usize,
}

/// Configuration consumed by the peer explorer.
///
/// # Protocol Limits
///
/// - `max_nodes_per_message`: NEIGHBORS replies never carry more nodes, and
///   inbound NEIGHBORS are truncated to it.
/// - `max_nodes_to_ask` / `max_nodes_to_check`: fan-out caps for the periodic
///   FIND_NODE round and the liveness PING round.
/// - `max_ping_attempts`: a PING is sent at most this many times before the
///   associated node is evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Our own identity and advertised address.
    pub local_node: Node,
    /// Bootstrap targets as `host:port` strings.
    pub bootstrap_nodes: Vec<String>,
    /// Messages declaring another network id are dropped.
    pub network_id: u32,
    /// Time after which an unanswered request expires.
    pub request_timeout_ms: u64,
    /// Period of the refresh pass (FIND_NODE + liveness PING).
    pub refresh_period_ms: u64,
    /// Period of the cleanup pass (expire, retry, evict).
    pub clean_period_ms: u64,
    /// When false, a host:port re-announcing with a new id evicts the old id.
    pub allow_multiple_connections_per_host_port: bool,
    /// Bound of the `host:port` resolution cache.
    pub address_cache_size: usize,
    /// Capacity of each distance table bucket.
    pub bucket_size: usize,
    pub max_nodes_per_message: usize,
    pub max_nodes_to_ask: usize,
    pub max_nodes_to_check: usize,
    pub max_ping_attempts: u32,
}

impl DiscoveryConfig {
    /// Default configuration for the given local node.
    pub fn new(local_node: Node) -> Self {
        Self {
            local_node,
            bootstrap_nodes: Vec::new(),
            network_id: 0,
            request_timeout_ms: 3_000,
            refresh_period_ms: 60_000,
            clean_period_ms: 15_000,
            allow_multiple_connections_per_host_port: true,
            address_cache_size: 200,
            bucket_size: 16,
            max_nodes_per_message: 20,
            max_nodes_to_ask: 24,
            max_nodes_to_check: 16,
            max_ping_attempts: 3,
        }
    }

    /// Create a config suitable for testing (small buckets, short timeout)
    pub fn for_testing(local_node: Node) -> Self {
        Self {
            request_timeout_ms: 1_000,
            refresh_period_ms: 5_000,
            clean_period_ms: 1_000,
            bucket_size: 3,
            ..Self::new(local_node)
        }
    }

    #[must_use]
    pub fn with_bootstrap_nodes(mut self, nodes: Vec<String>) -> Self {
        self.bootstrap_nodes = nodes;
        self
    }

    #[must_use]
    pub fn with_network_id(mut self, network_id: u32) -> Self {
        self.network_id = network_id;
        self
    }

    #[must_use]
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    #[must_use]
    pub fn with_multiple_connections_per_host_port(mut self, allow: bool) -> Self {
        self.allow_multiple_connections_per_host_port = allow;
        self
    }

    /// Local identifier shortcut.
    pub fn local_id(&self) -> &NodeId {
        self.local_node.id()
    }
}
