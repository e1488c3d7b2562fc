use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::warn;

use crate::domain::{
    AddressCache, DiscoveryConfig, DiscoveryEvent, DistanceTable, ExecState, Node,
    NodeChallengeManager, NodeId, PeerDiscoveryRequest, RequestTracker, Timestamp,
};
use crate::ports::{ConfigProvider, DiscoveryTransport, PeerScoring, TimeSource};

/// Random picks in a NEIGHBORS reply.
pub const NEIGHBORS_RANDOM_COUNT: usize = 5;
/// Random picks in the periodic FIND_NODE round.
pub const FIND_NODE_RANDOM_COUNT: usize = 5;
/// Random picks in the periodic liveness PING round.
pub const PULSE_RANDOM_COUNT: usize = 10;

/// Peer Explorer: the discovery orchestrator.
///
/// Owns the distance table, the request tracker, the challenge manager, the
/// address cache and the established/known-host maps, all inside one
/// [`Mutex`]. Every entry point takes the lock once, so lifecycle transitions
/// and table mutation never interleave.
///
/// Outbound messages produced while the lock is held are queued and handed to
/// the [`DiscoveryTransport`] only after it is released.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use peer_discovery::{
///     DiscoveryConfig, ExecState, NoBans, NoOpTransport, Node, NodeId, PeerDiscoveryApi,
///     PeerExplorer, SystemTimeSource,
/// };
///
/// let local = Node::new(NodeId::from_public_key(b"local"), "127.0.0.1", 30305);
/// let explorer = PeerExplorer::new(
///     DiscoveryConfig::new(local).with_bootstrap_nodes(vec!["10.0.0.1:30305".into()]),
///     Arc::new(NoOpTransport),
///     Arc::new(NoBans),
///     Box::new(SystemTimeSource::new()),
/// );
///
/// // Nothing is sent before start().
/// explorer.update();
/// assert!(explorer.pending_pings().is_empty());
///
/// assert!(explorer.start());
/// assert_eq!(explorer.pending_pings().len(), 1);
///
/// assert!(explorer.dispose());
/// assert!(!explorer.start());
/// assert_eq!(explorer.state(), ExecState::Finished);
/// ```
pub struct PeerExplorer {
    pub(crate) config: DiscoveryConfig,
    pub(crate) transport: Arc<dyn DiscoveryTransport>,
    pub(crate) scoring: Arc<dyn PeerScoring>,
    pub(crate) time_source: Box<dyn TimeSource>,
    pub(crate) state: Mutex<ExplorerState>,
}

/// Everything guarded by the explorer lock.
pub(crate) struct ExplorerState {
    pub(crate) exec: ExecState,
    /// Addresses to ping on the next conversation round.
    pub(crate) boot_nodes: BTreeSet<SocketAddr>,
    pub(crate) requests: RequestTracker,
    pub(crate) established: HashMap<NodeId, Node>,
    /// `host:port` -> id last admitted from that address.
    pub(crate) known_hosts: HashMap<String, NodeId>,
    pub(crate) table: DistanceTable,
    pub(crate) challenges: NodeChallengeManager,
    pub(crate) address_cache: AddressCache,
    pub(crate) rng: Box<dyn RngCore + Send>,
    /// Messages waiting for the lock to be released.
    pub(crate) outbox: Vec<DiscoveryEvent>,
}

impl PeerExplorer {
    /// Create an explorer in `CREATED` state.
    ///
    /// Bootstrap entries are resolved through the address cache right away,
    /// including any DNS lookups, before the explorer can be shared; entries
    /// that do not resolve are logged and skipped.
    pub fn new(
        config: DiscoveryConfig,
        transport: Arc<dyn DiscoveryTransport>,
        scoring: Arc<dyn PeerScoring>,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        let mut address_cache = AddressCache::new(config.address_cache_size);
        let mut boot_nodes = BTreeSet::new();
        for entry in &config.bootstrap_nodes {
            match address_cache.lookup_str(entry) {
                Ok(address) => {
                    boot_nodes.insert(address);
                }
                Err(error) => warn!(%entry, %error, "skipping bootstrap node"),
            }
        }

        let state = ExplorerState {
            exec: ExecState::Created,
            boot_nodes,
            requests: RequestTracker::new(),
            established: HashMap::new(),
            known_hosts: HashMap::new(),
            table: DistanceTable::new(*config.local_id(), config.bucket_size),
            challenges: NodeChallengeManager::new(),
            address_cache,
            rng: Box::new(StdRng::from_entropy()),
            outbox: Vec::new(),
        };

        Self {
            config,
            transport,
            scoring,
            time_source,
            state: Mutex::new(state),
        }
    }

    /// Create an explorer from a configuration source.
    pub fn from_provider(
        provider: &dyn ConfigProvider,
        transport: Arc<dyn DiscoveryTransport>,
        scoring: Arc<dyn PeerScoring>,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        Self::new(provider.discovery_config(), transport, scoring, time_source)
    }

    /// Replace the random source used for sampling and message ids.
    #[must_use]
    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.state.get_mut().rng = Box::new(rng);
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn local_node(&self) -> &Node {
        &self.config.local_node
    }

    /// Outstanding PING requests, oldest first.
    pub fn pending_pings(&self) -> Vec<PeerDiscoveryRequest> {
        let state = self.state.lock();
        let mut requests: Vec<PeerDiscoveryRequest> =
            state.requests.pending_pings().cloned().collect();
        requests.sort_by_key(PeerDiscoveryRequest::created_at);
        requests
    }

    /// Outstanding FIND_NODE requests, oldest first.
    pub fn pending_find_nodes(&self) -> Vec<PeerDiscoveryRequest> {
        let state = self.state.lock();
        let mut requests: Vec<PeerDiscoveryRequest> =
            state.requests.pending_find_nodes().cloned().collect();
        requests.sort_by_key(PeerDiscoveryRequest::created_at);
        requests
    }

    pub(crate) fn local_id(&self) -> &NodeId {
        self.config.local_id()
    }

    /// Run `f` inside the critical section, then flush queued messages.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut ExplorerState, Timestamp) -> T) -> T {
        let now = self.time_source.now();
        let (result, outbox) = {
            let mut state = self.state.lock();
            let result = f(&mut state, now);
            (result, std::mem::take(&mut state.outbox))
        };
        self.flush(outbox);
        result
    }

    /// Like [`Self::with_state`], but only while `RUNNING`.
    pub(crate) fn when_running(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut ExplorerState, Timestamp),
    ) {
        self.with_state(|state, now| {
            if state.exec != ExecState::Running {
                warn!(operation, state = %state.exec, "operation skipped, explorer not running");
                return;
            }
            f(state, now);
        });
    }

    fn flush(&self, outbox: Vec<DiscoveryEvent>) {
        for event in outbox {
            let address = event.address;
            let kind = event.message.message_type();
            if let Err(error) = self.transport.send(event) {
                warn!(%address, %kind, %error, "failed to send discovery message");
            }
        }
    }
}
