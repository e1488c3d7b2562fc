//! # Driving Ports (Inbound API)
//!
//! These are the public APIs this subsystem exposes to the node.

use crate::domain::{DiscoveryEvent, ExecState, ExplorerStats, Node, NodeId};

/// Primary API for interacting with the peer discovery subsystem.
///
/// Every method takes `&self`: implementations serialize internally so the
/// transport, the scheduler and the application can call in concurrently.
///
/// # Lifecycle
///
/// `start` and `dispose` drive `CREATED -> RUNNING -> FINISHED`. Message
/// handling and the periodic passes are no-ops outside `RUNNING`.
///
/// # Example
///
/// ```rust,ignore
/// use peer_discovery::ports::PeerDiscoveryApi;
///
/// fn report<T: PeerDiscoveryApi>(api: &T) {
///     println!("{} established peers", api.established_peers().len());
/// }
/// ```
pub trait PeerDiscoveryApi {
    /// Move to `RUNNING` and ping the bootstrap addresses.
    ///
    /// Returns `false` (and does nothing) unless the state was `CREATED`.
    fn start(&self) -> bool;

    /// Move to `FINISHED`. Returns `false` if already finished.
    fn dispose(&self) -> bool;

    /// Dispatch one decoded, signature-verified inbound message.
    fn handle_message(&self, event: DiscoveryEvent);

    /// Expire, retry and evict outstanding requests.
    fn clean(&self);

    /// Ask for more nodes and probe liveness of known ones.
    fn update(&self);

    /// Peers that completed a PING/PONG round trip.
    fn established_peers(&self) -> Vec<Node>;

    /// Known peers sorted by XOR distance to `target`.
    fn closest_peers(&self, target: &NodeId) -> Vec<Node>;

    fn state(&self) -> ExecState;

    fn stats(&self) -> ExplorerStats;
}
