//! # Peer Discovery
//!
//! UDP, Kademlia-style peer discovery for a blockchain node: bootstrap from a
//! few known addresses, rank reachable peers by XOR distance, resolve bucket
//! conflicts with liveness challenges, and keep the peer set fresh.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Pure discovery logic (distance table, request tracker,
//!   challenge manager, address cache, sampling)
//! - **Ports Layer:** Trait definitions for the transport, ban oracle, clock
//!   and configuration source
//! - **Service Layer:** `PeerExplorer`, the orchestrator
//! - **Adapters Layer:** Concrete implementations, some feature-gated
//!
//! ## Feature Flags
//!
//! - `runtime` - Tokio driver and channel transport
//! - `config` - TOML configuration loading
//! - `test-utils` - Recording transport and controllable clock
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use peer_discovery::{
//!     DiscoveryConfig, ExecState, Node, NodeId, NoBans, NoOpTransport, PeerDiscoveryApi,
//!     PeerExplorer, SystemTimeSource,
//! };
//!
//! let local = Node::new(NodeId::from_public_key(b"local public key"), "127.0.0.1", 30305);
//! let config = DiscoveryConfig::new(local).with_bootstrap_nodes(vec!["10.0.0.1:30305".into()]);
//!
//! let explorer = PeerExplorer::new(
//!     config,
//!     Arc::new(NoOpTransport),
//!     Arc::new(NoBans),
//!     Box::new(SystemTimeSource::new()),
//! );
//!
//! assert!(explorer.start());
//! assert_eq!(explorer.state(), ExecState::Running);
//! assert_eq!(explorer.stats().pending_pings, 1);
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Test utilities (RecordingTransport, ControllableTimeSource)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

// Domain entities and values
pub use domain::{
    DiscoveryConfig, DiscoveryEvent, DiscoveryMessage, Distance, ExecState, ExplorerStats,
    FindNodeMessage, MessageId, MessageType, NeighborsMessage, Node, NodeId, PeerDiscoveryError,
    PeerDiscoveryRequest, PingMessage, PongMessage, Timestamp,
};

// Domain structures
pub use domain::{AddressCache, DistanceTable, NodeChallengeManager, RequestTracker};

// Domain services
pub use domain::{bucket_index, randomized_limited_list, sort_by_distance, xor_distance};

// Port traits
pub use ports::{
    ConfigProvider, DiscoveryTransport, PeerDiscoveryApi, PeerScoring, TimeSource, TransportError,
};

// Service
pub use service::PeerExplorer;

// Adapters
pub use adapters::{NoBans, NoOpTransport, StaticBanList, StaticConfigProvider, SystemTimeSource};

#[cfg(feature = "config")]
pub use adapters::{ConfigError, TomlConfigProvider};

#[cfg(feature = "runtime")]
pub use adapters::{ChannelTransport, DiscoveryRuntime};
