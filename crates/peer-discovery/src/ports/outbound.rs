//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces this subsystem **requires** the host application to implement.

use std::net::IpAddr;

use thiserror::Error;

use crate::domain::{DiscoveryConfig, DiscoveryEvent, NodeId, Timestamp};

/// Outbound half of the discovery transport.
///
/// The host owns encoding, signing and the UDP socket. The explorer hands it
/// typed events and never waits for delivery.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the explorer sends from whichever
/// thread is running a handler or a periodic pass.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct UdpTransport {
///     outbound: std::sync::mpsc::Sender<(Vec<u8>, SocketAddr)>,
///     codec: SignedCodec,
/// }
///
/// impl DiscoveryTransport for UdpTransport {
///     fn send(&self, event: DiscoveryEvent) -> Result<(), TransportError> {
///         let bytes = self.codec.encode(&event.message);
///         self.outbound
///             .send((bytes, event.address))
///             .map_err(|_| TransportError::ChannelClosed)
///     }
/// }
/// ```
pub trait DiscoveryTransport: Send + Sync {
    /// Queue a message for delivery to `event.address`.
    fn send(&self, event: DiscoveryEvent) -> Result<(), TransportError>;
}

/// Errors from the outbound transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The consumer of outbound events has gone away
    #[error("transport channel closed")]
    ChannelClosed,
    /// The transport refused the message
    #[error("transport rejected message: {0}")]
    Rejected(String),
}

/// Ban oracle consulted before trusting nodes learned from NEIGHBORS.
pub trait PeerScoring: Send + Sync {
    fn is_address_banned(&self, address: &IpAddr) -> bool;

    fn is_node_banned(&self, node_id: &NodeId) -> bool;
}

/// Abstract interface for time-related operations.
///
/// Enables deterministic testing by injecting controllable time sources.
/// Production implementations use system time; tests advance a counter.
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Abstract interface for configuration loading.
pub trait ConfigProvider: Send + Sync {
    /// Configuration the explorer is built from.
    fn discovery_config(&self) -> DiscoveryConfig;
}
