//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** APIs this subsystem exposes to the node
//! - **Driven Ports (Outbound):** SPIs this subsystem requires from adapters

pub mod inbound;
pub mod outbound;

pub use inbound::PeerDiscoveryApi;
pub use outbound::{ConfigProvider, DiscoveryTransport, PeerScoring, TimeSource, TransportError};
