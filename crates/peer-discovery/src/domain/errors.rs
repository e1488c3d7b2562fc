//! Domain Errors for Peer Discovery
//!
//! Protocol-level mismatches (foreign network id, uncorrelated or spoofed
//! responses, full buckets) are not errors: they are dropped or routed into
//! the challenge protocol. Only failures a caller can act on live here.

use thiserror::Error;

/// Errors that can occur during peer discovery operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerDiscoveryError {
    /// Attempted to add the local node to the distance table
    #[error("cannot add local node to distance table")]
    SelfConnection,

    /// Node is not present in the distance table
    #[error("node not found in distance table")]
    NodeNotFound,

    /// A `host:port` pair could not be parsed or resolved
    #[error("cannot resolve address {address}")]
    UnresolvableAddress { address: String },

    /// A hostname seen while handling traffic; only IP literals and cached
    /// bootstrap names are accepted there
    #[error("hostname {address} is not resolved outside bootstrap")]
    UnresolvedHostname { address: String },

    /// Node identifier is not 32 bytes of valid hex
    #[error("invalid node identifier: {value}")]
    InvalidNodeId { value: String },
}
