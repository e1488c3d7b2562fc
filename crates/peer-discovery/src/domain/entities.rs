//! Core Domain Entities for Peer Discovery
//!
//! `NodeId`, `Node` and the millisecond `Timestamp` used by request expiry.

use std::fmt;
use std::hash::{Hash, Hasher};

use sha3::{Digest, Keccak256};

use super::errors::PeerDiscoveryError;

/// Length in bytes of a node identifier.
pub const NODE_ID_LEN: usize = 32;

/// 256-bit node identifier derived from a public key hash.
///
/// NodeId keys the distance table and is the operand of every XOR distance
/// comparison. It is immutable once assigned.
///
/// # Security (Timing Attack Prevention)
///
/// Equality is constant-time. Standard `PartialEq` for byte arrays
/// short-circuits on the first difference, leaking where two ids diverge.
// SAFETY: derived_hash_with_manual_eq is intentionally allowed here.
// The manual PartialEq only changes comparison timing, equal ids still
// hash equally.
#[allow(clippy::derived_hash_with_manual_eq)]
#[derive(Clone, Copy, Hash)]
pub struct NodeId(pub [u8; NODE_ID_LEN]);

impl PartialEq for NodeId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        let mut result = 0u8;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            result |= a ^ b;
        }
        result == 0
    }
}

impl Eq for NodeId {}

impl NodeId {
    /// Create a NodeId from a raw 32-byte array.
    pub fn new(bytes: [u8; NODE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive the identifier of a peer from its public key (Keccak-256).
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = Keccak256::digest(public_key);
        let mut bytes = [0u8; NODE_ID_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Parse a NodeId from its 64-character hex form.
    pub fn from_hex(value: &str) -> Result<Self, PeerDiscoveryError> {
        let trimmed = value.trim_start_matches("0x");
        let decoded = hex::decode(trimmed).map_err(|_| PeerDiscoveryError::InvalidNodeId {
            value: value.to_string(),
        })?;
        let bytes: [u8; NODE_ID_LEN] =
            decoded
                .try_into()
                .map_err(|_| PeerDiscoveryError::InvalidNodeId {
                    value: value.to_string(),
                })?;
        Ok(Self(bytes))
    }

    /// Get the underlying bytes for XOR distance calculation.
    pub fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }

    /// Full hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create a zero-initialized NodeId.
    pub fn zero() -> Self {
        Self([0u8; NODE_ID_LEN])
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self)
    }
}

/// Abbreviated form for logs: first and last four bytes.
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            hex::encode(&self.0[..4]),
            hex::encode(&self.0[NODE_ID_LEN - 4..])
        )
    }
}

/// A peer as seen by discovery: identity plus the address it answers on.
///
/// Two nodes are the same peer iff their ids match. Host and port may change
/// between sightings of the same peer.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    host: String,
    port: u16,
}

impl Node {
    /// Create a node from its identifier and advertised address.
    pub fn new(id: NodeId, host: impl Into<String>, port: u16) -> Self {
        Self {
            id,
            host: host.into(),
            port,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` key used by the address cache and the known hosts map.
    pub fn address_key(&self) -> String {
        address_key(&self.host, self.port)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.id, self.host, self.port)
    }
}

/// Canonical `host:port` rendering shared by every address-keyed map.
pub fn address_key(host: &str, port: u16) -> String {
    format!("{}:{}", host, port)
}

/// Unix timestamp in milliseconds.
///
/// # Security (Timestamp Bounds)
///
/// Timestamps are clamped to a reasonable maximum so that expiry arithmetic
/// can never overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Maximum reasonable timestamp (year 9999, in milliseconds).
    pub const MAX_REASONABLE: u64 = 253_402_300_799_000;

    /// Create a new timestamp, clamping to MAX_REASONABLE.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.min(Self::MAX_REASONABLE))
    }

    /// Get the underlying milliseconds value.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Add milliseconds (saturating at MAX_REASONABLE).
    pub fn add_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis).min(Self::MAX_REASONABLE))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is in the future).
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}
