//! Kademlia distance calculations.

use crate::domain::{Distance, Node, NodeId, NODE_ID_LEN};

/// Calculate the XOR distance between two NodeIds.
///
/// # Properties
/// - Symmetric: `xor_distance(a, b) == xor_distance(b, a)`
/// - Zero only for identical ids
pub fn xor_distance(a: &NodeId, b: &NodeId) -> Distance {
    let mut out = [0u8; NODE_ID_LEN];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = a.as_bytes()[i] ^ b.as_bytes()[i];
    }
    Distance(out)
}

/// Bucket index of `remote` relative to `local`.
///
/// Equals the number of leading bits the two ids share (0-255). Higher means
/// closer. An id identical to `local` would map to 256; callers never store
/// the local id, so the value is clamped into the last bucket.
pub fn bucket_index(local: &NodeId, remote: &NodeId) -> usize {
    let shared = xor_distance(local, remote).leading_zeros() as usize;
    shared.min(NODE_ID_LEN * 8 - 1)
}

/// Sort nodes by XOR distance to `target`, closest first.
pub fn sort_by_distance(nodes: &mut [Node], target: &NodeId) {
    nodes.sort_by_cached_key(|node| xor_distance(node.id(), target));
}
