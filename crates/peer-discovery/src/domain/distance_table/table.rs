//! Main DistanceTable implementation.

use crate::domain::{bucket_index, sort_by_distance, Node, NodeId, PeerDiscoveryError, Timestamp};

use super::bucket::{BucketEntry, KBucket};
use super::config::NUM_BUCKETS;

/// Outcome of offering a node to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Node took a free slot.
    Added,
    /// Node was already present; its entry moved to most recently seen.
    Refreshed,
    /// Target bucket is full. `incumbent` is the least recently seen
    /// occupant, to be challenged before any eviction.
    Conflict { incumbent: Node },
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Conflict { .. })
    }
}

/// Kademlia routing table keyed by distance from the local id.
///
/// # Invariants
/// - A NodeId lives in exactly one bucket, the one its distance selects.
/// - No bucket holds more than `bucket_size` entries.
/// - The local id is never stored.
///
/// Every entry is addressable by `(bucket index, slot index)`.
#[derive(Debug)]
pub struct DistanceTable {
    local_id: NodeId,
    bucket_size: usize,
    buckets: Vec<KBucket>,
}

impl DistanceTable {
    pub fn new(local_id: NodeId, bucket_size: usize) -> Self {
        Self {
            local_id,
            bucket_size,
            buckets: (0..NUM_BUCKETS).map(|_| KBucket::new()).collect(),
        }
    }

    pub fn local_id(&self) -> &NodeId {
        &self.local_id
    }

    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// Total node count across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(KBucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(KBucket::is_empty)
    }

    pub fn bucket(&self, index: usize) -> Option<&KBucket> {
        self.buckets.get(index)
    }

    /// Offer a node to its bucket.
    ///
    /// A node already present is refreshed. A full bucket is left untouched
    /// and reports its oldest occupant.
    pub fn add_node(
        &mut self,
        node: Node,
        now: Timestamp,
    ) -> Result<OperationResult, PeerDiscoveryError> {
        if node.id() == &self.local_id {
            return Err(PeerDiscoveryError::SelfConnection);
        }

        let capacity = self.bucket_size;
        let bucket = self.bucket_mut_for(node.id());

        if let Some(slot) = bucket.slot_of(node.id()) {
            bucket.refresh(slot, &node, now);
            return Ok(OperationResult::Refreshed);
        }

        if bucket.is_full(capacity) {
            let incumbent = bucket
                .oldest()
                .map(|entry| entry.node.clone())
                .ok_or(PeerDiscoveryError::NodeNotFound)?;
            return Ok(OperationResult::Conflict { incumbent });
        }

        bucket.push(node, now);
        Ok(OperationResult::Added)
    }

    /// Mark a present node as most recently seen. Returns false if absent.
    pub fn update_entry(&mut self, node: &Node, now: Timestamp) -> bool {
        let bucket = self.bucket_mut_for(node.id());
        match bucket.slot_of(node.id()) {
            Some(slot) => {
                bucket.refresh(slot, node, now);
                true
            }
            None => false,
        }
    }

    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<Node> {
        self.bucket_mut_for(node_id).remove(node_id)
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.locate(node_id).is_some()
    }

    /// `(bucket index, slot index)` of a node.
    pub fn locate(&self, node_id: &NodeId) -> Option<(usize, usize)> {
        let index = bucket_index(&self.local_id, node_id);
        self.buckets
            .get(index)
            .and_then(|bucket| bucket.slot_of(node_id))
            .map(|slot| (index, slot))
    }

    pub fn entry(&self, bucket: usize, slot: usize) -> Option<&BucketEntry> {
        self.buckets.get(bucket)?.entries().get(slot)
    }

    /// Every known node, sorted by XOR distance to `target` (closest first).
    pub fn closest_nodes(&self, target: &NodeId) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes().cloned().collect();
        sort_by_distance(&mut nodes, target);
        nodes
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.entries().iter().map(|entry| &entry.node))
    }

    fn bucket_mut_for(&mut self, node_id: &NodeId) -> &mut KBucket {
        let index = bucket_index(&self.local_id, node_id);
        // bucket_index is clamped below NUM_BUCKETS
        &mut self.buckets[index]
    }
}
