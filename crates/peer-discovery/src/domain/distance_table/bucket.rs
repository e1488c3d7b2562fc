//! K-Bucket implementation for the distance table.

use crate::domain::{Node, NodeId, Timestamp};

/// A node slot in a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketEntry {
    pub node: Node,
    /// Last time this node proved liveness or was refreshed.
    pub last_seen: Timestamp,
}

/// A bucket storing up to `capacity` nodes at one distance class.
///
/// Entries are ordered least recently seen first, so the front entry is the
/// incumbent challenged when a newcomer finds the bucket full.
#[derive(Debug, Clone, Default)]
pub struct KBucket {
    pub(crate) entries: Vec<BucketEntry>,
}

impl KBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self, capacity: usize) -> bool {
        self.entries.len() >= capacity
    }

    /// Least recently seen entry.
    pub fn oldest(&self) -> Option<&BucketEntry> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[BucketEntry] {
        &self.entries
    }

    pub fn slot_of(&self, node_id: &NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.node.id() == node_id)
    }

    /// Append at the most recently seen position (assumes not full).
    pub(crate) fn push(&mut self, node: Node, now: Timestamp) {
        self.entries.push(BucketEntry {
            node,
            last_seen: now,
        });
    }

    /// Move an entry to the most recently seen position, taking the latest
    /// address the node was seen at.
    pub(crate) fn refresh(&mut self, slot: usize, node: &Node, now: Timestamp) {
        let mut entry = self.entries.remove(slot);
        entry.node = node.clone();
        entry.last_seen = now;
        self.entries.push(entry);
    }

    pub(crate) fn remove(&mut self, node_id: &NodeId) -> Option<Node> {
        self.slot_of(node_id)
            .map(|slot| self.entries.remove(slot).node)
    }
}
