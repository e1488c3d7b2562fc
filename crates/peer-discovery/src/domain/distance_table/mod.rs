//! Node Distance Table
//!
//! Kademlia-style routing table: nodes bucketed by shared-prefix length with
//! the local id, each bucket bounded and ordered least-recently-seen first.

mod bucket;
mod config;
mod table;

pub use bucket::{BucketEntry, KBucket};
pub use config::NUM_BUCKETS;
pub use table::{DistanceTable, OperationResult};
