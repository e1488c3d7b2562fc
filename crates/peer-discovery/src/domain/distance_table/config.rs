//! Distance table constants.

use crate::domain::NODE_ID_LEN;

/// Number of buckets (one per bit of NodeId)
pub const NUM_BUCKETS: usize = NODE_ID_LEN * 8;
