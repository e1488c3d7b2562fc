//! Domain Services - Pure functions for Kademlia operations
//!
//! All functions in this module are free of I/O and state. Randomized
//! selection takes its random source as a parameter.

mod distance;
mod sampling;

pub use distance::{bucket_index, sort_by_distance, xor_distance};
pub use sampling::randomized_limited_list;
