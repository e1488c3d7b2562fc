//! # Peer Explorer
//!
//! The orchestrator implementing the `PeerDiscoveryApi` port: lifecycle,
//! inbound dispatch, admission with challenges, and the periodic clean and
//! update passes.

// Semantic submodules
mod admission;
mod api;
mod core;
mod handlers;
mod lifecycle;
mod maintenance;
mod messaging;

// Re-export public API
pub use self::core::{
    PeerExplorer, FIND_NODE_RANDOM_COUNT, NEIGHBORS_RANDOM_COUNT, PULSE_RANDOM_COUNT,
};

#[cfg(test)]
mod tests;
