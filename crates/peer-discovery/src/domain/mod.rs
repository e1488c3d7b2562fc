//! Domain Layer - Pure discovery logic with no I/O
//!
//! This module contains:
//! - Node identifiers, XOR distance and the distance table
//! - Discovery messages and request correlation
//! - The challenge protocol guarding full buckets
//! - The bounded address resolution cache
//! - Randomized bounded sampling

pub mod address_cache;
pub mod challenge;
pub mod distance_table;
pub mod entities;
pub mod errors;
pub mod messages;
pub mod request;
pub mod services;
pub mod value_objects;

pub use address_cache::*;
pub use challenge::*;
pub use distance_table::*;
pub use entities::*;
pub use errors::*;
pub use messages::*;
pub use request::*;
pub use services::*;
pub use value_objects::*;
