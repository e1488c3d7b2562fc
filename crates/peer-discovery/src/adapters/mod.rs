//! # Adapters
//!
//! Concrete implementations of the outbound ports.
//!
//! ## Adapters Provided
//!
//! - `SystemTimeSource` - Production time source using the system clock
//! - `StaticConfigProvider` - Builder-style in-memory configuration
//! - `TomlConfigProvider` - Config file loading (requires "config" feature)
//! - `NoBans` / `StaticBanList` - Ban oracles
//! - `ChannelTransport` - Outbound queue to a UDP writer (requires "runtime" feature)
//! - `DiscoveryRuntime` - Periodic clean/update tasks and the inbound queue (requires "runtime" feature)

// Semantic submodules
/// Configuration providers
pub mod config;
/// Runtime driver
#[cfg(feature = "runtime")]
pub mod runtime;
/// Ban oracles
pub mod scoring;
/// Time source adapters
pub mod time;
/// Transport adapters
pub mod transport;

// Re-export public API
pub use config::StaticConfigProvider;
pub use scoring::{NoBans, StaticBanList};
pub use time::SystemTimeSource;
pub use transport::NoOpTransport;

#[cfg(feature = "config")]
pub use config::{ConfigError, TomlConfigProvider};

#[cfg(feature = "runtime")]
pub use runtime::DiscoveryRuntime;

#[cfg(feature = "runtime")]
pub use transport::ChannelTransport;
