//! Test utilities for peer discovery.
//!
//! Deterministic stand-ins for the outbound ports. Enable with the
//! `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use peer_discovery::test_utils::ControllableTimeSource;
//! use peer_discovery::TimeSource;
//!
//! let clock = ControllableTimeSource::new(1_000);
//! clock.advance(500);
//! assert_eq!(clock.now().as_millis(), 1_500);
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{DiscoveryEvent, DiscoveryMessage, MessageType, Timestamp};
use crate::ports::outbound::{DiscoveryTransport, TimeSource, TransportError};

/// Thread-safe clock for tests requiring time advancement.
///
/// Clones share the same counter, so a test can keep a handle while the
/// explorer owns the boxed source.
#[derive(Debug, Clone)]
pub struct ControllableTimeSource {
    millis: Arc<AtomicU64>,
}

impl ControllableTimeSource {
    pub fn new(initial_millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(initial_millis)),
        }
    }

    /// Advance the clock by `millis`.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ControllableTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Transport that records every outbound event.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<DiscoveryEvent>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<DiscoveryEvent> {
        self.sent.lock().clone()
    }

    /// Remove and return everything sent so far.
    pub fn take(&self) -> Vec<DiscoveryEvent> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Sent events of one message type.
    pub fn sent_of(&self, kind: MessageType) -> Vec<DiscoveryEvent> {
        self.sent
            .lock()
            .iter()
            .filter(|event| event.message.message_type() == kind)
            .cloned()
            .collect()
    }

    /// Most recent message sent to `address`.
    pub fn last_to(&self, address: SocketAddr) -> Option<DiscoveryMessage> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|event| event.address == address)
            .map(|event| event.message.clone())
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl DiscoveryTransport for RecordingTransport {
    fn send(&self, event: DiscoveryEvent) -> Result<(), TransportError> {
        self.sent.lock().push(event);
        Ok(())
    }
}

/// Transport whose every send fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingTransport;

impl DiscoveryTransport for FailingTransport {
    fn send(&self, _event: DiscoveryEvent) -> Result<(), TransportError> {
        Err(TransportError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controllable_time_source_clones_share_the_clock() {
        let clock = ControllableTimeSource::new(1_000);
        let handle = clock.clone();

        handle.advance(250);
        assert_eq!(clock.now().as_millis(), 1_250);

        handle.set(10);
        assert_eq!(clock.now().as_millis(), 10);
    }
}
