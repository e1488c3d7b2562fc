use crate::domain::DiscoveryEvent;
use crate::ports::{DiscoveryTransport, TransportError};

// ============================================================================
// NoOpTransport - Stub for running without network
// ============================================================================

/// Transport that accepts and discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTransport;

impl NoOpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DiscoveryTransport for NoOpTransport {
    fn send(&self, _event: DiscoveryEvent) -> Result<(), TransportError> {
        Ok(())
    }
}

// ============================================================================
// ChannelTransport - Outbound queue (requires "runtime" feature)
// ============================================================================

#[cfg(feature = "runtime")]
mod channel {
    use super::*;
    use tokio::sync::mpsc;

    /// Hands outbound events to a bounded queue drained by the UDP writer.
    ///
    /// `send` never waits: a full queue rejects the message, which the
    /// explorer treats like any lost datagram.
    #[derive(Debug, Clone)]
    pub struct ChannelTransport {
        outbound: mpsc::Sender<DiscoveryEvent>,
    }

    impl ChannelTransport {
        /// Create a transport and the receiver the writer task consumes.
        pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DiscoveryEvent>) {
            let (outbound, receiver) = mpsc::channel(capacity.max(1));
            (Self { outbound }, receiver)
        }

        pub fn from_sender(outbound: mpsc::Sender<DiscoveryEvent>) -> Self {
            Self { outbound }
        }
    }

    impl DiscoveryTransport for ChannelTransport {
        fn send(&self, event: DiscoveryEvent) -> Result<(), TransportError> {
            self.outbound.try_send(event).map_err(|error| match error {
                mpsc::error::TrySendError::Full(_) => {
                    TransportError::Rejected("outbound queue full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => TransportError::ChannelClosed,
            })
        }
    }
}

#[cfg(feature = "runtime")]
pub use channel::ChannelTransport;
