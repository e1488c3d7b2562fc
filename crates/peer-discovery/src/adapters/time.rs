use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::domain::Timestamp;
use crate::ports::TimeSource;

/// Wall clock in milliseconds since the Unix epoch, the resolution request
/// expiry is measured in.
///
/// A clock set before the epoch reads as zero.
///
/// ```rust
/// use peer_discovery::adapters::SystemTimeSource;
/// use peer_discovery::ports::TimeSource;
///
/// let clock = SystemTimeSource::new();
/// let earlier = clock.now();
/// assert!(clock.now() >= earlier);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource {
    offset: Duration,
}

impl SystemTimeSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock running `offset` ahead of the host clock.
    #[must_use]
    pub fn with_offset(offset: Duration) -> Self {
        Self { offset }
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_add(self.offset);
        Timestamp::from_millis(u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
    }
}
