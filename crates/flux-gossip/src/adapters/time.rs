use crate::ports::TimeSource;

// ============================================================================
// SystemTimeSource - Production Time Source
// ============================================================================

/// Wall clock in milliseconds since the Unix epoch.
///
/// For tests, use `FixedTimeSource` from the test utilities.
///
/// ```rust
/// use flux_gossip::adapters::SystemTimeSource;
/// use flux_gossip::ports::TimeSource;
///
/// let clock = SystemTimeSource::new();
/// assert!(clock.now_ms() > 1_600_000_000_000);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};

        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}
