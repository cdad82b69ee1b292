//! Timestamp windows applied to incoming envelopes.
//!
//! Two predicates share the five minute constant but compare in opposite
//! directions. They are kept separate on purpose; `is_fresh` is strict at the
//! window edge while `is_stale_for_rebroadcast` only fires past it.

/// Forward clock skew tolerated on a sender timestamp.
pub const MAX_FUTURE_SKEW_MS: i64 = 120_000;

/// Age after which a message is no longer original / fresh.
pub const ORIGINAL_WINDOW_MS: i64 = 300_000;

/// True when the envelope claims to come from more than two minutes in the future.
pub fn is_beyond_clock_skew(timestamp: i64, now: i64) -> bool {
    now < timestamp.saturating_sub(MAX_FUTURE_SKEW_MS)
}

/// True when the envelope is too old to be rebroadcast (`now > ts + 5min`).
pub fn is_stale_for_rebroadcast(timestamp: i64, now: i64) -> bool {
    now > timestamp.saturating_add(ORIGINAL_WINDOW_MS)
}

/// True when the envelope is younger than five minutes (`now < ts + 5min`).
pub fn is_fresh(timestamp: i64, now: i64) -> bool {
    now < timestamp.saturating_add(ORIGINAL_WINDOW_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_clock_skew_boundary() {
        assert!(is_beyond_clock_skew(NOW + 120_001, NOW));
        assert!(!is_beyond_clock_skew(NOW + 120_000, NOW));
        assert!(!is_beyond_clock_skew(NOW + 119_999, NOW));
        assert!(!is_beyond_clock_skew(NOW - 1_000_000, NOW));
    }

    #[test]
    fn test_rebroadcast_staleness_boundary() {
        assert!(is_stale_for_rebroadcast(NOW - 300_001, NOW));
        assert!(!is_stale_for_rebroadcast(NOW - 300_000, NOW));
        assert!(!is_stale_for_rebroadcast(NOW, NOW));
    }

    #[test]
    fn test_freshness_boundary() {
        assert!(is_fresh(NOW - 299_999, NOW));
        assert!(!is_fresh(NOW - 300_000, NOW));
        assert!(!is_fresh(NOW - 300_001, NOW));
        assert!(is_fresh(NOW + 60_000, NOW));
    }

    #[test]
    fn test_predicates_disagree_at_exact_edge() {
        // At exactly five minutes the message is neither fresh nor stale
        let ts = NOW - ORIGINAL_WINDOW_MS;
        assert!(!is_fresh(ts, NOW));
        assert!(!is_stale_for_rebroadcast(ts, NOW));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        assert!(!is_beyond_clock_skew(i64::MIN, NOW));
        assert!(!is_stale_for_rebroadcast(i64::MAX, NOW));
        assert!(is_fresh(i64::MAX, NOW));
    }
}
