//! Retention and paging policy for the history logs.

use chrono::Duration;

use crate::types::Timestamp;

/// Default lifetime of an undo entry: 24 hours.
pub const DEFAULT_UNDO_TTL_HOURS: i64 = 24;

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Upper bound applied to every caller-supplied page size.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Resolve a caller-supplied limit: missing falls back to `default`,
/// everything is clamped into `1..=max`.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}

/// When an undo entry created at `created_at` stops being usable.
pub fn undo_expiry(created_at: Timestamp, ttl: Duration) -> Timestamp {
    created_at + ttl
}

/// An entry is expired from `expires_at` onwards.
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now >= expires_at
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn missing_limit_uses_default() {
        assert_eq!(clamp_limit(None, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT), 50);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(Some(10_000), 50, 500), 500);
        assert_eq!(clamp_limit(Some(0), 50, 500), 1);
        assert_eq!(clamp_limit(Some(-5), 50, 500), 1);
        assert_eq!(clamp_limit(Some(20), 50, 500), 20);
    }

    #[test]
    fn expiry_boundary() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let ttl = Duration::hours(DEFAULT_UNDO_TTL_HOURS);
        let expires = undo_expiry(t0, ttl);

        assert!(!is_expired(expires, expires - Duration::seconds(1)));
        assert!(is_expired(expires, expires));
        assert!(is_expired(expires, expires + Duration::seconds(1)));
    }
}
