//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// Represents a single cache entry with value and timing metadata.
///
/// Expiration is tracked on the monotonic clock; `stored_at` is the wall-clock
/// time reported back to callers.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Wall-clock time of the store that produced this entry
    pub stored_at: DateTime<Utc>,
    /// Monotonic expiration instant, None = never expires via TTL
    pub expire_at: Option<Instant>,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    ///
    /// A zero `ttl` means the entry never expires; it can still be evicted
    /// by capacity pressure.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self::new_at(value, ttl, Instant::now())
    }

    /// Creates a new entry expiring `ttl` after `now`.
    ///
    /// `now` only drives expiration; `stored_at` is always the wall-clock
    /// time at construction.
    pub fn new_at(value: V, ttl: Duration, now: Instant) -> Self {
        let expire_at = if ttl.is_zero() {
            None
        } else {
            now.checked_add(ttl)
        };

        Self {
            value,
            stored_at: Utc::now(),
            expire_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// An entry is expired once `now >= expire_at`; entries without an
    /// expiration never are.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expire_at {
            Some(expire_at) => now >= expire_at,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or None if no expiration is set.
    ///
    /// Returns `Some(Duration::ZERO)` once the entry has expired.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expire_at
            .map(|expire_at| expire_at.saturating_duration_since(Instant::now()))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = Entry::new("test_value", Duration::ZERO);

        assert_eq!(entry.value, "test_value");
        assert!(entry.expire_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining().is_none());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = Entry::new(7u16, Duration::from_secs(60));

        assert_eq!(entry.value, 7);
        assert!(entry.expire_at.is_some());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = Entry::new("test_value", Duration::from_millis(20));

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(40));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = Entry::new_at("test", Duration::from_millis(5), now);

        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + Duration::from_millis(5)));
        assert!(entry.is_expired_at(now + Duration::from_millis(6)));
    }

    #[test]
    fn test_stored_at_is_wall_clock_with_injected_now() {
        let before = Utc::now();
        let past = Instant::now() - Duration::from_millis(50);
        let entry = Entry::new_at("test", Duration::from_millis(10), past);

        assert!(entry.stored_at >= before);
        assert!(entry.stored_at <= Utc::now());
        // expiry still follows the injected instant
        assert!(entry.is_expired());
    }

    #[test]
    fn test_never_expiring_entry_ignores_clock() {
        let now = Instant::now();
        let entry = Entry::new_at("test", Duration::ZERO, now);

        assert!(!entry.is_expired_at(now + Duration::from_secs(3600 * 24 * 365)));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = Entry::new("test_value", Duration::from_secs(10));

        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }
}
