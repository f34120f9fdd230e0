//! Cache Entry Module
//!
//! Defines a serialized cache value together with its absolute expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A serialized value held by the in-process backend.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// JSON encoded value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after now.
    pub fn new(value: String, ttl: Duration) -> Self {
        Self::written_at(value, ttl, current_timestamp_ms())
    }

    /// Creates an entry as if it had been written at `now` (Unix milliseconds).
    pub fn written_at(value: String, ttl: Duration, now: u64) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            value,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches the expiration time,
    /// so a zero TTL is already expired on the next read.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against an explicit clock reading.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_with_ttl() {
        let before = current_timestamp_ms();
        let entry = CacheEntry::new("\"value\"".to_string(), Duration::from_secs(60));

        assert_eq!(entry.value, "\"value\"");
        assert!(entry.expires_at >= before + 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new("1".to_string(), Duration::ZERO);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::written_at("1".to_string(), Duration::from_millis(500), 1_000);

        assert!(!entry.is_expired_at(1_000));
        assert!(!entry.is_expired_at(1_499));
        assert!(entry.is_expired_at(1_500), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(9_999));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::written_at("1".to_string(), Duration::MAX, 1_000);
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired_at(u64::MAX - 1));
    }
}
