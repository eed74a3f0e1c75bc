//! Cache entries

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

/// A stored fetch result.
///
/// An entry is served only while `now - cached_at < ttl`.
#[derive(Debug, Clone)]
pub struct CacheEntry<P> {
    /// The fingerprint the entry is stored under.
    pub key: String,
    /// When the fetch that produced the payload finished.
    pub cached_at: DateTime<Utc>,
    /// The fetch result, opaque to the cache.
    pub payload: P,
}

impl<P> CacheEntry<P> {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, payload: P, cached_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            cached_at,
            payload,
        }
    }

    /// Returns `true` while the entry may still be served.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.cached_at < ttl_delta(ttl)
    }

    /// When the entry stops being served.
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.cached_at
            .checked_add_signed(ttl_delta(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

fn ttl_delta(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero())
}
