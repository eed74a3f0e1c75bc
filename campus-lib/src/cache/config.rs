//! Cache configuration

use std::time::Duration;

/// Timing settings for a [`QueryCache`](super::QueryCache).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use campus_lib::cache::CacheConfig;
///
/// let config = CacheConfig::default()
///     .with_ttl(Duration::from_secs(60))
///     .with_slow_query_threshold(Duration::from_millis(250));
/// assert_eq!(config.sweep_interval, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a stored payload is served before the next resolve refetches.
    ///
    /// Default: 5 minutes
    pub ttl: Duration,

    /// How often the background sweeper evicts expired entries.
    ///
    /// Default: 60 seconds
    pub sweep_interval: Duration,

    /// Fetches taking at least this long are counted and logged as slow.
    ///
    /// Default: 1 second
    pub slow_query_threshold: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
            slow_query_threshold: Duration::from_millis(1000),
        }
    }
}

impl CacheConfig {
    /// Creates a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets the slow-query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = threshold;
        self
    }

    /// A config whose entries are never fresh: every resolve runs its fetch.
    pub fn no_cache() -> Self {
        Self::default().with_ttl(Duration::ZERO)
    }
}
