//! Cache performance counters

use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

/// Snapshot of a cache's telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceMetrics {
    /// Duration of the most recent non-cached fetch.
    pub query_time: Duration,
    /// Number of resolves answered without running a fetch.
    pub cache_hits: u64,
    /// Number of fetches at or above the slow-query threshold.
    pub slow_queries: u64,
    /// When any counter last changed.
    pub last_update: Option<DateTime<Utc>>,
}

const NEVER: i64 = i64::MIN;

/// Lock-free counters behind [`PerformanceMetrics`].
#[derive(Debug)]
pub(crate) struct MetricsRecorder {
    query_time_micros: AtomicU64,
    cache_hits: AtomicU64,
    slow_queries: AtomicU64,
    last_update_millis: AtomicI64,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self {
            query_time_micros: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            slow_queries: AtomicU64::new(0),
            last_update_millis: AtomicI64::new(NEVER),
        }
    }
}

impl MetricsRecorder {
    pub(crate) fn record_hit(&self, at: DateTime<Utc>) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.touch(at);
    }

    pub(crate) fn record_slow_query(&self, at: DateTime<Utc>) {
        self.slow_queries.fetch_add(1, Ordering::Relaxed);
        self.touch(at);
    }

    pub(crate) fn record_fetch(&self, elapsed: Duration, at: DateTime<Utc>) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.query_time_micros.store(micros, Ordering::Relaxed);
        self.touch(at);
    }

    pub(crate) fn reset_hits(&self, at: DateTime<Utc>) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.touch(at);
    }

    pub(crate) fn snapshot(&self) -> PerformanceMetrics {
        let last_update = match self.last_update_millis.load(Ordering::Relaxed) {
            NEVER => None,
            millis => DateTime::from_timestamp_millis(millis),
        };

        PerformanceMetrics {
            query_time: Duration::from_micros(self.query_time_micros.load(Ordering::Relaxed)),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            slow_queries: self.slow_queries.load(Ordering::Relaxed),
            last_update,
        }
    }

    fn touch(&self, at: DateTime<Utc>) {
        self.last_update_millis
            .store(at.timestamp_millis(), Ordering::Relaxed);
    }
}
