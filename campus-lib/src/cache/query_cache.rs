//! Time-boxed read-through cache

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use dashmap::DashMap;
use log::debug;
use log::warn;
use tokio::sync::OnceCell;

use super::CacheConfig;
use super::CacheEntry;
use super::Clock;
use super::PerformanceMetrics;
use super::SystemClock;
use super::metrics::MetricsRecorder;
use crate::response::Response;

/// A read-through cache that memoizes async fetches for a fixed TTL.
///
/// `resolve` serves a fresh entry when one exists and otherwise runs the
/// supplied fetch, storing its result. Failed fetches are never stored.
/// Concurrent resolves of the same key share one fetch.
///
/// The cache is an ordinary value: wrap it in an `Arc` to share it between
/// [`PaginatedQuery`](crate::query::PaginatedQuery) instances.
///
/// # Example
///
/// ```
/// use campus_lib::cache::{CacheConfig, QueryCache};
///
/// # tokio_test_block(async {
/// let cache: QueryCache<Vec<u32>> = QueryCache::new(CacheConfig::default());
///
/// let first = cache.resolve("grades:7a", || async { Ok::<_, ()>(vec![91, 78]) }).await.unwrap();
/// let again = cache.resolve("grades:7a", || async { Ok::<_, ()>(vec![]) }).await.unwrap();
///
/// assert!(!first.is_cached());
/// assert!(again.is_cached());
/// assert_eq!(again.into_inner(), vec![91, 78]);
/// assert_eq!(cache.metrics().cache_hits, 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug)]
pub struct QueryCache<P> {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: DashMap<String, CacheEntry<P>>,
    in_flight: InFlightTable<P>,
    metrics: MetricsRecorder,
}

impl<P> QueryCache<P>
where
    P: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache on the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty cache that reads time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            metrics: MetricsRecorder::default(),
        }
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the payload stored under `key`, or runs `fetch` and stores its result.
    ///
    /// Errors from `fetch` are returned unchanged and nothing is stored, so
    /// the next resolve for the key runs a real fetch again. No timeout is
    /// applied; wrap `fetch` if one is needed.
    pub async fn resolve<F, Fut, E>(&self, key: &str, fetch: F) -> Result<Response<P>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P, E>>,
    {
        if let Some(response) = self.lookup(key) {
            return Ok(response);
        }

        let claim = InFlight {
            table: &self.in_flight,
            key,
            cell: Arc::clone(self.in_flight.entry(key.to_string()).or_default().value()),
        };

        let fetched = AtomicBool::new(false);
        let outcome = claim
            .cell
            .get_or_try_init(|| {
                fetched.store(true, Ordering::Relaxed);
                self.fetch_and_store(key, fetch)
            })
            .await
            .cloned();
        drop(claim);

        let entry = outcome?;
        let expires_at = entry.expires_at(self.config.ttl);

        if fetched.load(Ordering::Relaxed) {
            Ok(Response::cache_miss(entry.payload, entry.cached_at, expires_at))
        } else {
            // Another caller's fetch answered this one.
            self.metrics.record_hit(self.clock.now());
            debug!("query cache: shared in-flight fetch for {key}");
            Ok(Response::cache_hit(entry.payload, entry.cached_at, expires_at))
        }
    }

    /// Removes every entry and zeroes the hit counter.
    pub fn clear(&self) {
        self.entries.clear();
        self.metrics.reset_hits(self.clock.now());
        debug!("query cache: cleared");
    }

    /// Removes a single entry. Returns `true` if one was stored.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            if key.starts_with(prefix) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            if entry.is_fresh(now, ttl) {
                true
            } else {
                removed += 1;
                false
            }
        });
        removed
    }

    /// Returns a snapshot of the performance counters.
    pub fn metrics(&self) -> PerformanceMetrics {
        self.metrics.snapshot()
    }

    /// Returns the number of stored entries (including expired ones not yet swept).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &str) -> Option<Response<P>> {
        let now = self.clock.now();
        let ttl = self.config.ttl;

        let entry = self.entries.get(key)?;
        if !entry.is_fresh(now, ttl) {
            return None;
        }
        let response = Response::cache_hit(entry.payload.clone(), entry.cached_at, entry.expires_at(ttl));
        drop(entry);

        self.metrics.record_hit(now);
        debug!("query cache: hit for {key}");
        Some(response)
    }

    async fn fetch_and_store<F, Fut, E>(&self, key: &str, fetch: F) -> Result<CacheEntry<P>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P, E>>,
    {
        let started = self.clock.now();
        let payload = fetch().await?;
        let finished = self.clock.now();
        let elapsed = (finished - started).to_std().unwrap_or(Duration::ZERO);

        if elapsed >= self.config.slow_query_threshold {
            self.metrics.record_slow_query(finished);
            warn!(
                "slow query for {key}: took {}ms (threshold {}ms)",
                elapsed.as_millis(),
                self.config.slow_query_threshold.as_millis()
            );
        }

        let entry = CacheEntry::new(key, payload, finished);
        self.entries.insert(key.to_string(), entry.clone());
        self.metrics.record_fetch(elapsed, finished);
        debug!("query cache: stored {key} after {}ms", elapsed.as_millis());

        Ok(entry)
    }
}

type InFlightTable<P> = DashMap<String, Arc<OnceCell<CacheEntry<P>>>>;

/// A caller's hold on the shared fetch for one key.
///
/// Dropping it, on completion or when the resolve future is cancelled,
/// removes the slot once it is filled or no other caller is waiting on it.
struct InFlight<'a, P> {
    table: &'a InFlightTable<P>,
    key: &'a str,
    cell: Arc<OnceCell<CacheEntry<P>>>,
}

impl<P> Drop for InFlight<'_, P> {
    fn drop(&mut self) {
        self.table.remove_if(self.key, |_, current| {
            Arc::ptr_eq(current, &self.cell) && (current.initialized() || Arc::strong_count(current) <= 2)
        });
    }
}
