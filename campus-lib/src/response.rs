//! Resolved payload with cache status

use chrono::DateTime;
use chrono::Utc;

/// A payload resolved through the [`QueryCache`](crate::cache::QueryCache),
/// tagged with whether it was served from cache.
///
/// # Example
///
/// ```ignore
/// let response = cache.resolve("students:p1", || source.query(&request)).await?;
///
/// if response.is_cached() {
///     log::debug!("served page cached at {:?}", response.cached_at());
/// }
///
/// let page = response.into_inner();
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    data: T,
    /// Whether this payload came from the cache or a fresh fetch.
    pub cache: CacheStatus,
}

impl<T> Response<T> {
    /// Creates a response for a payload that was just fetched and stored.
    pub fn cache_miss(data: T, cached_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Miss {
                cached_at,
                expires_at,
            },
        }
    }

    /// Creates a response for a payload served from a fresh cache entry.
    pub fn cache_hit(data: T, cached_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Hit {
                cached_at,
                expires_at,
            },
        }
    }

    /// Returns `true` if the fetch callback was not invoked for this payload.
    pub fn is_cached(&self) -> bool {
        self.cache.is_hit()
    }

    /// When the payload was stored.
    pub fn cached_at(&self) -> DateTime<Utc> {
        match self.cache {
            CacheStatus::Miss { cached_at, .. } | CacheStatus::Hit { cached_at, .. } => cached_at,
        }
    }

    /// When the stored payload stops being served.
    pub fn expires_at(&self) -> DateTime<Utc> {
        match self.cache {
            CacheStatus::Miss { expires_at, .. } | CacheStatus::Hit { expires_at, .. } => expires_at,
        }
    }

    /// Returns a reference to the inner data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the response and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Maps the inner data using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        Response {
            data: f(self.data),
            cache: self.cache,
        }
    }
}

/// Cache status of a resolved payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The fetch callback ran and its result is now cached.
    Miss {
        cached_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    /// Served from a fresh entry, or shared from a concurrent caller's fetch.
    Hit {
        cached_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

impl CacheStatus {
    /// Returns `true` if this is a cache hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Returns `true` if this is a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }
}
