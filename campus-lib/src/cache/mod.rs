//! Time-boxed read-through caching
//!
//! [`QueryCache`] memoizes async fetches under string keys for a fixed TTL,
//! tracks hit and latency counters, and can run a background [`Sweeper`]
//! that evicts expired entries.

mod clock;
mod config;
mod entry;
mod metrics;
mod query_cache;
mod sweeper;

pub use clock::*;
pub use config::*;
pub use entry::*;
pub use metrics::PerformanceMetrics;
pub use query_cache::*;
pub use sweeper::*;
