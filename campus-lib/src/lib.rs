//! Campus data layer
//!
//! Read-side plumbing for the campus management backend: a time-boxed
//! read-through [`QueryCache`](cache::QueryCache) and a
//! [`PaginatedQuery`](query::PaginatedQuery) controller that loads pages of
//! a collection through it from any [`DataSource`](source::DataSource).

pub mod cache;
pub mod error;
pub mod query;
pub mod response;
pub mod source;

pub use response::CacheStatus;
pub use response::Response;
