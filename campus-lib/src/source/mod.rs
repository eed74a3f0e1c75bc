//! Queryable data sources
//!
//! A [`DataSource`] answers one ranged read at a time. [`RestSource`] talks
//! to the hosted backend over HTTP; [`InMemorySource`] serves rows held in
//! memory and backs tests and the offline demo.

mod memory;
mod rest;

pub use memory::InMemorySource;
pub use rest::*;

use async_trait::async_trait;

use crate::error::Error;
use crate::query::Page;
use crate::query::QueryRequest;

/// A collection store that can be filtered, ordered, and read by row range.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Returns rows `request.from..=request.to` of the filtered, ordered
    /// collection and the exact number of rows matching the filters.
    ///
    /// Failures are reported as [`Error::FetchFailed`].
    async fn query(&self, request: &QueryRequest) -> Result<Page, Error>;
}
