//! Concrete ranged reads.

use super::Filter;
use super::OrderBy;
use super::QueryConfig;
use crate::error::ConfigError;

/// One ranged read against a data source.
///
/// The source returns rows `from..=to` of the filtered, ordered result,
/// together with the exact number of rows matching the filters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub collection: String,
    /// Columns to return; empty means every column.
    pub columns: Vec<String>,
    /// Conditions to apply; absent filters are already removed.
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    /// First row, 0-based.
    pub from: usize,
    /// Last row, inclusive.
    pub to: usize,
}

impl QueryRequest {
    /// Builds the read for a 1-based `page` of `config`.
    pub fn for_page(config: &QueryConfig, page: usize) -> Result<Self, ConfigError> {
        let (from, to) = config.page_range(page)?;
        Ok(Self {
            collection: config.collection().to_string(),
            columns: config.columns().to_vec(),
            filters: config.applied_filters(),
            order_by: config.order_by().cloned(),
            from,
            to,
        })
    }

    /// Number of rows the range asks for.
    pub fn limit(&self) -> usize {
        self.to - self.from + 1
    }
}
