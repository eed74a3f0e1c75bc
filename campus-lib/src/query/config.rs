//! Declarative query configuration.

use std::collections::BTreeMap;

use super::Filter;
use super::FilterValue;
use super::OrderBy;
use crate::error::ConfigError;

/// Rows per page when the builder is not told otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// What to read: collection, columns, filters, order, and page size.
///
/// Always valid once built: the collection is named, the page size is
/// positive, and every field name is non-empty.
///
/// # Example
///
/// ```
/// use campus_lib::query::{OrderBy, QueryConfig};
///
/// let config = QueryConfig::builder("students")
///     .columns(["id", "first_name", "last_name", "grade"])
///     .page_size(25)
///     .filter("grade", 7)
///     .search("last_name", "son")
///     .filter_opt("homeroom_id", None::<i64>)
///     .order_by(OrderBy::asc("last_name"))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.applied_filters().len(), 2);
/// assert_eq!(config.page_range(3).unwrap(), (50, 74));
/// assert_eq!(config.total_pages(51), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    collection: String,
    columns: Vec<String>,
    page_size: usize,
    filters: BTreeMap<String, FilterValue>,
    order_by: Option<OrderBy>,
}

impl QueryConfig {
    /// Starts a configuration for `collection`.
    pub fn builder(collection: impl Into<String>) -> QueryConfigBuilder {
        QueryConfigBuilder::new(collection)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Selected columns; empty means every column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Every configured filter, including absent ones.
    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    /// The conditions actually sent to the data source, in field order.
    pub fn applied_filters(&self) -> Vec<Filter> {
        self.filters
            .iter()
            .filter_map(|(field, value)| Filter::from_config(field, value))
            .collect()
    }

    /// Inclusive row range `(from, to)` covered by a 1-based page.
    pub fn page_range(&self, page: usize) -> Result<(usize, usize), ConfigError> {
        if page == 0 {
            return Err(ConfigError::InvalidPage(page));
        }
        let from = (page - 1).saturating_mul(self.page_size);
        let to = from.saturating_add(self.page_size - 1);
        Ok((from, to))
    }

    /// Number of pages needed for `total_count` rows.
    pub fn total_pages(&self, total_count: usize) -> usize {
        total_count.div_ceil(self.page_size)
    }

    /// Returns `true` if switching from `self` to `next` must restart at page 1:
    /// the collection, the applied filters, or the order changed.
    pub fn requires_reset(&self, next: &QueryConfig) -> bool {
        self.collection != next.collection
            || self.applied_filters() != next.applied_filters()
            || self.order_by != next.order_by
    }

    /// Returns a builder pre-filled with this configuration.
    pub fn to_builder(&self) -> QueryConfigBuilder {
        QueryConfigBuilder {
            collection: self.collection.clone(),
            columns: self.columns.clone(),
            page_size: self.page_size,
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
            error: None,
        }
    }
}

/// Builder for [`QueryConfig`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct QueryConfigBuilder {
    collection: String,
    columns: Vec<String>,
    page_size: usize,
    filters: BTreeMap<String, FilterValue>,
    order_by: Option<OrderBy>,
    error: Option<ConfigError>,
}

impl QueryConfigBuilder {
    fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            columns: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            filters: BTreeMap::new(),
            order_by: None,
            error: None,
        }
    }

    /// Switches to another collection.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the selected columns. `["*"]` or an empty list selects everything.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        if self.columns.len() == 1 && self.columns[0] == "*" {
            self.columns.clear();
        }
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Adds or replaces an exact-match filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Adds a filter when `value` is `Some`; removes it when `None`.
    pub fn filter_opt<V: Into<FilterValue>>(mut self, field: impl Into<String>, value: Option<V>) -> Self {
        let field = field.into();
        match value {
            Some(value) => {
                self.filters.insert(field, value.into());
            }
            None => {
                self.filters.remove(&field);
            }
        }
        self
    }

    /// Adds or replaces a case-insensitive pattern filter.
    pub fn search(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters
            .insert(field.into(), FilterValue::Pattern(pattern.into()));
        self
    }

    /// Adds a filter from its tagged string form (see [`FilterValue::parse_tagged`]).
    pub fn filter_tagged(mut self, field: impl Into<String>, raw: &str) -> Self {
        let field = field.into();
        match FilterValue::parse_tagged(&field, raw) {
            Ok(value) => {
                self.filters.insert(field, value);
            }
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    pub fn remove_filter(mut self, field: &str) -> Self {
        self.filters.remove(field);
        self
    }

    pub fn clear_filters(mut self) -> Self {
        self.filters.clear();
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Orders by a single column.
    pub fn order(self, field: impl Into<String>, ascending: bool) -> Self {
        self.order_by(OrderBy::new(field, ascending))
    }

    pub fn unordered(mut self) -> Self {
        self.order_by = None;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<QueryConfig, ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::EmptyCollection);
        }
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if let Some(position) = self.columns.iter().position(|c| c.trim().is_empty()) {
            return Err(ConfigError::EmptyColumn(position));
        }
        if self.filters.keys().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::EmptyFilterField);
        }
        if let Some(order) = &self.order_by
            && order.fields().iter().any(|(f, _)| f.trim().is_empty())
        {
            return Err(ConfigError::EmptyOrderField);
        }

        Ok(QueryConfig {
            collection: self.collection,
            columns: self.columns,
            page_size: self.page_size,
            filters: self.filters,
            order_by: self.order_by,
        })
    }
}
