//! Query configuration errors

/// Reasons a query configuration or page request is rejected before fetching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The collection name is empty.
    #[error("collection name must not be empty")]
    EmptyCollection,

    /// The page size is zero.
    #[error("page size must be greater than zero")]
    ZeroPageSize,

    /// A page index below 1 was requested.
    #[error("page must be 1 or greater, got {0}")]
    InvalidPage(usize),

    /// A column name in the select list is empty.
    #[error("column name at position {0} is empty")]
    EmptyColumn(usize),

    /// A filter was registered with an empty field name.
    #[error("filter field name must not be empty")]
    EmptyFilterField,

    /// An order clause was registered with an empty field name.
    #[error("order field name must not be empty")]
    EmptyOrderField,

    /// A tagged filter string used a tag that is not understood.
    #[error("malformed filter value for '{field}': unknown tag '{tag}'")]
    MalformedFilter {
        /// The filter field.
        field: String,
        /// The unrecognised tag.
        tag: String,
    },
}

impl ConfigError {
    /// Creates a malformed filter error.
    pub fn malformed_filter(field: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::MalformedFilter {
            field: field.into(),
            tag: tag.into(),
        }
    }
}
