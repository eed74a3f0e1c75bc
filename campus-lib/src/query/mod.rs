//! Query configuration and paginated retrieval.
//!
//! # Types
//!
//! - [`QueryConfig`] - what to read: collection, columns, filters, order, page size
//! - [`QueryRequest`] - one concrete ranged read handed to a data source
//! - [`Page`] - the rows of one read plus the total matching count
//! - [`PaginatedQuery`] - drives page loads through the cache and holds [`PageState`]

mod config;
mod filter;
mod key;
mod order;
mod page;
mod paginated;
mod record;
mod request;
mod state;
mod value;

pub use config::DEFAULT_PAGE_SIZE;
pub use config::QueryConfig;
pub use config::QueryConfigBuilder;
pub use filter::Filter;
pub use filter::FilterValue;
pub use key::CacheKey;
pub use order::Direction;
pub use order::OrderBy;
pub use page::Page;
pub use paginated::PaginatedQuery;
pub use record::Record;
pub use request::QueryRequest;
pub use state::PageState;
pub use value::Value;
