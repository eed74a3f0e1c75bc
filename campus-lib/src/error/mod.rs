//! Error types

mod api;
mod config;
mod field;

pub use api::*;
pub use config::*;
pub use field::*;

/// Errors surfaced by the cache, the paginated query controller, and data sources.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The underlying data-source call failed. The message is passed through verbatim.
    #[error("{0}")]
    FetchFailed(String),

    /// The query configuration was rejected before any fetch was attempted.
    #[error("Invalid query configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl Error {
    /// Creates a fetch failure with the given message.
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::FetchFailed(message.into())
    }

    /// Returns `true` if this error came from the data source.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_))
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err {
            // The backend's own message is what callers want to show.
            ApiError::Http { message, .. } => Self::FetchFailed(message),
            other => Self::FetchFailed(other.to_string()),
        }
    }
}
