//! HTTP data source for the hosted PostgREST backend

mod url;

pub use self::url::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use super::DataSource;
use crate::error::ApiError;
use crate::error::Error;
use crate::query::Page;
use crate::query::QueryRequest;
use crate::query::Record;

/// Reads collections from a PostgREST endpoint (`{url}/rest/v1/{collection}`).
///
/// Each query is a single `GET` with the row range in the `Range` header and
/// `Prefer: count=exact`, so the total arrives in `Content-Range`.
///
/// This client is cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use campus_lib::source::RestSource;
///
/// let source = RestSource::builder()
///     .url("https://tenant.example.supabase.co")
///     .api_key(std::env::var("CAMPUS_API_KEY")?)
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct RestSource {
    inner: Arc<RestSourceInner>,
}

struct RestSourceInner {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    schema: Option<String>,
    http_client: Client,
    timeout: Option<Duration>,
}

impl RestSource {
    /// Creates a new builder for constructing a source.
    pub fn builder() -> RestSourceBuilder<Missing, Missing> {
        RestSourceBuilder::new()
    }

    /// Returns the base URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    async fn fetch(&self, request: &QueryRequest) -> Result<Page, ApiError> {
        let url = build_url(&self.inner.base_url, request)?;
        debug!("GET {url} (rows {})", range_header(request));

        let bearer = self.inner.access_token.as_deref().unwrap_or(&self.inner.api_key);
        let mut builder = self
            .inner
            .http_client
            .get(url)
            .header("apikey", &self.inner.api_key)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .header("Range-Unit", "items")
            .header("Range", range_header(request))
            .header("Prefer", "count=exact");

        if let Some(schema) = &self.inner.schema {
            builder = builder.header("Accept-Profile", schema);
        }
        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| match self.inner.timeout {
            Some(timeout) if e.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::Network(e),
        })?;

        let status = response.status();
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);

        // Asking for rows past the end is answered with 416 and the total.
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Page::new(Vec::new(), total.unwrap_or(0)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http_error(status.as_u16(), body));
        }

        let body = response.text().await?;
        let rows: Vec<Record> = serde_json::from_str(&body)
            .map_err(|e| ApiError::parse_with_body(e.to_string(), body))?;
        let total = total.unwrap_or(request.from + rows.len());

        Ok(Page::new(rows, total))
    }
}

#[async_trait]
impl DataSource for RestSource {
    async fn query(&self, request: &QueryRequest) -> Result<Page, Error> {
        self.fetch(request).await.map_err(Error::from)
    }
}

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    code: Option<String>,
}

fn http_error(status: u16, body: String) -> ApiError {
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            message,
            code: Some(code),
        }) => ApiError::http_with_code(status, message, code),
        Ok(ErrorBody { message, code: None }) => ApiError::http(status, message),
        Err(_) if body.is_empty() => ApiError::http(status, format!("request failed with status {status}")),
        Err(_) => ApiError::http(status, body),
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for a [`RestSource`].
///
/// Uses the typestate pattern so `url` and `api_key` must be set before
/// `build` is available.
pub struct RestSourceBuilder<Url, Key> {
    url: Url,
    api_key: Key,
    access_token: Option<String>,
    schema: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl RestSourceBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            api_key: Missing,
            access_token: None,
            schema: None,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }
}

impl Default for RestSourceBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RestSourceBuilder<Missing, K> {
    /// Sets the backend URL, e.g. `https://tenant.example.supabase.co`.
    pub fn url(self, url: impl Into<String>) -> RestSourceBuilder<Set<String>, K> {
        RestSourceBuilder {
            url: Set(url.into()),
            api_key: self.api_key,
            access_token: self.access_token,
            schema: self.schema,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl<U> RestSourceBuilder<U, Missing> {
    /// Sets the project API key, sent as `apikey` on every request.
    pub fn api_key(self, key: impl Into<String>) -> RestSourceBuilder<U, Set<String>> {
        RestSourceBuilder {
            url: self.url,
            api_key: Set(key.into()),
            access_token: self.access_token,
            schema: self.schema,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl<U, K> RestSourceBuilder<U, K> {
    /// Sets a signed-in user's token. Without one, the API key is used as bearer.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Reads from a schema other than the default one (`Accept-Profile`).
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl RestSourceBuilder<Set<String>, Set<String>> {
    /// Builds the [`RestSource`].
    pub fn build(self) -> Result<RestSource, ApiError> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(RestSource {
            inner: Arc::new(RestSourceInner {
                base_url: self.url.0,
                api_key: self.api_key.0,
                access_token: self.access_token,
                schema: self.schema,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}

impl std::fmt::Debug for RestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSource")
            .field("base_url", &self.inner.base_url)
            .field("schema", &self.inner.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_uses_backend_message() {
        let err = http_error(
            401,
            r#"{"code":"42501","details":null,"hint":null,"message":"permission denied for table grades"}"#.to_string(),
        );
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.error_code(), Some("42501"));
        assert_eq!(
            Error::from(err),
            Error::fetch_failed("permission denied for table grades")
        );
    }

    #[test]
    fn test_http_error_falls_back_to_body() {
        assert_eq!(
            Error::from(http_error(502, "Bad Gateway".to_string())),
            Error::fetch_failed("Bad Gateway")
        );
        assert_eq!(
            Error::from(http_error(500, String::new())),
            Error::fetch_failed("request failed with status 500")
        );
    }

    #[test]
    fn test_builder() {
        let source = RestSource::builder()
            .api_key("anon")
            .url("https://school.example.com")
            .schema("campus")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(source.base_url(), "https://school.example.com");
    }
}
