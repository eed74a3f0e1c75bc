//! Page-by-page retrieval through the query cache.

use std::sync::Arc;

use log::debug;
use tokio::sync::watch;

use super::CacheKey;
use super::Page;
use super::PageState;
use super::QueryConfig;
use super::QueryConfigBuilder;
use super::QueryRequest;
use crate::cache::QueryCache;
use crate::error::Error;
use crate::source::DataSource;

/// Drives ranged reads of a [`QueryConfig`] through a shared [`QueryCache`]
/// and exposes the resulting [`PageState`].
///
/// Mutating operations take `&mut self`, so one instance has at most one
/// load in flight. Observers follow state changes, including the `loading`
/// flag, through [`subscribe`](Self::subscribe).
///
/// # Example
///
/// ```ignore
/// let cache = Arc::new(QueryCache::new(CacheConfig::default()));
/// let config = QueryConfig::builder("students").page_size(20).build()?;
/// let mut students = PaginatedQuery::new(cache, source, config);
///
/// students.refresh().await?;
/// while students.has_more() {
///     students.load_more().await?;
/// }
/// ```
pub struct PaginatedQuery {
    cache: Arc<QueryCache<Page>>,
    source: Arc<dyn DataSource>,
    config: QueryConfig,
    state: watch::Sender<PageState>,
}

impl PaginatedQuery {
    /// Creates a controller. Nothing is fetched until the first load.
    pub fn new(cache: Arc<QueryCache<Page>>, source: Arc<dyn DataSource>, config: QueryConfig) -> Self {
        let (state, _) = watch::channel(PageState::default());
        Self {
            cache,
            source,
            config,
            state,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> PageState {
        self.state.borrow().clone()
    }

    /// Returns a receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state.subscribe()
    }

    /// Returns a copy of the rows loaded so far.
    pub fn rows(&self) -> Vec<super::Record> {
        self.state.borrow().rows.clone()
    }

    pub fn current_page(&self) -> usize {
        self.state.borrow().current_page
    }

    pub fn total_pages(&self) -> usize {
        self.state.borrow().total_pages
    }

    pub fn has_more(&self) -> bool {
        self.state.borrow().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Loads a 1-based page, appending its rows or replacing the current ones.
    ///
    /// On failure the message is stored in [`PageState::error`], the rows and
    /// totals from earlier loads are kept, and the error is returned.
    pub async fn load(&mut self, page: usize, append: bool) -> Result<(), Error> {
        let request = QueryRequest::for_page(&self.config, page)?;
        let key = CacheKey::for_page(&self.config, page);
        let page_size = self.config.page_size();

        self.state.send_modify(|state| state.loading = true);

        let source = Arc::clone(&self.source);
        let outcome = self
            .cache
            .resolve(key.as_str(), move || async move { source.query(&request).await })
            .await;

        match outcome {
            Ok(response) => {
                let cached = response.is_cached();
                let fetched = response.into_inner();
                let returned = fetched.len();
                let total_count = fetched.total_count();
                let total_pages = self.config.total_pages(total_count);

                self.state.send_modify(|state| {
                    if append {
                        state.rows.extend(fetched.into_rows());
                    } else {
                        state.rows = fetched.into_rows();
                    }
                    state.total_count = total_count;
                    state.total_pages = total_pages;
                    state.has_more = returned == page_size;
                    state.current_page = page;
                    state.error = None;
                    state.loading = false;
                });

                debug!(
                    "{}: page {page} ({returned} rows, {total_count} total, cached: {cached})",
                    self.config.collection()
                );
                Ok(())
            }
            Err(err) => {
                self.state.send_modify(|state| {
                    state.error = Some(err.to_string());
                    state.loading = false;
                });
                debug!("{}: page {page} failed: {err}", self.config.collection());
                Err(err)
            }
        }
    }

    /// Appends the next page. Does nothing while loading or when the last
    /// page came back short.
    pub async fn load_more(&mut self) -> Result<(), Error> {
        let (loading, has_more, current_page) = {
            let state = self.state.borrow();
            (state.loading, state.has_more, state.current_page)
        };
        if loading || !has_more {
            return Ok(());
        }
        self.load(current_page + 1, true).await
    }

    /// Reloads from page 1, replacing the rows. Still served from cache
    /// within the TTL.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.load(1, false).await
    }

    /// Replaces the rows with those of `page`.
    pub async fn go_to_page(&mut self, page: usize) -> Result<(), Error> {
        self.load(page, false).await
    }

    /// Switches to `config`, reloading from page 1 if the collection, the
    /// applied filters, or the order changed.
    ///
    /// Returns `true` if a reload happened.
    pub async fn set_config(&mut self, config: QueryConfig) -> Result<bool, Error> {
        let reset = self.config.requires_reset(&config);
        self.config = config;
        if !reset {
            let config = &self.config;
            self.state
                .send_modify(|state| state.total_pages = config.total_pages(state.total_count));
            return Ok(false);
        }
        debug!("{}: query changed, reloading from page 1", self.config.collection());
        self.load(1, false).await?;
        Ok(true)
    }

    /// Edits the current configuration, then behaves like [`set_config`](Self::set_config).
    pub async fn update_config<F>(&mut self, edit: F) -> Result<bool, Error>
    where
        F: FnOnce(QueryConfigBuilder) -> QueryConfigBuilder,
    {
        let config = edit(self.config.to_builder()).build()?;
        self.set_config(config).await
    }
}

impl std::fmt::Debug for PaginatedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedQuery")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
