//! Observable page state.

use super::Record;

/// What a [`PaginatedQuery`](super::PaginatedQuery) currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    /// Rows of the loaded page, or of every page appended so far.
    pub rows: Vec<Record>,
    /// `true` while a load is in flight.
    pub loading: bool,
    /// Message of the most recent failed load; cleared by the next success.
    pub error: Option<String>,
    /// 1-based index of the most recently loaded page.
    pub current_page: usize,
    /// Rows matching the filters, independent of pagination.
    pub total_count: usize,
    /// `ceil(total_count / page_size)`.
    pub total_pages: usize,
    /// `true` iff the last loaded page came back full. A heuristic: a full
    /// last page still reports more.
    pub has_more: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            loading: false,
            error: None,
            current_page: 1,
            total_count: 0,
            total_pages: 0,
            has_more: false,
        }
    }
}
