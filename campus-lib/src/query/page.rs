//! Page type for ranged query results.

use serde::Deserialize;
use serde::Serialize;

use super::Record;

/// The rows of one ranged read plus the total number of matching rows.
///
/// This is the payload stored in the query cache.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    rows: Vec<Record>,
    total_count: usize,
}

impl Page {
    pub fn new(rows: Vec<Record>, total_count: usize) -> Self {
        Self { rows, total_count }
    }

    /// Returns the rows of this page.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Consumes the page and returns the rows.
    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    /// Total rows matching the filters, independent of the range.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
