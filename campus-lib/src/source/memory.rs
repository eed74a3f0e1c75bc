//! In-memory data source backed by DashMap

use std::cmp::Ordering;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;

use super::DataSource;
use crate::error::Error;
use crate::query::Filter;
use crate::query::OrderBy;
use crate::query::Page;
use crate::query::QueryRequest;
use crate::query::Record;
use crate::query::Value;

/// Collections of rows held in memory.
///
/// Applies filters, ordering, and ranges the way the hosted backend does:
/// exact filters compare values, pattern filters are case-insensitive
/// `ILIKE` matches, nulls sort last. Failures can be injected per
/// collection, and every query is counted.
///
/// # Example
///
/// ```
/// use campus_lib::query::Record;
/// use campus_lib::source::InMemorySource;
///
/// let source = InMemorySource::new().with_collection(
///     "students",
///     vec![Record::new().set("name", "Ada"), Record::new().set("name", "Alan")],
/// );
/// assert_eq!(source.rows("students"), 2);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySource {
    collections: DashMap<String, Vec<Record>>,
    failures: DashMap<String, String>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl InMemorySource {
    /// Creates a source with no collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection (builder style).
    pub fn with_collection(self, name: impl Into<String>, rows: Vec<Record>) -> Self {
        self.collections.insert(name.into(), rows);
        self
    }

    /// Delays every query by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replaces the rows of a collection.
    pub fn insert(&self, name: impl Into<String>, rows: Vec<Record>) {
        self.collections.insert(name.into(), rows);
    }

    /// Appends a row to a collection, creating it if needed.
    pub fn push(&self, name: &str, row: Record) {
        self.collections.entry(name.to_string()).or_default().push(row);
    }

    /// Makes every query of `collection` fail with `message` until [`heal`](Self::heal) is called.
    pub fn fail(&self, collection: impl Into<String>, message: impl Into<String>) {
        self.failures.insert(collection.into(), message.into());
    }

    /// Stops injecting failures for `collection`.
    pub fn heal(&self, collection: &str) {
        self.failures.remove(collection);
    }

    /// Number of queries served or failed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of rows stored in a collection.
    pub fn rows(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |rows| rows.len())
    }

    fn evaluate(&self, request: &QueryRequest) -> Result<Page, Error> {
        if let Some(message) = self.failures.get(&request.collection) {
            return Err(Error::FetchFailed(message.clone()));
        }

        let conditions = request
            .filters
            .iter()
            .map(Condition::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self.collections.get(&request.collection).ok_or_else(|| {
            Error::FetchFailed(format!("relation \"{}\" does not exist", request.collection))
        })?;

        let mut matched: Vec<&Record> = rows
            .iter()
            .filter(|row| conditions.iter().all(|c| c.matches(row)))
            .collect();

        if let Some(order) = &request.order_by {
            matched.sort_by(|a, b| compare_rows(a, b, order));
        }

        let total_count = matched.len();
        let page = matched
            .into_iter()
            .skip(request.from)
            .take(request.limit())
            .map(|row| row.project(&request.columns))
            .collect();

        Ok(Page::new(page, total_count))
    }
}

#[async_trait]
impl DataSource for InMemorySource {
    async fn query(&self, request: &QueryRequest) -> Result<Page, Error> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.evaluate(request)
    }
}

/// A filter prepared for evaluation against rows.
enum Condition<'a> {
    Eq(&'a str, &'a Value),
    Like(&'a str, Regex),
}

impl<'a> Condition<'a> {
    fn compile(filter: &'a Filter) -> Result<Self, Error> {
        match filter {
            Filter::Eq(field, value) => Ok(Condition::Eq(field, value)),
            Filter::ILike(field, pattern) => {
                let regex = Regex::new(&ilike_to_regex(pattern))
                    .map_err(|e| Error::FetchFailed(format!("invalid pattern for {field}: {e}")))?;
                Ok(Condition::Like(field, regex))
            }
        }
    }

    fn matches(&self, row: &Record) -> bool {
        match self {
            Condition::Eq(field, value) => row.get(field).is_some_and(|v| v.loosely_eq(value)),
            Condition::Like(field, regex) => row
                .get(field)
                .and_then(Value::to_text)
                .is_some_and(|text| regex.is_match(&text)),
        }
    }
}

/// Translates a search pattern into a case-insensitive regex that matches it
/// anywhere in the value.
///
/// `%` and `_` inside the pattern keep their `ILIKE` meaning.
fn ilike_to_regex(pattern: &str) -> String {
    let mut regex = String::from("(?is)^.*");
    for ch in pattern.chars() {
        match ch {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    regex.push_str(".*$");
    regex
}

fn compare_rows(a: &Record, b: &Record, order: &OrderBy) -> Ordering {
    for (field, direction) in order.fields() {
        let left = a.get(field).unwrap_or(&Value::Null);
        let right = b.get(field).unwrap_or(&Value::Null);
        let ordering = match (left.is_null(), right.is_null()) {
            // Nulls stay last in both directions.
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ if direction.is_ascending() => left.sort_cmp(right),
            _ => right.sort_cmp(left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryConfig;

    fn roster() -> InMemorySource {
        let rows = [
            ("Ada", "Lovelace", 7),
            ("Alan", "Turing", 8),
            ("Grace", "Hopper", 7),
            ("Edsger", "Dijkstra", 9),
            ("Barbara", "Liskov", 7),
        ]
        .into_iter()
        .map(|(first, last, grade)| {
            Record::new()
                .set("first_name", first)
                .set("last_name", last)
                .set("grade", grade)
        })
        .collect();
        InMemorySource::new().with_collection("students", rows)
    }

    async fn run(source: &InMemorySource, config: QueryConfig, page: usize) -> Result<Page, Error> {
        source.query(&QueryRequest::for_page(&config, page).unwrap()).await
    }

    fn last_names(page: &Page) -> Vec<&str> {
        page.rows()
            .iter()
            .map(|r| r.get_str("last_name").unwrap().unwrap())
            .collect()
    }

    #[test]
    fn test_ilike_translation() {
        assert_eq!(ilike_to_regex("ada"), "(?is)^.*ada.*$");
        assert_eq!(ilike_to_regex("A%"), "(?is)^.*A.*.*$");
        assert_eq!(ilike_to_regex("_.x"), "(?is)^.*.\\.x.*$");
    }

    #[tokio::test]
    async fn test_exact_filter_order_and_range() {
        let source = roster();
        let config = QueryConfig::builder("students")
            .page_size(2)
            .filter("grade", 7)
            .order("last_name", true)
            .build()
            .unwrap();

        let first = run(&source, config.clone(), 1).await.unwrap();
        assert_eq!(first.total_count(), 3);
        assert_eq!(last_names(&first), vec!["Hopper", "Liskov"]);

        let second = run(&source, config, 2).await.unwrap();
        assert_eq!(last_names(&second), vec!["Lovelace"]);
    }

    #[tokio::test]
    async fn test_pattern_filter_is_case_insensitive_substring() {
        let source = roster();
        let config = QueryConfig::builder("students").search("last_name", "IN").build().unwrap();

        let page = run(&source, config, 1).await.unwrap();
        let mut names = last_names(&page);
        names.sort();
        assert_eq!(names, vec!["Turing"]);
    }

    #[tokio::test]
    async fn test_pattern_with_wildcards_still_matches_inside() {
        let source = InMemorySource::new().with_collection(
            "students",
            vec![
                Record::new().set("email", "john_doe@school.edu"),
                Record::new().set("email", "jane@school.edu"),
            ],
        );
        let config = QueryConfig::builder("students").search("email", "john_doe").build().unwrap();

        let page = run(&source, config, 1).await.unwrap();
        assert_eq!(page.total_count(), 1);
        assert_eq!(page.rows()[0].get_str("email").unwrap(), Some("john_doe@school.edu"));

        let config = QueryConfig::builder("students").search("email", "school%edu").build().unwrap();
        assert_eq!(run(&source, config, 1).await.unwrap().total_count(), 2);
    }

    #[tokio::test]
    async fn test_columns_are_projected() {
        let source = roster();
        let config = QueryConfig::builder("students")
            .columns(["first_name"])
            .order_by(OrderBy::desc("grade").then_asc("first_name"))
            .build()
            .unwrap();

        let page = run(&source, config, 1).await.unwrap();
        assert_eq!(page.rows()[0], Record::new().set("first_name", "Edsger"));
        assert_eq!(page.rows()[1], Record::new().set("first_name", "Alan"));
    }

    #[tokio::test]
    async fn test_range_past_the_end_is_empty() {
        let source = roster();
        let config = QueryConfig::builder("students").page_size(20).build().unwrap();

        let page = run(&source, config, 2).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_count(), 5);
    }

    #[tokio::test]
    async fn test_failures_and_unknown_collections() {
        let source = roster();
        source.fail("students", "permission denied for table students");

        let config = QueryConfig::builder("students").build().unwrap();
        assert_eq!(
            run(&source, config.clone(), 1).await,
            Err(Error::fetch_failed("permission denied for table students"))
        );
        source.heal("students");
        assert!(run(&source, config, 1).await.is_ok());

        let missing = QueryConfig::builder("lockers").build().unwrap();
        assert!(run(&source, missing, 1).await.unwrap_err().is_fetch_failure());
        assert_eq!(source.calls(), 3);
    }
}
