//! End-to-end behaviour of `PaginatedQuery` over an in-memory source.

use std::sync::Arc;
use std::time::Duration;

use campus_lib::cache::CacheConfig;
use campus_lib::cache::ManualClock;
use campus_lib::cache::QueryCache;
use campus_lib::error::ConfigError;
use campus_lib::error::Error;
use campus_lib::query::OrderBy;
use campus_lib::query::Page;
use campus_lib::query::PaginatedQuery;
use campus_lib::query::QueryConfig;
use campus_lib::query::Record;
use campus_lib::source::InMemorySource;

const SURNAMES: [&str; 5] = ["Nakamura", "Okafor", "Lindqvist", "Haddad", "Moreau"];

fn students(count: i64) -> Vec<Record> {
    (0..count)
        .map(|i| {
            Record::new()
                .set("id", i + 1)
                .set("last_name", SURNAMES[(i % 5) as usize])
                .set("grade", 6 + i % 3)
        })
        .collect()
}

struct Fixture {
    clock: Arc<ManualClock>,
    cache: Arc<QueryCache<Page>>,
    source: Arc<InMemorySource>,
}

impl Fixture {
    fn new(rows: i64) -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let cache = Arc::new(QueryCache::with_clock(CacheConfig::default(), clock.clone()));
        let source = Arc::new(InMemorySource::new().with_collection("students", students(rows)));
        Self { clock, cache, source }
    }

    fn query(&self, config: QueryConfig) -> PaginatedQuery {
        PaginatedQuery::new(self.cache.clone(), self.source.clone(), config)
    }
}

fn by_id(page_size: usize) -> QueryConfig {
    QueryConfig::builder("students")
        .page_size(page_size)
        .order("id", true)
        .build()
        .unwrap()
}

fn ids(query: &PaginatedQuery) -> Vec<i64> {
    query
        .state()
        .rows
        .iter()
        .map(|r| r.get_i64("id").unwrap().unwrap())
        .collect()
}

#[tokio::test]
async fn test_go_to_page_loads_the_right_range() {
    let fixture = Fixture::new(95);
    let mut query = fixture.query(by_id(20));

    query.go_to_page(3).await.unwrap();

    let state = query.state();
    assert_eq!(ids(&query), (41..=60).collect::<Vec<_>>());
    assert_eq!(state.current_page, 3);
    assert_eq!(state.total_count, 95);
    assert_eq!(state.total_pages, 5);
    assert!(state.has_more);
    assert!(!state.loading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_short_last_page_ends_load_more() {
    let fixture = Fixture::new(45);
    let mut query = fixture.query(by_id(20));

    query.refresh().await.unwrap();
    query.load_more().await.unwrap();
    assert_eq!(ids(&query), (1..=40).collect::<Vec<_>>());
    assert!(query.has_more());

    query.load_more().await.unwrap();
    assert_eq!(ids(&query), (1..=45).collect::<Vec<_>>());
    assert_eq!(query.current_page(), 3);
    assert!(!query.has_more());

    // Nothing left: no further fetch.
    let calls = fixture.source.calls();
    query.load_more().await.unwrap();
    assert_eq!(fixture.source.calls(), calls);
    assert_eq!(query.state().rows.len(), 45);
}

#[tokio::test]
async fn test_full_last_page_still_reports_more() {
    let fixture = Fixture::new(40);
    let mut query = fixture.query(by_id(20));

    query.go_to_page(2).await.unwrap();
    assert!(query.has_more());

    query.load_more().await.unwrap();
    let state = query.state();
    assert_eq!(ids(&query), (21..=40).collect::<Vec<_>>());
    assert_eq!(state.current_page, 3);
    assert!(!state.has_more);
}

#[tokio::test]
async fn test_empty_result_has_no_more() {
    let fixture = Fixture::new(0);
    let mut query = fixture.query(by_id(20));

    query.refresh().await.unwrap();
    let state = query.state();
    assert!(state.rows.is_empty());
    assert_eq!(state.total_pages, 0);
    assert!(!state.has_more);
}

#[tokio::test]
async fn test_go_to_page_replaces_appended_rows() {
    let fixture = Fixture::new(95);
    let mut query = fixture.query(by_id(20));

    query.refresh().await.unwrap();
    query.load_more().await.unwrap();
    assert_eq!(query.state().rows.len(), 40);

    query.go_to_page(5).await.unwrap();
    assert_eq!(ids(&query), (81..=95).collect::<Vec<_>>());

    query.refresh().await.unwrap();
    assert_eq!(ids(&query), (1..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_refresh_within_ttl_is_served_from_cache() {
    let fixture = Fixture::new(30);
    let mut query = fixture.query(by_id(20));

    query.refresh().await.unwrap();
    fixture.source.push("students", Record::new().set("id", 31));
    query.refresh().await.unwrap();

    assert_eq!(fixture.source.calls(), 1);
    assert_eq!(query.state().total_count, 30);
    assert_eq!(fixture.cache.metrics().cache_hits, 1);

    fixture.clock.advance(Duration::from_secs(300));
    query.refresh().await.unwrap();
    assert_eq!(fixture.source.calls(), 2);
    assert_eq!(query.state().total_count, 31);
}

#[tokio::test]
async fn test_clear_forces_refetch() {
    let fixture = Fixture::new(30);
    let mut query = fixture.query(by_id(20));

    query.refresh().await.unwrap();
    query.refresh().await.unwrap();
    fixture.cache.clear();
    assert_eq!(fixture.cache.metrics().cache_hits, 0);

    query.refresh().await.unwrap();
    assert_eq!(fixture.source.calls(), 2);
}

#[tokio::test]
async fn test_failed_load_keeps_previous_rows() {
    let fixture = Fixture::new(95);
    let mut query = fixture.query(by_id(20));
    query.refresh().await.unwrap();

    fixture.source.fail("students", "permission denied for table students");
    let err = query.go_to_page(2).await.unwrap_err();
    assert_eq!(err, Error::fetch_failed("permission denied for table students"));

    let state = query.state();
    assert_eq!(state.error.as_deref(), Some("permission denied for table students"));
    assert_eq!(state.rows.len(), 20);
    assert_eq!(state.current_page, 1);
    assert_eq!(state.total_count, 95);
    assert!(!state.loading);

    // The failure was not cached: retrying reaches the source again.
    fixture.source.heal("students");
    query.go_to_page(2).await.unwrap();
    let state = query.state();
    assert_eq!(state.error, None);
    assert_eq!(state.current_page, 2);
    assert_eq!(fixture.source.calls(), 3);
}

#[tokio::test]
async fn test_page_zero_is_rejected_before_fetching() {
    let fixture = Fixture::new(10);
    let mut query = fixture.query(by_id(20));

    let err = query.go_to_page(0).await.unwrap_err();
    assert_eq!(err, Error::InvalidConfig(ConfigError::InvalidPage(0)));
    assert_eq!(fixture.source.calls(), 0);
    assert_eq!(query.state().error, None);
}

#[tokio::test]
async fn test_filter_change_resets_to_first_page() {
    let fixture = Fixture::new(95);
    let mut query = fixture.query(by_id(10));

    query.refresh().await.unwrap();
    query.load_more().await.unwrap();
    query.load_more().await.unwrap();
    assert_eq!(query.current_page(), 3);
    assert_eq!(query.state().rows.len(), 30);

    let reloaded = query
        .update_config(|config| config.search("last_name", "oka"))
        .await
        .unwrap();
    assert!(reloaded);

    let state = query.state();
    assert_eq!(state.current_page, 1);
    assert_eq!(state.total_count, 19);
    assert_eq!(state.rows.len(), 10);
    assert!(
        state
            .rows
            .iter()
            .all(|r| r.get_str("last_name").unwrap() == Some("Okafor"))
    );
}

#[tokio::test]
async fn test_blank_search_is_not_a_change() {
    let fixture = Fixture::new(95);
    let mut query = fixture.query(by_id(10));
    query.refresh().await.unwrap();
    query.load_more().await.unwrap();

    let reloaded = query
        .update_config(|config| config.search("last_name", ""))
        .await
        .unwrap();
    assert!(!reloaded);
    assert_eq!(query.current_page(), 2);
    assert_eq!(query.state().rows.len(), 20);
}

#[tokio::test]
async fn test_order_change_is_not_served_from_the_old_order() {
    let fixture = Fixture::new(30);
    let mut query = fixture.query(by_id(5));
    query.refresh().await.unwrap();
    assert_eq!(ids(&query), vec![1, 2, 3, 4, 5]);

    let reloaded = query
        .update_config(|config| config.order_by(OrderBy::desc("id")))
        .await
        .unwrap();
    assert!(reloaded);
    assert_eq!(ids(&query), vec![30, 29, 28, 27, 26]);
    assert_eq!(fixture.source.calls(), 2);
}

#[tokio::test]
async fn test_page_size_change_keeps_position() {
    let fixture = Fixture::new(30);
    let mut query = fixture.query(by_id(5));
    query.go_to_page(2).await.unwrap();
    assert_eq!(query.total_pages(), 6);

    let reloaded = query.update_config(|config| config.page_size(10)).await.unwrap();
    assert!(!reloaded);
    assert_eq!(query.config().page_size(), 10);
    assert_eq!(query.current_page(), 2);
    assert_eq!(query.state().total_count, 30);
    assert_eq!(query.total_pages(), 3);
}

#[tokio::test]
async fn test_invalid_config_update_is_rejected() {
    let fixture = Fixture::new(30);
    let mut query = fixture.query(by_id(5));

    let err = query
        .update_config(|config| config.filter_tagged("last_name", "regex:^O"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::InvalidConfig(ConfigError::malformed_filter("last_name", "regex"))
    );
    assert_eq!(query.config(), &by_id(5));
}

#[tokio::test]
async fn test_instances_share_the_cache() {
    let fixture = Fixture::new(30);
    let mut roster = fixture.query(by_id(10));
    let mut sidebar = fixture.query(by_id(10));

    roster.refresh().await.unwrap();
    sidebar.refresh().await.unwrap();

    assert_eq!(fixture.source.calls(), 1);
    assert_eq!(roster.state().rows, sidebar.state().rows);
}

#[tokio::test]
async fn test_subscribers_see_loading_transitions() {
    let cache = Arc::new(QueryCache::new(CacheConfig::default()));
    let source = InMemorySource::new()
        .with_latency(Duration::from_millis(10))
        .with_collection("students", students(30));
    let mut query = PaginatedQuery::new(cache, Arc::new(source), by_id(10));
    let mut updates = query.subscribe();

    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            seen.push(state.loading);
            if !state.loading {
                break;
            }
        }
        seen
    });

    query.refresh().await.unwrap();
    let seen = observer.await.unwrap();
    assert_eq!(seen, vec![true, false]);
    assert_eq!(query.state().rows.len(), 10);
}
