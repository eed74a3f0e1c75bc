//! Live tests against a real PostgREST backend.
//!
//! These tests need a reachable backend and are ignored by default.
//! To run them, create a `.env` file in the campus-lib directory with:
//!
//! ```env
//! CAMPUS_URL=https://tenant.example.supabase.co
//! CAMPUS_API_KEY=your-anon-key
//! CAMPUS_COLLECTION=students
//! ```
//!
//! Then run: `cargo test -p campus-lib -- --ignored`

use std::env;
use std::sync::Arc;

use campus_lib::cache::CacheConfig;
use campus_lib::cache::QueryCache;
use campus_lib::query::PaginatedQuery;
use campus_lib::query::QueryConfig;
use campus_lib::source::RestSource;

fn load_env() -> Option<(String, String, String)> {
    let _ = dotenvy::dotenv();

    let url = env::var("CAMPUS_URL").ok()?;
    let api_key = env::var("CAMPUS_API_KEY").ok()?;
    let collection = env::var("CAMPUS_COLLECTION").unwrap_or_else(|_| "students".to_string());

    Some((url, api_key, collection))
}

#[tokio::test]
#[ignore = "requires a live backend configured in .env"]
async fn test_first_two_pages() {
    let (url, api_key, collection) =
        load_env().expect("Missing required environment variables. See module docs.");

    let source = RestSource::builder()
        .url(url)
        .api_key(api_key)
        .build()
        .expect("Failed to build source");
    let cache = Arc::new(QueryCache::new(CacheConfig::default()));
    let config = QueryConfig::builder(collection).page_size(5).build().unwrap();
    let mut query = PaginatedQuery::new(cache.clone(), Arc::new(source), config);

    query.refresh().await.expect("First page failed");
    let state = query.state();
    assert!(state.rows.len() <= 5);
    assert_eq!(state.total_pages, state.total_count.div_ceil(5));

    query.load_more().await.expect("Second page failed");
    println!(
        "Loaded {} of {} rows, {} cache hits",
        query.state().rows.len(),
        query.state().total_count,
        cache.metrics().cache_hits
    );
}

#[tokio::test]
#[ignore = "requires a live backend configured in .env"]
async fn test_unknown_collection_fails() {
    let (url, api_key, _) =
        load_env().expect("Missing required environment variables. See module docs.");

    let source = RestSource::builder().url(url).api_key(api_key).build().unwrap();
    let cache = Arc::new(QueryCache::new(CacheConfig::default()));
    let config = QueryConfig::builder("no_such_collection_here").build().unwrap();
    let mut query = PaginatedQuery::new(cache, Arc::new(source), config);

    let err = query.refresh().await.unwrap_err();
    assert!(err.is_fetch_failure());
    assert!(query.state().error.is_some());
}
