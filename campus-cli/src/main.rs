mod demo;

use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use campus_lib::cache::CacheConfig;
use campus_lib::cache::QueryCache;
use campus_lib::query::OrderBy;
use campus_lib::query::Page;
use campus_lib::query::PaginatedQuery;
use campus_lib::query::QueryConfig;
use campus_lib::source::DataSource;
use campus_lib::source::RestSource;
use clap::Parser;
use log::info;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

/// Page through a campus collection.
///
/// Reads from the backend named by CAMPUS_URL / CAMPUS_API_KEY (a `.env`
/// file is honoured), or from a built-in data set with `--demo`.
#[derive(Debug, Parser)]
#[command(name = "campus", version)]
struct Args {
    /// Collection to read.
    #[arg(default_value = "students")]
    collection: String,

    /// Comma-separated columns to select (default: all).
    #[arg(short, long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Page to show, starting at 1.
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Rows per page.
    #[arg(short = 's', long, default_value_t = campus_lib::query::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Filter as FIELD=VALUE; VALUE may be tagged, e.g. `name=ilike:ann`.
    #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,

    /// Sort column; prefix with `-` for descending.
    #[arg(short, long)]
    order: Option<String>,

    /// Keep loading pages until the last one.
    #[arg(long)]
    all: bool,

    /// Use the built-in demo data instead of the backend.
    #[arg(long)]
    demo: bool,

    /// Per-request timeout in seconds for the backend.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        eprintln!("Error: failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    match &args.log_file {
        Some(path) => WriteLogger::init(level, Config::default(), File::create(path)?)?,
        None => TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = open_source(&args)?;
    let config = build_config(&args)?;

    let cache: Arc<QueryCache<Page>> = Arc::new(QueryCache::new(CacheConfig::default()));
    let _sweeper = cache.spawn_sweeper();
    let mut query = PaginatedQuery::new(cache.clone(), source, config);

    query.go_to_page(args.page).await?;
    while args.all && query.has_more() {
        query.load_more().await?;
    }

    let state = query.state();
    for row in &state.rows {
        println!("{}", serde_json::to_string(row)?);
    }
    eprintln!(
        "{}: page {} of {}, {} rows shown, {} total",
        args.collection,
        state.current_page,
        state.total_pages,
        state.rows.len(),
        state.total_count
    );

    let metrics = cache.metrics();
    info!(
        "last fetch {}ms, {} cache hits, {} slow queries",
        metrics.query_time.as_millis(),
        metrics.cache_hits,
        metrics.slow_queries
    );
    Ok(())
}

fn open_source(args: &Args) -> Result<Arc<dyn DataSource>, Box<dyn std::error::Error>> {
    if args.demo {
        return Ok(Arc::new(demo::source()));
    }

    let _ = dotenvy::dotenv();
    let (Ok(url), Ok(api_key)) = (std::env::var("CAMPUS_URL"), std::env::var("CAMPUS_API_KEY")) else {
        return Err("CAMPUS_URL and CAMPUS_API_KEY must be set (or pass --demo)".into());
    };

    let mut builder = RestSource::builder()
        .url(url)
        .api_key(api_key)
        .timeout(Duration::from_secs(args.timeout));
    if let Ok(token) = std::env::var("CAMPUS_ACCESS_TOKEN") {
        builder = builder.access_token(token);
    }
    Ok(Arc::new(builder.build()?))
}

fn build_config(args: &Args) -> Result<QueryConfig, Box<dyn std::error::Error>> {
    let mut builder = QueryConfig::builder(&args.collection)
        .columns(args.columns.iter().map(String::as_str))
        .page_size(args.page_size);

    for filter in &args.filters {
        let Some((field, value)) = filter.split_once('=') else {
            return Err(format!("filter '{filter}' is not FIELD=VALUE").into());
        };
        builder = builder.filter_tagged(field, value);
    }

    if let Some(order) = &args.order {
        builder = builder.order_by(match order.strip_prefix('-') {
            Some(field) => OrderBy::desc(field),
            None => OrderBy::asc(order),
        });
    }

    Ok(builder.build()?)
}
