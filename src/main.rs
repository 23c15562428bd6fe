//! # Past News
//!
//! A small HTTP service that answers "what was the news about *keyword*
//! a week / two weeks / a month ago, or on a random day?".
//!
//! ## Usage
//!
//! ```sh
//! GUARDIAN_API_KEY=... past_news --port 5001
//! curl 'http://127.0.0.1:5001/?option=one_week'
//! ```
//!
//! ## Architecture
//!
//! Each request runs the same pipeline:
//! 1. **Date**: turn the `option` into a historical day with the same weekday as today
//! 2. **Fetch**: ask the content API for that day's candidate articles
//! 3. **Select**: score candidates by keyword density and format the best one
//! 4. **Cache**: keep the answer until the current cache window ends
//!    (`random` is never cached)

use chrono::Local;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cache;
mod cli;
mod dates;
mod error;
mod models;
mod relevance;
mod selector;
mod server;
mod utils;

use api::{ContentSource, GuardianClient, GuardianConfig};
use cache::NewsCache;
use cli::Cli;
use relevance::RelevanceScorer;
use server::AppState;
use utils::SystemClock;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "past_news starting up");

    let args = Cli::parse();
    debug!(host = %args.host, port = args.port, keyword = %args.keyword, "Parsed CLI arguments");

    if args.random_start >= Local::now().date_naive() {
        warn!(random_start = %args.random_start, "Random start date is not in the past; `random` requests will fail");
    }

    let scorer = RelevanceScorer::new(&args.keyword)?;

    let source: Option<Arc<dyn ContentSource>> = match args.api_key() {
        Some(api_key) => {
            let client = GuardianClient::new(GuardianConfig {
                api_key: api_key.to_string(),
                base_url: args.api_base_url.clone(),
                query: scorer.keyword().to_string(),
                timeout: Duration::from_secs(args.timeout_secs),
            })?;
            info!(?client, "Content API client ready");
            Some(Arc::new(client))
        }
        None => {
            warn!("GUARDIAN_API_KEY not set; uncached requests will fail with a configuration error");
            None
        }
    };

    let cache = NewsCache::new(args.cache_policy.into_policy(args.cache_ttl_hours));
    info!(policy = ?cache.policy(), "Response cache initialized");

    let state = AppState {
        source,
        scorer,
        cache: Mutex::new(cache),
        rng: Mutex::new(StdRng::from_os_rng()),
        clock: Arc::new(SystemClock),
        page_size: args.page_size,
        random_start: args.random_start,
    };

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
