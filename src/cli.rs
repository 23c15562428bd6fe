//! Command-line interface definitions for Past News.
//!
//! Every option can also be supplied through an environment variable, which
//! is how the API key is normally provided.

use chrono::NaiveDate;
use clap::Parser;
use url::Url;

use crate::api::GUARDIAN_SEARCH_URL;
use crate::cache::{CachePolicyKind, DEFAULT_TTL_HOURS, MAX_TTL_HOURS};

/// Command-line arguments for the Past News server.
///
/// # Examples
///
/// ```sh
/// # Serve on the default address with the key from the environment
/// GUARDIAN_API_KEY=... past_news
///
/// # Daily cache resets, different keyword and port
/// past_news --cache-policy daily --keyword Biden --port 8080
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "PAST_NEWS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PAST_NEWS_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Guardian Open Platform API key
    #[arg(long, env = "GUARDIAN_API_KEY", hide_env_values = true)]
    pub guardian_api_key: Option<String>,

    /// Search endpoint of the content API
    #[arg(long, env = "GUARDIAN_API_URL", default_value = GUARDIAN_SEARCH_URL)]
    pub api_base_url: Url,

    /// Keyword articles are searched for and scored against
    #[arg(short, long, env = "PAST_NEWS_KEYWORD", default_value = "Trump")]
    pub keyword: String,

    /// Maximum number of candidate articles fetched per day
    #[arg(long, env = "PAST_NEWS_PAGE_SIZE", default_value_t = 50)]
    pub page_size: usize,

    /// Timeout for each content API request, in seconds
    #[arg(long, env = "PAST_NEWS_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Earliest day the `random` option may pick (YYYY-MM-DD)
    #[arg(long, env = "PAST_NEWS_RANDOM_START", default_value = "2016-05-26")]
    pub random_start: NaiveDate,

    /// When cached responses are discarded
    #[arg(long, env = "PAST_NEWS_CACHE_POLICY", value_enum, default_value_t = CachePolicyKind::Ttl)]
    pub cache_policy: CachePolicyKind,

    /// Length of the cache window for the `ttl` policy, in hours (1 to 8760)
    #[arg(
        long,
        env = "PAST_NEWS_CACHE_TTL_HOURS",
        default_value_t = DEFAULT_TTL_HOURS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_TTL_HOURS)
    )]
    pub cache_ttl_hours: i64,
}

impl Cli {
    /// The API key, if one was given and is not blank.
    ///
    /// # Returns
    ///
    /// The trimmed key, or `None` when the flag and `GUARDIAN_API_KEY` are
    /// both unset or only whitespace.
    pub fn api_key(&self) -> Option<&str> {
        self.guardian_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
