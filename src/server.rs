//! HTTP surface: router, shared state and handlers.
//!
//! ```text
//! GET /?option=one_week        news for a day one week ago
//! GET /api/news?option=random  same endpoint, explicit path
//! GET /health                  liveness check
//! ```

use std::any::Any;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, instrument};

use crate::api::ContentSource;
use crate::cache::NewsCache;
use crate::dates::target_date;
use crate::error::NewsError;
use crate::models::{NewsResponse, Period};
use crate::relevance::RelevanceScorer;
use crate::selector::select_best;
use crate::utils::Clock;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    /// `None` when no API key was configured.
    pub source: Option<Arc<dyn ContentSource>>,
    pub scorer: RelevanceScorer,
    pub cache: Mutex<NewsCache<NewsResponse>>,
    pub rng: Mutex<StdRng>,
    pub clock: Arc<dyn Clock>,
    /// Maximum number of candidates requested per day.
    pub page_size: usize,
    /// Earliest day the `random` period may land on.
    pub random_start: NaiveDate,
}

/// Build the application router over `state`.
///
/// Every route shares one [`AppState`]; handler panics are caught and
/// answered with the usual `{success: false, error}` envelope.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_news))
        .route("/api/news", get(get_news))
        .route("/health", get(health))
        .layer(CatchPanicLayer::custom(internal_error))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Resolve `?option=` to a day in the past and answer with its most
/// relevant article.
///
/// # Errors
///
/// Every failure is a [`NewsError`], rendered as a JSON error body with
/// the matching status code.
#[instrument(level = "info", skip_all)]
pub async fn get_news(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<NewsResponse>, NewsError> {
    let period: Period = query_param(query.as_deref(), "option")
        .as_deref()
        .filter(|o| !o.is_empty())
        .ok_or(NewsError::MissingOption)?
        .parse()?;

    let now = state.clock.now();

    if let Some(cached) = state.cache.lock().await.get(period, now) {
        debug!(%period, "Serving cached response");
        return Ok(Json(cached));
    }

    let date = {
        let mut rng = state.rng.lock().await;
        target_date(period, now.date(), state.random_start, &mut *rng)?
    };

    let source = state
        .source
        .as_ref()
        .ok_or_else(|| NewsError::Config("GUARDIAN_API_KEY not set".to_string()))?;

    let candidates = source.search(date, state.page_size).await?;

    let response = match select_best(&candidates, &state.scorer) {
        Some(article) => NewsResponse::found(date, article),
        None => NewsResponse::quiet_day(date, state.scorer.keyword()),
    };

    info!(
        %period,
        %date,
        candidates = candidates.len(),
        found = response.article.is_some(),
        "Resolved news request"
    );

    state.cache.lock().await.set(period, response.clone(), now);

    Ok(Json(response))
}

/// First value of `name` in a raw query string.
///
/// Decoding is lossy and never fails, so repeated or malformed parameters
/// still reach the handler and are reported through [`NewsError`].
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Turn a handler panic into the generic error envelope.
fn internal_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unexpected failure".to_string());

    NewsError::Internal(detail).into_response()
}
