//! Content-API interaction.
//!
//! The pipeline only sees the [`ContentSource`] trait: "give me the
//! candidates for this day". [`GuardianClient`] implements it against the
//! Guardian Open Platform search endpoint.
//!
//! # Failure model
//!
//! One request per call, bounded by the client timeout, never retried.
//! Failures are classified into [`FetchError`] so the HTTP layer can map
//! each kind to its own status:
//!
//! | Upstream outcome                 | Error                    |
//! |----------------------------------|--------------------------|
//! | HTTP 429                         | [`FetchError::RateLimited`] |
//! | other non-2xx, bad JSON, not ok  | [`FetchError::Upstream`]    |
//! | timeout                          | [`FetchError::Timeout`]     |
//! | connect/transport failure        | [`FetchError::Network`]     |

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::models::Article;
use crate::utils::truncate_for_log;

/// Default search endpoint of the Guardian Open Platform.
pub const GUARDIAN_SEARCH_URL: &str = "https://content.guardianapis.com/search";

/// Failure of a single content-API call.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("API rate limit exceeded")]
    RateLimited,

    #[error("{0}")]
    Upstream(String),

    #[error("request to content API timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error while contacting content API: {0}")]
    Network(String),
}

/// Anything that can list the candidate articles published on a day.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Up to `page_size` candidates published on `date`.
    async fn search(&self, date: NaiveDate, page_size: usize) -> Result<Vec<Article>, FetchError>;
}

/// Settings for [`GuardianClient`].
#[derive(Debug, Clone)]
pub struct GuardianConfig {
    pub api_key: String,
    pub base_url: Url,
    /// Free-text query sent as `q`.
    pub query: String,
    pub timeout: Duration,
}

/// Guardian Open Platform search client.
///
/// Owns one pooled HTTP client for its whole lifetime; connections are
/// released when the client is dropped.
pub struct GuardianClient {
    http: Client,
    config: GuardianConfig,
}

impl std::fmt::Debug for GuardianClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardianClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("query", &self.config.query)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl GuardianClient {
    /// Build a client with its own connection pool.
    ///
    /// # Arguments
    ///
    /// * `config` - Key, endpoint and query; `config.timeout` bounds each
    ///   whole request, connect included.
    ///
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] if the TLS backend cannot be initialized.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let client = GuardianClient::new(GuardianConfig {
    ///     api_key: "test".to_string(),
    ///     base_url: Url::parse(GUARDIAN_SEARCH_URL)?,
    ///     query: "Trump".to_string(),
    ///     timeout: Duration::from_secs(10),
    /// })?;
    /// ```
    pub fn new(config: GuardianConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.config.timeout)
        } else if e.is_decode() {
            FetchError::Upstream(format!("malformed response from content API: {e}"))
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ContentSource for GuardianClient {
    #[instrument(level = "info", skip(self))]
    async fn search(&self, date: NaiveDate, page_size: usize) -> Result<Vec<Article>, FetchError> {
        let t0 = Instant::now();
        let day = date.format("%Y-%m-%d").to_string();
        let page_size = page_size.to_string();

        let response = self
            .http
            .get(self.config.base_url.clone())
            .query(&[
                ("q", self.config.query.as_str()),
                ("from-date", day.as_str()),
                ("to-date", day.as_str()),
                ("page-size", page_size.as_str()),
                ("show-fields", "body,headline,thumbnail"),
                ("api-key", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(elapsed_ms = t0.elapsed().as_millis(), "Content API rate limit hit");
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis(),
                body = %truncate_for_log(&body, 300),
                "Content API returned an error"
            );
            return Err(FetchError::Upstream(format!(
                "content API returned error {}: {}",
                status.as_u16(),
                truncate_for_log(&body, 200)
            )));
        }

        let envelope: SearchEnvelope = response.json().await.map_err(|e| self.classify(e))?;
        if envelope.response.status != "ok" {
            warn!(status = %envelope.response.status, "Content API returned non-OK status");
            return Err(FetchError::Upstream(format!(
                "content API returned non-OK status: {}",
                envelope.response.status
            )));
        }

        let articles: Vec<Article> = envelope
            .response
            .results
            .into_iter()
            .map(Article::from)
            .collect();

        info!(
            count = articles.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched candidate articles"
        );
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    id: String,
    web_title: Option<String>,
    web_url: Option<String>,
    web_publication_date: Option<String>,
    #[serde(default)]
    fields: Option<SearchFields>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchFields {
    headline: Option<String>,
    body: Option<String>,
    thumbnail: Option<String>,
}

impl From<SearchResult> for Article {
    fn from(result: SearchResult) -> Self {
        let fields = result.fields.unwrap_or_default();
        Article {
            id: result.id,
            title: result.web_title,
            url: result.web_url,
            published: result.web_publication_date,
            headline_override: fields.headline,
            body: fields.body,
            thumbnail: fields.thumbnail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SAMPLE_RESPONSE: &str = r#"{
        "response": {
            "status": "ok",
            "total": 2,
            "results": [
                {
                    "id": "us-news/2024/jan/20/trump-rally",
                    "webTitle": "Trump holds rally",
                    "webUrl": "https://www.theguardian.com/us-news/2024/jan/20/trump-rally",
                    "webPublicationDate": "2024-01-20T10:00:00Z",
                    "fields": {
                        "headline": "Trump holds rally in New Hampshire",
                        "body": "<p>Donald Trump spoke.</p>",
                        "thumbnail": "https://media.guim.co.uk/thumb.jpg"
                    }
                },
                {
                    "id": "world/2024/jan/20/other",
                    "webTitle": "Other news",
                    "webUrl": "https://www.theguardian.com/world/2024/jan/20/other",
                    "webPublicationDate": "2024-01-20T12:00:00Z"
                }
            ]
        }
    }"#;

    fn client_for(base_url: &str, timeout: Duration) -> GuardianClient {
        GuardianClient::new(GuardianConfig {
            api_key: "test-key".to_string(),
            base_url: Url::parse(base_url).unwrap(),
            query: "Trump".to_string(),
            timeout,
        })
        .unwrap()
    }

    fn jan_20() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
    }

    #[tokio::test]
    async fn test_successful_search() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Trump".into()),
                Matcher::UrlEncoded("from-date".into(), "2024-01-20".into()),
                Matcher::UrlEncoded("to-date".into(), "2024-01-20".into()),
                Matcher::UrlEncoded("page-size".into(), "50".into()),
                Matcher::UrlEncoded("show-fields".into(), "body,headline,thumbnail".into()),
                Matcher::UrlEncoded("api-key".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SAMPLE_RESPONSE)
            .create_async()
            .await;

        let client = client_for(&format!("{}/search", server.url()), Duration::from_secs(5));
        let articles = client.search(jan_20(), 50).await.unwrap();

        mock.assert_async().await;
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, "us-news/2024/jan/20/trump-rally");
        assert_eq!(articles[0].title.as_deref(), Some("Trump holds rally"));
        assert_eq!(
            articles[0].headline_override.as_deref(),
            Some("Trump holds rally in New Hampshire")
        );
        assert_eq!(articles[0].body.as_deref(), Some("<p>Donald Trump spoke.</p>"));
        assert_eq!(articles[0].published.as_deref(), Some("2024-01-20T10:00:00Z"));
        assert_eq!(articles[1].headline_override, None);
        assert_eq!(articles[1].body, None);
    }

    #[tokio::test]
    async fn test_empty_results() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"response": {"status": "ok", "results": []}}"#)
            .create_async()
            .await;

        let client = client_for(&format!("{}/search", server.url()), Duration::from_secs(5));
        assert!(client.search(jan_20(), 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_page_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("page-size".into(), "10".into()))
            .with_status(200)
            .with_body(r#"{"response": {"status": "ok", "results": []}}"#)
            .create_async()
            .await;

        let client = client_for(&format!("{}/search", server.url()), Duration::from_secs(5));
        client.search(jan_20(), 10).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let client = client_for(&format!("{}/search", server.url()), Duration::from_secs(5));
        let err = client.search(jan_20(), 50).await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited));
    }

    #[tokio::test]
    async fn test_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let client = client_for(&format!("{}/search", server.url()), Duration::from_secs(5));
        match client.search(jan_20(), 50).await.unwrap_err() {
            FetchError::Upstream(message) => {
                assert!(message.contains("500"), "{message}");
                assert!(message.contains("Internal Server Error"), "{message}");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_request_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("Bad Request")
            .create_async()
            .await;

        let client = client_for(&format!("{}/search", server.url()), Duration::from_secs(5));
        let err = client.search(jan_20(), 50).await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream(ref m) if m.contains("400")));
    }

    #[tokio::test]
    async fn test_non_ok_status_in_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"response": {"status": "error", "message": "Invalid API key"}}"#)
            .create_async()
            .await;

        let client = client_for(&format!("{}/search", server.url()), Duration::from_secs(5));
        let err = client.search(jan_20(), 50).await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream(ref m) if m.contains("non-OK")));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = client_for(&format!("{}/search", server.url()), Duration::from_secs(5));
        let err = client.search(jan_20(), 50).await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_timeout_error() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(200);
        let client = client_for(&format!("http://{addr}/search"), timeout);
        let err = client.search(jan_20(), 50).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(t) if t == timeout), "{err:?}");
    }

    #[tokio::test]
    async fn test_network_error() {
        // Bind then drop to get a port with nothing listening.
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let client = client_for(&format!("http://{addr}/search"), Duration::from_secs(5));
        let err = client.search(jan_20(), 50).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "{err:?}");
    }
}
