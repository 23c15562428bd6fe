//! Data models shared by the selection pipeline and the HTTP layer.
//!
//! - [`Period`]: the time-period selector a caller asks for
//! - [`Article`]: an unscored candidate as returned by the content API
//! - [`SelectedArticle`]: the formatted winner shown to the client
//! - [`NewsResponse`]: the success body of the news endpoint (also what gets cached)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NewsError;

/// Time period a caller can ask for.
///
/// `Random` is the volatile option: it is never cached because every call
/// should land on a different historical day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    OneWeek,
    TwoWeeks,
    OneMonth,
    Random,
}

impl Period {
    /// Every accepted period, in the order they are listed to clients.
    pub const ALL: [Period; 4] = [
        Period::OneWeek,
        Period::TwoWeeks,
        Period::OneMonth,
        Period::Random,
    ];

    /// Wire name used in the `option` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneWeek => "one_week",
            Period::TwoWeeks => "two_weeks",
            Period::OneMonth => "one_month",
            Period::Random => "random",
        }
    }

    /// Whether responses for this period must bypass the cache.
    pub fn is_volatile(&self) -> bool {
        matches!(self, Period::Random)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = NewsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| NewsError::InvalidOption(s.to_string()))
    }
}

/// A candidate article fetched from the content API for a given day.
///
/// Only `id` is guaranteed; every other field may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    /// Identifier assigned by the content API.
    pub id: String,
    /// Web title of the article.
    pub title: Option<String>,
    /// Canonical URL.
    pub url: Option<String>,
    /// Publication timestamp exactly as the API returned it.
    pub published: Option<String>,
    /// Structured headline; replaces `title` when present.
    pub headline_override: Option<String>,
    /// Body markup (paragraph-wrapped HTML).
    pub body: Option<String>,
    pub thumbnail: Option<String>,
}

impl Article {
    /// The headline used for scoring and display.
    ///
    /// # Returns
    ///
    /// The structured headline whenever the API sent one, even an empty
    /// one, else the title. `None` when neither is present.
    pub fn headline(&self) -> Option<&str> {
        self.headline_override.as_deref().or(self.title.as_deref())
    }
}

/// The best article for a day, formatted for display.
///
/// `excerpt` is never empty: it falls back to `headline` when the body
/// yields no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedArticle {
    pub headline: String,
    pub excerpt: String,
    pub url: String,
    /// Publication timestamp, passed through verbatim.
    pub published: String,
}

/// Success body of the news endpoint.
///
/// `message` is only present when `article` is `None` (a quiet day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsResponse {
    pub success: bool,
    /// The historical day that was searched, `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub article: Option<SelectedArticle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NewsResponse {
    /// Response carrying the selected article for `date`.
    pub fn found(date: NaiveDate, article: SelectedArticle) -> Self {
        Self {
            success: true,
            date,
            article: Some(article),
            message: None,
        }
    }

    /// Response for a day without any relevant coverage. Not an error.
    pub fn quiet_day(date: NaiveDate, keyword: &str) -> Self {
        Self {
            success: true,
            date,
            article: None,
            message: Some(format!("No {keyword} coverage found on this day")),
        }
    }
}
