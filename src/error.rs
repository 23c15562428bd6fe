//! Request-level error taxonomy and its mapping onto HTTP responses.
//!
//! Every failure leaves the service as `{"success": false, "error": "..."}`
//! with a status that tells the client who is at fault: the caller (400),
//! the upstream content API (429/502/503/504) or this server (500).

use std::error::Error;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::api::FetchError;
use crate::dates::InvalidRangeError;

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("Missing required parameter: option")]
    MissingOption,

    #[error("Invalid option: {0}. Must be one of: one_week, two_weeks, one_month, random")]
    InvalidOption(String),

    #[error("Unable to compute target date: {0}")]
    InvalidRange(#[from] InvalidRangeError),

    #[error("Server configuration error: {0}")]
    Config(String),

    #[error("Unable to fetch articles: {0}")]
    Fetch(#[from] FetchError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl NewsError {
    /// HTTP status for this error.
    ///
    /// Bad input is 400, upstream failures map to 429/502/503/504 by kind,
    /// and everything else is 500.
    pub fn status(&self) -> StatusCode {
        match self {
            NewsError::MissingOption | NewsError::InvalidOption(_) => StatusCode::BAD_REQUEST,
            NewsError::Fetch(FetchError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            NewsError::Fetch(FetchError::Upstream(_)) => StatusCode::SERVICE_UNAVAILABLE,
            NewsError::Fetch(FetchError::Network(_)) => StatusCode::BAD_GATEWAY,
            NewsError::Fetch(FetchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            NewsError::InvalidRange(_) | NewsError::Config(_) | NewsError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Rate limiting gets a fixed hint instead
    /// of the upstream wording.
    pub fn client_message(&self) -> String {
        match self {
            NewsError::Fetch(FetchError::RateLimited) => {
                "API rate limit exceeded. Please try again later.".to_string()
            }
            NewsError::InvalidRange(e) => format!("Internal server error: {e}"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for NewsError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, source = ?self.source(), "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let payload = Json(json!({"success": false, "error": self.client_message()}));

        (status, payload).into_response()
    }
}
