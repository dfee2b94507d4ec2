//! Error type shared by the fetch layer and the spiders.

use chrono::NaiveDate;
use reqwest::StatusCode;

/// Everything that can go wrong while crawling a gazette portal.
#[derive(Debug, thiserror::Error)]
pub enum SpiderError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unparsable date {0:?}")]
    InvalidDate(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl SpiderError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SpiderError::Http { .. } => true,
            SpiderError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
