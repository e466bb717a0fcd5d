//! Errors raised while loading pages and images.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from page and image fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("HTTP {status}: {status_text} for {url}")]
    Navigation {
        url: String,
        status: i64,
        status_text: String,
    },

    #[error("Timed out after {timeout_ms}ms loading {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Failed to decode image from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to rasterize SVG: {0}")]
    Svg(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Build a request error for a URL.
    pub(crate) fn request(url: &str, source: reqwest::Error) -> Self {
        FetchError::Request {
            url: url.to_string(),
            source,
        }
    }
}
