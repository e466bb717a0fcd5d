//! HTTP client used for page loads and image downloads.

mod response;

pub use response::HttpResponse;

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::FetchError;

/// User agent sent when none is configured.
pub const USER_AGENT: &str = concat!("wuzup/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around `reqwest::Client` with a fixed timeout and user agent.
///
/// Proxies are taken from the standard `ALL_PROXY` / `HTTPS_PROXY` /
/// `HTTP_PROXY` environment variables by reqwest itself.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a new HTTP client sending `user_agent`, or [`USER_AGENT`] when
    /// it is `None`.
    pub fn with_user_agent(timeout: Duration, user_agent: Option<&str>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(USER_AGENT))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue a GET request. Non-success statuses are returned as
    /// [`FetchError::Status`].
    pub async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        debug!("GET {} (timeout={:?})", url, self.timeout);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::request(url, e))?;

        let status = response.status();
        debug!("Got HTTP {} from {}", status.as_u16(), url);
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(HttpResponse {
            url: url.to_string(),
            response,
        })
    }

    /// Get page content as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url).await?.text().await
    }
}
