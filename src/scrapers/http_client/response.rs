//! HTTP response wrapper.

use reqwest::Response;

use super::super::FetchError;

/// A successful HTTP response whose body has not been read yet.
pub struct HttpResponse {
    pub url: String,
    pub(crate) response: Response,
}

impl HttpResponse {
    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Get response body as bytes.
    pub async fn bytes(self) -> Result<Vec<u8>, FetchError> {
        let url = self.url;
        self.response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::request(&url, e))
    }

    /// Get response body as text, decoded using the response charset.
    pub async fn text(self) -> Result<String, FetchError> {
        let url = self.url;
        self.response
            .text()
            .await
            .map_err(|e| FetchError::request(&url, e))
    }
}
