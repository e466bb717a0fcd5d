//! Page fetchers and image acquisition.
//!
//! A [`Fetcher`] loads a page exactly once and reports the image URLs and
//! visible text of the elements matched by a list of CSS selectors. Two
//! implementations exist:
//!
//! - [`HttpFetcher`]: plain HTTP GET, parses the server-delivered HTML
//! - [`BrowserFetcher`]: renders the page in headless Chromium first

pub mod browser;
mod collector;
mod error;
mod http_client;
pub mod images;
mod static_html;

pub use browser::{BrowserEngineConfig, BrowserFetcher};
pub use collector::{ScrapeCollector, LAZY_ATTR, NESTED_IMAGE_SELECTOR, PRIMARY_ATTR};
pub use error::FetchError;
pub use http_client::{HttpClient, HttpResponse, USER_AGENT};
pub use static_html::{collect_from_html, HttpFetcher};

use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tracing::debug;

/// Data extracted from a page via selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeResult {
    /// Deduplicated absolute image URLs, in discovery order.
    pub img_urls: Vec<String>,
    /// Visible text of matched elements, one block per element, joined by
    /// newlines.
    pub element_text: String,
}

/// A page loading strategy.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Timeout applied to page loads and image downloads.
    fn timeout(&self) -> Duration;

    /// HTTP client used for image downloads.
    fn http(&self) -> &HttpClient;

    /// Load `url` once and collect image URLs and element text for
    /// `selectors`.
    async fn scrape(&self, url: &str, selectors: &[String]) -> Result<ScrapeResult, FetchError>;

    /// Download and decode one image. Non-success statuses are errors.
    async fn fetch_image(&self, url: &str) -> Result<DynamicImage, FetchError> {
        images::fetch_image(self.http(), url).await
    }

    /// Download each URL in order, skipping any that fail.
    async fn fetch_images(&self, urls: &[String]) -> Vec<DynamicImage> {
        debug!("Fetching {} image(s)", urls.len());
        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            match self.fetch_image(url).await {
                Ok(image) => fetched.push(image),
                Err(e) => debug!("Failed to fetch image at {}: {}", url, e),
            }
        }
        debug!(
            "Successfully fetched {}/{} image(s)",
            fetched.len(),
            urls.len()
        );
        fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves images from a fixed table and records every request.
    struct TableFetcher {
        http: HttpClient,
        requested: Mutex<Vec<String>>,
    }

    impl TableFetcher {
        fn new() -> Self {
            Self {
                http: HttpClient::new(Duration::from_secs(1)).unwrap(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Fetcher for TableFetcher {
        fn name(&self) -> &'static str {
            "table"
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn http(&self) -> &HttpClient {
            &self.http
        }

        async fn scrape(&self, _url: &str, _selectors: &[String]) -> Result<ScrapeResult, FetchError> {
            Ok(ScrapeResult::default())
        }

        async fn fetch_image(&self, url: &str) -> Result<DynamicImage, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            match url.strip_prefix("ok:") {
                Some(width) => Ok(DynamicImage::new_rgb8(width.parse().unwrap(), 1)),
                None => Err(FetchError::Browser(format!("no such image {}", url))),
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_images_empty_makes_no_requests() {
        let fetcher = TableFetcher::new();
        let images = fetcher.fetch_images(&[]).await;
        assert!(images.is_empty());
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_images_skips_failures_in_order() {
        let fetcher = TableFetcher::new();
        let urls: Vec<String> = ["ok:1", "bad", "ok:2", "bad2", "ok:3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let images = fetcher.fetch_images(&urls).await;
        let widths: Vec<u32> = images.iter().map(|i| i.width()).collect();
        assert_eq!(widths, [1, 2, 3]);
        assert_eq!(*fetcher.requested.lock().unwrap(), urls);
    }

    #[test]
    fn test_scrape_results_are_independent() {
        let mut a = ScrapeResult::default();
        let b = ScrapeResult::default();
        a.img_urls.push("https://example.com/a.png".to_string());
        assert!(b.img_urls.is_empty());
        assert_eq!(b.element_text, "");
    }
}
