//! Fetcher that renders pages in headless Chromium before querying them.
//!
//! Uses chromiumoxide (CDP). Each `scrape` launches its own browser session
//! and releases it before returning, whatever the outcome.

mod config;
#[cfg(feature = "browser")]
mod session;

pub use config::{default_headless, BrowserEngineConfig};
#[cfg(feature = "browser")]
pub use session::BrowserSession;

use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info};

use super::{FetchError, Fetcher, HttpClient, ScrapeResult};

#[cfg(feature = "browser")]
use super::collector::{ScrapeCollector, LAZY_ATTR, NESTED_IMAGE_SELECTOR, PRIMARY_ATTR};
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
#[cfg(feature = "browser")]
use chromiumoxide::error::CdpError;
#[cfg(feature = "browser")]
use chromiumoxide::Page;
#[cfg(feature = "browser")]
use futures::{FutureExt, StreamExt};

/// Longest wait for the main document's response event once navigation
/// has completed.
#[cfg(feature = "browser")]
const RESPONSE_GRACE: Duration = Duration::from_millis(500);

/// Browser-backed fetcher.
pub struct BrowserFetcher {
    client: HttpClient,
    config: BrowserEngineConfig,
    settle_delay: Duration,
    user_agent: Option<String>,
}

impl BrowserFetcher {
    /// Create a fetcher. `client` carries the timeout and is used for image
    /// downloads; `settle_delay` is waited once after the page has loaded.
    pub fn new(client: HttpClient, config: BrowserEngineConfig, settle_delay: Duration) -> Self {
        Self {
            client,
            config,
            settle_delay,
            user_agent: None,
        }
    }

    /// Override the browser's user agent for page loads.
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    fn timeout_ms(&self) -> u64 {
        self.client.timeout().as_millis() as u64
    }
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    /// Everything that happens while the page is held. Kept separate so the
    /// caller can always close the session afterwards.
    async fn scrape_inner(
        &self,
        page: &Page,
        url: &str,
        selectors: &[String],
    ) -> Result<ScrapeResult, FetchError> {
        let mut collector = ScrapeCollector::new(url)?;

        if let Some(ref user_agent) = self.user_agent {
            page.set_user_agent(user_agent.as_str())
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        self.navigate(page, url).await?;

        if !self.settle_delay.is_zero() {
            debug!("Waiting {:?} for page to settle", self.settle_delay);
            tokio::time::sleep(self.settle_delay).await;
        }

        let nested_label_suffix = format!(" {}", NESTED_IMAGE_SELECTOR);
        for selector in selectors {
            let elements = page
                .find_elements(selector.as_str())
                .await
                .map_err(|e| selector_err(selector, e))?;
            debug!("Selector '{}' matched {} element(s)", selector, elements.len());

            for element in elements {
                let primary = element.attribute(PRIMARY_ATTR).await.map_err(browser_err)?;
                let lazy = element.attribute(LAZY_ATTR).await.map_err(browser_err)?;
                collector.record_image(primary.as_deref(), lazy.as_deref(), selector);

                // find_elements on an element only searches its descendants
                let nested = element
                    .find_elements(NESTED_IMAGE_SELECTOR)
                    .await
                    .map_err(browser_err)?;
                let nested_label = format!("{}{}", selector, nested_label_suffix);
                for img in nested {
                    let primary = img.attribute(PRIMARY_ATTR).await.map_err(browser_err)?;
                    let lazy = img.attribute(LAZY_ATTR).await.map_err(browser_err)?;
                    collector.record_image(primary.as_deref(), lazy.as_deref(), &nested_label);
                }

                let text = element.inner_text().await.map_err(browser_err)?;
                collector.push_text(text.as_deref().unwrap_or_default(), selector);
            }
        }

        Ok(collector.finish())
    }

    /// Navigate and wait for the load event, then check the main document's
    /// response status.
    async fn navigate(&self, page: &Page, url: &str) -> Result<(), FetchError> {
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(browser_err)?;

        let timeout = self.client.timeout();
        debug!("Navigating to {} (timeout={}ms)", url, self.timeout_ms());
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(CdpError::Timeout)) | Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout_ms(),
                })
            }
            Ok(Err(e)) => {
                return Err(FetchError::Browser(format!(
                    "Navigation to {} failed: {}",
                    url, e
                )))
            }
        }

        // Network.responseReceived for the document precedes the load event
        // that ends `goto`, so it is normally queued already. The handler task
        // forwards events asynchronously, so allow a short wait if it is not.
        let main_frame = page.mainframe().await.map_err(browser_err)?;
        let mut document = None;
        let deadline = tokio::time::Instant::now() + RESPONSE_GRACE;
        loop {
            let next = match responses.next().now_or_never() {
                Some(event) => event,
                None if document.is_none() => {
                    tokio::time::timeout_at(deadline, responses.next())
                        .await
                        .ok()
                        .flatten()
                }
                None => None,
            };
            let Some(event) = next else {
                break;
            };
            let is_main = match (&main_frame, &event.frame_id) {
                (Some(main), Some(frame)) => main == frame,
                (None, _) => true,
                (Some(_), None) => false,
            };
            if is_main && event.r#type == ResourceType::Document {
                document = Some(event);
            }
        }

        match document {
            Some(event) => {
                debug!("Main document status {} for {}", event.response.status, url);
                check_document_status(url, event.response.status, &event.response.status_text)
            }
            None => {
                debug!("No main document response observed for {}", url);
                Ok(())
            }
        }
    }
}

/// Status `0` (non-HTTP schemes such as `data:`) and 2xx are success.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
fn check_document_status(url: &str, status: i64, status_text: &str) -> Result<(), FetchError> {
    if status == 0 || (200..=299).contains(&status) {
        return Ok(());
    }
    Err(FetchError::Navigation {
        url: url.to_string(),
        status,
        status_text: status_text.to_string(),
    })
}

/// Protocol errors returned by the browser while querying mean the selector
/// was rejected. Anything else is a transport or session failure.
#[cfg(feature = "browser")]
fn selector_err(selector: &str, e: CdpError) -> FetchError {
    match e {
        CdpError::Chrome(err) => FetchError::InvalidSelector {
            selector: selector.to_string(),
            reason: err.to_string(),
        },
        other => browser_err(other),
    }
}

#[cfg(feature = "browser")]
fn browser_err(e: CdpError) -> FetchError {
    FetchError::Browser(e.to_string())
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn timeout(&self) -> Duration {
        self.client.timeout()
    }

    fn http(&self) -> &HttpClient {
        &self.client
    }

    #[cfg(feature = "browser")]
    async fn scrape(&self, url: &str, selectors: &[String]) -> Result<ScrapeResult, FetchError> {
        info!("Rendering {} in browser", url);
        let session = BrowserSession::open(&self.config, self.client.timeout()).await?;

        let result = match session.page() {
            Ok(page) => self.scrape_inner(page, url, selectors).await,
            Err(e) => Err(e),
        };
        session.close().await;

        if let Ok(ref r) = result {
            debug!(
                "Browser scrape complete: {} image(s), {} chars of text",
                r.img_urls.len(),
                r.element_text.len()
            );
        }
        result
    }

    #[cfg(not(feature = "browser"))]
    async fn scrape(&self, _url: &str, _selectors: &[String]) -> Result<ScrapeResult, FetchError> {
        Err(FetchError::Browser(
            "Browser support not compiled in. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(timeout_secs: u64, settle: Duration) -> BrowserFetcher {
        let client = HttpClient::new(Duration::from_secs(timeout_secs)).unwrap();
        BrowserFetcher::new(client, BrowserEngineConfig::default(), settle)
    }

    #[test]
    fn test_timeout_in_milliseconds() {
        let f = fetcher(7, Duration::ZERO);
        assert_eq!(f.timeout_ms(), 7000);
        assert_eq!(f.timeout(), Duration::from_secs(7));
        assert_eq!(f.name(), "browser");
    }

    #[test]
    fn test_settle_delay_kept() {
        let f = fetcher(30, Duration::from_millis(1500));
        assert_eq!(f.settle_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_document_status_success() {
        for status in [0, 200, 204, 299] {
            assert!(check_document_status("https://example.com", status, "").is_ok());
        }
    }

    #[test]
    fn test_document_status_failure() {
        for (status, text) in [(404, "Not Found"), (500, "Internal Server Error"), (301, "")] {
            match check_document_status("https://example.com/x", status, text) {
                Err(FetchError::Navigation {
                    url,
                    status: got,
                    status_text,
                }) => {
                    assert_eq!(url, "https://example.com/x");
                    assert_eq!(got, status);
                    assert_eq!(status_text, text);
                }
                other => panic!("expected navigation error for {}, got {:?}", status, other),
            }
        }
    }

    #[cfg(feature = "browser")]
    #[test]
    fn test_selector_err_keeps_transport_failures() {
        let err = selector_err("p", CdpError::Timeout);
        assert!(matches!(err, FetchError::Browser(_)));
    }

    #[cfg(feature = "browser")]
    #[tokio::test]
    #[ignore = "requires a local Chrome/Chromium"]
    async fn test_invalid_selector_releases_session() {
        let url = "data:text/html,<p>hello</p>";
        let f = fetcher(30, Duration::ZERO);
        let result = tokio::time::timeout(
            Duration::from_secs(60),
            f.scrape(url, &["p[".to_string()]),
        )
        .await
        .expect("scrape returned after closing the session");
        match result {
            Err(FetchError::InvalidSelector { selector, .. }) => assert_eq!(selector, "p["),
            other => panic!("expected invalid selector, got {:?}", other),
        }
    }

    #[cfg(feature = "browser")]
    #[tokio::test]
    #[ignore = "requires a local Chrome/Chromium"]
    async fn test_scrape_renders_script_output() {
        let html = "<html><body><div id='out'></div><script>\
            document.getElementById('out').innerHTML = \
            '<img src=\"https://example.com/x.png\"><p>Rendered</p>';\
            </script></body></html>";
        let url = format!("data:text/html,{}", html);
        let f = fetcher(30, Duration::ZERO);
        let result = f.scrape(&url, &["#out".to_string()]).await.unwrap();
        assert_eq!(result.img_urls, ["https://example.com/x.png"]);
        assert_eq!(result.element_text, "Rendered");
    }
}
