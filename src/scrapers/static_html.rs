//! Fetcher that reads server-delivered HTML only (no JavaScript).

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::collector::{ScrapeCollector, LAZY_ATTR, NESTED_IMAGE_SELECTOR, PRIMARY_ATTR};
use super::{FetchError, Fetcher, HttpClient, ScrapeResult};

/// Fetch pages with a plain HTTP GET and query the static DOM.
pub struct HttpFetcher {
    client: HttpClient,
}

impl HttpFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn timeout(&self) -> Duration {
        self.client.timeout()
    }

    fn http(&self) -> &HttpClient {
        &self.client
    }

    async fn scrape(&self, url: &str, selectors: &[String]) -> Result<ScrapeResult, FetchError> {
        debug!(
            "Fetching page {} via HTTP (timeout={:?})",
            url,
            self.client.timeout()
        );
        let html = self.client.get_text(url).await?;
        debug!("Got {} chars of HTML", html.len());
        let result = collect_from_html(&html, url, selectors)?;
        debug!(
            "HTTP scrape complete: {} image(s), {} chars of text",
            result.img_urls.len(),
            result.element_text.len()
        );
        Ok(result)
    }
}

fn parse_selector(selector: &str) -> Result<Selector, FetchError> {
    Selector::parse(selector).map_err(|e| FetchError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Visible text of an element: its text nodes trimmed, blanks dropped,
/// joined with single spaces.
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `selectors` against an HTML document and collect image URLs and
/// element text.
///
/// For every match (selector order, then document order) the element's own
/// image attribute is recorded first, then any nested `<img>` descendants,
/// then its text.
pub fn collect_from_html(
    html: &str,
    page_url: &str,
    selectors: &[String],
) -> Result<ScrapeResult, FetchError> {
    let mut collector = ScrapeCollector::new(page_url)?;
    let document = Html::parse_document(html);
    let nested_selector = parse_selector(NESTED_IMAGE_SELECTOR)?;

    for selector_str in selectors {
        let selector = parse_selector(selector_str)?;
        let nested_label = format!("{} {}", selector_str, NESTED_IMAGE_SELECTOR);

        for element in document.select(&selector) {
            let attrs = element.value();
            collector.record_image(attrs.attr(PRIMARY_ATTR), attrs.attr(LAZY_ATTR), selector_str);

            // `select` on an element also visits the element itself
            for nested in element
                .select(&nested_selector)
                .filter(|n| n.id() != element.id())
            {
                let attrs = nested.value();
                collector.record_image(attrs.attr(PRIMARY_ATTR), attrs.attr(LAZY_ATTR), &nested_label);
            }

            collector.push_text(&element_text(&element), selector_str);
        }
    }

    Ok(collector.finish())
}
