//! Image URL and text accumulation shared by every fetcher.
//!
//! Both backends walk matched elements the same way and funnel what they
//! find through [`ScrapeCollector`], so URL resolution, attribute fallback
//! and deduplication behave identically regardless of how the DOM was
//! obtained.

use std::collections::HashSet;

use tracing::debug;
use url::Url;

use super::{FetchError, ScrapeResult};

/// Attribute holding an element's image source.
pub const PRIMARY_ATTR: &str = "src";
/// Attribute used by lazy-loading scripts before `src` is populated.
pub const LAZY_ATTR: &str = "data-src";
/// Selector for image elements nested inside a match.
pub const NESTED_IMAGE_SELECTOR: &str = "img";

/// Accumulates image URLs and text blocks during a single scrape.
#[derive(Debug)]
pub struct ScrapeCollector {
    base: Url,
    seen_urls: HashSet<String>,
    img_urls: Vec<String>,
    text_parts: Vec<String>,
}

impl ScrapeCollector {
    /// Start collecting for the page at `page_url`.
    pub fn new(page_url: &str) -> Result<Self, FetchError> {
        let base = Url::parse(page_url).map_err(|source| FetchError::InvalidUrl {
            url: page_url.to_string(),
            source,
        })?;
        Ok(Self {
            base,
            seen_urls: HashSet::new(),
            img_urls: Vec::new(),
            text_parts: Vec::new(),
        })
    }

    /// Record the image referenced by an element, if any.
    ///
    /// `primary` wins unless it is missing or empty, in which case `lazy`
    /// is used. The value is resolved against the page URL and appended
    /// only the first time it is seen.
    pub fn record_image(&mut self, primary: Option<&str>, lazy: Option<&str>, selector: &str) {
        let Some(raw) = primary
            .filter(|s| !s.is_empty())
            .or(lazy.filter(|s| !s.is_empty()))
        else {
            debug!(
                "Element matching selector '{}' has no {} or {} attribute, skipping",
                selector, PRIMARY_ATTR, LAZY_ATTR
            );
            return;
        };

        let resolved = match self.base.join(raw) {
            Ok(u) => u.to_string(),
            Err(e) => {
                debug!("Could not resolve image URL '{}' against {}: {}", raw, self.base, e);
                return;
            }
        };

        if self.seen_urls.insert(resolved.clone()) {
            debug!("Found image URL: {}", resolved);
            self.img_urls.push(resolved);
        }
    }

    /// Append a text block. Blank blocks are dropped.
    pub fn push_text(&mut self, text: &str, selector: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        debug!(
            "Extracted text from selector '{}': {}...",
            selector,
            text.chars().take(80).collect::<String>()
        );
        self.text_parts.push(text.to_string());
    }

    pub fn finish(self) -> ScrapeResult {
        ScrapeResult {
            img_urls: self.img_urls,
            element_text: self.text_parts.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_relative_urls() {
        let mut c = ScrapeCollector::new("https://example.com/news/today.html").unwrap();
        c.record_image(Some("/a.png"), None, "img");
        c.record_image(Some("b.png"), None, "img");
        c.record_image(Some("https://cdn.example.net/c.png"), None, "img");
        let result = c.finish();
        assert_eq!(
            result.img_urls,
            [
                "https://example.com/a.png",
                "https://example.com/news/b.png",
                "https://cdn.example.net/c.png",
            ]
        );
    }

    #[test]
    fn test_lazy_attribute_fallback() {
        let mut c = ScrapeCollector::new("https://example.com/").unwrap();
        c.record_image(None, Some("lazy.png"), "img");
        c.record_image(Some(""), Some("empty-src.png"), "img");
        c.record_image(None, None, "div");
        c.record_image(Some(""), Some(""), "div");
        let result = c.finish();
        assert_eq!(
            result.img_urls,
            [
                "https://example.com/lazy.png",
                "https://example.com/empty-src.png"
            ]
        );
    }

    #[test]
    fn test_primary_beats_lazy() {
        let mut c = ScrapeCollector::new("https://example.com/").unwrap();
        c.record_image(Some("real.png"), Some("placeholder.png"), "img");
        assert_eq!(c.finish().img_urls, ["https://example.com/real.png"]);
    }

    #[test]
    fn test_dedup_keeps_first_position() {
        let mut c = ScrapeCollector::new("https://example.com/").unwrap();
        c.record_image(Some("/one.png"), None, "a");
        c.record_image(Some("/two.png"), None, "a");
        c.record_image(Some("https://example.com/one.png"), None, "b");
        assert_eq!(
            c.finish().img_urls,
            ["https://example.com/one.png", "https://example.com/two.png"]
        );
    }

    #[test]
    fn test_text_blocks_skip_blank() {
        let mut c = ScrapeCollector::new("https://example.com/").unwrap();
        c.push_text("  First  ", "p");
        c.push_text("   ", "p");
        c.push_text("Second", "p");
        let result = c.finish();
        assert!(result.img_urls.is_empty());
        assert_eq!(result.element_text, "First\nSecond");
    }

    #[test]
    fn test_invalid_page_url() {
        let err = ScrapeCollector::new("not a url").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
