//! Text extraction pipeline: fetch, OCR, merge, and escalate.
//!
//! Direct-image mode (no selectors) OCRs the URL itself. Selector mode
//! scrapes the page, OCRs every image the selectors found, appends the
//! matched elements' text, and retries once in the browser when the plain
//! HTTP attempt found nothing and fallback was requested.

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;
use crate::ocr::{ImageTextExtractor, OcrBackend, OcrError, TesseractBackend};
use crate::scrapers::{BrowserFetcher, FetchError, Fetcher, HttpClient, HttpFetcher};
use crate::utils::UniqueLines;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No images or text found matching selectors")]
    NothingMatched,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("OCR task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Page loading strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Plain HTTP GET of server-delivered HTML.
    #[default]
    Http,
    /// Headless browser rendering.
    Browser,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Http => "http",
            Backend::Browser => "browser",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One extraction job.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub url: String,
    /// CSS selectors. Empty means `url` is itself an image.
    pub selectors: Vec<String>,
    pub timeout: Duration,
    /// Extra wait after page load. Only the browser backend uses it.
    pub settle_delay: Duration,
    pub backend: Backend,
    /// Retry in the browser when the HTTP attempt finds nothing.
    pub fallback_to_browser: bool,
}

impl ExtractRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selectors: Vec::new(),
            timeout: Duration::from_secs_f64(crate::config::DEFAULT_TIMEOUT_SECS),
            settle_delay: Duration::ZERO,
            backend: Backend::Http,
            fallback_to_browser: false,
        }
    }

    /// Reject option combinations that cannot work. Runs before any I/O.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.timeout.is_zero() {
            return Err(ExtractError::Config("timeout must be positive".to_string()));
        }
        if self.fallback_to_browser && self.backend == Backend::Browser {
            return Err(ExtractError::Config(
                "fallback to browser cannot be combined with the browser backend".to_string(),
            ));
        }
        if !self.settle_delay.is_zero()
            && self.backend != Backend::Browser
            && !self.fallback_to_browser
        {
            return Err(ExtractError::Config(
                "a page wait requires the browser backend or fallback to browser".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds the fetcher for one attempt.
pub trait FetcherFactory: Send + Sync {
    fn create(
        &self,
        backend: Backend,
        timeout: Duration,
        settle_delay: Duration,
    ) -> Result<Box<dyn Fetcher>, FetchError>;
}

/// Builds real fetchers from [`Settings`].
pub struct DefaultFetcherFactory {
    settings: Settings,
}

impl DefaultFetcherFactory {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl FetcherFactory for DefaultFetcherFactory {
    fn create(
        &self,
        backend: Backend,
        timeout: Duration,
        settle_delay: Duration,
    ) -> Result<Box<dyn Fetcher>, FetchError> {
        let client = HttpClient::with_user_agent(timeout, self.settings.user_agent.as_deref())?;
        Ok(match backend {
            Backend::Http => Box::new(HttpFetcher::new(client)),
            Backend::Browser => Box::new(
                BrowserFetcher::new(client, self.settings.browser.clone(), settle_delay)
                    .with_user_agent(self.settings.user_agent.clone()),
            ),
        })
    }
}

/// Runs extraction requests.
pub struct Extractor {
    factory: Arc<dyn FetcherFactory>,
    ocr: ImageTextExtractor,
}

impl Extractor {
    pub fn new(factory: Arc<dyn FetcherFactory>, ocr: Arc<dyn OcrBackend>) -> Self {
        Self {
            factory,
            ocr: ImageTextExtractor::new(ocr),
        }
    }

    /// Real fetchers and Tesseract, configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let ocr = TesseractBackend::with_config(settings.ocr.clone());
        if !ocr.is_available() {
            tracing::warn!("{}", ocr.availability_hint());
        }
        Self::new(
            Arc::new(DefaultFetcherFactory::new(settings.clone())),
            Arc::new(ocr),
        )
    }

    /// Extract text from a web resource.
    pub async fn web_to_text(&self, request: &ExtractRequest) -> Result<String, ExtractError> {
        request.validate()?;

        if request.selectors.is_empty() {
            return self.direct_image(request).await;
        }

        if let Some(text) = self.attempt(request, request.backend).await? {
            return Ok(text);
        }

        if request.fallback_to_browser && request.backend == Backend::Http {
            info!(
                "Nothing found via {}, falling back to browser for {}",
                request.backend, request.url
            );
            if let Some(text) = self.attempt(request, Backend::Browser).await? {
                return Ok(text);
            }
        }

        Err(ExtractError::NothingMatched)
    }

    /// OCR an already decoded image.
    pub async fn image_to_text(&self, image: DynamicImage) -> Result<String, ExtractError> {
        let lines = self.ocr_images(vec![image]).await?;
        Ok(lines.join())
    }

    async fn direct_image(&self, request: &ExtractRequest) -> Result<String, ExtractError> {
        debug!("No selectors given, treating {} as an image", request.url);
        let fetcher = self.fetcher_for(request, request.backend)?;
        let image = fetcher.fetch_image(&request.url).await?;
        self.image_to_text(image).await
    }

    /// One selector-mode attempt. `Ok(None)` means nothing was found.
    async fn attempt(
        &self,
        request: &ExtractRequest,
        backend: Backend,
    ) -> Result<Option<String>, ExtractError> {
        let fetcher = self.fetcher_for(request, backend)?;
        debug!("Scraping {} with {} backend", request.url, fetcher.name());
        let scraped = fetcher.scrape(&request.url, &request.selectors).await?;
        let images = fetcher.fetch_images(&scraped.img_urls).await;

        let mut blocks = Vec::with_capacity(2);
        if !images.is_empty() {
            let lines = self.ocr_images(images).await?;
            if !lines.is_empty() {
                blocks.push(lines.join());
            }
        }
        let element_text = scraped.element_text.trim();
        if !element_text.is_empty() {
            blocks.push(element_text.to_string());
        }

        if blocks.is_empty() {
            debug!("{} backend found nothing at {}", backend, request.url);
            return Ok(None);
        }
        Ok(Some(blocks.join("\n")))
    }

    fn fetcher_for(
        &self,
        request: &ExtractRequest,
        backend: Backend,
    ) -> Result<Box<dyn Fetcher>, ExtractError> {
        let settle_delay = match backend {
            Backend::Browser => request.settle_delay,
            Backend::Http => Duration::ZERO,
        };
        Ok(self
            .factory
            .create(backend, request.timeout, settle_delay)?)
    }

    /// OCR images in order into one shared line set, off the async worker.
    async fn ocr_images(&self, images: Vec<DynamicImage>) -> Result<UniqueLines, ExtractError> {
        let ocr = self.ocr.clone();
        let lines = tokio::task::spawn_blocking(move || {
            let mut lines = UniqueLines::new();
            for image in &images {
                ocr.collect_lines(image, &mut lines)?;
            }
            Ok::<_, OcrError>(lines)
        })
        .await??;
        Ok(lines)
    }
}
