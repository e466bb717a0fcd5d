//! One browser process (or remote connection) plus one page, held for the
//! duration of a single scrape.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::BrowserEngineConfig;
use crate::scrapers::FetchError;

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Locate a Chrome executable: configured path, well-known locations, then `PATH`.
pub(crate) fn find_chrome(configured: Option<&PathBuf>) -> Result<PathBuf, FetchError> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(FetchError::Browser(format!(
            "configured chrome_path {} does not exist",
            path.display()
        )));
    }

    for path in CHROME_PATHS {
        let p = std::path::Path::new(path);
        if p.exists() {
            debug!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in CHROME_COMMANDS {
        if let Ok(path) = which::which(cmd) {
            debug!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(FetchError::Browser(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or set browser.chrome_path in the config file"
            .to_string(),
    ))
}

fn cdp_error(context: &str, e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(format!("{}: {}", context, e))
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

/// A browser plus a blank page.
///
/// Always finish with [`BrowserSession::close`]. If the session is dropped
/// without closing (a panic mid-scrape), the CDP handler task is aborted and
/// `chromiumoxide` kills the launched child process.
pub struct BrowserSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    launched: bool,
}

impl BrowserSession {
    /// Launch (or connect to) a browser and open a blank page.
    pub async fn open(config: &BrowserEngineConfig, timeout: Duration) -> Result<Self, FetchError> {
        let (browser, handler, launched) = match config.remote_url.as_deref() {
            Some(remote_url) => {
                let (browser, handler) = connect_remote(remote_url, timeout).await?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) = launch(config, timeout).await?;
                (browser, handler, true)
            }
        };

        let handler = spawn_handler(handler);
        let mut session = Self {
            browser,
            page: None,
            handler,
            launched,
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => {
                session.page = Some(page);
                Ok(session)
            }
            Err(e) => {
                session.close().await;
                Err(cdp_error("Failed to open page", e))
            }
        }
    }

    pub fn page(&self) -> Result<&Page, FetchError> {
        self.page
            .as_ref()
            .ok_or_else(|| FetchError::Browser("browser page is not open".to_string()))
    }

    /// Release the session. A launched browser is closed and its process
    /// reaped; a remote browser only loses the page we opened.
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if !self.launched {
                if let Err(e) = page.close().await {
                    warn!("Failed to close remote page: {}", e);
                }
            }
        }

        if self.launched {
            if let Err(e) = self.browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            match self.browser.wait().await {
                Ok(status) => debug!("Browser exited: {:?}", status),
                Err(e) => warn!("Failed to wait for browser exit: {}", e),
            }
        }
        // handler is aborted on drop
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

async fn launch(
    config: &BrowserEngineConfig,
    timeout: Duration,
) -> Result<(Browser, Handler), FetchError> {
    let chrome_path = find_chrome(config.chrome_path.as_ref())?;
    info!(
        "Launching browser {} (headless={})",
        chrome_path.display(),
        config.headless
    );

    let mut builder = BrowserConfig::builder()
        .chrome_executable(chrome_path)
        .request_timeout(timeout);

    // with_head means NOT headless
    if !config.headless {
        builder = builder.with_head();
    }

    if let Some(proxy) = config.effective_proxy() {
        debug!("Using browser proxy {}", proxy);
        builder = builder.arg(format!("--proxy-server={}", proxy));
    }

    builder = builder
        .arg("--disable-dev-shm-usage")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .arg("--no-sandbox")
        .arg("--disable-gpu")
        .arg("--disable-software-rasterizer");

    for arg in &config.chrome_args {
        builder = builder.arg(arg.as_str());
    }

    let browser_config = builder
        .build()
        .map_err(|e| cdp_error("Failed to build browser config", e))?;

    Browser::launch(browser_config)
        .await
        .map_err(|e| cdp_error("Failed to launch browser", e))
}

/// Connect to a remote Chrome instance via its `/json/version` endpoint.
async fn connect_remote(url: &str, timeout: Duration) -> Result<(Browser, Handler), FetchError> {
    info!("Connecting to remote browser at {}", url);

    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(FetchError::Client)?;
    let resp: serde_json::Value = client
        .get(&version_url)
        .send()
        .await
        .map_err(|e| FetchError::request(&version_url, e))?
        .json()
        .await
        .map_err(|e| FetchError::request(&version_url, e))?;

    let ws_url = resp
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| FetchError::Browser("No webSocketDebuggerUrl in response".to_string()))?;

    debug!("Connecting to WebSocket: {}", ws_url);
    Browser::connect(ws_url)
        .await
        .map_err(|e| cdp_error("Failed to connect to remote browser", e))
}
