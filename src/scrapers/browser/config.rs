//! Browser engine configuration types.
//!
//! These types live outside `#[cfg(feature = "browser")]` so that config
//! parsing works without the browser feature.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Set to false for debugging.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    /// Falls back to the `ALL_PROXY` / `all_proxy` environment variables.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Chrome/Chromium executable. Auto-detected when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,
}

pub fn default_headless() -> bool {
    true
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            proxy: None,
            chrome_path: None,
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Proxy to hand to the browser: the configured one, else `ALL_PROXY`,
    /// else `all_proxy`.
    pub fn effective_proxy(&self) -> Option<String> {
        self.proxy
            .clone()
            .or_else(|| proxy_from_env(|key| std::env::var(key).ok()))
    }
}

/// Read a proxy from `ALL_PROXY`, falling back to `all_proxy`.
/// Empty values count as unset.
pub(crate) fn proxy_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["ALL_PROXY", "all_proxy"]
        .into_iter()
        .filter_map(lookup)
        .find(|v| !v.is_empty())
}
