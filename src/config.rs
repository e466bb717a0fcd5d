//! Configuration management for wuzup.
//!
//! Settings come from an optional TOML file, then environment overrides,
//! then command-line flags (applied by the CLI).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::OcrConfig;
use crate::scrapers::BrowserEngineConfig;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "WUZUP_CONFIG";
/// Environment variable overriding the HTTP user agent.
pub const USER_AGENT_ENV: &str = "WUZUP_USER_AGENT";
/// Environment variable overriding the tesseract binary.
pub const TESSERACT_ENV: &str = "WUZUP_TESSERACT";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Request and navigation timeout in seconds. Fractions allowed.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    /// User agent for HTTP requests and browser pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    /// File these settings were read from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            ocr: OcrConfig::default(),
            browser: BrowserEngineConfig::default(),
            source_path: None,
        }
    }
}

impl Settings {
    /// The configured timeout. Negative or non-finite values come back as
    /// zero so request validation rejects them.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::ZERO)
    }

    /// Load settings, discovering the config file and applying environment
    /// overrides.
    ///
    /// Discovery order: `explicit`, then `$WUZUP_CONFIG`, then
    /// `<config_dir>/wuzup/config.toml`. A missing discovered file means
    /// defaults; a missing explicit file is an error.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match explicit {
            Some(path) => Self::load_from_path(path).await?,
            None => match discover_config_path(|key| std::env::var(key).ok()) {
                Some(path) if path.exists() => Self::load_from_path(&path).await?,
                Some(path) => {
                    tracing::debug!("No config file at {}, using defaults", path.display());
                    Self::default()
                }
                None => Self::default(),
            },
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load settings from a specific TOML file.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut settings: Settings =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!("Loaded config from {}", path.display());
        settings.source_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Apply `WUZUP_USER_AGENT` and `WUZUP_TESSERACT`. Empty values are
    /// ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ua) = lookup(USER_AGENT_ENV).filter(|s| !s.is_empty()) {
            tracing::debug!("Using {} from environment", USER_AGENT_ENV);
            self.user_agent = Some(ua);
        }
        if let Some(path) = lookup(TESSERACT_ENV).filter(|s| !s.is_empty()) {
            tracing::debug!("Using {} from environment: {}", TESSERACT_ENV, path);
            self.ocr.tesseract_path = Some(PathBuf::from(path));
        }
    }
}

/// Config file location when none is given on the command line.
fn discover_config_path(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(path) = lookup(CONFIG_ENV).filter(|s| !s.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("wuzup").join("config.toml"))
}
