//! `web-to-text`: extract text from a page or a direct image link.

use std::time::Duration;

use anyhow::Context;
use clap::Args;

use crate::config::Settings;
use crate::extract::{Backend, ExtractRequest, Extractor};

#[derive(Args, Debug)]
pub struct WebToTextArgs {
    /// Page or image URL
    #[arg(short, long)]
    pub url: String,

    /// CSS selector for elements to read (repeatable). Without one, the URL
    /// is treated as an image.
    #[arg(short = 's', long = "selector")]
    pub selectors: Vec<String>,

    /// Request timeout in seconds, fractions allowed (default: from config, 30)
    #[arg(short = 'T', long, value_parser = parse_seconds)]
    pub timeout: Option<Duration>,

    /// Seconds to wait after the page loads before reading it (browser only)
    #[arg(long, default_value = "0", value_parser = parse_seconds)]
    pub page_wait_for_timeout: Duration,

    /// Render the page in a headless browser
    #[arg(long, conflicts_with = "fallback_to_browser")]
    pub browser: bool,

    /// Retry in a headless browser when plain HTTP finds nothing
    #[arg(short = 'F', long)]
    pub fallback_to_browser: bool,

    /// User agent for page and image requests
    #[arg(long)]
    pub user_agent: Option<String>,
}

/// Parse a non-negative number of seconds, fractions allowed.
fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("'{}' must be zero or more seconds", value))
}

impl WebToTextArgs {
    fn to_request(&self, settings: &Settings) -> ExtractRequest {
        ExtractRequest {
            url: self.url.clone(),
            selectors: self.selectors.clone(),
            timeout: self.timeout.unwrap_or_else(|| settings.timeout()),
            settle_delay: self.page_wait_for_timeout,
            backend: if self.browser {
                Backend::Browser
            } else {
                Backend::Http
            },
            fallback_to_browser: self.fallback_to_browser,
        }
    }
}

pub async fn cmd_web_to_text(mut settings: Settings, args: WebToTextArgs) -> anyhow::Result<()> {
    if let Some(ref ua) = args.user_agent {
        settings.user_agent = Some(ua.clone());
    }
    let request = args.to_request(&settings);
    let extractor = Extractor::from_settings(&settings);

    let text = extractor
        .web_to_text(&request)
        .await
        .with_context(|| format!("Failed to extract text from {}", request.url))?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> WebToTextArgs {
        WebToTextArgs {
            url: "https://example.com".to_string(),
            selectors: vec!["p".to_string()],
            timeout: None,
            page_wait_for_timeout: Duration::ZERO,
            browser: false,
            fallback_to_browser: false,
            user_agent: None,
        }
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_seconds("2").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_seconds("0.25").unwrap(), Duration::from_millis(250));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let request = WebToTextArgs {
            timeout: Some(Duration::ZERO),
            ..args()
        }
        .to_request(&Settings::default());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_timeout_defaults_to_settings() {
        let settings = Settings {
            timeout_secs: 45.0,
            ..Default::default()
        };
        let request = args().to_request(&settings);
        assert_eq!(request.timeout, Duration::from_secs(45));
        assert_eq!(request.backend, Backend::Http);

        let request = WebToTextArgs {
            timeout: Some(Duration::from_millis(2500)),
            browser: true,
            ..args()
        }
        .to_request(&settings);
        assert_eq!(request.timeout, Duration::from_millis(2500));
        assert_eq!(request.backend, Backend::Browser);
    }
}
