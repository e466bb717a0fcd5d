//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod image_to_text;
mod web_to_text;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

pub use image_to_text::ImageToTextArgs;
pub use web_to_text::WebToTextArgs;

#[derive(Parser, Debug)]
#[command(name = "wuzup")]
#[command(about = "Extract text from web pages and images, OCR included")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging for wuzup
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable debug logging for wuzup and every library it uses
    #[arg(long, global = true)]
    pub debug_all: bool,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug_all {
            "debug"
        } else if self.debug {
            "wuzup=debug"
        } else {
            "wuzup=info"
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract text (OCR included) from a web page or a direct image link
    #[command(name = "web-to-text", visible_aliases = ["w2t", "wtt"])]
    WebToText(WebToTextArgs),

    /// OCR a local image file
    #[command(name = "image-to-text", visible_alias = "i2t")]
    ImageToText(ImageToTextArgs),
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::WebToText(args) => web_to_text::cmd_web_to_text(settings, args).await,
        Commands::ImageToText(args) => image_to_text::cmd_image_to_text(&settings, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_web_to_text_args() {
        let cli = Cli::try_parse_from([
            "wuzup",
            "web-to-text",
            "-u",
            "https://example.com",
            "-s",
            ".headline",
            "--selector",
            "img.banner",
            "-T",
            "10",
            "-F",
            "--page-wait-for-timeout",
            "1.5",
        ])
        .unwrap();
        let Commands::WebToText(args) = cli.command else {
            panic!("expected web-to-text");
        };
        assert_eq!(args.url, "https://example.com");
        assert_eq!(args.selectors, [".headline", "img.banner"]);
        assert_eq!(args.timeout, Some(Duration::from_secs(10)));
        assert!(args.fallback_to_browser);
        assert!(!args.browser);
        assert_eq!(args.page_wait_for_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_aliases() {
        for alias in ["w2t", "wtt"] {
            let cli = Cli::try_parse_from(["wuzup", alias, "--url", "https://x.test/a.png"]).unwrap();
            assert!(matches!(cli.command, Commands::WebToText(_)));
        }
        let cli = Cli::try_parse_from(["wuzup", "i2t", "-p", "pic.png"]).unwrap();
        let Commands::ImageToText(args) = cli.command else {
            panic!("expected image-to-text");
        };
        assert_eq!(args.path, PathBuf::from("pic.png"));
    }

    #[test]
    fn test_browser_and_fallback_conflict() {
        let err = Cli::try_parse_from([
            "wuzup",
            "web-to-text",
            "-u",
            "https://example.com",
            "--browser",
            "--fallback-to-browser",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_url_is_required() {
        let err = Cli::try_parse_from(["wuzup", "web-to-text"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_fractional_timeout() {
        let cli =
            Cli::try_parse_from(["wuzup", "w2t", "-u", "https://example.com", "-T", "2.5"])
                .unwrap();
        let Commands::WebToText(args) = cli.command else {
            panic!("expected web-to-text");
        };
        assert_eq!(args.timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_negative_wait_rejected() {
        let err = Cli::try_parse_from([
            "wuzup",
            "w2t",
            "-u",
            "https://example.com",
            "--page-wait-for-timeout=-1",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_log_filter() {
        let cli = Cli::try_parse_from(["wuzup", "i2t", "-p", "a.png"]).unwrap();
        assert_eq!(cli.default_log_filter(), "wuzup=info");
        let cli = Cli::try_parse_from(["wuzup", "--debug", "i2t", "-p", "a.png"]).unwrap();
        assert_eq!(cli.default_log_filter(), "wuzup=debug");
        let cli = Cli::try_parse_from(["wuzup", "i2t", "-p", "a.png", "--debug-all"]).unwrap();
        assert_eq!(cli.default_log_filter(), "debug");
    }
}
