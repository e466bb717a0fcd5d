//! `image-to-text`: OCR a local image file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::config::Settings;
use crate::extract::Extractor;
use crate::scrapers::images::load_image_from_path;

#[derive(Args, Debug)]
pub struct ImageToTextArgs {
    /// Image file (PNG, JPEG, SVG, ...)
    #[arg(short, long)]
    pub path: PathBuf,
}

pub async fn cmd_image_to_text(settings: &Settings, args: ImageToTextArgs) -> anyhow::Result<()> {
    let image = load_image_from_path(&args.path)
        .with_context(|| format!("Failed to open image {}", args.path.display()))?;

    let text = Extractor::from_settings(settings)
        .image_to_text(image)
        .await
        .with_context(|| format!("Failed to OCR {}", args.path.display()))?;
    println!("{}", text);
    Ok(())
}
