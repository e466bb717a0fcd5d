//! Image acquisition: download, SVG detection and decoding.

use std::path::Path;

use image::DynamicImage;
use resvg::{tiny_skia, usvg};
use tracing::debug;

use super::{FetchError, HttpClient};

/// How far into the body an `<svg` tag may appear after an XML declaration.
const SVG_SNIFF_LEN: usize = 1024;

/// Return `true` if `data` looks like an SVG document.
///
/// Leading whitespace is ignored. The body must either start with `<svg`
/// or start with an XML declaration followed by `<svg` within the first
/// 1024 bytes.
pub fn is_svg(data: &[u8]) -> bool {
    let header = &data[..data.len().min(SVG_SNIFF_LEN)];
    let header = header.trim_ascii_start();
    if header.starts_with(b"<svg") {
        return true;
    }
    header.starts_with(b"<?xml") && header.windows(4).any(|w| w == b"<svg")
}

/// Render SVG bytes to a bitmap at the document's intrinsic size.
pub fn rasterize_svg(data: &[u8]) -> Result<DynamicImage, FetchError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| FetchError::Svg(e.to_string()))?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        FetchError::Svg(format!(
            "invalid canvas size {}x{}",
            size.width(),
            size.height()
        ))
    })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let png = pixmap
        .encode_png()
        .map_err(|e| FetchError::Svg(e.to_string()))?;
    image::load_from_memory_with_format(&png, image::ImageFormat::Png)
        .map_err(|e| FetchError::Svg(e.to_string()))
}

/// Decode raw bytes into a bitmap, rasterizing SVG content first.
pub fn decode_image(data: &[u8], url: &str) -> Result<DynamicImage, FetchError> {
    if is_svg(data) {
        debug!("Detected SVG content, rasterizing");
        return rasterize_svg(data);
    }
    image::load_from_memory(data).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Open a local image file.
pub fn load_image_from_path(path: &Path) -> Result<DynamicImage, FetchError> {
    let label = path.display().to_string();
    let data = std::fs::read(path).map_err(|e| FetchError::Decode {
        url: label.clone(),
        source: image::ImageError::IoError(e),
    })?;
    decode_image(&data, &label)
}

/// Download and decode a single image.
pub async fn fetch_image(client: &HttpClient, url: &str) -> Result<DynamicImage, FetchError> {
    debug!("Fetching image from {} (timeout={:?})", url, client.timeout());
    let response = client.get(url).await?;
    if let Some(content_type) = response.content_type() {
        debug!("Image content-type: {}", content_type);
    }
    let data = response.bytes().await?;
    let image = decode_image(&data, url)?;
    debug!(
        "Fetched image: {}x{} {:?}",
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}
