//! Image renderings fed to the OCR engine.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

pub const WHITE: [u8; 3] = [255, 255, 255];
pub const BLACK: [u8; 3] = [0, 0, 0];

/// Alpha-blend `image` over an opaque background of `background`.
///
/// Fully transparent pixels become the background and fully opaque pixels
/// keep their color. Images without alpha come back unchanged (as RGB).
pub fn composite_on_color(image: &DynamicImage, background: [u8; 3]) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let px = rgba.get_pixel(x, y).0;
        let alpha = u32::from(px[3]);
        let blend = |src: u8, bg: u8| -> u8 {
            ((u32::from(src) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([
            blend(px[0], background[0]),
            blend(px[1], background[1]),
            blend(px[2], background[2]),
        ])
    })
}

/// Extract one color channel (0 = red, 1 = green, 2 = blue) as grayscale.
pub fn channel(image: &RgbImage, index: usize) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y).0[index]])
    })
}

/// The five OCR passes, in order: white background, black background, then
/// the red, green and blue channels of the white composite.
pub fn ocr_variants(image: &DynamicImage) -> [(&'static str, DynamicImage); 5] {
    let white = composite_on_color(image, WHITE);
    let black = composite_on_color(image, BLACK);
    let red = channel(&white, 0);
    let green = channel(&white, 1);
    let blue = channel(&white, 2);
    [
        ("white", DynamicImage::ImageRgb8(white)),
        ("black", DynamicImage::ImageRgb8(black)),
        ("red", DynamicImage::ImageLuma8(red)),
        ("green", DynamicImage::ImageLuma8(green)),
        ("blue", DynamicImage::ImageLuma8(blue)),
    ]
}
