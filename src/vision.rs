//! Screenshot normalization.
//!
//! The model was conditioned on screenshots resized to a fixed width with
//! Lanczos resampling and cropped from the top to a fixed height. Any other
//! filter or crop anchor shifts the input distribution.

use crate::error::Result;
use image::{DynamicImage, ImageOutputFormat, imageops::FilterType};
use std::io::Cursor;

/// Width every screenshot is scaled to
pub const TARGET_WIDTH: u32 = 1024;

/// Tallest image the model sees; anything below is discarded
pub const MAX_HEIGHT: u32 = 1280;

/// Resizes and crops screenshots into the model's framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNormalizer {
    pub target_width: u32,
    pub max_height: u32,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            target_width: TARGET_WIDTH,
            max_height: MAX_HEIGHT,
        }
    }
}

impl ImageNormalizer {
    pub fn new(target_width: u32, max_height: u32) -> Self {
        Self { target_width, max_height }
    }

    /// Height after scaling to the target width, truncated toward zero
    pub fn scaled_height(&self, width: u32, height: u32) -> u32 {
        let factor = f64::from(self.target_width) / f64::from(width);
        (f64::from(height) * factor) as u32
    }

    /// Scale to the target width, then crop from the top to the height cap.
    pub fn normalize(&self, image: &DynamicImage) -> DynamicImage {
        let height = self.scaled_height(image.width(), image.height()).max(1);
        let resized = image.resize_exact(self.target_width, height, FilterType::Lanczos3);

        if height > self.max_height {
            resized.crop_imm(0, 0, self.target_width, self.max_height)
        } else {
            resized
        }
    }
}

/// Decode screenshot bytes into an RGB image
pub fn decode_screenshot(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])))
    }

    #[test]
    fn test_tall_image_is_resized_and_cropped() {
        let normalized = ImageNormalizer::default().normalize(&solid(2560, 5000));
        assert_eq!((normalized.width(), normalized.height()), (1024, 1280));
    }

    #[test]
    fn test_wide_image_keeps_aspect_ratio() {
        let normalized = ImageNormalizer::default().normalize(&solid(2048, 1000));
        assert_eq!((normalized.width(), normalized.height()), (1024, 500));
    }

    #[test]
    fn test_small_image_is_upscaled() {
        let normalized = ImageNormalizer::default().normalize(&solid(512, 300));
        assert_eq!((normalized.width(), normalized.height()), (1024, 600));
    }

    #[test]
    fn test_crop_keeps_top() {
        let mut img = RgbImage::from_pixel(1024, 2000, Rgb([0, 0, 255]));
        for y in 0..100 {
            for x in 0..1024 {
                img.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }
        let normalized = ImageNormalizer::default().normalize(&DynamicImage::ImageRgb8(img));
        let rgb = normalized.to_rgb8();
        let top = rgb.get_pixel(512, 10);
        let bottom = rgb.get_pixel(512, 1270);
        assert!(top[0] > 200 && top[2] < 50);
        assert!(bottom[2] > 200 && bottom[0] < 50);
    }

    #[test]
    fn test_scaled_height_truncates() {
        let normalizer = ImageNormalizer::default();
        assert_eq!(normalizer.scaled_height(3000, 1000), 341);
        assert_eq!(normalizer.scaled_height(1366, 768), 575);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let normalizer = ImageNormalizer::default();
        let source = solid(1920, 1080);
        assert_eq!(normalizer.normalize(&source).to_rgb8(), normalizer.normalize(&source).to_rgb8());
    }

    #[test]
    fn test_png_round_trip_decodes_to_rgb() {
        let png = encode_png(&solid(8, 4)).unwrap();
        let decoded = decode_screenshot(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
    }
}
