//! Photo normalisation for problem uploads
//!
//! Uploaded photos are decoded, flattened to RGB, bounded on their longest
//! side and re-encoded as base64 JPEG so they can be inlined in a chat
//! completion request as a data URI.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder};
use serde::Serialize;

/// Longest side, in pixels, an encoded photo may have
pub const DEFAULT_MAX_DIMENSION: u32 = 2000;

/// JPEG quality used when re-encoding
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Image vide")]
    Empty,

    #[error("Impossible de lire l'image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Impossible d'encoder l'image: {0}")]
    Encode(#[source] image::ImageError),
}

/// A size-normalised, base64-encoded JPEG
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedImage {
    #[serde(skip)]
    base64: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Inline form accepted by vision-capable chat models
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64)
    }
}

/// Re-encodes uploads into bounded JPEGs
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    max_dimension: u32,
    quality: u8,
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION, DEFAULT_JPEG_QUALITY)
    }
}

impl PhotoEncoder {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    /// Decode `bytes` in any supported raster format and re-encode them
    pub fn encode(&self, bytes: &[u8]) -> Result<EncodedImage, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }

        let decoded = image::load_from_memory(bytes).map_err(MediaError::Decode)?;
        let mut rgb = decoded.to_rgb8();

        if let Some((width, height)) = bounded_size(rgb.width(), rgb.height(), self.max_dimension)
        {
            tracing::debug!(
                from_width = rgb.width(),
                from_height = rgb.height(),
                width,
                height,
                "Downscaling uploaded photo"
            );
            rgb = image::imageops::resize(&rgb, width, height, FilterType::Lanczos3);
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(MediaError::Encode)?;

        Ok(EncodedImage {
            base64: STANDARD.encode(&jpeg),
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}

/// Target size when the longest side exceeds `max`, keeping the aspect ratio
fn bounded_size(width: u32, height: u32, max: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if longest <= max {
        return None;
    }

    let scale = |side: u32| {
        let scaled = (u64::from(side) * u64::from(max) + u64::from(longest) / 2) / u64::from(longest);
        // scaled <= max, which fits in u32
        (scaled as u32).max(1)
    };

    Some((scale(width), scale(height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn rgb_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        png_bytes(DynamicImage::ImageRgb8(img))
    }

    fn decode_output(encoded: &EncodedImage) -> DynamicImage {
        let jpeg = STANDARD.decode(&encoded.base64).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        image::load_from_memory(&jpeg).unwrap()
    }

    #[test]
    fn test_landscape_is_bounded_to_default_cap() {
        let encoded = PhotoEncoder::default().encode(&rgb_png(2100, 700)).unwrap();
        assert_eq!((encoded.width, encoded.height), (2000, 667));

        let decoded = decode_output(&encoded);
        assert_eq!((decoded.width(), decoded.height()), (2000, 667));
    }

    #[test]
    fn test_portrait_keeps_aspect_ratio() {
        let encoder = PhotoEncoder::new(200, DEFAULT_JPEG_QUALITY);
        let encoded = encoder.encode(&rgb_png(120, 480)).unwrap();
        assert_eq!((encoded.width, encoded.height), (50, 200));
    }

    #[test]
    fn test_odd_ratio_within_one_pixel() {
        let encoder = PhotoEncoder::new(500, DEFAULT_JPEG_QUALITY);
        let encoded = encoder.encode(&rgb_png(1001, 333)).unwrap();

        assert_eq!(encoded.width, 500);
        let expected = 333.0 * 500.0 / 1001.0;
        assert!((f64::from(encoded.height) - expected).abs() < 1.0);
    }

    #[test]
    fn test_small_image_is_not_resized() {
        let encoded = PhotoEncoder::default().encode(&rgb_png(64, 48)).unwrap();
        assert_eq!((encoded.width, encoded.height), (64, 48));
    }

    #[test]
    fn test_alpha_is_flattened_to_rgb() {
        let img = RgbaImage::from_pixel(32, 32, Rgba([10, 20, 30, 100]));
        let encoded = PhotoEncoder::default()
            .encode(&png_bytes(DynamicImage::ImageRgba8(img)))
            .unwrap();

        assert_eq!(decode_output(&encoded).color(), ColorType::Rgb8);
    }

    #[test]
    fn test_data_uri_prefix() {
        let encoded = PhotoEncoder::default().encode(&rgb_png(8, 8)).unwrap();
        let uri = encoded.data_uri();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert!(uri.ends_with(&encoded.base64));
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let result = PhotoEncoder::default().encode(b"definitely not an image");
        assert!(matches!(result, Err(MediaError::Decode(_))));
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(PhotoEncoder::default().encode(&[]), Err(MediaError::Empty)));
    }

    #[test]
    fn test_bounded_size() {
        assert_eq!(bounded_size(2000, 1000, 2000), None);
        assert_eq!(bounded_size(4000, 3000, 2000), Some((2000, 1500)));
        assert_eq!(bounded_size(5000, 1, 2000), Some((2000, 1)));
    }
}
