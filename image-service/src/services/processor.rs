//! Image processor - decodes uploads and produces JPEG outputs
//!
//! Two operations: an exact-stretch resize to caller-supplied dimensions,
//! and an aspect-preserving shrink-to-fit used for thumbnails. Inputs are
//! force-converted to RGB, so transparency is discarded and output is
//! always 3-channel JPEG.
//!
//! Uses `spawn_blocking` for CPU-intensive operations to avoid blocking the
//! async runtime.

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use tracing::debug;

use crate::error::{AppError, Result};

/// Configuration for image processing
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    /// JPEG quality (0-100)
    pub quality: u8,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self { quality: 75 }
    }
}

/// Result of a processing operation
#[derive(Debug)]
pub struct ProcessedImage {
    /// The output image data as JPEG
    pub data: Bytes,
    /// Width of the output
    pub width: u32,
    /// Height of the output
    pub height: u32,
}

/// Image processor
pub struct ImageProcessor {
    config: ProcessorConfig,
}

impl ImageProcessor {
    /// Create a new processor with the given configuration
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Create a processor with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ProcessorConfig::default())
    }

    /// Stretch to exactly `width`×`height` pixels (blocking version)
    ///
    /// Aspect ratio is NOT preserved; the caller's dimensions win.
    pub fn resize_exact(&self, data: &[u8], width: u32, height: u32) -> Result<ProcessedImage> {
        let img = decode_rgb(data)?;

        let (orig_w, orig_h) = img.dimensions();
        debug!(
            original_width = orig_w,
            original_height = orig_h,
            width,
            height,
            "Resizing image to exact dimensions"
        );

        let resized = img.resize_exact(width.max(1), height.max(1), FilterType::Triangle);
        let data = self.encode_jpeg(&resized)?;

        Ok(ProcessedImage {
            data,
            width: resized.width(),
            height: resized.height(),
        })
    }

    /// Shrink to fit within `max_width`×`max_height` (blocking version)
    ///
    /// Preserves aspect ratio and never upscales: images already inside the
    /// box are re-encoded at their original dimensions.
    pub fn fit_within(&self, data: &[u8], max_width: u32, max_height: u32) -> Result<ProcessedImage> {
        let img = decode_rgb(data)?;

        let (orig_w, orig_h) = img.dimensions();
        if orig_w <= max_width && orig_h <= max_height {
            debug!("Image already within bounds, encoding as-is");
            let data = self.encode_jpeg(&img)?;
            return Ok(ProcessedImage {
                data,
                width: orig_w,
                height: orig_h,
            });
        }

        let resized = img.resize(max_width, max_height, FilterType::Triangle);
        let data = self.encode_jpeg(&resized)?;

        debug!(
            width = resized.width(),
            height = resized.height(),
            size = data.len(),
            "Thumbnail generated"
        );

        Ok(ProcessedImage {
            data,
            width: resized.width(),
            height: resized.height(),
        })
    }

    /// Exact-stretch resize on a blocking thread pool
    pub async fn resize_exact_async(
        self: Arc<Self>,
        data: Bytes,
        width: u32,
        height: u32,
    ) -> Result<ProcessedImage> {
        let processor = self.clone();

        tokio::task::spawn_blocking(move || processor.resize_exact(&data, width, height))
            .await
            .map_err(|e| AppError::Internal(format!("Image task panicked: {e}")))?
    }

    /// Shrink-to-fit resize on a blocking thread pool
    pub async fn fit_within_async(
        self: Arc<Self>,
        data: Bytes,
        max_width: u32,
        max_height: u32,
    ) -> Result<ProcessedImage> {
        let processor = self.clone();

        tokio::task::spawn_blocking(move || processor.fit_within(&data, max_width, max_height))
            .await
            .map_err(|e| AppError::Internal(format!("Image task panicked: {e}")))?
    }

    /// Encode image as JPEG
    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Bytes> {
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);

        img.write_to(&mut cursor, ImageOutputFormat::Jpeg(self.config.quality))
            .map_err(|e| AppError::Internal(format!("Failed to encode JPEG: {e}")))?;

        Ok(Bytes::from(buf))
    }
}

/// Decode bytes and force-convert to a 3-channel color model.
fn decode_rgb(data: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::Internal(format!("Failed to decode image: {e}")))?;

    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
        }));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_resize_exact_stretches_to_requested_box() {
        let processor = ImageProcessor::with_defaults();
        let result = processor.resize_exact(&png_fixture(800, 600), 500, 200).unwrap();

        assert_eq!(result.width, 500);
        assert_eq!(result.height, 200);

        let output = image::load_from_memory(&result.data).unwrap();
        assert_eq!(output.dimensions(), (500, 200));
    }

    #[test]
    fn test_resize_exact_output_is_jpeg() {
        let processor = ImageProcessor::with_defaults();
        let result = processor.resize_exact(&png_fixture(64, 64), 300, 300).unwrap();

        let format = image::guess_format(&result.data).unwrap();
        assert_eq!(format, image::ImageFormat::Jpeg);
    }

    #[test]
    fn test_alpha_channel_is_discarded() {
        let processor = ImageProcessor::with_defaults();
        let result = processor.resize_exact(&png_fixture(64, 64), 32, 32).unwrap();

        let output = image::load_from_memory(&result.data).unwrap();
        assert_eq!(output.color().channel_count(), 3);
    }

    #[test]
    fn test_fit_within_preserves_aspect_ratio_landscape() {
        let processor = ImageProcessor::with_defaults();
        let result = processor.fit_within(&png_fixture(1200, 800), 300, 300).unwrap();

        assert_eq!(result.width, 300);
        assert_eq!(result.height, 200);
    }

    #[test]
    fn test_fit_within_preserves_aspect_ratio_portrait() {
        let processor = ImageProcessor::with_defaults();
        let result = processor.fit_within(&png_fixture(800, 1200), 300, 300).unwrap();

        assert_eq!(result.width, 200);
        assert_eq!(result.height, 300);
    }

    #[test]
    fn test_fit_within_never_upscales() {
        let processor = ImageProcessor::with_defaults();
        let result = processor.fit_within(&png_fixture(100, 80), 300, 300).unwrap();

        assert_eq!(result.width, 100);
        assert_eq!(result.height, 80);
    }

    #[test]
    fn test_undecodable_bytes_are_an_error() {
        let processor = ImageProcessor::with_defaults();
        assert!(processor.resize_exact(b"not an image", 300, 300).is_err());
        assert!(processor.fit_within(b"not an image", 300, 300).is_err());
    }
}
