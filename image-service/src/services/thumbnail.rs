//! Thumbnail pipeline - fixed-size aspect-preserving resize
//!
//! Simpler sibling of the resize pipeline: no backup, no notification, no
//! per-object metadata. Qualifying uploads are shrunk to fit within a fixed
//! box (never upscaled) and stored under a "resized/" key.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::kafka::{StorageEvent, StorageEventHandler, StorageRecord};
use crate::keys;
use crate::services::processor::ImageProcessor;
use crate::storage::ObjectStorage;

/// Thumbnail pipeline configuration
#[derive(Clone, Debug)]
pub struct ThumbnailServiceConfig {
    pub result_bucket: String,
    /// Bounding box the output must fit within
    pub max_width: u32,
    pub max_height: u32,
}

/// Thumbnail-only pipeline
pub struct ThumbnailService {
    storage: Arc<dyn ObjectStorage>,
    processor: Arc<ImageProcessor>,
    config: ThumbnailServiceConfig,
}

impl ThumbnailService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        processor: Arc<ImageProcessor>,
        config: ThumbnailServiceConfig,
    ) -> Self {
        Self {
            storage,
            processor,
            config,
        }
    }

    async fn process_record(&self, record: &StorageRecord) -> Result<()> {
        info!(bucket = %record.bucket, key = %record.key, "Generating thumbnail");

        let object = self.storage.get_object(&record.bucket, &record.key).await?;

        let thumbnail = self
            .processor
            .clone()
            .fit_within_async(object.bytes, self.config.max_width, self.config.max_height)
            .await?;

        let dest_key = keys::resized_key(&record.key);
        self.storage
            .put_object(
                &self.config.result_bucket,
                &dest_key,
                thumbnail.data,
                "image/jpeg",
                HashMap::new(),
            )
            .await?;

        info!(
            key = %record.key,
            dest_key = %dest_key,
            width = thumbnail.width,
            height = thumbnail.height,
            "Thumbnail stored"
        );

        Ok(())
    }
}

#[async_trait]
impl StorageEventHandler for ThumbnailService {
    async fn handle_event(&self, event: &StorageEvent) -> Result<()> {
        for record in &event.records {
            if !keys::is_image_key(&record.key) {
                debug!(key = %record.key, "Skipping non-image key");
                continue;
            }

            self.process_record(record).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use bytes::Bytes;
    use image::{DynamicImage, GenericImageView, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn png_fixture(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([20, 200, 120]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    fn service(storage: Arc<InMemoryStorage>) -> ThumbnailService {
        ThumbnailService::new(
            storage,
            Arc::new(ImageProcessor::with_defaults()),
            ThumbnailServiceConfig {
                result_bucket: "result".to_string(),
                max_width: 300,
                max_height: 300,
            },
        )
    }

    fn event(key: &str) -> StorageEvent {
        StorageEvent {
            records: vec![StorageRecord {
                bucket: "input".to_string(),
                key: key.to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_thumbnail_fits_box_and_preserves_aspect() {
        let storage = Arc::new(InMemoryStorage::new());
        storage
            .put_object("input", "wide.jpg", png_fixture(1200, 400), "image/jpeg", HashMap::new())
            .await
            .unwrap();

        service(storage.clone())
            .handle_event(&event("wide.jpg"))
            .await
            .unwrap();

        let result = storage.get_object("result", "resized/wide.jpg").await.unwrap();
        assert_eq!(result.content_type.as_deref(), Some("image/jpeg"));
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        let (w, h) = decoded.dimensions();
        assert!(w <= 300 && h <= 300);
        assert_eq!((w, h), (300, 100));
    }

    #[tokio::test]
    async fn test_small_images_are_not_upscaled() {
        let storage = Arc::new(InMemoryStorage::new());
        storage
            .put_object("input", "tiny.png", png_fixture(120, 90), "image/png", HashMap::new())
            .await
            .unwrap();

        service(storage.clone())
            .handle_event(&event("tiny.png"))
            .await
            .unwrap();

        let result = storage.get_object("result", "resized/tiny.png").await.unwrap();
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (120, 90));
    }

    #[tokio::test]
    async fn test_no_backup_is_written_and_metadata_is_ignored() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut metadata = HashMap::new();
        metadata.insert("width".to_string(), "not-a-number".to_string());
        storage
            .put_object("input", "cat.png", png_fixture(600, 600), "image/png", metadata)
            .await
            .unwrap();

        // Malformed resize metadata is irrelevant to this pipeline.
        service(storage.clone())
            .handle_event(&event("cat.png"))
            .await
            .unwrap();

        assert!(storage.keys("backup").is_empty());
        let result = storage.get_object("result", "resized/cat.png").await.unwrap();
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (300, 300));
    }

    #[tokio::test]
    async fn test_skipped_keys_produce_no_writes() {
        let storage = Arc::new(InMemoryStorage::new());
        let svc = service(storage.clone());

        svc.handle_event(&event("uploads/")).await.unwrap();
        svc.handle_event(&event("notes.txt")).await.unwrap();

        assert!(storage.keys("result").is_empty());
    }
}
