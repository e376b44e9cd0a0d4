//! Resize pipeline - backs up originals, produces resized outputs, notifies
//!
//! Reacts to objects landing in the input bucket. For each record:
//! 1. Back up the untouched original to the backup bucket
//! 2. Resize to the dimensions attached as object metadata (default 300×300)
//! 3. Store the result under a "resized/" key
//! 4. Publish a completion notification
//!
//! Records in a batch are handled strictly in order; the first failure
//! aborts the whole invocation, leaving earlier writes in place.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::kafka::{Notifier, StorageEvent, StorageEventHandler, StorageRecord};
use crate::keys;
use crate::services::processor::ImageProcessor;
use crate::storage::ObjectStorage;

/// Content type assumed when the input object carries none.
const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

const NOTIFICATION_SUBJECT: &str = "Image Resize Completed";

/// Resize pipeline configuration
#[derive(Clone, Debug)]
pub struct ResizeServiceConfig {
    pub backup_bucket: String,
    pub result_bucket: String,
    pub default_width: u32,
    pub default_height: u32,
}

/// Resize-and-notify pipeline
pub struct ResizeService {
    storage: Arc<dyn ObjectStorage>,
    notifier: Arc<dyn Notifier>,
    processor: Arc<ImageProcessor>,
    config: ResizeServiceConfig,
}

impl ResizeService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        notifier: Arc<dyn Notifier>,
        processor: Arc<ImageProcessor>,
        config: ResizeServiceConfig,
    ) -> Self {
        Self {
            storage,
            notifier,
            processor,
            config,
        }
    }

    /// Process a single qualifying record
    async fn process_record(&self, record: &StorageRecord) -> Result<()> {
        info!(bucket = %record.bucket, key = %record.key, "Processing upload");

        let object = self.storage.get_object(&record.bucket, &record.key).await?;
        let content_type = object
            .content_type
            .clone()
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        // Back up the untouched original before any processing.
        let backup_key = keys::base_name(&record.key).to_string();
        self.storage
            .put_object(
                &self.config.backup_bucket,
                &backup_key,
                object.bytes.clone(),
                &content_type,
                HashMap::new(),
            )
            .await?;

        let (width, height) = parse_dimensions(
            &object.metadata,
            self.config.default_width,
            self.config.default_height,
        )?;

        let resized = self
            .processor
            .clone()
            .resize_exact_async(object.bytes.clone(), width, height)
            .await?;

        let dest_key = keys::resized_key(&record.key);
        self.storage
            .put_object(
                &self.config.result_bucket,
                &dest_key,
                resized.data,
                "image/jpeg",
                HashMap::new(),
            )
            .await?;

        let message = format!(
            "Image resize completed successfully.\n\n\
             Original file: {}\n\
             Resized file: {}\n\
             Size: {} x {}",
            record.key, dest_key, width, height
        );
        self.notifier.publish(NOTIFICATION_SUBJECT, &message).await?;

        info!(
            key = %record.key,
            dest_key = %dest_key,
            width,
            height,
            "Resize completed"
        );

        Ok(())
    }
}

/// Parse width/height metadata, defaulting absent values.
///
/// Values are trusted as supplied (no bounds check); a non-numeric value
/// fails the whole invocation.
fn parse_dimensions(
    metadata: &HashMap<String, String>,
    default_width: u32,
    default_height: u32,
) -> Result<(u32, u32)> {
    let width = match metadata.get("width") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| AppError::ValidationError(format!("Invalid width metadata: {raw}")))?,
        None => default_width,
    };

    let height = match metadata.get("height") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| AppError::ValidationError(format!("Invalid height metadata: {raw}")))?,
        None => default_height,
    };

    Ok((width, height))
}

#[async_trait]
impl StorageEventHandler for ResizeService {
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
