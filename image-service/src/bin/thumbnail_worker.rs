//! Thumbnail Worker - storage event consumer for the thumbnail pipeline
//!
//! Listens for object-created events from the input bucket and stores an
//! aspect-preserving thumbnail for each image record. No backup, no
//! notification, no per-object metadata.
//!
//! Environment variables:
//! - KAFKA_BROKERS: Kafka broker addresses (default: "localhost:9092")
//! - STORAGE_EVENTS_TOPIC: Topic to consume (default: "storage.events")
//! - INPUT_BUCKET / RESULT_BUCKET: storage locations
//! - AWS_REGION, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, S3_ENDPOINT
//! - THUMBNAIL_MAX_DIMENSION: bounding box size (default: 300)
//! - JPEG_QUALITY: output quality 0-100 (default: 75)

use image_service::kafka::{StorageEventConsumer, StorageEventConsumerConfig};
use image_service::services::{
    ImageProcessor, ProcessorConfig, ThumbnailService, ThumbnailServiceConfig,
};
use image_service::storage::{s3, S3Storage};
use image_service::Config;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("thumbnail_worker=info".parse().expect("valid directive"))
                .add_directive("image_service=info".parse().expect("valid directive")),
        )
        .init();

    info!("Starting Thumbnail Worker");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    info!(
        input_bucket = %config.buckets.input,
        result_bucket = %config.buckets.result,
        kafka_brokers = %config.kafka.brokers,
        topic = %config.kafka.storage_events_topic,
        "Configuration loaded"
    );

    // Create the S3-backed storage handle
    let s3_client = s3::build_client(&config.s3).await.map_err(|e| format!("{e}"))?;
    let storage = Arc::new(S3Storage::new(s3_client));
    storage
        .health_check(&config.buckets.input)
        .await
        .map_err(|e| format!("{e}"))?;
    info!("S3 client initialized");

    // Create the thumbnail pipeline
    let processor = Arc::new(ImageProcessor::new(ProcessorConfig {
        quality: config.processing.jpeg_quality,
    }));
    let service = Arc::new(ThumbnailService::new(
        storage,
        processor,
        ThumbnailServiceConfig {
            result_bucket: config.buckets.result.clone(),
            max_width: config.processing.thumbnail_max_dimension,
            max_height: config.processing.thumbnail_max_dimension,
        },
    ));

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl+c");
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // Create and run the Kafka consumer (blocks until shutdown)
    let consumer_config = StorageEventConsumerConfig {
        brokers: config.kafka.brokers.clone(),
        topic: config.kafka.storage_events_topic.clone(),
        group_id: std::env::var("KAFKA_GROUP_ID")
            .unwrap_or_else(|_| "thumbnail-worker".to_string()),
    };
    let mut consumer = StorageEventConsumer::new(&consumer_config, service, shutdown_rx)
        .map_err(|e| format!("{e}"))?;
    info!("Kafka consumer initialized");

    if let Err(e) = consumer.run().await {
        error!(error = %e, "Consumer error");
    }

    info!("Thumbnail Worker stopped");
    Ok(())
}
