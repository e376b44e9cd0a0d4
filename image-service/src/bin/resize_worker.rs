//! Resize Worker - storage event consumer for the resize-and-notify pipeline
//!
//! Listens for object-created events from the input bucket; for each image
//! record it backs up the original, resizes it to the metadata-supplied
//! dimensions, stores the result, and publishes a completion notification.
//!
//! Environment variables:
//! - KAFKA_BROKERS: Kafka broker addresses (default: "localhost:9092")
//! - STORAGE_EVENTS_TOPIC: Topic to consume (default: "storage.events")
//! - NOTIFICATIONS_TOPIC: Topic to publish to (default: "image.notifications")
//! - INPUT_BUCKET / BACKUP_BUCKET / RESULT_BUCKET: storage locations
//! - AWS_REGION, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, S3_ENDPOINT
//! - DEFAULT_WIDTH / DEFAULT_HEIGHT: fallback dimensions (default: 300)
//! - JPEG_QUALITY: output quality 0-100 (default: 75)

use image_service::kafka::{KafkaNotifier, StorageEventConsumer, StorageEventConsumerConfig};
use image_service::services::{ImageProcessor, ProcessorConfig, ResizeService, ResizeServiceConfig};
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
                .add_directive("resize_worker=info".parse().expect("valid directive"))
                .add_directive("image_service=info".parse().expect("valid directive")),
        )
        .init();

    info!("Starting Resize Worker");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    info!(
        input_bucket = %config.buckets.input,
        backup_bucket = %config.buckets.backup,
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

    // Create the notification producer
    let notifier = Arc::new(KafkaNotifier::new(
        &config.kafka.brokers,
        &config.kafka.notifications_topic,
    )?);
    info!("Notification producer initialized");

    // Create the resize pipeline
    let processor = Arc::new(ImageProcessor::new(ProcessorConfig {
        quality: config.processing.jpeg_quality,
    }));
    let service = Arc::new(ResizeService::new(
        storage,
        notifier,
        processor,
        ResizeServiceConfig {
            backup_bucket: config.buckets.backup.clone(),
            result_bucket: config.buckets.result.clone(),
            default_width: config.processing.default_width,
            default_height: config.processing.default_height,
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
        group_id: std::env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| "resize-worker".to_string()),
    };
    let mut consumer = StorageEventConsumer::new(&consumer_config, service, shutdown_rx)
        .map_err(|e| format!("{e}"))?;
    info!("Kafka consumer initialized");

    if let Err(e) = consumer.run().await {
        error!(error = %e, "Consumer error");
    }

    info!("Resize Worker stopped");
    Ok(())
}
