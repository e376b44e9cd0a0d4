/// Configuration management for image-service
///
/// Loads configuration from environment variables with sensible defaults.
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub buckets: BucketsConfig,
    pub s3: S3Config,
    pub kafka: KafkaConfig,
    pub restore: RestoreConfig,
    pub processing: ProcessingConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

/// The three storage areas the pipeline writes to.
#[derive(Clone, Debug, Deserialize)]
pub struct BucketsConfig {
    /// Receives uploads with resize metadata attached
    pub input: String,
    /// Holds untouched originals, keyed by normalized filename
    pub backup: String,
    /// Holds resized outputs under the "resized/" prefix
    pub result: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct S3Config {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KafkaConfig {
    pub brokers: String,
    /// Topic carrying object-created events for the input bucket
    pub storage_events_topic: String,
    /// Topic the resize pipeline publishes completion notifications to
    pub notifications_topic: String,
    pub group_id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RestoreConfig {
    pub host: String,
    pub port: u16,
    /// Endpoint the front end invokes the restore function at
    pub invoke_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProcessingConfig {
    pub default_width: u32,
    pub default_height: u32,
    pub jpeg_quality: u8,
    pub thumbnail_max_dimension: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            app: AppConfig {
                host: std::env::var("IMAGE_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("IMAGE_SERVICE_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            },
            buckets: BucketsConfig {
                input: std::env::var("INPUT_BUCKET")
                    .unwrap_or_else(|_| "image-resize-input".to_string()),
                backup: std::env::var("BACKUP_BUCKET")
                    .unwrap_or_else(|_| "image-resize-backup".to_string()),
                result: std::env::var("RESULT_BUCKET")
                    .unwrap_or_else(|_| "image-resize-result".to_string()),
            },
            s3: S3Config {
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
            },
            kafka: KafkaConfig {
                brokers: std::env::var("KAFKA_BROKERS")
                    .unwrap_or_else(|_| "localhost:9092".to_string()),
                storage_events_topic: std::env::var("STORAGE_EVENTS_TOPIC")
                    .unwrap_or_else(|_| "storage.events".to_string()),
                notifications_topic: std::env::var("NOTIFICATIONS_TOPIC")
                    .unwrap_or_else(|_| "image.notifications".to_string()),
                group_id: std::env::var("KAFKA_GROUP_ID")
                    .unwrap_or_else(|_| "image-service".to_string()),
            },
            restore: RestoreConfig {
                host: std::env::var("RESTORE_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("RESTORE_SERVICE_PORT")
                    .unwrap_or_else(|_| "8089".to_string())
                    .parse()
                    .unwrap_or(8089),
                invoke_url: std::env::var("RESTORE_INVOKE_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:8089/invoke".to_string()),
            },
            processing: ProcessingConfig {
                default_width: std::env::var("DEFAULT_WIDTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
                default_height: std::env::var("DEFAULT_HEIGHT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
                jpeg_quality: std::env::var("JPEG_QUALITY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(75),
                thumbnail_max_dimension: std::env::var("THUMBNAIL_MAX_DIMENSION")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            },
        })
    }
}
