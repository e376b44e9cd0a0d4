//! Kafka producer for completion notifications
//!
//! Publishes (subject, message) pairs to a fixed topic when a resize
//! finishes. Fire-and-forget from the pipeline's perspective: errors
//! surface synchronously to the caller, delivery is not confirmed beyond
//! the broker acknowledgement.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result as AnyhowResult};
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde_json::json;

use crate::error::{AppError, Result};

/// Publish contract for completion notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<()>;
}

/// Kafka producer wrapper for notification publishing.
#[derive(Clone)]
pub struct KafkaNotifier {
    inner: Arc<FutureProducer>,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(brokers: &str, topic: &str) -> AnyhowResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("message.timeout.ms", "5000")
            .create()
            .with_context(|| format!("Failed to create Kafka producer for '{}'", topic))?;

        Ok(Self {
            inner: Arc::new(producer),
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<()> {
        let payload = serde_json::to_string(&json!({
            "subject": subject,
            "message": message,
        }))
        .map_err(|e| AppError::Internal(format!("Failed to serialize notification: {e}")))?;

        let record = FutureRecord::to(&self.topic).key(subject).payload(&payload);

        self.inner
            .send(record, Duration::from_secs(10))
            .await
            .map_err(|(err, _)| {
                AppError::Internal(format!("Failed to publish notification: {err}"))
            })?;

        Ok(())
    }
}
