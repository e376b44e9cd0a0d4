//! Kafka consumer for storage change events
//!
//! Listens for object-created notifications from the input bucket and hands
//! each batch to the configured handler. One message is one invocation:
//! records inside it are processed sequentially by the handler, and a
//! failure anywhere aborts the whole invocation. Redelivery is the
//! platform's concern, so the loop keeps consuming after a failure.

use std::sync::Arc;

use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::ClientConfig;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, Result};
use crate::kafka::events::{EventEnvelope, StorageEvent};

/// Handles one storage event batch.
#[async_trait]
pub trait StorageEventHandler: Send + Sync {
    async fn handle_event(&self, event: &StorageEvent) -> Result<()>;
}

/// Kafka consumer configuration
#[derive(Clone, Debug)]
pub struct StorageEventConsumerConfig {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
}

/// Kafka consumer driving a storage event handler
pub struct StorageEventConsumer {
    consumer: StreamConsumer,
    handler: Arc<dyn StorageEventHandler>,
    shutdown_rx: watch::Receiver<bool>,
}

impl StorageEventConsumer {
    /// Create a new consumer subscribed to the storage events topic
    pub fn new(
        config: &StorageEventConsumerConfig,
        handler: Arc<dyn StorageEventHandler>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.commit.interval.ms", "5000")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "45000")
            .set("max.poll.interval.ms", "300000")
            .create()
            .map_err(|e| AppError::Internal(format!("Failed to create Kafka consumer: {e}")))?;

        consumer
            .subscribe(&[&config.topic])
            .map_err(|e| AppError::Internal(format!("Failed to subscribe to topic: {e}")))?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            "Storage event consumer initialized"
        );

        Ok(Self {
            consumer,
            handler,
            shutdown_rx,
        })
    }

    /// Run the consumer loop
    pub async fn run(&mut self) -> Result<()> {
        use futures::StreamExt;

        info!("Starting storage event consumer loop");

        let mut message_stream = self.consumer.stream();

        loop {
            tokio::select! {
                // Check for shutdown signal
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping consumer");
                        break;
                    }
                }

                // Process messages
                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            if let Err(e) = self.process_message(&msg).await {
                                error!(error = %e, "Invocation failed");
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka consumer error");
                            // Continue consuming despite errors
                        }
                        None => {
                            warn!("Message stream ended unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        info!("Storage event consumer stopped");
        Ok(())
    }

    /// Process a single Kafka message
    async fn process_message<M: Message>(&self, msg: &M) -> Result<()> {
        let payload = match msg.payload() {
            Some(p) => p,
            None => {
                debug!("Empty message payload, skipping");
                return Ok(());
            }
        };

        let event: StorageEvent = match parse_enveloped_or_direct(payload) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Failed to parse storage event, skipping");
                return Ok(());
            }
        };

        debug!(records = event.records.len(), "Received storage event");

        self.handler.handle_event(&event).await
    }
}

fn parse_enveloped_or_direct(payload: &[u8]) -> Result<StorageEvent> {
    if let Ok(envelope) = serde_json::from_slice::<EventEnvelope<StorageEvent>>(payload) {
        return Ok(envelope.data);
    }

    Ok(serde_json::from_slice::<StorageEvent>(payload)?)
}
