//! Kafka plumbing
//!
//! Storage change events arrive on one topic and drive the workers;
//! completion notifications leave on another.

pub mod consumer;
pub mod events;
pub mod producer;

pub use consumer::{StorageEventConsumer, StorageEventConsumerConfig, StorageEventHandler};
pub use events::{StorageEvent, StorageRecord};
pub use producer::{KafkaNotifier, Notifier};
