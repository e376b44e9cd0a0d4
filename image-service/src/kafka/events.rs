//! Storage change event payloads
//!
//! The storage service publishes one message per batch of newly written
//! objects; each record names the bucket and key that changed.

use serde::{Deserialize, Serialize};

/// One changed object within a storage change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageRecord {
    pub bucket: String,
    pub key: String,
}

/// A batch of storage change records delivered as one handler invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEvent {
    pub records: Vec<StorageRecord>,
}

/// Some publishers wrap the event in a data envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct EventEnvelope<T> {
    pub data: T,
}
