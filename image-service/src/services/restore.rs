//! Restore path - returns the untouched original from the backup bucket
//!
//! The backup bucket is the only place an untouched original persists;
//! restore reads exclusively from it. Bytes are transported base64-encoded
//! so the JSON payload is binary-safe.
//!
//! `RestoreService` is the function itself; `RestoreInvoker` is the
//! synchronous invocation contract the front end consumes it through.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{RestoreRequest, RestoreResponse};
use crate::storage::ObjectStorage;

/// The restore function over the backup bucket
pub struct RestoreService {
    storage: Arc<dyn ObjectStorage>,
    backup_bucket: String,
}

impl RestoreService {
    pub fn new(storage: Arc<dyn ObjectStorage>, backup_bucket: impl Into<String>) -> Self {
        Self {
            storage,
            backup_bucket: backup_bucket.into(),
        }
    }

    /// Look up a backed-up original and package it for transport.
    pub async fn restore(&self, file_name: &str) -> RestoreResponse {
        match self.storage.get_object(&self.backup_bucket, file_name).await {
            Ok(object) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&object.bytes);
                info!(file_name, size = object.bytes.len(), "Original restored from backup");
                RestoreResponse::ok(encoded)
            }
            Err(AppError::NotFound(_)) => {
                warn!(file_name, "No backup found for restore request");
                RestoreResponse::error(404, format!("Original image not found: {file_name}"))
            }
            Err(e) => RestoreResponse::error(500, format!("Failed to restore image: {e}")),
        }
    }
}

/// Synchronous invocation contract for the restore function.
#[async_trait]
pub trait RestoreInvoker: Send + Sync {
    async fn invoke(&self, file_name: &str) -> Result<RestoreResponse>;
}

/// Invokes the deployed restore function over HTTP.
pub struct HttpRestoreInvoker {
    client: reqwest::Client,
    invoke_url: String,
}

impl HttpRestoreInvoker {
    pub fn new(invoke_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            invoke_url: invoke_url.into(),
        })
    }
}

#[async_trait]
impl RestoreInvoker for HttpRestoreInvoker {
    async fn invoke(&self, file_name: &str) -> Result<RestoreResponse> {
        let response = self
            .client
            .post(&self.invoke_url)
            .json(&RestoreRequest {
                file_name: file_name.to_string(),
            })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Restore invocation failed: {e}")))?;

        response
            .json::<RestoreResponse>()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid restore response: {e}")))
    }
}
