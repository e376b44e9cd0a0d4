/// S3-backed object storage
///
/// Wraps the AWS SDK client behind the `ObjectStorage` contract. A custom
/// endpoint supports S3-compatible stores such as MinIO.
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use crate::config::S3Config;
use crate::error::{AppError, Result};

use super::{ObjectStorage, StoredObject};

/// Initialize an AWS S3 client with credentials from config
///
/// Uses the default credential chain unless explicit keys are provided.
pub async fn build_client(config: &S3Config) -> Result<Client> {
    use aws_sdk_s3::config::Region;

    let mut aws_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        use aws_sdk_s3::config::Credentials;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None, // No session token
            None, // No expiration
            "image_service_s3",
        );

        aws_config_builder = aws_config_builder.credentials_provider(credentials);
    }

    if let Some(endpoint) = &config.endpoint {
        aws_config_builder = aws_config_builder.endpoint_url(endpoint);
    }

    let aws_config = aws_config_builder.load().await;

    Ok(Client::new(&aws_config))
}

/// Object storage backed by S3
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Health check for S3 connectivity and bucket access
    ///
    /// Lists at most one object as a connectivity test, validating
    /// credentials, bucket existence, and permissions in one call.
    pub async fn health_check(&self, bucket: &str) -> Result<()> {
        self.client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| {
                AppError::StorageError(format!("S3 health check failed for '{bucket}': {e}"))
            })?;

        tracing::info!(bucket = %bucket, "S3 connection validated");
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        debug!(bucket = %bucket, key = %key, "Reading object from S3");

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(format!("Object not found: {bucket}/{key}"))
                } else {
                    AppError::StorageError(format!(
                        "S3 read failed for {bucket}/{key}: {service_error}"
                    ))
                }
            })?;

        let content_type = output.content_type().map(|ct| ct.to_string());
        let metadata = output.metadata().cloned().unwrap_or_default();

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to read S3 object body: {e}")))?
            .into_bytes();

        debug!(bucket = %bucket, key = %key, size = bytes.len(), "Object read from S3");

        Ok(StoredObject {
            bytes,
            content_type,
            metadata,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        debug!(bucket = %bucket, key = %key, size = bytes.len(), "Writing object to S3");

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type);

        if !metadata.is_empty() {
            request = request.set_metadata(Some(metadata));
        }

        request.send().await.map_err(|e| {
            let error_msg = e.to_string();
            if error_msg.contains("403") || error_msg.contains("Forbidden") {
                AppError::StorageError("S3 auth failed (403): Check AWS credentials".to_string())
            } else if error_msg.contains("NoSuchBucket") {
                AppError::StorageError(format!("S3 bucket not found: {bucket}"))
            } else {
                AppError::StorageError(format!("S3 write failed for {bucket}/{key}: {e}"))
            }
        })?;

        Ok(())
    }
}
