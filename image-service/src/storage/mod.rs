//! Object storage contract and implementations
//!
//! Every component receives storage as an injected `ObjectStorage` handle
//! rather than an ambient client, so tests substitute the in-memory
//! implementation for the S3-backed one.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub mod memory;
pub mod s3;

pub use memory::InMemoryStorage;
pub use s3::S3Storage;

/// An object read back from storage.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Put/get contract over bucketed object storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Read an object's bytes, content type, and metadata.
    ///
    /// Returns `AppError::NotFound` when the key is absent.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject>;

    /// Write an object with a content type and string-keyed metadata.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()>;
}
