/// In-memory object storage
///
/// Test double for the S3-backed implementation, also handy for local
/// development without cloud credentials. Objects live in a mutex-guarded
/// map keyed by (bucket, key).
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{AppError, Result};

use super::{ObjectStorage, StoredObject};

#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently stored in a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.lock().expect("storage mutex poisoned");
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        let objects = self.objects.lock().expect("storage mutex poisoned");
        objects.contains_key(&(bucket.to_string(), key.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let objects = self.objects.lock().expect("storage mutex poisoned");
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Object not found: {bucket}/{key}")))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let mut objects = self.objects.lock().expect("storage mutex poisoned");
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                content_type: Some(content_type.to_string()),
                metadata,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let storage = InMemoryStorage::new();
        let mut metadata = HashMap::new();
        metadata.insert("width".to_string(), "500".to_string());

        storage
            .put_object(
                "input",
                "cat.png",
                Bytes::from_static(b"png-bytes"),
                "image/png",
                metadata,
            )
            .await
            .unwrap();

        let object = storage.get_object("input", "cat.png").await.unwrap();
        assert_eq!(object.bytes.as_ref(), b"png-bytes");
        assert_eq!(object.content_type.as_deref(), Some("image/png"));
        assert_eq!(object.metadata.get("width").map(String::as_str), Some("500"));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let storage = InMemoryStorage::new();
        let err = storage.get_object("backup", "absent.png").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let storage = InMemoryStorage::new();
        storage
            .put_object(
                "input",
                "cat.png",
                Bytes::from_static(b"x"),
                "image/png",
                HashMap::new(),
            )
            .await
            .unwrap();

        assert!(storage.contains("input", "cat.png"));
        assert!(!storage.contains("backup", "cat.png"));
        assert!(storage.get_object("backup", "cat.png").await.is_err());
    }
}
