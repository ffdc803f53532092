use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::StoreError;

/// Read-side view of the object storage collaborator that holds the raw
/// source documents. The ingestion trigger tells us `(bucket, key)`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Map-backed object store for tests and examples.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), bytes);
    }

    pub async fn remove(&self, bucket: &str, key: &str) {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{bucket}/{key}")))
    }
}
