use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use ragkit_core::{
    IngestionStatus, IngestionStatusStore, LeaseDecision, ProgressStatus, StatusPage, StoreError,
};
use tokio::sync::RwLock;
use tracing::debug;

/// Status store backed by an ordered map, mirroring a key-value table
/// keyed by `(user_id, doc_id)`. The write lock stands in for the backing
/// store's single-key conditional-write atomicity, which `begin` relies
/// on for lease acquisition.
#[derive(Clone, Default)]
pub struct InMemoryStatusStore {
    inner: Arc<RwLock<BTreeMap<(String, String), IngestionStatus>>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IngestionStatusStore for InMemoryStatusStore {
    async fn put(&self, status: IngestionStatus) -> Result<(), StoreError> {
        let key = (status.user_id.clone(), status.doc_id.clone());
        self.inner.write().await.insert(key, status);
        Ok(())
    }

    async fn get(
        &self,
        user_id: &str,
        doc_id: &str,
    ) -> Result<Option<IngestionStatus>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .get(&(user_id.to_string(), doc_id.to_string()))
            .cloned())
    }

    async fn list(
        &self,
        user_id: &str,
        limit: usize,
        start_after: Option<&str>,
    ) -> Result<StatusPage, StoreError> {
        let inner = self.inner.read().await;
        let items: Vec<IngestionStatus> = inner
            .range((user_id.to_string(), String::new())..)
            .take_while(|((user, _), _)| user == user_id)
            .filter(|((_, doc), _)| match start_after {
                Some(after) => doc.as_str() > after,
                None => true,
            })
            .take(limit)
            .map(|(_, status)| status.clone())
            .collect();

        let next_token = if items.len() == limit {
            items.last().map(|status| status.doc_id.clone())
        } else {
            None
        };
        Ok(StatusPage { items, next_token })
    }

    async fn delete(&self, user_id: &str, doc_id: &str) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .remove(&(user_id.to_string(), doc_id.to_string()));
        Ok(())
    }

    async fn begin(
        &self,
        user_id: &str,
        doc_id: &str,
        etag: &str,
    ) -> Result<LeaseDecision, StoreError> {
        let mut inner = self.inner.write().await;
        let key = (user_id.to_string(), doc_id.to_string());

        let decision = match inner.get(&key) {
            Some(existing) if existing.progress_status == ProgressStatus::InProgress => {
                debug!(doc_id, "lease busy, another ingestion run is in flight");
                return Ok(LeaseDecision::Busy);
            }
            Some(existing)
                if existing.etag == etag
                    && existing.progress_status == ProgressStatus::Complete =>
            {
                debug!(doc_id, etag, "etag unchanged, skipping re-ingestion");
                return Ok(LeaseDecision::Unchanged);
            }
            Some(existing) if existing.etag != etag => LeaseDecision::Acquired {
                stale_etag: Some(existing.etag.clone()),
            },
            _ => LeaseDecision::Acquired { stale_etag: None },
        };

        inner.insert(
            key,
            IngestionStatus::new(user_id, doc_id, etag, 0, ProgressStatus::InProgress),
        );
        Ok(decision)
    }
}
