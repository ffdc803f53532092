use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use ragkit_core::{
    Embedding, SearchHit, SemanticRequest, StoreError, Value, VectorDocument, VectorStore,
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Collection {
    docs: HashMap<String, VectorDocument>,
    dimension: Option<usize>,
}

/// Tenant-scoped in-memory vector store.
///
/// Each collection id names an isolated namespace; nothing ever reads
/// across namespaces, which keeps multi-tenant queries leak-free even
/// though all tenants share the one process-local map.
#[derive(Clone)]
pub struct InMemoryVectorStore {
    embedding: Arc<dyn Embedding>,
    embed_concurrency: usize,
    inner: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryVectorStore {
    pub fn new(embedding: Arc<dyn Embedding>) -> Self {
        Self {
            embedding,
            embed_concurrency: 4,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// How many chunks to embed in flight at once during `save`.
    pub fn embed_concurrency(mut self, value: usize) -> Self {
        self.embed_concurrency = value.max(1);
        self
    }

    /// Embeds documents that arrived without vectors. Embedding overlaps
    /// across chunks but output order matches input order, so chunk ids
    /// stay aligned.
    async fn embed_missing(
        &self,
        docs: Vec<VectorDocument>,
    ) -> Result<Vec<VectorDocument>, StoreError> {
        stream::iter(docs.into_iter().map(|mut doc| {
            let embedding = Arc::clone(&self.embedding);
            async move {
                if doc.vector.is_none() {
                    let vector = embedding
                        .embed(&doc.content)
                        .await
                        .map_err(|e| StoreError::Internal(Box::new(e)))?;
                    doc.vector = Some(vector);
                }
                Ok::<_, StoreError>(doc)
            }
        }))
        .buffered(self.embed_concurrency)
        .try_collect()
        .await
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_index(&self, collection_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.entry(collection_id.to_string()).or_default();
        Ok(())
    }

    async fn delete_index(&self, collection_id: &str) -> Result<(), StoreError> {
        self.inner.write().await.remove(collection_id);
        Ok(())
    }

    async fn save(
        &self,
        docs: Vec<VectorDocument>,
        collection_id: &str,
    ) -> Result<usize, StoreError> {
        for doc in &docs {
            if doc.id.trim().is_empty() {
                return Err(StoreError::InvalidId(doc.id.clone()));
            }
        }
        let docs = self.embed_missing(docs).await?;
        let count = docs.len();

        let mut inner = self.inner.write().await;
        let collection = inner.entry(collection_id.to_string()).or_default();
        for doc in docs {
            let dimension = doc
                .vector
                .as_ref()
                .map(Vec::len)
                .unwrap_or_default();
            match collection.dimension {
                Some(expected) if expected != dimension => {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        got: dimension,
                    });
                }
                None => collection.dimension = Some(dimension),
                _ => {}
            }
            collection.docs.insert(doc.id.clone(), doc);
        }
        debug!(collection_id, count, "saved documents");
        Ok(count)
    }

    async fn delete_record(&self, collection_id: &str, doc_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(collection) = inner.get_mut(collection_id) {
            collection.docs.remove(doc_id);
        }
        Ok(())
    }

    async fn delete_by_source(
        &self,
        collection_id: &str,
        source: &str,
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(collection) = inner.get_mut(collection_id) else {
            return Ok(0);
        };
        let before = collection.docs.len();
        collection
            .docs
            .retain(|_, doc| doc.metadata.get("source").and_then(Value::as_str) != Some(source));
        Ok(before - collection.docs.len())
    }

    async fn query(
        &self,
        collection_id: &str,
        keyword: &str,
    ) -> Result<Vec<VectorDocument>, StoreError> {
        let inner = self.inner.read().await;
        let Some(collection) = inner.get(collection_id) else {
            return Ok(Vec::new());
        };
        let needle = keyword.to_lowercase();
        let mut matches: Vec<VectorDocument> = collection
            .docs
            .values()
            .filter(|doc| doc.content.to_lowercase().contains(&needle))
            .cloned()
            .map(|mut doc| {
                doc.vector = None;
                doc
            })
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches)
    }

    async fn semantic_query(
        &self,
        requests: &[SemanticRequest],
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let mut merged: Vec<SearchHit> = Vec::new();
        for request in requests {
            let query_vector = self
                .embedding
                .embed(&request.search_terms)
                .await
                .map_err(|e| StoreError::Internal(Box::new(e)))?;

            let inner = self.inner.read().await;
            let Some(collection) = inner.get(&request.collection_id) else {
                continue;
            };

            let mut scored: Vec<SearchHit> = Vec::new();
            let mut ids: Vec<&String> = collection.docs.keys().collect();
            ids.sort();
            for id in ids {
                let doc = &collection.docs[id];
                let Some(vector) = doc.vector.as_ref() else {
                    continue;
                };
                let mut score = cosine_similarity(&query_vector, vector);
                if score.is_nan() {
                    score = f32::NEG_INFINITY;
                }
                let mut document = doc.clone();
                document.vector = None;
                scored.push(SearchHit { document, score });
            }

            // Normalize to the best hit of this query, then threshold.
            let max_score = scored.iter().map(|hit| hit.score).fold(0.0_f32, f32::max);
            if max_score > 0.0 {
                for hit in &mut scored {
                    hit.score /= max_score;
                }
            }
            scored.retain(|hit| hit.score >= score_threshold);
            scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(top_k);
            for hit in &mut scored {
                hit.document.metadata.insert(
                    "score".to_string(),
                    serde_json::Number::from_f64(hit.score as f64)
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                );
            }
            merged.extend(scored);
        }

        // Stable sort keeps request order on ties.
        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        merged.truncate(top_k);
        Ok(merged)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
