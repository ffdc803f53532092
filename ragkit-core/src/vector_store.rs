use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{StoreError, VectorDocument};

/// One semantic query, addressed to a single collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SemanticRequest {
    pub collection_id: String,
    pub search_terms: String,
}

impl SemanticRequest {
    pub fn new(collection_id: impl Into<String>, search_terms: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            search_terms: search_terms.into(),
        }
    }
}

/// A ranked result from a semantic query. Scores are normalized to the
/// best hit of the originating query, so 1.0 is the top match.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub document: VectorDocument,
    pub score: f32,
}

/// Abstraction over a tenant-scoped vector index.
///
/// Every operation is namespaced by `collection_id`; implementations share
/// one backing store across tenants, so scoping is a correctness
/// requirement, not an optimization.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the collection's index if absent. Already-exists is a
    /// successful no-op, not an error.
    async fn ensure_index(&self, collection_id: &str) -> Result<(), StoreError>;

    async fn delete_index(&self, collection_id: &str) -> Result<(), StoreError>;

    /// Embeds any document lacking a vector, then upserts by id.
    /// Safe to call repeatedly with the same ids. Returns the count saved.
    async fn save(
        &self,
        docs: Vec<VectorDocument>,
        collection_id: &str,
    ) -> Result<usize, StoreError>;

    async fn delete_record(&self, collection_id: &str, doc_id: &str) -> Result<(), StoreError>;

    /// Removes every chunk whose `source` metadata matches. Used to sweep a
    /// prior etag generation before re-ingestion.
    async fn delete_by_source(&self, collection_id: &str, source: &str)
        -> Result<usize, StoreError>;

    /// Lexical contains-match over chunk content.
    async fn query(
        &self,
        collection_id: &str,
        keyword: &str,
    ) -> Result<Vec<VectorDocument>, StoreError>;

    /// Nearest-neighbor search. Hits below `score_threshold` are excluded;
    /// ties keep stable request order.
    async fn semantic_query(
        &self,
        requests: &[SemanticRequest],
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchHit>, StoreError>;
}
