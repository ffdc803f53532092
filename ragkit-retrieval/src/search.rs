use std::collections::HashSet;
use std::sync::Arc;

use ragkit_core::{
    ObjectStore, SearchError, SearchHit, SemanticRequest, StoreError, Value, VectorStore,
};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct SearchOptions {
    pub top_k: usize,
    pub score_threshold: f32,
    /// Replace each hit's chunk with its full source document, one object
    /// read per unique source.
    pub expand_parent_docs: bool,
    /// Keep only the highest-scoring hit per source.
    pub dedup_by_source: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            score_threshold: 0.2,
            expand_parent_docs: false,
            dedup_by_source: false,
        }
    }
}

/// Composes semantic queries across the collections a caller is
/// authorized to see. Authorization itself is the caller's concern; this
/// type only fans out, merges, and post-processes.
pub struct SearchProvider {
    store: Arc<dyn VectorStore>,
    objects: Arc<dyn ObjectStore>,
}

impl SearchProvider {
    pub fn new(store: Arc<dyn VectorStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    pub async fn semantic_search(
        &self,
        requests: &[SemanticRequest],
        opts: &SearchOptions,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let mut hits = self
            .store
            .semantic_query(requests, opts.top_k, opts.score_threshold)
            .await
            .map_err(|error| match error {
                StoreError::Unavailable(message) => SearchError::StoreUnavailable(message),
                other => SearchError::Store(other),
            })?;
        debug!(hits = hits.len(), "semantic query returned");

        if opts.dedup_by_source {
            hits = dedup_by_source(hits);
        }
        if opts.expand_parent_docs {
            hits = self.expand_parent_docs(hits).await?;
        }
        Ok(hits)
    }

    /// Swaps each chunk for its full parent document, stripping the chunk
    /// header the loaders injected. Hits whose metadata lacks a storage
    /// location are passed through unchanged.
    async fn expand_parent_docs(
        &self,
        hits: Vec<SearchHit>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let mut expanded = Vec::with_capacity(hits.len());
        for mut hit in hits {
            let location = hit
                .document
                .metadata
                .get("source_bucket")
                .and_then(Value::as_str)
                .zip(hit.document.metadata.get("source_key").and_then(Value::as_str));
            let Some((bucket, key)) = location else {
                expanded.push(hit);
                continue;
            };
            let bytes = self.objects.get(bucket, key).await.map_err(|error| {
                SearchError::ParentFetch {
                    location: format!("{bucket}/{key}"),
                    reason: error.to_string(),
                }
            })?;
            let body = String::from_utf8_lossy(&bytes);
            hit.document.content = strip_chunk_header(&body).to_string();
            expanded.push(hit);
        }
        Ok(expanded)
    }
}

/// Keeps the highest-scoring hit per `source`; hits arrive score-sorted,
/// so the first occurrence wins. Hits without a source are kept as-is.
fn dedup_by_source(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| {
            match hit
                .document
                .metadata
                .get("source")
                .and_then(Value::as_str)
            {
                Some(source) => seen.insert(source.to_string()),
                None => true,
            }
        })
        .collect()
}

/// Removes the loader-injected header lines (`FILENAME:`, `TITLE:`) from
/// the top of a chunk or parent document body.
pub fn strip_chunk_header(text: &str) -> &str {
    let mut rest = text;
    loop {
        let Some(line_end) = rest.find('\n') else {
            return rest;
        };
        let line = &rest[..line_end];
        let upper = line.trim_start().to_uppercase();
        if upper.starts_with("FILENAME:") || upper.starts_with("TITLE:") {
            rest = &rest[line_end + 1..];
        } else {
            return rest;
        }
    }
}
