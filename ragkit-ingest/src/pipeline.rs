use std::path::PathBuf;
use std::sync::Arc;

use ragkit_core::{
    retry_with_backoff, Embedding, EmbeddingError, EmbeddingTokenEstimator, IngestError,
    IngestionStatus, IngestionStatusStore, LeaseDecision, ObjectStore, ProgressStatus,
    RetryPolicy, StoreError, Value, VectorStore,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::loader::{resolve_loader, LoadContext};
use crate::splitter::{ParagraphSplitter, SplitterConfigError};

/// Orchestrator knobs. All fields default sensibly so a config file can
/// set only what it cares about.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-chunk token budget; 0 derives it from the embedding model's
    /// max sequence length.
    pub max_tokens_per_chunk: usize,
    /// Retry budget for transient embedding/store failures.
    pub retry_max_attempts: usize,
    /// How often to re-poll a busy per-document lease before giving up.
    pub lease_max_attempts: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: 0,
            retry_max_attempts: 3,
            lease_max_attempts: 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Removed,
}

/// Object-storage notification that triggers ingestion or removal.
#[derive(Clone, Debug, Deserialize)]
pub struct ObjectEvent {
    pub kind: EventKind,
    pub bucket: String,
    pub key: String,
    pub etag: String,
    pub user_id: String,
    pub collection_id: String,
    pub filename: String,
}

impl ObjectEvent {
    /// `"<collection_id>/<filename>"`, the document id used for status
    /// records and chunk `source` metadata.
    pub fn doc_id(&self) -> String {
        format!("{}/{}", self.collection_id, self.filename)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Document loaded, split, embedded, and saved.
    Ingested { chunks: usize },
    /// Same etag already ingested to completion; nothing was done.
    Skipped,
    /// Source removal propagated to the vector store and status table.
    Removed { chunks_deleted: usize },
}

/// Per-document outcomes for a batch of events. One document's failure
/// never aborts its siblings.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(String, Result<IngestOutcome, IngestError>)>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// Reacts to object-storage events: resolves the right loader, runs
/// load + split + embed + save, and keeps the ingestion status record
/// current. Collaborators are injected at construction; the pipeline owns
/// no global state.
pub struct IngestionPipeline {
    store: Arc<dyn VectorStore>,
    status: Arc<dyn IngestionStatusStore>,
    objects: Arc<dyn ObjectStore>,
    embedding: Arc<dyn Embedding>,
    splitter: Arc<ParagraphSplitter>,
    retry: RetryPolicy,
    lease_retry: RetryPolicy,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        status: Arc<dyn IngestionStatusStore>,
        objects: Arc<dyn ObjectStore>,
        embedding: Arc<dyn Embedding>,
        config: PipelineConfig,
    ) -> Result<Self, SplitterConfigError> {
        let budget = if config.max_tokens_per_chunk == 0 {
            embedding.max_tokens()
        } else {
            config.max_tokens_per_chunk
        };
        let splitter = Arc::new(
            ParagraphSplitter::builder()
                .max_tokens_per_chunk(budget)
                .estimator(Arc::new(EmbeddingTokenEstimator::new(Arc::clone(&embedding))))
                .build()?,
        );
        Ok(Self {
            store,
            status,
            objects,
            embedding,
            splitter,
            retry: RetryPolicy::new(config.retry_max_attempts),
            lease_retry: RetryPolicy::new(config.lease_max_attempts),
        })
    }

    pub fn splitter(&self) -> Arc<ParagraphSplitter> {
        Arc::clone(&self.splitter)
    }

    /// Processes a batch of events with bulkhead isolation between
    /// documents.
    pub async fn handle_batch(&self, events: &[ObjectEvent]) -> BatchReport {
        let mut report = BatchReport::default();
        for event in events {
            let outcome = self.handle_event(event).await;
            if let Err(error) = &outcome {
                warn!(doc_id = %event.doc_id(), %error, "document failed, continuing batch");
            }
            report.outcomes.push((event.doc_id(), outcome));
        }
        report
    }

    pub async fn handle_event(&self, event: &ObjectEvent) -> Result<IngestOutcome, IngestError> {
        match event.kind {
            EventKind::Created => self.handle_created(event).await,
            EventKind::Removed => self.handle_removed(event).await,
        }
    }

    async fn handle_created(&self, event: &ObjectEvent) -> Result<IngestOutcome, IngestError> {
        let doc_id = event.doc_id();
        match self.acquire_lease(event, &doc_id).await? {
            LeaseDecision::Unchanged => {
                info!(%doc_id, etag = %event.etag, "etag unchanged, skipping");
                return Ok(IngestOutcome::Skipped);
            }
            LeaseDecision::Busy => return Err(IngestError::LeaseBusy { doc_id }),
            LeaseDecision::Acquired { stale_etag } => {
                if let Some(stale) = stale_etag {
                    info!(%doc_id, %stale, etag = %event.etag, "source changed, replacing generation");
                }
            }
        }

        match self.ingest_document(event).await {
            Ok(chunks) => {
                self.status
                    .put(IngestionStatus::new(
                        &event.user_id,
                        &doc_id,
                        &event.etag,
                        chunks as u64,
                        ProgressStatus::Complete,
                    ))
                    .await?;
                info!(%doc_id, chunks, "document ingested");
                Ok(IngestOutcome::Ingested { chunks })
            }
            Err(error) => {
                // Load, split, and embed all run before the first store
                // write, so a failed run leaves the prior generation's
                // chunks queryable.
                if let Err(status_error) = self
                    .status
                    .put(IngestionStatus::new(
                        &event.user_id,
                        &doc_id,
                        &event.etag,
                        0,
                        ProgressStatus::Failed,
                    ))
                    .await
                {
                    warn!(%doc_id, %status_error, "failed to record FAILED status");
                }
                Err(error)
            }
        }
    }

    async fn ingest_document(&self, event: &ObjectEvent) -> Result<usize, IngestError> {
        self.store.ensure_index(&event.collection_id).await?;

        let bytes = retry_with_backoff(self.retry, StoreError::is_transient, || {
            self.objects.get(&event.bucket, &event.key)
        })
        .await?;

        let local_path = self.stage_locally(event, &bytes).await?;
        let loader = resolve_loader(&local_path, Arc::clone(&self.splitter))?;

        let ctx = LoadContext::new(&event.collection_id, &event.filename)
            .with_metadata("etag", Value::String(event.etag.clone()))
            .with_metadata("source_bucket", Value::String(event.bucket.clone()))
            .with_metadata("source_key", Value::String(event.key.clone()));
        let mut docs = loader.load_and_split(&local_path, &ctx)?;

        // Embed before any store write. Everything that can fail for
        // content reasons happens while the prior generation is still
        // intact and queryable; only the sweep and the upsert remain.
        let texts: Vec<String> = docs.iter().map(|doc| doc.content.clone()).collect();
        let vectors = retry_with_backoff(self.retry, EmbeddingError::is_transient, || {
            self.embedding.embed_batch(&texts)
        })
        .await?;
        for (doc, vector) in docs.iter_mut().zip(vectors) {
            doc.vector = Some(vector);
        }

        // Unconditional sweep: clears the prior complete generation and
        // any partial leftovers from an earlier failed run, even when the
        // status record no longer remembers which etag wrote them.
        let swept = retry_with_backoff(self.retry, StoreError::is_transient, || {
            self.store.delete_by_source(&event.collection_id, &ctx.source)
        })
        .await?;
        if swept > 0 {
            info!(source = %ctx.source, swept, "removed prior chunk generation");
        }

        let saved = retry_with_backoff(self.retry, StoreError::is_transient, || {
            self.store.save(docs.clone(), &event.collection_id)
        })
        .await?;

        if let Err(error) = tokio::fs::remove_file(&local_path).await {
            warn!(path = %local_path.display(), %error, "failed to clean staged file");
        }
        Ok(saved)
    }

    async fn handle_removed(&self, event: &ObjectEvent) -> Result<IngestOutcome, IngestError> {
        let doc_id = event.doc_id();
        let chunks_deleted = retry_with_backoff(self.retry, StoreError::is_transient, || {
            self.store.delete_by_source(&event.collection_id, &doc_id)
        })
        .await?;
        self.status.delete(&event.user_id, &doc_id).await?;
        info!(%doc_id, chunks_deleted, "document removed");
        Ok(IngestOutcome::Removed { chunks_deleted })
    }

    async fn acquire_lease(
        &self,
        event: &ObjectEvent,
        doc_id: &str,
    ) -> Result<LeaseDecision, IngestError> {
        let mut attempt = 0;
        loop {
            let decision = self
                .status
                .begin(&event.user_id, doc_id, &event.etag)
                .await?;
            if decision != LeaseDecision::Busy {
                return Ok(decision);
            }
            attempt += 1;
            if attempt >= self.lease_retry.max_attempts {
                return Ok(LeaseDecision::Busy);
            }
            let delay = self.lease_retry.delay_for(attempt - 1);
            warn!(%doc_id, attempt, ?delay, "lease busy, backing off");
            tokio::time::sleep(delay).await;
        }
    }

    /// Stages the object's bytes on local disk for the loaders.
    async fn stage_locally(
        &self,
        event: &ObjectEvent,
        bytes: &[u8],
    ) -> Result<PathBuf, IngestError> {
        let dir = std::env::temp_dir().join("ragkit-ingest").join(&event.collection_id);
        let path = dir.join(&event.filename);
        let io_err = |source| IngestError::Io {
            path: path.clone(),
            source,
        };
        tokio::fs::create_dir_all(&dir).await.map_err(io_err)?;
        tokio::fs::write(&path, bytes).await.map_err(io_err)?;
        Ok(path)
    }
}
