use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Per-document ingestion progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    Pending,
    InProgress,
    Complete,
    Failed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Pending => "PENDING",
            ProgressStatus::InProgress => "IN_PROGRESS",
            ProgressStatus::Complete => "COMPLETE",
            ProgressStatus::Failed => "FAILED",
        }
    }
}

/// Ingestion progress record, keyed by `(user_id, doc_id)`.
///
/// Wire form is flat string fields: `lines_processed` travels as a numeric
/// string and `last_modified` as ISO-8601 with a trailing `Z`, matching the
/// key-value metadata store's record shape.
#[derive(Clone, Debug, PartialEq)]
pub struct IngestionStatus {
    pub user_id: String,
    pub doc_id: String,
    pub etag: String,
    pub lines_processed: u64,
    pub progress_status: ProgressStatus,
    pub last_modified: DateTime<Utc>,
}

impl IngestionStatus {
    pub fn new(
        user_id: impl Into<String>,
        doc_id: impl Into<String>,
        etag: impl Into<String>,
        lines_processed: u64,
        progress_status: ProgressStatus,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            doc_id: doc_id.into(),
            etag: etag.into(),
            lines_processed,
            progress_status,
            last_modified: Utc::now(),
        }
    }

    /// Flat record form for the key-value metadata store.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.user_id,
            "doc_id": self.doc_id,
            "etag": self.etag,
            "lines_processed": self.lines_processed.to_string(),
            "progress_status": self.progress_status.as_str(),
            "last_modified": self.last_modified.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

/// One page of status records plus the continuation key, if more remain.
#[derive(Clone, Debug, Default)]
pub struct StatusPage {
    pub items: Vec<IngestionStatus>,
    pub next_token: Option<String>,
}

/// Outcome of attempting to start an ingestion run for a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaseDecision {
    /// Lease acquired; `stale_etag` holds the superseded generation's etag
    /// when the source changed and prior chunks must be swept first.
    Acquired { stale_etag: Option<String> },
    /// Another run holds the lease; retry with backoff.
    Busy,
    /// Same etag already ingested to completion; nothing to do.
    Unchanged,
}

/// Tracks per-document ingestion progress for idempotent reprocessing.
///
/// `begin` doubles as the per-document lease: it must be a conditional
/// write on the status record so two concurrent runs for the same
/// `(user_id, doc_id)` cannot both win.
#[async_trait]
pub trait IngestionStatusStore: Send + Sync {
    async fn put(&self, status: IngestionStatus) -> Result<(), StoreError>;

    async fn get(&self, user_id: &str, doc_id: &str)
        -> Result<Option<IngestionStatus>, StoreError>;

    /// Lists a user's records in `doc_id` order, starting after
    /// `start_after` when present.
    async fn list(
        &self,
        user_id: &str,
        limit: usize,
        start_after: Option<&str>,
    ) -> Result<StatusPage, StoreError>;

    async fn delete(&self, user_id: &str, doc_id: &str) -> Result<(), StoreError>;

    /// Atomically claims the document for ingestion with the given etag.
    async fn begin(
        &self,
        user_id: &str,
        doc_id: &str,
        etag: &str,
    ) -> Result<LeaseDecision, StoreError>;
}
