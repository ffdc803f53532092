use std::{error::Error as StdError, fmt, path::PathBuf, time::Duration};

use thiserror::Error;

/// Errors from the splitter family.
#[derive(Debug, Error)]
pub enum SplitError {
    /// A single indivisible unit (word, record) exceeds the token budget
    /// even after every delimiter has been tried. Fatal for the document;
    /// never silently truncated.
    #[error("atomic unit of {token_count} tokens exceeds budget of {max_tokens} in {source_id}")]
    OversizedAtomicUnit {
        source_id: String,
        token_count: usize,
        max_tokens: usize,
    },
}

/// Errors raised while loading and ingesting a source document.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported source type: {path}")]
    UnsupportedSource { path: PathBuf },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("ingestion already in progress for {doc_id}")]
    LeaseBusy { doc_id: String },
}

/// Errors from embedding providers.
#[derive(Debug)]
pub enum EmbeddingError {
    InvalidResponse(String),
    RateLimited { retry_after: Option<Duration> },
    Timeout(Duration),
    Provider(String),
    Other(Box<dyn StdError + Send + Sync>),
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingError::InvalidResponse(message) => {
                write!(f, "embedding invalid response: {message}")
            }
            EmbeddingError::RateLimited { retry_after } => match retry_after {
                Some(duration) => write!(f, "embedding rate limited (retry_after={duration:?})"),
                None => write!(f, "embedding rate limited (retry_after=unknown)"),
            },
            EmbeddingError::Timeout(duration) => write!(f, "embedding timeout after {duration:?}"),
            EmbeddingError::Provider(message) => write!(f, "embedding provider error: {message}"),
            EmbeddingError::Other(error) => write!(f, "embedding error: {error}"),
        }
    }
}

impl StdError for EmbeddingError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            EmbeddingError::Other(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl EmbeddingError {
    /// Transient failures are worth a bounded retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EmbeddingError::RateLimited { .. } | EmbeddingError::Timeout(_)
        )
    }
}

/// Errors from vector store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid document id: {0}")]
    InvalidId(String),
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Internal(#[source] Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Errors surfaced at query time.
///
/// Retrieval failures are explicit, never a silent empty result, so the
/// downstream generation step can decide how to degrade.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("vector store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("parent document fetch failed for {location}: {reason}")]
    ParentFetch { location: String, reason: String },
}
