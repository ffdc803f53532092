//! Core types and capability traits shared across the ragkit crates.
//!
//! Everything here is collaborator-agnostic: concrete vector stores,
//! embedders, and object stores live in downstream crates (or in the
//! caller's own integration code) and plug in through the traits exported
//! from this crate.

mod document;
mod embedding;
mod error;
mod object_store;
mod retry;
mod status;
mod token;
mod vector_store;

pub use document::{chunk_doc_id, VectorDocument};
pub use embedding::Embedding;
pub use error::{EmbeddingError, IngestError, SearchError, SplitError, StoreError};
pub use object_store::{InMemoryObjectStore, ObjectStore};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use status::{
    IngestionStatus, IngestionStatusStore, LeaseDecision, ProgressStatus, StatusPage,
};
pub use token::{EmbeddingTokenEstimator, HeuristicTokenEstimator, TokenEstimator};
pub use vector_store::{SearchHit, SemanticRequest, VectorStore};

/// Metadata values are free-form JSON scalars/structures.
pub type Value = serde_json::Value;
