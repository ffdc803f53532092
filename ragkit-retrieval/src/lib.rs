//! Retrieval-side building blocks: a tenant-scoped in-memory vector
//! store, a deterministic hash embedder for tests and examples, and the
//! search provider that composes semantic queries with parent-document
//! expansion and per-source deduplication.

mod hash_embedder;
mod in_memory;
mod search;

pub use hash_embedder::HashEmbedder;
pub use in_memory::InMemoryVectorStore;
pub use search::{strip_chunk_header, SearchOptions, SearchProvider};
