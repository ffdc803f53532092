use async_trait::async_trait;
use ragkit_core::{Embedding, EmbeddingError};

const FNV_OFFSET: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

fn fnv1a(bytes: &[u8], seed: u64) -> u64 {
    let mut hash = FNV_OFFSET ^ seed;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic, network-free embedder. Equal texts get equal vectors,
/// which is all the ingestion and store tests need. Token counts use the
/// same whitespace-word rule everywhere, so budget assertions stay exact.
#[derive(Clone)]
pub struct HashEmbedder {
    dimension: usize,
    max_tokens: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            max_tokens: 512,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn hash_to_vec(&self, text: &str) -> Vec<f32> {
        let bytes = text.as_bytes();
        let mut vec = Vec::with_capacity(self.dimension);
        for idx in 0..self.dimension {
            let value = fnv1a(bytes, idx as u64);
            let normalized = (value % 10_000) as f32 / 10_000.0;
            vec.push(normalized);
        }
        vec
    }
}

#[async_trait]
impl Embedding for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.hash_to_vec(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.hash_to_vec(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn token_count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}
