use async_trait::async_trait;

use crate::EmbeddingError;

/// Hosted embedding model invocation.
///
/// Alongside vector production the provider exposes its tokenizer, which
/// the splitters use for exact budget decisions when available.
#[async_trait]
pub trait Embedding: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize;

    /// Exact token count for `text` under the model's tokenizer.
    fn token_count(&self, text: &str) -> usize;

    /// The model's maximum input sequence length, the default chunk budget.
    fn max_tokens(&self) -> usize;
}
