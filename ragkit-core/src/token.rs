/// Converts text to an approximate or exact token count.
///
/// Pure function of the input; the splitters call it on every packing
/// decision, so implementations should be cheap.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Whitespace-word heuristic, used when no model tokenizer is reachable.
///
/// Leans conservative (rounds up) because it gates a hard constraint:
/// a chunk must never exceed the model's budget.
#[derive(Clone, Debug)]
pub struct HeuristicTokenEstimator {
    tokens_per_word: f64,
}

impl HeuristicTokenEstimator {
    pub fn new(tokens_per_word: f64) -> Self {
        Self { tokens_per_word }
    }
}

impl Default for HeuristicTokenEstimator {
    fn default() -> Self {
        Self::new(1.3)
    }
}

impl TokenEstimator for HeuristicTokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        let words = text.split_whitespace().count();
        (words as f64 * self.tokens_per_word).ceil() as usize
    }
}

/// Exact counts from an embedding provider's tokenizer.
pub struct EmbeddingTokenEstimator {
    embedding: std::sync::Arc<dyn crate::Embedding>,
}

impl EmbeddingTokenEstimator {
    pub fn new(embedding: std::sync::Arc<dyn crate::Embedding>) -> Self {
        Self { embedding }
    }
}

impl TokenEstimator for EmbeddingTokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.embedding.token_count(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero_tokens() {
        let est = HeuristicTokenEstimator::default();
        assert_eq!(est.estimate(""), 0);
        assert_eq!(est.estimate("   \n "), 0);
    }

    #[test]
    fn rounds_up() {
        let est = HeuristicTokenEstimator::default();
        // one word * 1.3 => 2 tokens, never 1
        assert_eq!(est.estimate("hello"), 2);
        assert_eq!(est.estimate("one two three"), 4);
    }

    #[test]
    fn estimate_is_monotone_in_word_count() {
        let est = HeuristicTokenEstimator::default();
        let short = est.estimate("a b c");
        let long = est.estimate("a b c d e f");
        assert!(long >= short);
    }
}
