use std::fmt;
use std::sync::Arc;

use ragkit_core::{HeuristicTokenEstimator, SplitError, TokenEstimator};
use tracing::trace;

use super::{with_header, SplitterConfigError};

const DEFAULT_SPLIT_SEQS: [&str; 5] = ["\n\n\n", "\n\n", "\n", ". ", " "];

/// Token-budget-aware recursive text splitter.
///
/// Packs semantic units (paragraphs, then lines, sentences, words) into
/// chunks as close to `max_tokens_per_chunk` as possible without exceeding
/// it, preferring the coarsest delimiter that works. A unit that still
/// exceeds the budget is re-split on the next, finer delimiter; exhausting
/// the delimiter list on an oversized unit is a fatal per-document error.
///
/// Tie-break: a part is appended to the running chunk only while the total
/// stays strictly below the budget, leaving headroom for tokenizer
/// estimation error. Header tokens count against every chunk's budget.
pub struct ParagraphSplitter {
    max_tokens_per_chunk: usize,
    split_seqs: Vec<String>,
    estimator: Arc<dyn TokenEstimator>,
}

impl fmt::Debug for ParagraphSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParagraphSplitter")
            .field("max_tokens_per_chunk", &self.max_tokens_per_chunk)
            .field("split_seqs", &self.split_seqs)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ParagraphSplitterBuilder {
    max_tokens_per_chunk: Option<usize>,
    split_seqs: Option<Vec<String>>,
    estimator: Option<Arc<dyn TokenEstimator>>,
}

impl ParagraphSplitterBuilder {
    pub fn max_tokens_per_chunk(mut self, value: usize) -> Self {
        self.max_tokens_per_chunk = Some(value);
        self
    }

    pub fn split_seqs<I, S>(mut self, seqs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.split_seqs = Some(seqs.into_iter().map(Into::into).collect());
        self
    }

    pub fn estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn build(self) -> Result<ParagraphSplitter, SplitterConfigError> {
        let max_tokens_per_chunk = self.max_tokens_per_chunk.unwrap_or(0);
        if max_tokens_per_chunk == 0 {
            return Err(SplitterConfigError::BudgetMustBeGreaterThanZero);
        }
        let split_seqs = self
            .split_seqs
            .unwrap_or_else(|| DEFAULT_SPLIT_SEQS.iter().map(|s| s.to_string()).collect());
        if split_seqs.is_empty() {
            return Err(SplitterConfigError::EmptySplitSeqs);
        }
        Ok(ParagraphSplitter {
            max_tokens_per_chunk,
            split_seqs,
            estimator: self
                .estimator
                .unwrap_or_else(|| Arc::new(HeuristicTokenEstimator::default())),
        })
    }
}

impl ParagraphSplitter {
    pub fn builder() -> ParagraphSplitterBuilder {
        ParagraphSplitterBuilder::default()
    }

    pub fn max_tokens_per_chunk(&self) -> usize {
        self.max_tokens_per_chunk
    }

    /// Splits `content` into ordered chunks, each prefixed with `header`
    /// and individually within the token budget. `source_id` only labels
    /// errors.
    pub fn split(
        &self,
        content: &str,
        source_id: &str,
        header: &str,
    ) -> Result<Vec<String>, SplitError> {
        // Content cleaning, not a splitting rule: non-breaking spaces and
        // tabs confuse both tokenizers and delimiter matching.
        let content = content.replace('\u{a0}', "").replace('\t', "");
        self.split_at_depth(&content, source_id, header, 0)
    }

    fn split_at_depth(
        &self,
        content: &str,
        source_id: &str,
        header: &str,
        depth: usize,
    ) -> Result<Vec<String>, SplitError> {
        let header_tokens = self.estimator.estimate(header);
        let content_tokens = self.estimator.estimate(content);
        if header_tokens + content_tokens <= self.max_tokens_per_chunk {
            return Ok(vec![with_header(header, content)]);
        }

        let Some(seq) = self.split_seqs.get(depth) else {
            return Err(SplitError::OversizedAtomicUnit {
                source_id: source_id.to_string(),
                token_count: header_tokens + content_tokens,
                max_tokens: self.max_tokens_per_chunk,
            });
        };
        trace!(depth, seq = seq.escape_debug().to_string(), "re-splitting oversized unit");

        let mut chunks = Vec::new();
        let mut running = String::new();
        let mut running_tokens = header_tokens;

        let pieces: Vec<&str> = content.split(seq.as_str()).collect();
        for (index, raw_part) in pieces.iter().enumerate() {
            if raw_part.trim().is_empty() {
                continue;
            }
            // Re-append the delimiter to every piece it actually followed,
            // so reassembly stays lossless modulo the greedy packing.
            let part = if index + 1 < pieces.len() {
                format!("{raw_part}{seq}")
            } else {
                (*raw_part).to_string()
            };
            let part_tokens = self.estimator.estimate(&part);

            if header_tokens + part_tokens > self.max_tokens_per_chunk {
                // This part alone cannot fit; flush what we have and
                // splice in the sub-chunks from the next finer delimiter.
                if !running.trim().is_empty() {
                    chunks.push(with_header(header, running.trim_end()));
                }
                running.clear();
                running_tokens = header_tokens;
                chunks.extend(self.split_at_depth(&part, source_id, header, depth + 1)?);
                continue;
            }

            if running_tokens + part_tokens < self.max_tokens_per_chunk {
                running.push_str(&part);
                running_tokens += part_tokens;
            } else {
                if !running.trim().is_empty() {
                    chunks.push(with_header(header, running.trim_end()));
                }
                running = part;
                running_tokens = header_tokens + part_tokens;
            }
        }

        if !running.trim().is_empty() {
            chunks.push(with_header(header, running.trim_end()));
        }
        Ok(chunks)
    }
}
