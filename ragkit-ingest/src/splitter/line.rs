use std::sync::Arc;

use ragkit_core::{HeuristicTokenEstimator, SplitError, TokenEstimator};

use super::{with_header, SplitterConfigError};

/// Packs an ordered sequence of atomic records (JSON lines, spreadsheet
/// rows) into token-budgeted chunks.
///
/// Same greedy accumulation and strict-less-than tie-break as the
/// paragraph splitter, but records are indivisible: one that exceeds the
/// budget on its own is a fatal error since no finer splitting strategy
/// exists.
pub struct LineSplitter {
    max_tokens_per_chunk: usize,
    estimator: Arc<dyn TokenEstimator>,
}

impl LineSplitter {
    pub fn new(max_tokens_per_chunk: usize) -> Result<Self, SplitterConfigError> {
        if max_tokens_per_chunk == 0 {
            return Err(SplitterConfigError::BudgetMustBeGreaterThanZero);
        }
        Ok(Self {
            max_tokens_per_chunk,
            estimator: Arc::new(HeuristicTokenEstimator::default()),
        })
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Greedily packs `records` under the budget, prefixing each emitted
    /// chunk with `header`.
    pub fn split(
        &self,
        records: &[String],
        source_id: &str,
        header: &str,
    ) -> Result<Vec<String>, SplitError> {
        let header_tokens = self.estimator.estimate(header);
        let mut chunks = Vec::new();
        let mut running = String::new();
        let mut running_tokens = header_tokens;

        for record in records {
            if record.trim().is_empty() {
                continue;
            }
            let line = format!("{record}\n");
            let line_tokens = self.estimator.estimate(&line);
            if header_tokens + line_tokens > self.max_tokens_per_chunk {
                return Err(SplitError::OversizedAtomicUnit {
                    source_id: source_id.to_string(),
                    token_count: header_tokens + line_tokens,
                    max_tokens: self.max_tokens_per_chunk,
                });
            }

            if running_tokens + line_tokens < self.max_tokens_per_chunk {
                running.push_str(&line);
                running_tokens += line_tokens;
            } else {
                if !running.trim().is_empty() {
                    chunks.push(with_header(header, running.trim_end()));
                }
                running = line;
                running_tokens = header_tokens + line_tokens;
            }
        }

        if !running.trim().is_empty() {
            chunks.push(with_header(header, running.trim_end()));
        }
        Ok(chunks)
    }

    /// One chunk per record, each prefixed with `header`. Oversized
    /// records still error.
    pub fn split_one_per_record(
        &self,
        records: &[String],
        source_id: &str,
        header: &str,
    ) -> Result<Vec<String>, SplitError> {
        let header_tokens = self.estimator.estimate(header);
        let mut chunks = Vec::with_capacity(records.len());
        for record in records {
            if record.trim().is_empty() {
                continue;
            }
            let record_tokens = self.estimator.estimate(record);
            if header_tokens + record_tokens > self.max_tokens_per_chunk {
                return Err(SplitError::OversizedAtomicUnit {
                    source_id: source_id.to_string(),
                    token_count: header_tokens + record_tokens,
                    max_tokens: self.max_tokens_per_chunk,
                });
            }
            chunks.push(with_header(header, record));
        }
        Ok(chunks)
    }
}
