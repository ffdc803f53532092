mod line;
mod paragraph;

pub use line::LineSplitter;
pub use paragraph::{ParagraphSplitter, ParagraphSplitterBuilder};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitterConfigError {
    #[error("max_tokens_per_chunk must be greater than zero")]
    BudgetMustBeGreaterThanZero,
    #[error("split sequence list must not be empty")]
    EmptySplitSeqs,
}

/// Joins an optional header onto a chunk body.
fn with_header(header: &str, body: &str) -> String {
    if header.is_empty() {
        body.to_string()
    } else {
        format!("{header}\n{body}")
    }
}
