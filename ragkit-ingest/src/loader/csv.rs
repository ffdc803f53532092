use std::path::Path;
use std::sync::Arc;

use ragkit_core::{IngestError, VectorDocument};
use tracing::debug;

use super::{read_to_string, LoadContext, Loader};
use crate::splitter::{LineSplitter, ParagraphSplitter};

/// Loader for spreadsheet-style row files (CSV, TSV).
///
/// Rows are atomic: the line splitter packs whole rows under the token
/// budget and a single oversized row is a fatal error. The column-header
/// row is repeated at the top of every chunk so each chunk stays
/// interpretable on its own.
pub struct CsvLoader {
    line_splitter: LineSplitter,
}

impl CsvLoader {
    pub fn new(splitter: Arc<ParagraphSplitter>) -> Self {
        let line_splitter = LineSplitter::new(splitter.max_tokens_per_chunk())
            .expect("paragraph splitter guarantees a nonzero budget");
        Self { line_splitter }
    }
}

impl Loader for CsvLoader {
    fn load(&self, path: &Path) -> Result<String, IngestError> {
        read_to_string(path)
    }

    fn load_and_split(
        &self,
        path: &Path,
        ctx: &LoadContext,
    ) -> Result<Vec<VectorDocument>, IngestError> {
        let content = self.load(path)?;
        let mut lines = content.lines().filter(|line| !line.trim().is_empty());
        let Some(column_header) = lines.next() else {
            return Ok(Vec::new());
        };
        let rows: Vec<String> = lines.map(str::to_string).collect();

        let header = format!("{}\n{column_header}", ctx.header());
        let chunks = self.line_splitter.split(&rows, &ctx.source, &header)?;
        debug!(rows = rows.len(), chunks = chunks.len(), source = %ctx.source, "csv loader split rows");
        Ok(ctx.docs_from_chunks(chunks))
    }
}
