use std::path::Path;
use std::sync::Arc;

use ragkit_core::{IngestError, VectorDocument};

use super::{LoadContext, Loader};
use crate::splitter::ParagraphSplitter;

/// PDF loader backed by `pdf-extract`. Only available with the `pdf`
/// cargo feature.
pub struct PdfLoader {
    splitter: Arc<ParagraphSplitter>,
}

impl PdfLoader {
    pub fn new(splitter: Arc<ParagraphSplitter>) -> Self {
        Self { splitter }
    }
}

impl Loader for PdfLoader {
    fn load(&self, path: &Path) -> Result<String, IngestError> {
        pdf_extract::extract_text(path).map_err(|e| IngestError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn load_and_split(
        &self,
        path: &Path,
        ctx: &LoadContext,
    ) -> Result<Vec<VectorDocument>, IngestError> {
        let content = self.load(path)?;
        let chunks = self.splitter.split(&content, &ctx.source, &ctx.header())?;
        Ok(ctx.docs_from_chunks(chunks))
    }
}
