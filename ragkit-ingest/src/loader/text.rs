use std::path::Path;
use std::sync::Arc;

use ragkit_core::{IngestError, VectorDocument};

use super::{read_to_string, LoadContext, Loader};
use crate::splitter::ParagraphSplitter;

/// Plain-text loader: reads the file and hands it to the paragraph
/// splitter.
pub struct TextLoader {
    splitter: Arc<ParagraphSplitter>,
}

impl TextLoader {
    pub fn new(splitter: Arc<ParagraphSplitter>) -> Self {
        Self { splitter }
    }
}

impl Loader for TextLoader {
    fn load(&self, path: &Path) -> Result<String, IngestError> {
        read_to_string(path)
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
