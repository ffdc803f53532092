mod csv;
mod docx;
mod json;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

pub use csv::CsvLoader;
pub use docx::DocxLoader;
pub use json::JsonLoader;
#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use ragkit_core::{chunk_doc_id, IngestError, Value, VectorDocument};

use crate::splitter::ParagraphSplitter;

/// Per-file ingestion context handed to every loader: where the file came
/// from, plus metadata and header text to stamp onto each chunk.
#[derive(Clone, Debug)]
pub struct LoadContext {
    pub collection_id: String,
    pub filename: String,
    /// Source identifier, `"<collection_id>/<filename>"` by convention.
    pub source: String,
    pub extra_metadata: HashMap<String, Value>,
    pub extra_header_text: String,
}

impl LoadContext {
    pub fn new(collection_id: impl Into<String>, filename: impl Into<String>) -> Self {
        let collection_id = collection_id.into();
        let filename = filename.into();
        let source = format!("{collection_id}/{filename}");
        Self {
            collection_id,
            filename,
            source,
            extra_metadata: HashMap::new(),
            extra_header_text: String::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_metadata.insert(key.into(), value);
        self
    }

    pub fn with_header_text(mut self, header: impl Into<String>) -> Self {
        self.extra_header_text = header.into();
        self
    }

    /// Header affixed to every chunk. Injects a `FILENAME:` line when the
    /// caller's header text does not already carry one.
    pub(crate) fn header(&self) -> String {
        if self.extra_header_text.to_uppercase().contains("FILENAME") {
            self.extra_header_text.clone()
        } else if self.extra_header_text.is_empty() {
            format!("FILENAME: {}", self.filename)
        } else {
            format!("FILENAME: {}\n{}", self.filename, self.extra_header_text)
        }
    }

    pub(crate) fn base_metadata(&self) -> HashMap<String, Value> {
        let mut metadata = self.extra_metadata.clone();
        metadata
            .entry("source".to_string())
            .or_insert_with(|| Value::String(self.source.clone()));
        metadata
            .entry("title".to_string())
            .or_insert_with(|| Value::String(self.filename.clone()));
        metadata.insert(
            "upsert_date".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        metadata
    }

    /// Wraps split chunks into documents with deterministic ids so
    /// re-ingestion of an unchanged file upserts rather than duplicates.
    pub(crate) fn docs_from_chunks(&self, chunks: Vec<String>) -> Vec<VectorDocument> {
        let metadata = self.base_metadata();
        chunks
            .into_iter()
            .enumerate()
            .map(|(index, content)| VectorDocument {
                id: chunk_doc_id(&self.collection_id, &self.filename, index),
                content,
                metadata: metadata.clone(),
                vector: None,
                meta_fields_to_context: vec!["title".to_string()],
            })
            .collect()
    }
}

/// Converts one stored file into chunk documents.
pub trait Loader: Send + Sync {
    /// Extracts the file's plain-text content.
    fn load(&self, path: &Path) -> Result<String, IngestError>;

    /// Extracts, splits under the token budget, and stamps metadata.
    fn load_and_split(
        &self,
        path: &Path,
        ctx: &LoadContext,
    ) -> Result<Vec<VectorDocument>, IngestError>;
}

/// Resolves the loader for a file by extension. Unknown extensions are an
/// [`IngestError::UnsupportedSource`], which the pipeline records as a
/// failed document without aborting the batch.
pub fn resolve_loader(
    path: &Path,
    splitter: Arc<ParagraphSplitter>,
) -> Result<Box<dyn Loader>, IngestError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "text" | "md" => Ok(Box::new(TextLoader::new(splitter))),
        "csv" | "tsv" => Ok(Box::new(CsvLoader::new(splitter))),
        "json" => Ok(Box::new(JsonLoader::new(splitter))),
        "jsonl" => Ok(Box::new(JsonLoader::new(splitter).json_lines(true))),
        "docx" => Ok(Box::new(DocxLoader::new(splitter))),
        #[cfg(feature = "pdf")]
        "pdf" => Ok(Box::new(PdfLoader::new(splitter))),
        _ => Err(IngestError::UnsupportedSource {
            path: path.to_path_buf(),
        }),
    }
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, IngestError> {
    std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}
