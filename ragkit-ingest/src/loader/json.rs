use std::path::Path;
use std::sync::Arc;

use ragkit_core::{IngestError, Value, VectorDocument};
use tracing::debug;

use super::{read_to_string, LoadContext, Loader};
use crate::splitter::{LineSplitter, ParagraphSplitter};

const CONTENT_FIELDS: [&str; 3] = ["page_content", "content", "text"];
const ID_FIELDS: [&str; 4] = ["source", "id", "url", "filename"];
const TITLE_FIELDS: [&str; 5] = ["title", "url", "source", "filename", "id"];

/// Loader for JSON arrays and JSON-lines files.
///
/// In record mode (the default) each record becomes one or more documents:
/// content, id, and title are resolved by field-order preference, and a
/// record whose content exceeds the budget routes through the paragraph
/// splitter. In packed mode raw records are greedily packed into chunks by
/// the line splitter instead.
pub struct JsonLoader {
    splitter: Arc<ParagraphSplitter>,
    line_splitter: LineSplitter,
    json_lines: bool,
    pack_records: bool,
}

impl JsonLoader {
    pub fn new(splitter: Arc<ParagraphSplitter>) -> Self {
        let line_splitter = LineSplitter::new(splitter.max_tokens_per_chunk())
            .expect("paragraph splitter guarantees a nonzero budget");
        Self {
            splitter,
            line_splitter,
            json_lines: false,
            pack_records: false,
        }
    }

    /// Force JSON-lines parsing (otherwise inferred from the content).
    pub fn json_lines(mut self, value: bool) -> Self {
        self.json_lines = value;
        self
    }

    /// Pack raw records into budget-sized chunks instead of emitting one
    /// document per record.
    pub fn pack_records(mut self, value: bool) -> Self {
        self.pack_records = value;
        self
    }

    fn parse_records(&self, path: &Path, content: &str) -> Result<Vec<Value>, IngestError> {
        let parse_err = |reason: String| IngestError::Parse {
            path: path.to_path_buf(),
            reason,
        };

        let records: Vec<Value> = if !self.json_lines && content.trim_start().starts_with('[') {
            serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?
        } else {
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line).map_err(|e| parse_err(e.to_string())))
                .collect::<Result<_, _>>()?
        };

        // Scrapy-style crawlers emit arrays of strings where a single text
        // value belongs; flatten them by joining with spaces.
        Ok(records.into_iter().map(flatten_string_arrays).collect())
    }

    fn record_docs(
        &self,
        records: Vec<Value>,
        ctx: &LoadContext,
        path: &Path,
    ) -> Result<Vec<VectorDocument>, IngestError> {
        let mut docs = Vec::new();
        for (row, record) in records.iter().enumerate() {
            let content = first_string(record, &CONTENT_FIELDS).ok_or_else(|| {
                IngestError::Parse {
                    path: path.to_path_buf(),
                    reason: format!("record {row} has no content field (tried {CONTENT_FIELDS:?})"),
                }
            })?;
            let record_id = first_string(record, &ID_FIELDS).unwrap_or_else(|| row.to_string());
            let doc_id = format!(
                "{}/{}:row:{}",
                ctx.collection_id, ctx.filename, record_id
            );
            let title = first_string(record, &TITLE_FIELDS).unwrap_or_else(|| doc_id.clone());

            let mut metadata = ctx.base_metadata();
            if let Value::Object(fields) = record {
                for (key, value) in fields {
                    metadata.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
            metadata.insert("title".to_string(), Value::String(title.clone()));

            let header = format!("TITLE: {title}");
            let chunks = self.splitter.split(&content, &ctx.source, &header)?;
            let multi = chunks.len() > 1;
            for (index, chunk) in chunks.into_iter().enumerate() {
                let id = if multi {
                    format!("{doc_id}:{index}")
                } else {
                    doc_id.clone()
                };
                docs.push(VectorDocument {
                    id,
                    content: chunk,
                    metadata: metadata.clone(),
                    vector: None,
                    meta_fields_to_context: vec!["title".to_string()],
                });
            }
        }
        debug!(count = docs.len(), source = %ctx.source, "json loader produced record documents");
        Ok(docs)
    }
}

impl Loader for JsonLoader {
    fn load(&self, path: &Path) -> Result<String, IngestError> {
        read_to_string(path)
    }

    fn load_and_split(
        &self,
        path: &Path,
        ctx: &LoadContext,
    ) -> Result<Vec<VectorDocument>, IngestError> {
        let content = self.load(path)?;
        let records = self.parse_records(path, &content)?;

        if self.pack_records {
            let lines: Vec<String> = records.iter().map(|record| record.to_string()).collect();
            let chunks = self
                .line_splitter
                .split(&lines, &ctx.source, &ctx.header())?;
            return Ok(ctx.docs_from_chunks(chunks));
        }

        self.record_docs(records, ctx, path)
    }
}

fn first_string(record: &Value, fields: &[&str]) -> Option<String> {
    let object = record.as_object()?;
    for field in fields {
        match object.get(*field) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(other) if !other.is_null() => return Some(other.to_string()),
            _ => continue,
        }
    }
    None
}

fn flatten_string_arrays(record: Value) -> Value {
    let Value::Object(fields) = record else {
        return record;
    };
    let flattened = fields
        .into_iter()
        .map(|(key, value)| match value {
            Value::Array(items) if items.iter().all(|item| item.is_string()) => {
                let joined = items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                (key, Value::String(joined))
            }
            other => (key, other),
        })
        .collect();
    Value::Object(flattened)
}
