use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Value;

/// The canonical chunk record stored in and retrieved from a vector index.
///
/// `vector` stays `None` until an embedder has run; stores embed lazily on
/// `save`. `meta_fields_to_context` lists the metadata keys (in order) that
/// [`VectorDocument::to_context_string`] surfaces as labeled context lines
/// when the chunk is rendered into a prompt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VectorDocument {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub vector: Option<Vec<f32>>,
    #[serde(default)]
    pub meta_fields_to_context: Vec<String>,
}

impl VectorDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
            vector: None,
            meta_fields_to_context: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Renders the selected metadata keys as `KEY: value` lines above the
    /// chunk body, the shape the downstream generation step consumes.
    pub fn to_context_string(&self) -> String {
        let mut out = String::new();
        for key in &self.meta_fields_to_context {
            if let Some(value) = self.metadata.get(key) {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.push_str(&format!("{}: {}\n", key.to_uppercase(), rendered));
            }
        }
        out.push_str(&self.content);
        out
    }
}

/// Deterministic chunk id for a (collection, filename, chunk-index) triple.
///
/// Stable across runs so re-ingesting an unchanged file upserts the same
/// records instead of appending duplicates.
pub fn chunk_doc_id(collection_id: &str, filename: &str, chunk_index: usize) -> String {
    format!("{collection_id}/{filename}:{chunk_index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chunk_ids_are_stable() {
        assert_eq!(chunk_doc_id("col1", "notes.txt", 0), "col1/notes.txt:0");
        assert_eq!(
            chunk_doc_id("col1", "notes.txt", 0),
            chunk_doc_id("col1", "notes.txt", 0)
        );
    }

    #[test]
    fn context_string_prefixes_selected_metadata() {
        let mut doc = VectorDocument::new("c/f:0", "body text")
            .with_metadata("title", json!("Quarterly Report"))
            .with_metadata("page", json!(3));
        doc.meta_fields_to_context = vec!["title".to_string(), "page".to_string()];

        assert_eq!(
            doc.to_context_string(),
            "TITLE: Quarterly Report\nPAGE: 3\nbody text"
        );
    }

    #[test]
    fn context_string_skips_missing_keys() {
        let mut doc = VectorDocument::new("c/f:0", "body");
        doc.meta_fields_to_context = vec!["absent".to_string()];
        assert_eq!(doc.to_context_string(), "body");
    }

    #[test]
    fn serializes_with_all_fields() {
        let doc = VectorDocument::new("id", "text");
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("id").is_some());
        assert!(value.get("content").is_some());
        assert!(value.get("metadata").is_some());
        assert!(value.get("vector").is_some());
        assert!(value.get("meta_fields_to_context").is_some());
    }
}
