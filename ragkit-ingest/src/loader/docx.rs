use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;
use ragkit_core::{IngestError, VectorDocument};
use tracing::debug;
use zip::ZipArchive;

use super::{LoadContext, Loader};
use crate::splitter::ParagraphSplitter;

/// DOCX loader: unpacks the OOXML container, flattens the main document's
/// paragraphs and table cells to text, and appends any embedded
/// sub-documents (a spreadsheet pasted into the doc, say) as delimited
/// `<attachment>` blocks so nested content stays searchable.
pub struct DocxLoader {
    splitter: Arc<ParagraphSplitter>,
}

impl DocxLoader {
    pub fn new(splitter: Arc<ParagraphSplitter>) -> Self {
        Self { splitter }
    }

    fn parse_err(path: &Path, reason: impl ToString) -> IngestError {
        IngestError::Parse {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    fn extract(path: &Path, bytes: &[u8]) -> Result<String, IngestError> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| Self::parse_err(path, e))?;

        let mut xml = Vec::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| Self::parse_err(path, e))?
            .read_to_end(&mut xml)
            .map_err(|e| Self::parse_err(path, e))?;
        let mut text =
            document_xml_to_text(&xml).map_err(|reason| Self::parse_err(path, reason))?;

        let embedded: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("word/embeddings/"))
            .map(str::to_string)
            .collect();

        if !embedded.is_empty() {
            text.push_str("\n\n<attachments>");
            for name in embedded {
                let mut bytes = Vec::new();
                archive
                    .by_name(&name)
                    .map_err(|e| Self::parse_err(path, e))?
                    .read_to_end(&mut bytes)
                    .map_err(|e| Self::parse_err(path, e))?;

                let content = match embedded_to_text(path, &name, &bytes) {
                    Some(content) => content,
                    None => {
                        debug!(%name, "skipping embedded object with no text extraction");
                        continue;
                    }
                };
                text.push_str(&format!(
                    "\n<attachment>\n<filename>{name}</filename>\n<content>\n{content}\n</content>\n</attachment>"
                ));
            }
            text.push_str("\n</attachments>");
        }
        Ok(text)
    }
}

fn embedded_to_text(path: &Path, name: &str, bytes: &[u8]) -> Option<String> {
    if name.ends_with(".docx") {
        DocxLoader::extract(path, bytes).ok()
    } else if name.ends_with(".txt") || name.ends_with(".csv") || name.ends_with(".json") {
        Some(String::from_utf8_lossy(bytes).into_owned())
    } else {
        None
    }
}

/// Flattens `word/document.xml` to plain text: paragraphs separated by
/// blank lines, table cells joined with ` | `, rows on their own lines.
fn document_xml_to_text(xml: &[u8]) -> Result<String, String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_run_text = false;
    let mut cell_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = true,
                b"w:tc" => cell_depth += 1,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => {
                    if cell_depth == 0 {
                        out.push_str("\n\n");
                    }
                }
                b"w:tc" => {
                    cell_depth = cell_depth.saturating_sub(1);
                    out.push_str(" | ");
                }
                b"w:tr" => {
                    if let Some(stripped) = out.strip_suffix(" | ") {
                        out.truncate(stripped.len());
                    }
                    out.push('\n');
                }
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"w:br" => out.push('\n'),
            Event::Text(t) if in_run_text => {
                out.push_str(&t.decode().map_err(|e| e.to_string())?)
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim().to_string())
}

impl Loader for DocxLoader {
    fn load(&self, path: &Path) -> Result<String, IngestError> {
        if path.extension().and_then(|e| e.to_str()) == Some("doc") {
            return Err(Self::parse_err(
                path,
                "legacy .doc files are not supported, re-save as .docx",
            ));
        }
        let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::extract(path, &bytes)
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
