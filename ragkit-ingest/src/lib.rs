//! Document ingestion for ragkit: loaders turn stored files into text or
//! records, splitters pack them into token-budgeted chunks, and the
//! [`IngestionPipeline`] orchestrates load, split, embed, and save in
//! response to object-storage events.

mod loader;
mod pipeline;
mod splitter;
mod status;

pub use loader::{
    resolve_loader, CsvLoader, DocxLoader, JsonLoader, LoadContext, Loader, TextLoader,
};
#[cfg(feature = "pdf")]
pub use loader::PdfLoader;
pub use pipeline::{
    BatchReport, EventKind, IngestOutcome, IngestionPipeline, ObjectEvent, PipelineConfig,
};
pub use splitter::{
    LineSplitter, ParagraphSplitter, ParagraphSplitterBuilder, SplitterConfigError,
};
pub use status::InMemoryStatusStore;
