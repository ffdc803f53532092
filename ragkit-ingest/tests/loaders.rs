use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ragkit_core::{IngestError, Value};
use ragkit_ingest::{
    resolve_loader, CsvLoader, DocxLoader, JsonLoader, LoadContext, Loader, ParagraphSplitter,
    TextLoader,
};
use zip::write::FileOptions;

fn splitter(budget: usize) -> Arc<ParagraphSplitter> {
    Arc::new(
        ParagraphSplitter::builder()
            .max_tokens_per_chunk(budget)
            .build()
            .unwrap(),
    )
}

fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn text_loader_stamps_ids_header_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "notes.txt", "first paragraph\n\nsecond paragraph");
    let loader = TextLoader::new(splitter(500));
    let ctx = LoadContext::new("col1", "notes.txt");

    let docs = loader.load_and_split(&path, &ctx).unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "col1/notes.txt:0");
    assert!(docs[0].content.starts_with("FILENAME: notes.txt"));
    assert!(docs[0].content.contains("second paragraph"));
    assert_eq!(
        docs[0].metadata.get("source"),
        Some(&Value::String("col1/notes.txt".to_string()))
    );
    assert_eq!(
        docs[0].metadata.get("title"),
        Some(&Value::String("notes.txt".to_string()))
    );
    assert!(docs[0].metadata.contains_key("upsert_date"));
    assert!(docs[0].vector.is_none());
}

#[test]
fn text_loader_chunk_ids_are_deterministic_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let long_text = (0..400)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ");
    let path = write_fixture(dir.path(), "big.txt", &long_text);
    let loader = TextLoader::new(splitter(50));
    let ctx = LoadContext::new("col1", "big.txt");

    let first = loader.load_and_split(&path, &ctx).unwrap();
    let second = loader.load_and_split(&path, &ctx).unwrap();

    assert!(first.len() > 1);
    let first_ids: Vec<_> = first.iter().map(|d| d.id.clone()).collect();
    let second_ids: Vec<_> = second.iter().map(|d| d.id.clone()).collect();
    assert_eq!(first_ids, second_ids);
    assert_eq!(first_ids[0], "col1/big.txt:0");
    assert_eq!(first_ids[1], "col1/big.txt:1");
}

#[test]
fn json_loader_resolves_fields_by_preference_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "rows.jsonl",
        "{\"text\": \"alpha body\", \"id\": \"r1\", \"title\": \"Alpha\"}\n\
         {\"page_content\": \"beta body\", \"text\": \"ignored\", \"url\": \"http://b\"}\n",
    );
    let loader = JsonLoader::new(splitter(500)).json_lines(true);
    let ctx = LoadContext::new("col1", "rows.jsonl");

    let docs = loader.load_and_split(&path, &ctx).unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "col1/rows.jsonl:row:r1");
    assert!(docs[0].content.starts_with("TITLE: Alpha"));
    assert!(docs[0].content.contains("alpha body"));
    // page_content beats text; url supplies both id and title
    assert_eq!(docs[1].id, "col1/rows.jsonl:row:http://b");
    assert!(docs[1].content.contains("beta body"));
    assert_eq!(
        docs[1].metadata.get("title"),
        Some(&Value::String("http://b".to_string()))
    );
}

#[test]
fn json_loader_reads_arrays_and_flattens_string_lists() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "scraped.json",
        "[{\"text\": [\"part one\", \"part two\"], \"id\": \"p\"}]",
    );
    let loader = JsonLoader::new(splitter(500));
    let ctx = LoadContext::new("col1", "scraped.json");

    let docs = loader.load_and_split(&path, &ctx).unwrap();

    assert_eq!(docs.len(), 1);
    assert!(docs[0].content.contains("part one part two"));
}

#[test]
fn json_loader_record_without_content_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "bad.jsonl", "{\"id\": \"only-an-id\"}\n");
    let loader = JsonLoader::new(splitter(500)).json_lines(true);
    let ctx = LoadContext::new("col1", "bad.jsonl");

    let error = loader.load_and_split(&path, &ctx).unwrap_err();
    assert!(matches!(error, IngestError::Parse { .. }));
}

#[test]
fn json_loader_pack_mode_groups_records_under_budget() {
    let dir = tempfile::tempdir().unwrap();
    let lines: String = (0..10)
        .map(|i| format!("{{\"text\": \"row number {i}\", \"id\": \"{i}\"}}\n"))
        .collect();
    let path = write_fixture(dir.path(), "rows.jsonl", &lines);
    let loader = JsonLoader::new(splitter(30)).json_lines(true).pack_records(true);
    let ctx = LoadContext::new("col1", "rows.jsonl");

    let docs = loader.load_and_split(&path, &ctx).unwrap();

    assert!(docs.len() > 1);
    assert_eq!(docs[0].id, "col1/rows.jsonl:0");
    assert!(docs[0].content.starts_with("FILENAME: rows.jsonl"));
}

#[test]
fn csv_loader_repeats_the_column_header_on_every_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "teams.csv",
        "name,team\nalice,red\nbob,blue\ncarol,red\ndan,blue\n",
    );
    let loader = CsvLoader::new(splitter(8));
    let ctx = LoadContext::new("col1", "teams.csv");

    let docs = loader.load_and_split(&path, &ctx).unwrap();

    assert!(docs.len() > 1);
    for doc in &docs {
        assert!(doc.content.starts_with("FILENAME: teams.csv\nname,team"));
    }
    let all: String = docs.iter().map(|d| d.content.as_str()).collect();
    for row in ["alice,red", "bob,blue", "carol,red", "dan,blue"] {
        assert!(all.contains(row), "row lost: {row}");
    }
    assert_eq!(docs[0].id, "col1/teams.csv:0");
}

#[test]
fn csv_loader_never_splits_a_row_across_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "wide.csv",
        "col\nshort\na row with quite a few more words than the budget allows\n",
    );
    let loader = CsvLoader::new(splitter(8));
    let ctx = LoadContext::new("col1", "wide.csv");

    let error = loader.load_and_split(&path, &ctx).unwrap_err();
    assert!(matches!(
        error,
        IngestError::Split(ragkit_core::SplitError::OversizedAtomicUnit { .. })
    ));
}

#[test]
fn csv_loader_handles_an_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "empty.csv", "");
    let loader = CsvLoader::new(splitter(8));
    let ctx = LoadContext::new("col1", "empty.csv");

    let docs = loader.load_and_split(&path, &ctx).unwrap();
    assert!(docs.is_empty());
}

fn write_docx(path: &Path, document_xml: &str, embedded: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options: FileOptions = FileOptions::default();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document_xml.as_bytes()).unwrap();
    for (name, content) in embedded {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn docx_loader_flattens_paragraphs_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.docx");
    let xml = "<w:document><w:body>\
        <w:p><w:r><w:t>Intro paragraph</w:t></w:r></w:p>\
        <w:p><w:r><w:t>Second paragraph</w:t></w:r></w:p>\
        <w:tbl><w:tr>\
          <w:tc><w:p><w:r><w:t>R1C1</w:t></w:r></w:p></w:tc>\
          <w:tc><w:p><w:r><w:t>R1C2</w:t></w:r></w:p></w:tc>\
        </w:tr></w:tbl>\
        </w:body></w:document>";
    write_docx(&path, xml, &[]);

    let loader = DocxLoader::new(splitter(500));
    let text = loader.load(&path).unwrap();

    assert!(text.starts_with("Intro paragraph\n\nSecond paragraph"));
    assert!(text.contains("R1C1 | R1C2"));
}

#[test]
fn docx_loader_appends_embedded_docs_as_attachments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("with_embed.docx");
    let xml = "<w:document><w:body><w:p><w:r><w:t>Main narrative</w:t></w:r></w:p></w:body></w:document>";
    write_docx(
        &path,
        xml,
        &[("word/embeddings/budget.csv", "year,amount\n2024,10")],
    );

    let loader = DocxLoader::new(splitter(500));
    let text = loader.load(&path).unwrap();

    assert!(text.starts_with("Main narrative"));
    assert!(text.contains("<attachments>"));
    assert!(text.contains("<filename>word/embeddings/budget.csv</filename>"));
    assert!(text.contains("year,amount"));
    assert!(text.contains("</attachments>"));
}

#[test]
fn docx_loader_rejects_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "broken.docx", "this is not a zip archive");
    let loader = DocxLoader::new(splitter(500));

    let error = loader.load(&path).unwrap_err();
    assert!(matches!(error, IngestError::Parse { .. }));
}

#[test]
fn resolver_rejects_unknown_extensions() {
    let Err(error) = resolve_loader(Path::new("movie.mp4"), splitter(500)) else {
        panic!("expected an unsupported-source error");
    };
    assert!(matches!(
        error,
        IngestError::UnsupportedSource { path } if path == Path::new("movie.mp4")
    ));
}

#[test]
fn resolver_routes_known_extensions() {
    assert!(resolve_loader(Path::new("a.txt"), splitter(500)).is_ok());
    assert!(resolve_loader(Path::new("a.md"), splitter(500)).is_ok());
    assert!(resolve_loader(Path::new("a.csv"), splitter(500)).is_ok());
    assert!(resolve_loader(Path::new("a.tsv"), splitter(500)).is_ok());
    assert!(resolve_loader(Path::new("a.json"), splitter(500)).is_ok());
    assert!(resolve_loader(Path::new("a.jsonl"), splitter(500)).is_ok());
    assert!(resolve_loader(Path::new("a.docx"), splitter(500)).is_ok());
}
