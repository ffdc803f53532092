use std::sync::Arc;

use ragkit_core::{InMemoryObjectStore, SemanticRequest};
use ragkit_ingest::{
    EventKind, IngestionPipeline, InMemoryStatusStore, ObjectEvent, PipelineConfig,
};
use ragkit_retrieval::{HashEmbedder, InMemoryVectorStore, SearchOptions, SearchProvider};

#[tokio::main]
async fn main() {
    let embedder = Arc::new(HashEmbedder::new(16));
    let store = Arc::new(InMemoryVectorStore::new(embedder.clone()));
    let status = Arc::new(InMemoryStatusStore::new());
    let objects = Arc::new(InMemoryObjectStore::new());

    objects
        .put(
            "ingest",
            "u1/notes/pipeline.txt",
            b"Ingestion pipelines load documents, split them into chunks, \
              embed each chunk, and save the vectors.\n\n\
              Retrieval composes semantic queries over the collections a \
              user may read."
                .to_vec(),
        )
        .await;

    let pipeline = IngestionPipeline::new(
        store.clone(),
        status.clone(),
        objects.clone(),
        embedder,
        PipelineConfig::default(),
    )
    .unwrap();

    let event = ObjectEvent {
        kind: EventKind::Created,
        bucket: "ingest".to_string(),
        key: "u1/notes/pipeline.txt".to_string(),
        etag: "etag-1".to_string(),
        user_id: "u1".to_string(),
        collection_id: "notes".to_string(),
        filename: "pipeline.txt".to_string(),
    };
    let outcome = pipeline.handle_event(&event).await.unwrap();
    println!("ingested: {outcome:?}");

    let provider = SearchProvider::new(store, objects);
    let requests = [SemanticRequest {
        collection_id: "notes".to_string(),
        search_terms: "how are documents chunked".to_string(),
    }];
    let hits = provider
        .semantic_search(&requests, &SearchOptions::default())
        .await
        .unwrap();
    for hit in hits {
        println!("score={:.3} id={}", hit.score, hit.document.id);
    }
}
