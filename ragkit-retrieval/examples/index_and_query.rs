use std::{collections::HashMap, sync::Arc};

use ragkit_core::{SemanticRequest, VectorDocument, VectorStore};
use ragkit_retrieval::{HashEmbedder, InMemoryVectorStore};

#[tokio::main]
async fn main() {
    let embedder = Arc::new(HashEmbedder::new(8));
    let store = InMemoryVectorStore::new(embedder);

    let texts = [
        "Rust is fast and memory efficient.",
        "Vector stores index embeddings for similarity search.",
        "Ingestion pipelines split documents into chunks.",
    ];
    let docs: Vec<VectorDocument> = texts
        .iter()
        .enumerate()
        .map(|(idx, text)| VectorDocument {
            id: format!("demo/doc.txt:{idx}"),
            content: text.to_string(),
            metadata: HashMap::new(),
            vector: None,
            meta_fields_to_context: Vec::new(),
        })
        .collect();

    store.save(docs, "demo").await.unwrap();

    let requests = [SemanticRequest {
        collection_id: "demo".to_string(),
        search_terms: "similarity search over embeddings".to_string(),
    }];
    let hits = store.semantic_query(&requests, 3, 0.0).await.unwrap();
    println!("Retrieved {} hits", hits.len());
    for hit in hits {
        println!("score={:.3} content={}", hit.score, hit.document.content);
    }
}
