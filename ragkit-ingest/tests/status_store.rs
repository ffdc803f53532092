use ragkit_core::{IngestionStatus, IngestionStatusStore, LeaseDecision, ProgressStatus};
use ragkit_ingest::InMemoryStatusStore;

#[tokio::test]
async fn first_begin_acquires_with_no_stale_generation() {
    let store = InMemoryStatusStore::new();

    let decision = store.begin("u1", "col/a.txt", "etag-1").await.unwrap();

    assert_eq!(decision, LeaseDecision::Acquired { stale_etag: None });
    let status = store.get("u1", "col/a.txt").await.unwrap().unwrap();
    assert_eq!(status.progress_status, ProgressStatus::InProgress);
    assert_eq!(status.etag, "etag-1");
}

#[tokio::test]
async fn begin_is_busy_while_a_run_is_in_flight() {
    let store = InMemoryStatusStore::new();
    store.begin("u1", "col/a.txt", "etag-1").await.unwrap();

    let decision = store.begin("u1", "col/a.txt", "etag-1").await.unwrap();
    assert_eq!(decision, LeaseDecision::Busy);

    // busy must not clobber the in-flight record's etag
    let status = store.get("u1", "col/a.txt").await.unwrap().unwrap();
    assert_eq!(status.etag, "etag-1");
}

#[tokio::test]
async fn same_etag_after_completion_is_unchanged() {
    let store = InMemoryStatusStore::new();
    store
        .put(IngestionStatus::new(
            "u1",
            "col/a.txt",
            "etag-1",
            7,
            ProgressStatus::Complete,
        ))
        .await
        .unwrap();

    let decision = store.begin("u1", "col/a.txt", "etag-1").await.unwrap();

    assert_eq!(decision, LeaseDecision::Unchanged);
    // an unchanged decision leaves the completed record alone
    let status = store.get("u1", "col/a.txt").await.unwrap().unwrap();
    assert_eq!(status.progress_status, ProgressStatus::Complete);
    assert_eq!(status.lines_processed, 7);
}

#[tokio::test]
async fn new_etag_surfaces_the_stale_generation() {
    let store = InMemoryStatusStore::new();
    store
        .put(IngestionStatus::new(
            "u1",
            "col/a.txt",
            "etag-1",
            7,
            ProgressStatus::Complete,
        ))
        .await
        .unwrap();

    let decision = store.begin("u1", "col/a.txt", "etag-2").await.unwrap();

    assert_eq!(
        decision,
        LeaseDecision::Acquired {
            stale_etag: Some("etag-1".to_string())
        }
    );
    let status = store.get("u1", "col/a.txt").await.unwrap().unwrap();
    assert_eq!(status.progress_status, ProgressStatus::InProgress);
    assert_eq!(status.etag, "etag-2");
}

#[tokio::test]
async fn failed_run_can_be_retried_with_the_same_etag() {
    let store = InMemoryStatusStore::new();
    store
        .put(IngestionStatus::new(
            "u1",
            "col/a.txt",
            "etag-1",
            0,
            ProgressStatus::Failed,
        ))
        .await
        .unwrap();

    let decision = store.begin("u1", "col/a.txt", "etag-1").await.unwrap();
    assert_eq!(decision, LeaseDecision::Acquired { stale_etag: None });
}

#[tokio::test]
async fn list_is_scoped_to_the_user_and_ordered_by_doc_id() {
    let store = InMemoryStatusStore::new();
    for (user, doc) in [
        ("u1", "col/b.txt"),
        ("u2", "col/x.txt"),
        ("u1", "col/a.txt"),
        ("u1", "col/c.txt"),
    ] {
        store
            .put(IngestionStatus::new(
                user,
                doc,
                "etag",
                0,
                ProgressStatus::Complete,
            ))
            .await
            .unwrap();
    }

    let page = store.list("u1", 10, None).await.unwrap();

    let docs: Vec<&str> = page.items.iter().map(|s| s.doc_id.as_str()).collect();
    assert_eq!(docs, vec!["col/a.txt", "col/b.txt", "col/c.txt"]);
    assert!(page.next_token.is_none());
}

#[tokio::test]
async fn list_paginates_with_a_continuation_token() {
    let store = InMemoryStatusStore::new();
    for i in 0..5 {
        store
            .put(IngestionStatus::new(
                "u1",
                format!("col/doc{i}.txt"),
                "etag",
                0,
                ProgressStatus::Complete,
            ))
            .await
            .unwrap();
    }

    let first = store.list("u1", 2, None).await.unwrap();
    assert_eq!(first.items.len(), 2);
    let token = first.next_token.clone().unwrap();
    assert_eq!(token, "col/doc1.txt");

    let second = store.list("u1", 2, Some(&token)).await.unwrap();
    let docs: Vec<&str> = second.items.iter().map(|s| s.doc_id.as_str()).collect();
    assert_eq!(docs, vec!["col/doc2.txt", "col/doc3.txt"]);

    let third = store
        .list("u1", 2, second.next_token.as_deref())
        .await
        .unwrap();
    assert_eq!(third.items.len(), 1);
}

#[tokio::test]
async fn delete_removes_only_the_named_record() {
    let store = InMemoryStatusStore::new();
    for doc in ["col/a.txt", "col/b.txt"] {
        store
            .put(IngestionStatus::new(
                "u1",
                doc,
                "etag",
                0,
                ProgressStatus::Complete,
            ))
            .await
            .unwrap();
    }

    store.delete("u1", "col/a.txt").await.unwrap();

    assert!(store.get("u1", "col/a.txt").await.unwrap().is_none());
    assert!(store.get("u1", "col/b.txt").await.unwrap().is_some());
}
