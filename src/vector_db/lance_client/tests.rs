use super::*;
use tempfile::TempDir;

async fn open_db(temp_dir: &TempDir) -> LanceVectorDB {
    let db_path = temp_dir
        .path()
        .join("lancedb")
        .to_string_lossy()
        .to_string();
    LanceVectorDB::with_path(&db_path, "code_chunks").await.unwrap()
}

fn record(id: u64, language: &str, snippet: &str) -> ChunkRecord {
    ChunkRecord::new(
        id,
        "src/app.js",
        "app.js",
        language,
        id as usize,
        snippet,
        "Folder: src",
    )
}

#[tokio::test]
async fn test_new_creates_instance() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_db(&temp_dir).await;
    assert_eq!(db.collection_name(), "code_chunks");
    assert!(db.db_path().ends_with("lancedb"));
    assert!(!db.has_collection().await.unwrap());
}

#[tokio::test]
async fn test_default_path() {
    let path = LanceVectorDB::default_lancedb_path();
    assert!(path.contains("code-sync-rag"));
    assert!(path.contains("lancedb"));
}

#[tokio::test]
async fn test_create_and_drop_collection() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_db(&temp_dir).await;

    db.create_collection(4).await.unwrap();
    assert!(db.has_collection().await.unwrap());

    db.drop_collection().await.unwrap();
    assert!(!db.has_collection().await.unwrap());

    // Dropping a missing collection is not an error
    db.drop_collection().await.unwrap();
}

#[tokio::test]
async fn test_missing_collection_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_db(&temp_dir).await;
    let err = db.query_by_ids(&[0]).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VectorDbError>(),
        Some(VectorDbError::CollectionNotFound(_))
    ));
}

#[tokio::test]
async fn test_insert_query_and_delete() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_db(&temp_dir).await;
    db.create_collection(3).await.unwrap();

    let count = db
        .insert(
            vec![
                record(0, "javascript", "let a = 1;"),
                record(1, "css", "p { margin: 0; }"),
                record(2, "javascript", "run();"),
            ],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        )
        .await
        .unwrap();
    assert_eq!(count, 3);

    let found = db.query_by_ids(&[1]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].code_snippet, "p { margin: 0; }");
    assert_eq!(found[0].extra_context, "Folder: src");
    assert_eq!(found[0].chunk_index, 1);

    db.delete_by_ids(&[1]).await.unwrap();
    assert!(db.query_by_ids(&[1]).await.unwrap().is_empty());

    let stats = db.get_statistics().await.unwrap();
    assert_eq!(stats.total_chunks, 2);
    assert_eq!(stats.language_breakdown, vec![("javascript".to_string(), 2)]);
}

#[tokio::test]
async fn test_insert_empty_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_db(&temp_dir).await;
    db.create_collection(3).await.unwrap();
    assert_eq!(db.insert(vec![], vec![]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_dimension_mismatch() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_db(&temp_dir).await;
    db.create_collection(3).await.unwrap();
    let err = db
        .insert(vec![record(0, "css", "p {}")], vec![vec![1.0, 2.0]])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VectorDbError>(),
        Some(VectorDbError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));
}

#[tokio::test]
async fn test_search_returns_nearest_first() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_db(&temp_dir).await;
    db.create_collection(3).await.unwrap();
    db.insert(
        vec![
            record(0, "javascript", "first"),
            record(1, "css", "second"),
            record(2, "html", "third"),
        ],
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ],
    )
    .await
    .unwrap();

    let results = db.search(vec![0.0, 0.9, 0.1], 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record.id, 1);
    assert!(results[0].score >= results[1].score);
}

#[test]
fn test_id_filter() {
    assert_eq!(id_filter(&[3]), "id IN (3)");
    assert_eq!(id_filter(&[1, 2, 10]), "id IN (1, 2, 10)");
}
