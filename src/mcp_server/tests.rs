use super::*;
use crate::embedding::EmbeddingProvider;
use crate::vector_db::MemoryVectorDB;
use tempfile::TempDir;

const DIM: usize = 8;

struct FakeEmbedder;

impl EmbeddingProvider for FakeEmbedder {
    fn embed_batch(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .into_iter()
            .map(|text| {
                let mut v = vec![0.0; DIM];
                for b in text.bytes() {
                    v[b as usize % DIM] += 1.0;
                }
                v
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

fn server_for(root: &std::path::Path) -> CodeSyncMcpServer {
    let mut config = Config::default();
    config.indexing.root_path = root.to_path_buf();
    let client = CodeSyncClient::with_backends(
        config,
        Arc::new(FakeEmbedder),
        Arc::new(MemoryVectorDB::new("code")),
    );
    CodeSyncMcpServer::with_client(Arc::new(client))
}

async fn indexed_server(dir: &TempDir) -> CodeSyncMcpServer {
    std::fs::write(
        dir.path().join("app.js"),
        "function greet(name) {\n  return 'hi ' + name;\n}\n",
    )
    .unwrap();
    let server = server_for(dir.path());
    server
        .client()
        .rebuild(tokio_util::sync::CancellationToken::new())
        .await
        .unwrap();
    server
}

#[test]
fn test_get_info() {
    let dir = TempDir::new().unwrap();
    let server = server_for(dir.path());

    let info = server.get_info();

    assert_eq!(info.server_info.name, "code-sync");
    assert!(info.server_info.title.is_some());
    assert!(info.instructions.is_some());
    assert!(info.capabilities.tools.is_some());
    assert!(info.capabilities.prompts.is_some());
}

#[test]
fn test_server_cloneable() {
    let dir = TempDir::new().unwrap();
    let server = server_for(dir.path());
    let cloned = server.clone();
    assert_eq!(cloned.client().root(), server.client().root());
}

#[tokio::test]
async fn test_tool_search_code() {
    let dir = TempDir::new().unwrap();
    let server = indexed_server(&dir).await;

    let output = server
        .search_code(Parameters(SearchRequest {
            query: "greet".to_string(),
            top_k: Some(1),
        }))
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["file_name"], "app.js");
}

#[tokio::test]
async fn test_tool_search_code_validation_failure() {
    let dir = TempDir::new().unwrap();
    let server = indexed_server(&dir).await;

    let result = server
        .search_code(Parameters(SearchRequest {
            query: "   ".to_string(),
            top_k: Some(2),
        }))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_tool_update_code_patches_file() {
    let dir = TempDir::new().unwrap();
    let server = indexed_server(&dir).await;

    let output = server
        .update_code(Parameters(UpdateRequest {
            chunk_id: 0,
            new_code: "function greet(name) {\n  return 'hello ' + name;\n}".to_string(),
        }))
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["file_updated"], true);
    assert_eq!(json["database_updated"], true);
    assert_eq!(json["match_strategy"], "exact");

    let on_disk = std::fs::read_to_string(dir.path().join("app.js")).unwrap();
    assert!(on_disk.contains("'hello '"));
}

#[tokio::test]
async fn test_tool_update_code_unknown_chunk() {
    let dir = TempDir::new().unwrap();
    let server = indexed_server(&dir).await;

    let output = server
        .update_code(Parameters(UpdateRequest {
            chunk_id: 999,
            new_code: "const x = 1;".to_string(),
        }))
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["file_updated"], false);
    assert_eq!(json["database_updated"], false);
    assert!(json["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_tool_update_code_empty_code_rejected() {
    let dir = TempDir::new().unwrap();
    let server = indexed_server(&dir).await;

    let result = server
        .update_code(Parameters(UpdateRequest {
            chunk_id: 0,
            new_code: "  \n ".to_string(),
        }))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_tool_get_statistics() {
    let dir = TempDir::new().unwrap();
    let server = indexed_server(&dir).await;

    let output = server
        .get_statistics(Parameters(StatisticsRequest {}))
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["total_chunks"], 1);
    assert_eq!(json["language_breakdown"][0]["language"], "javascript");
}

#[tokio::test]
async fn test_tool_get_statistics_empty_index() {
    let dir = TempDir::new().unwrap();
    let server = server_for(dir.path());

    let output = server
        .get_statistics(Parameters(StatisticsRequest {}))
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["total_chunks"], 0);
}

#[tokio::test]
async fn test_tool_health_check() {
    let dir = TempDir::new().unwrap();
    let server = indexed_server(&dir).await;

    let output = server
        .health_check(Parameters(HealthRequest {}))
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["collection_exists"], true);
    assert_eq!(json["index_state"], "ready");
}

#[tokio::test]
async fn test_prompt_find_with_query() {
    let dir = TempDir::new().unwrap();
    let server = server_for(dir.path());

    let args = serde_json::json!({ "query": "login form" });
    let messages = server.find_prompt(Parameters(args)).await.unwrap();

    assert!(!messages.is_empty());
    let debug_str = format!("{:?}", messages[0].content);
    assert!(debug_str.contains("login form"));
}

#[tokio::test]
async fn test_prompt_edit_mentions_update_tool() {
    let dir = TempDir::new().unwrap();
    let server = server_for(dir.path());

    let args = serde_json::json!({ "change": "rename greet to welcome" });
    let messages = server.edit_prompt(Parameters(args)).await.unwrap();

    let debug_str = format!("{:?}", messages[0].content);
    assert!(debug_str.contains("update_code"));
    assert!(debug_str.contains("rename greet to welcome"));
}

#[tokio::test]
async fn test_prompt_reindex() {
    let dir = TempDir::new().unwrap();
    let server = server_for(dir.path());

    let messages = server.reindex_prompt().await;
    let debug_str = format!("{:?}", messages[0].content);
    assert!(debug_str.contains("reindex_codebase"));
}
