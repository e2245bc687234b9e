use crate::client::CodeSyncClient;
use crate::config::Config;
use crate::error::VectorDbError;
use crate::types::*;

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    handler::server::{router::prompt::PromptRouter, tool::ToolRouter, wrapper::Parameters},
    model::*,
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct CodeSyncMcpServer {
    client: Arc<CodeSyncClient>,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl CodeSyncMcpServer {
    pub async fn new(config: Config) -> Result<Self> {
        let client = CodeSyncClient::new(config).await?;
        Ok(Self::with_client(Arc::new(client)))
    }

    pub fn with_client(client: Arc<CodeSyncClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    pub fn client(&self) -> &CodeSyncClient {
        &self.client
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Serialization failed: {}", e))
}

#[tool_router(router = tool_router)]
impl CodeSyncMcpServer {
    #[tool(
        description = "Semantic search over the indexed JavaScript, HTML, CSS, JSON and Vue chunks. Returns the closest chunks with their chunk_id, file path and similarity score."
    )]
    async fn search_code(
        &self,
        Parameters(req): Parameters<SearchRequest>,
    ) -> Result<String, String> {
        let response = self
            .client
            .search(req)
            .await
            .map_err(|e| format!("{:#}", e))?;
        to_json(&response)
    }

    #[tool(
        description = "Replace the code of one chunk (by chunk_id from search_code) in its source file and in the index. Reports file_updated and database_updated separately."
    )]
    async fn update_code(
        &self,
        Parameters(req): Parameters<UpdateRequest>,
    ) -> Result<String, String> {
        let chunk_id = req.chunk_id;
        let response = match self.client.update(req).await {
            Ok(response) => response,
            Err(e) => match e.downcast_ref::<VectorDbError>() {
                Some(VectorDbError::ChunkNotFound(_)) => {
                    UpdateResponse::failure(chunk_id, format!("Chunk ID {} not found", chunk_id))
                }
                _ => return Err(format!("{:#}", e)),
            },
        };
        to_json(&response)
    }

    #[tool(
        description = "Rebuild the whole index from the configured root folder. Drops and recreates the collection; chunk ids are reassigned."
    )]
    async fn reindex_codebase(
        &self,
        context: RequestContext<RoleServer>,
        Parameters(_req): Parameters<RebuildRequest>,
    ) -> Result<String, String> {
        let response = self
            .client
            .rebuild(context.ct.clone())
            .await
            .map_err(|e| format!("{:#}", e))?;
        to_json(&response)
    }

    #[tool(description = "Get chunk counts for the index, broken down by language")]
    async fn get_statistics(
        &self,
        Parameters(_req): Parameters<StatisticsRequest>,
    ) -> Result<String, String> {
        let response = self
            .client
            .statistics()
            .await
            .map_err(|e| format!("{:#}", e))?;
        to_json(&response)
    }

    #[tool(description = "Report whether the index exists and whether a rebuild is running")]
    async fn health_check(
        &self,
        Parameters(_req): Parameters<HealthRequest>,
    ) -> Result<String, String> {
        let response = self
            .client
            .health()
            .await
            .map_err(|e| format!("{:#}", e))?;
        to_json(&response)
    }
}

#[prompt_router]
impl CodeSyncMcpServer {
    #[prompt(name = "find", description = "Find code in the indexed project")]
    async fn find_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");

        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Use search_code to find the code for: {}. Show the chunk ids of the best matches.",
                query
            ),
        )])
    }

    #[prompt(
        name = "edit",
        description = "Find a chunk and rewrite it in place"
    )]
    async fn edit_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let change = args.get("change").and_then(|v| v.as_str()).unwrap_or("");

        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Use search_code to locate the code affected by this change, then call update_code \
                 with the rewritten chunk: {}",
                change
            ),
        )])
    }

    #[prompt(name = "reindex", description = "Rebuild the index from the root folder")]
    async fn reindex_prompt(&self) -> Vec<PromptMessage> {
        vec![PromptMessage::new_text(
            PromptMessageRole::User,
            "Please rebuild the code index with reindex_codebase.",
        )]
    }
}

#[tool_handler(router = self.tool_router)]
#[prompt_handler]
impl ServerHandler for CodeSyncMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "code-sync".into(),
                title: Some("Code Sync RAG - search and edit web code through its index".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Index of a JavaScript/HTML/CSS/JSON/Vue project. \
                Use search_code to find chunks, update_code to rewrite a chunk in both its file \
                and the index, and reindex_codebase after large changes on disk."
                    .into(),
            ),
        }
    }
}

impl CodeSyncMcpServer {
    pub async fn serve_stdio(config: Config) -> Result<()> {
        let server = Self::new(config)
            .await
            .context("Failed to create MCP server")?;
        server.run_stdio().await
    }

    /// Serve this server over stdin/stdout until the client disconnects
    pub async fn run_stdio(self) -> Result<()> {
        tracing::info!("Starting code-sync MCP server");
        let transport = rmcp::transport::io::stdio();
        self.serve(transport).await?.waiting().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
