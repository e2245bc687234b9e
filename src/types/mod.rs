use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest accepted search query, in characters
pub const MAX_QUERY_CHARS: usize = 500;
/// Upper bound for `top_k` unless the configuration lowers it
pub const MAX_TOP_K: usize = 10;
/// Longest accepted replacement code, in characters
pub const MAX_NEW_CODE_CHARS: usize = 10_000;

/// Request to search the indexed chunks
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchRequest {
    /// Natural-language or code query (1-500 characters)
    pub query: String,
    /// Number of results to return (1-10); the server default (2) when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), String> {
        self.validate_with(MAX_TOP_K)
    }

    /// Validate against a configured `top_k` ceiling
    pub fn validate_with(&self, max_top_k: usize) -> Result<(), String> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err("query cannot be empty".to_string());
        }
        let chars = query.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(format!(
                "query too long: {} characters (max {})",
                chars, MAX_QUERY_CHARS
            ));
        }
        if let Some(top_k) = self.top_k
            && (top_k == 0 || top_k > max_top_k)
        {
            return Err(format!(
                "top_k must be between 1 and {}, got {}",
                max_top_k, top_k
            ));
        }
        Ok(())
    }
}

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CodeResult {
    /// Identifier to pass to `update_code`
    pub chunk_id: u64,
    /// File path relative to the indexed root
    pub file_path: String,
    pub file_name: String,
    /// Language tag (javascript, html, css, json, vue-template, ...)
    pub language: String,
    /// Position of the chunk within its file
    pub chunk_index: usize,
    pub code_snippet: String,
    /// Higher is more similar
    pub similarity_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchResponse {
    pub success: bool,
    /// Hits ordered by decreasing similarity
    pub results: Vec<CodeResult>,
    pub count: usize,
    /// The query as received
    pub query: String,
    pub duration_ms: u64,
}

/// Request to replace one chunk's code in the source file and the index
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateRequest {
    /// Chunk identifier from a search result
    pub chunk_id: u64,
    /// Replacement code (1-10000 characters, surrounding whitespace is trimmed)
    pub new_code: String,
}

impl UpdateRequest {
    pub fn validate(&self) -> Result<(), String> {
        self.validate_with(MAX_NEW_CODE_CHARS)
    }

    pub fn validate_with(&self, max_new_code_chars: usize) -> Result<(), String> {
        let code = self.new_code.trim();
        if code.is_empty() {
            return Err("new_code cannot be empty".to_string());
        }
        let chars = code.chars().count();
        if chars > max_new_code_chars {
            return Err(format!(
                "new_code too long: {} characters (max {})",
                chars, max_new_code_chars
            ));
        }
        Ok(())
    }

    /// The replacement with surrounding whitespace removed
    pub fn trimmed_code(&self) -> &str {
        self.new_code.trim()
    }
}

/// Outcome of an update; the two booleans report each side independently
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateResponse {
    /// Both the file and the index were updated
    pub success: bool,
    pub database_updated: bool,
    pub file_updated: bool,
    pub chunk_id: Option<u64>,
    /// File path relative to the indexed root
    pub file_path: Option<String>,
    /// Absolute path the patch was applied to
    pub full_local_path: Option<String>,
    /// Length in characters of the snippet that was replaced
    pub old_code_length: Option<usize>,
    pub new_code_length: Option<usize>,
    /// Name of the strategy that located the old snippet, if one did
    pub match_strategy: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateResponse {
    /// Response for a request that failed before touching anything
    pub fn failure(chunk_id: u64, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            chunk_id: Some(chunk_id),
            message: format!("Update failed: {}", error),
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Request to rebuild the whole collection from the root folder
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RebuildRequest {}

/// Summary of a full rebuild
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RebuildResponse {
    pub collection_name: String,
    pub files_found: usize,
    /// Files found per extension
    pub files_by_extension: BTreeMap<String, usize>,
    pub chunks_created: usize,
    /// Chunks per language tag
    pub chunks_by_language: BTreeMap<String, usize>,
    pub chunks_inserted: usize,
    /// Chunks stored with a zero vector because embedding failed
    pub embedding_failures: usize,
    pub dimension: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StatisticsRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatisticsResponse {
    pub collection_name: String,
    pub total_chunks: usize,
    /// Chunk counts per language, most frequent first
    pub language_breakdown: Vec<LanguageStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LanguageStats {
    pub language: String,
    pub chunk_count: usize,
}

/// Condition of the collection with respect to rebuilds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    /// No rebuild running; the collection reflects the last completed rebuild
    #[default]
    Ready,
    /// Walking, chunking or embedding; the old collection is still intact
    Rebuilding,
    /// Old collection dropped, new records being inserted
    Replacing,
    /// A rebuild stopped after dropping the old collection
    Incomplete,
}

impl IndexState {
    /// True while a rebuild is running or after one stopped half way
    pub fn rebuild_in_progress(&self) -> bool {
        !matches!(self, IndexState::Ready)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct HealthRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// "healthy" when the collection exists and is complete, "degraded" otherwise
    pub status: String,
    pub service: String,
    pub version: String,
    pub collection_name: String,
    pub collection_exists: bool,
    pub index_state: IndexState,
    pub model_name: String,
    /// Absolute path of the root that updates are confined to
    pub root_path: String,
}
