// LanceDB is the default embedded vector database
pub mod lance_client;
pub use lance_client::LanceVectorDB;

// Process-local store for tests and throwaway sessions
pub mod memory_client;
pub use memory_client::MemoryVectorDB;

use crate::indexer::CodeChunk;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Maximum stored length, in characters, of each scalar field
pub const MAX_FILE_PATH_CHARS: usize = 512;
pub const MAX_FILE_NAME_CHARS: usize = 256;
pub const MAX_LANGUAGE_CHARS: usize = 50;
pub const MAX_SNIPPET_CHARS: usize = 65_535;

/// Scalar fields stored alongside each vector, keyed by chunk id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: u64,
    pub file_path: String,
    pub file_name: String,
    pub language: String,
    pub chunk_index: usize,
    pub code_snippet: String,
    pub extra_context: String,
}

impl ChunkRecord {
    /// Build a record, silently truncating fields to the store's limits
    pub fn new(
        id: u64,
        file_path: &str,
        file_name: &str,
        language: &str,
        chunk_index: usize,
        code_snippet: &str,
        extra_context: &str,
    ) -> Self {
        Self {
            id,
            file_path: truncate_chars(file_path, MAX_FILE_PATH_CHARS),
            file_name: truncate_chars(file_name, MAX_FILE_NAME_CHARS),
            language: truncate_chars(language, MAX_LANGUAGE_CHARS),
            chunk_index,
            code_snippet: truncate_chars(code_snippet, MAX_SNIPPET_CHARS),
            extra_context: extra_context.to_string(),
        }
    }

    /// Same record with a replacement snippet
    pub fn with_snippet(&self, code_snippet: &str) -> Self {
        Self {
            code_snippet: truncate_chars(code_snippet, MAX_SNIPPET_CHARS),
            ..self.clone()
        }
    }
}

impl From<&CodeChunk> for ChunkRecord {
    fn from(chunk: &CodeChunk) -> Self {
        Self::new(
            chunk.chunk_id,
            &chunk.file_path,
            &chunk.file_name,
            chunk.language.as_str(),
            chunk.chunk_index,
            &chunk.code_snippet,
            &chunk.extra_context,
        )
    }
}

/// A record returned from a similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: ChunkRecord,
    /// Higher is more similar
    pub score: f32,
}

/// Trait for vector database operations
///
/// Each instance is bound to one named collection. Operations other than
/// `create_collection`, `drop_collection` and `has_collection` fail with
/// `VectorDbError::CollectionNotFound` when the collection is absent.
#[async_trait::async_trait]
pub trait VectorDatabase: Send + Sync {
    /// Name of the collection this instance operates on
    fn collection_name(&self) -> &str;

    /// Create an empty collection whose vectors have `dimension` components
    async fn create_collection(&self, dimension: usize) -> Result<()>;

    /// Drop the collection; succeeds when it does not exist
    async fn drop_collection(&self) -> Result<()>;

    async fn has_collection(&self) -> Result<bool>;

    /// Insert records with their vectors, returning how many were stored
    async fn insert(&self, records: Vec<ChunkRecord>, vectors: Vec<Vec<f32>>) -> Result<usize>;

    /// Delete records by chunk id; unknown ids are ignored
    async fn delete_by_ids(&self, ids: &[u64]) -> Result<()>;

    /// Fetch records by chunk id, in no particular order
    async fn query_by_ids(&self, ids: &[u64]) -> Result<Vec<ChunkRecord>>;

    /// Nearest neighbours of `query_vector`, best first
    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredRecord>>;

    /// Get statistics
    async fn get_statistics(&self) -> Result<DatabaseStats>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseStats {
    pub total_chunks: usize,
    /// Chunk count per language tag, most frequent first
    pub language_breakdown: Vec<(String, usize)>,
}

impl DatabaseStats {
    /// Build stats from a per-language tally
    pub fn from_counts(counts: std::collections::HashMap<String, usize>) -> Self {
        let total_chunks = counts.values().sum();
        let mut language_breakdown: Vec<(String, usize)> = counts.into_iter().collect();
        language_breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self {
            total_chunks,
            language_breakdown,
        }
    }
}

/// Keep at most `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::ChunkLanguage;
    use std::collections::HashMap;

    #[test]
    fn test_record_from_chunk() {
        let chunk = CodeChunk {
            chunk_id: 9,
            chunk_index: 2,
            file_path: "src/app.js".to_string(),
            file_name: "app.js".to_string(),
            language: ChunkLanguage::VueScript,
            code_snippet: "run();".to_string(),
            extra_context: "Folder: src".to_string(),
        };
        let record = ChunkRecord::from(&chunk);
        assert_eq!(record.id, 9);
        assert_eq!(record.language, "vue-script");
        assert_eq!(record.chunk_index, 2);
        assert_eq!(record.extra_context, "Folder: src");
    }

    #[test]
    fn test_record_fields_truncated() {
        let long_path = "a/".repeat(400);
        let snippet = "x".repeat(MAX_SNIPPET_CHARS + 10);
        let record = ChunkRecord::new(1, &long_path, "f.js", "javascript", 0, &snippet, "");
        assert_eq!(record.file_path.chars().count(), MAX_FILE_PATH_CHARS);
        assert_eq!(record.code_snippet.chars().count(), MAX_SNIPPET_CHARS);
    }

    #[test]
    fn test_with_snippet_keeps_metadata() {
        let record = ChunkRecord::new(3, "a.css", "a.css", "css", 4, "p {}", "Folder: x");
        let updated = record.with_snippet("p { margin: 0; }");
        assert_eq!(updated.id, 3);
        assert_eq!(updated.chunk_index, 4);
        assert_eq!(updated.extra_context, "Folder: x");
        assert_eq!(updated.code_snippet, "p { margin: 0; }");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("äöü", 2), "äö");
        assert_eq!(truncate_chars("äöü", 5), "äöü");
    }

    #[test]
    fn test_stats_from_counts() {
        let mut counts = HashMap::new();
        counts.insert("css".to_string(), 2);
        counts.insert("javascript".to_string(), 5);
        counts.insert("html".to_string(), 2);
        let stats = DatabaseStats::from_counts(counts);
        assert_eq!(stats.total_chunks, 9);
        assert_eq!(
            stats.language_breakdown,
            vec![
                ("javascript".to_string(), 5),
                ("css".to_string(), 2),
                ("html".to_string(), 2),
            ]
        );
    }
}
