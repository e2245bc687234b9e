mod fastembed_manager;

pub use fastembed_manager::{DEFAULT_MODEL_NAME, FastEmbedManager, resolve_model};

use anyhow::Result;

/// Suffix appended to text cut short before embedding
pub const TRUNCATION_SUFFIX: &str = "\n... [truncated]";

/// Trait for embedding generation
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of text
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the dimension of the embeddings
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Cut text to at most `max_chars` characters, marking the cut
pub fn truncate_for_embedding(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_SUFFIX),
        None => text.to_string(),
    }
}
