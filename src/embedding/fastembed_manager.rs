use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use anyhow::{Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// Default local model, matching the default in the configuration
pub const DEFAULT_MODEL_NAME: &str = "all-minilm-l6-v2";

/// FastEmbed-based embedding provider running a local ONNX model
pub struct FastEmbedManager {
    // TextEmbedding::embed takes &mut self
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: String,
}

impl FastEmbedManager {
    /// Create a manager from a configured model name
    pub fn from_model_name(name: &str) -> Result<Self> {
        let (model, dimension) = resolve_model(name)?;
        Self::with_model(model, dimension, name)
    }

    fn with_model(model: EmbeddingModel, dimension: usize, name: &str) -> Result<Self> {
        tracing::info!("Initializing FastEmbed model: {:?}", model);

        let embedding_model =
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(true))
                .map_err(|e| EmbeddingError::InitializationFailed(e.to_string()))
                .context("Failed to initialize FastEmbed model")?;

        Ok(Self {
            model: Mutex::new(embedding_model),
            dimension,
            model_name: name.to_string(),
        })
    }
}

/// Map a configured model name to the fastembed model and its dimension
///
/// Matching ignores case and an optional hub organisation prefix, so
/// `BAAI/bge-small-en-v1.5` and `bge-small-en-v1.5` are the same model.
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    let lowered = name.to_lowercase();
    let short = lowered.rsplit('/').next().unwrap_or(&lowered);
    let resolved = match short {
        "all-minilm-l6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
        "all-minilm-l12-v2" => (EmbeddingModel::AllMiniLML12V2, 384),
        "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
        "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
        "bge-large-en-v1.5" => (EmbeddingModel::BGELargeENV15, 1024),
        "nomic-embed-text-v1.5" => (EmbeddingModel::NomicEmbedTextV15, 768),
        _ => return Err(EmbeddingError::UnknownModel(name.to_string())),
    };
    Ok(resolved)
}

impl EmbeddingProvider for FastEmbedManager {
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::GenerationFailed("model lock poisoned".to_string()))?;
        let embeddings = model
            .embed(texts, None)
            .map_err(|e| EmbeddingError::GenerationFailed(e.to_string()))?;

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
