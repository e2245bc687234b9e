/// Configuration system for code-sync-rag
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, RagError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Backends accepted in `vector_db.backend`
pub const SUPPORTED_BACKENDS: &[&str] = &["lancedb", "memory"];

/// Settings for indexing, searching and updating one root folder
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub vector_db: VectorDbConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub update: UpdateConfig,
}

/// Where chunk records and vectors live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Database backend: "lancedb" or "memory"
    #[serde(default = "default_db_backend")]
    pub backend: String,

    /// Directory of the LanceDB database
    #[serde(default = "default_lancedb_path")]
    pub lancedb_path: PathBuf,

    /// Collection holding one record per chunk
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
}

/// How chunk text is embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// FastEmbed model; hub-style names such as `BAAI/bge-small-en-v1.5` are accepted
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Timeout in seconds for a single embedding call
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Texts longer than this many characters are cut before embedding
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

/// What gets walked and how it is chunked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Directory whose files are indexed and patched
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Elements per chunk for top-level JSON arrays; objects always group 5 keys
    #[serde(default = "default_json_group_size")]
    pub json_group_size: usize,

    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Skip files ignored by .gitignore and friends
    #[serde(default = "default_respect_gitignore")]
    pub respect_gitignore: bool,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

/// Update configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    #[serde(default = "default_max_new_code_chars")]
    pub max_new_code_chars: usize,
}

fn default_db_backend() -> String {
    "lancedb".to_string()
}

fn default_lancedb_path() -> PathBuf {
    crate::paths::PlatformPaths::default_lancedb_path()
}

fn default_collection_name() -> String {
    "code_embeddings".to_string()
}

fn default_model_name() -> String {
    crate::embedding::DEFAULT_MODEL_NAME.to_string()
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_max_input_chars() -> usize {
    30_000
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_json_group_size() -> usize {
    crate::indexer::DEFAULT_JSON_GROUP_SIZE
}

fn default_max_file_size() -> usize {
    1_048_576 // 1 MB
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "node_modules/**".to_string(),
        ".git/**".to_string(),
        "dist/**".to_string(),
    ]
}

fn default_respect_gitignore() -> bool {
    true
}

fn default_top_k() -> usize {
    2
}

fn default_max_top_k() -> usize {
    10
}

fn default_max_new_code_chars() -> usize {
    10_000
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: default_db_backend(),
            lancedb_path: default_lancedb_path(),
            collection_name: default_collection_name(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            timeout_secs: default_embedding_timeout(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            json_group_size: default_json_group_size(),
            max_file_size: default_max_file_size(),
            exclude_patterns: default_exclude_patterns(),
            respect_gitignore: default_respect_gitignore(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            max_new_code_chars: default_max_new_code_chars(),
        }
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> RagError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
    .into()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Read the platform config file, or fall back to defaults when there is none
    pub fn load_or_default() -> Result<Self, RagError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> Result<(), RagError> {
        if !SUPPORTED_BACKENDS.contains(&self.vector_db.backend.as_str()) {
            return Err(invalid(
                "vector_db.backend",
                format!(
                    "must be one of {:?}, got '{}'",
                    SUPPORTED_BACKENDS, self.vector_db.backend
                ),
            ));
        }

        if self.vector_db.collection_name.trim().is_empty() {
            return Err(invalid("vector_db.collection_name", "must not be empty"));
        }

        if self.embedding.timeout_secs == 0 {
            return Err(invalid("embedding.timeout_secs", "must be greater than 0"));
        }

        if self.embedding.max_input_chars == 0 {
            return Err(invalid("embedding.max_input_chars", "must be greater than 0"));
        }

        if self.indexing.json_group_size == 0 {
            return Err(invalid("indexing.json_group_size", "must be greater than 0"));
        }

        if self.indexing.max_file_size == 0 {
            return Err(invalid("indexing.max_file_size", "must be greater than 0"));
        }

        if self.search.max_top_k == 0 {
            return Err(invalid("search.max_top_k", "must be greater than 0"));
        }

        if self.search.default_top_k == 0 || self.search.default_top_k > self.search.max_top_k {
            return Err(invalid(
                "search.default_top_k",
                format!(
                    "must be between 1 and {}, got {}",
                    self.search.max_top_k, self.search.default_top_k
                ),
            ));
        }

        if self.update.max_new_code_chars == 0 {
            return Err(invalid("update.max_new_code_chars", "must be greater than 0"));
        }

        Ok(())
    }

    /// Override fields from `CODE_SYNC_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("CODE_SYNC_ROOT") {
            self.indexing.root_path = PathBuf::from(root);
        }

        if let Ok(collection) = std::env::var("CODE_SYNC_COLLECTION") {
            self.vector_db.collection_name = collection;
        }

        if let Ok(path) = std::env::var("CODE_SYNC_LANCEDB_PATH") {
            self.vector_db.lancedb_path = PathBuf::from(path);
        }

        if let Ok(backend) = std::env::var("CODE_SYNC_DB_BACKEND") {
            self.vector_db.backend = backend;
        }

        if let Ok(model) = std::env::var("CODE_SYNC_MODEL") {
            self.embedding.model_name = model;
        }
    }

    /// Load from `path` (or the default location), then apply env overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, RagError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::load_or_default()?,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests;
