//! Core library client for code-sync-rag
//!
//! Owns the embedding provider, the vector store and the patcher, and
//! exposes the four operations everything else is built on: rebuild,
//! search, update and statistics.

mod fs_lock;
mod index_lock;
mod rebuild;
mod update;

pub use fs_lock::{FsLockGuard, lock_key};

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedManager, truncate_for_embedding};
use crate::error::{EmbeddingError, IndexingError, ValidationError};
use crate::patcher::FuzzyPatcher;
use crate::types::*;
use crate::vector_db::{LanceVectorDB, MemoryVectorDB, VectorDatabase};
use anyhow::{Context, Result};
use index_lock::{ProcessLock, RebuildLockResult, RebuildSlot};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Longest a caller waits for another process to finish its rebuild
const FS_LOCK_WAIT: Duration = Duration::from_secs(30 * 60);

/// Main client for indexing a root folder and keeping it in sync
///
/// # Example
///
/// ```no_run
/// use code_sync_rag::{CodeSyncClient, Config, SearchRequest};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut config = Config::default();
///     config.indexing.root_path = "./site".into();
///
///     let client = CodeSyncClient::new(config).await?;
///     client.rebuild(CancellationToken::new()).await?;
///
///     let hits = client
///         .search(SearchRequest { query: "navbar toggle".into(), top_k: Some(2) })
///         .await?;
///     println!("{} hits", hits.count);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct CodeSyncClient {
    pub(crate) embedding_provider: Arc<dyn EmbeddingProvider>,
    pub(crate) vector_db: Arc<dyn VectorDatabase>,
    pub(crate) patcher: FuzzyPatcher,
    pub(crate) config: Arc<Config>,
    /// Absolute root that file updates are confined to
    pub(crate) root: PathBuf,
    rebuild_slot: RebuildSlot,
    process_lock: Option<ProcessLock>,
    index_state: Arc<RwLock<IndexState>>,
}

impl CodeSyncClient {
    /// Build a client from configuration, loading the embedding model and
    /// connecting to the configured backend
    pub async fn new(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        tracing::info!("Initializing code-sync client");
        tracing::debug!("Vector DB backend: {}", config.vector_db.backend);
        tracing::debug!("Embedding model: {}", config.embedding.model_name);

        let model_name = config.embedding.model_name.clone();
        let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(
            tokio::task::spawn_blocking(move || FastEmbedManager::from_model_name(&model_name))
                .await
                .context("Embedding model loader panicked")?
                .context("Failed to initialize embedding provider")?,
        );

        let collection = config.vector_db.collection_name.clone();
        let (vector_db, process_lock): (Arc<dyn VectorDatabase>, Option<ProcessLock>) =
            match config.vector_db.backend.as_str() {
                "memory" => {
                    tracing::info!("Using in-memory vector store");
                    (Arc::new(MemoryVectorDB::new(collection)), None)
                }
                _ => {
                    let db_path = config.vector_db.lancedb_path.clone();
                    tracing::info!("Using LanceDB vector store at {}", db_path.display());
                    let db = LanceVectorDB::with_path(&db_path.to_string_lossy(), &collection)
                        .await
                        .context("Failed to initialize LanceDB vector database")?;
                    let lock = ProcessLock {
                        lock_dir: crate::paths::PlatformPaths::lock_dir(),
                        key: lock_key(&db_path, &collection),
                    };
                    (Arc::new(db), Some(lock))
                }
            };

        let mut client = Self::with_backends(config, embedding_provider, vector_db);
        client.process_lock = process_lock;
        Ok(client)
    }

    /// Build a client around caller-supplied backends
    ///
    /// No cross-process lock is taken; add one with [`Self::with_process_lock`].
    pub fn with_backends(
        config: Config,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_db: Arc<dyn VectorDatabase>,
    ) -> Self {
        let root = absolute_root(&config.indexing.root_path);
        tracing::info!("Code root: {}", root.display());

        Self {
            embedding_provider,
            vector_db,
            patcher: FuzzyPatcher::default(),
            config: Arc::new(config),
            root,
            rebuild_slot: RebuildSlot::default(),
            process_lock: None,
            index_state: Arc::new(RwLock::new(IndexState::Ready)),
        }
    }

    /// Serialize rebuilds across processes through lock files in `lock_dir`
    pub fn with_process_lock(mut self, lock_dir: impl Into<PathBuf>) -> Self {
        self.process_lock = Some(ProcessLock {
            lock_dir: lock_dir.into(),
            key: lock_key(
                &self.config.vector_db.lancedb_path,
                self.vector_db.collection_name(),
            ),
        });
        self
    }

    /// Replace the default patcher, e.g. to restrict the strategies tried
    pub fn with_patcher(mut self, patcher: FuzzyPatcher) -> Self {
        self.patcher = patcher;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_state(&self) -> IndexState {
        *self
            .index_state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn set_index_state(&self, state: IndexState) {
        *self
            .index_state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// Embed one text, cut to the configured length, off the async runtime
    pub(crate) async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let input = truncate_for_embedding(text, self.config.embedding.max_input_chars);
        let provider = self.embedding_provider.clone();
        let timeout_secs = self.config.embedding.timeout_secs;

        let task = tokio::task::spawn_blocking(move || provider.embed_batch(vec![input]));
        let vectors = tokio::time::timeout(Duration::from_secs(timeout_secs), task)
            .await
            .map_err(|_| EmbeddingError::Timeout(timeout_secs))?
            .context("Embedding task panicked")??;

        let vector = vectors.into_iter().next().ok_or_else(|| {
            EmbeddingError::GenerationFailed("provider returned no embedding".to_string())
        })?;

        let expected = self.embedding_provider.dimension();
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }
            .into());
        }
        Ok(vector)
    }

    /// Walk the root and replace the whole collection with fresh chunks
    ///
    /// Only one rebuild runs at a time: a second caller in this process waits
    /// for the running one and receives its result, and a caller in another
    /// process waits for that process to finish first.
    pub async fn rebuild(&self, cancel_token: CancellationToken) -> Result<RebuildResponse> {
        loop {
            match self
                .rebuild_slot
                .try_acquire(self.process_lock.as_ref())
                .await?
            {
                RebuildLockResult::WaitForResult(mut receiver) => {
                    tracing::info!("Waiting for the running rebuild to finish");
                    return match receiver.recv().await {
                        Ok(Ok(response)) => Ok(response),
                        Ok(Err(message)) => Err(anyhow::anyhow!(message)),
                        Err(e) => Err(anyhow::anyhow!("Rebuild failed or was cancelled: {}", e)),
                    };
                }
                RebuildLockResult::WaitForFilesystemLock(lock) => {
                    tracing::info!(
                        "Another process is rebuilding '{}', waiting for it to finish",
                        self.vector_db.collection_name()
                    );
                    let acquired = tokio::task::spawn_blocking(move || {
                        FsLockGuard::acquire_blocking(&lock.lock_dir, &lock.key, FS_LOCK_WAIT)
                    })
                    .await
                    .context("Filesystem lock task panicked")??;

                    if acquired.is_none() {
                        return Err(IndexingError::RebuildInProgress(
                            self.vector_db.collection_name().to_string(),
                        )
                        .into());
                    }
                    // Released straight away; the next pass takes both locks together
                }
                RebuildLockResult::Acquired(lock) => {
                    let previous = self.index_state();
                    self.set_index_state(IndexState::Rebuilding);

                    let result = rebuild::do_rebuild(self, &cancel_token).await;

                    let outcome = match &result {
                        Ok(response) => {
                            self.set_index_state(IndexState::Ready);
                            Ok(response.clone())
                        }
                        Err(e) => {
                            tracing::error!("Rebuild failed: {:#}", e);
                            let state = match self.index_state() {
                                IndexState::Replacing => IndexState::Incomplete,
                                _ => previous,
                            };
                            self.set_index_state(state);
                            Err(format!("Rebuild failed: {:#}", e))
                        }
                    };
                    lock.finish(outcome).await;
                    return result;
                }
            }
        }
    }

    /// Semantic search over the indexed chunks
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        request
            .validate_with(self.config.search.max_top_k)
            .map_err(ValidationError::InvalidRequest)?;

        let top_k = request.top_k.unwrap_or(self.config.search.default_top_k);
        let start = Instant::now();
        let query_vector = self
            .embed_text(request.query.trim())
            .await
            .context("Failed to embed query")?;

        let hits = self
            .vector_db
            .search(query_vector, top_k)
            .await
            .context("Failed to search vector database")?;

        let results: Vec<CodeResult> = hits
            .into_iter()
            .map(|hit| CodeResult {
                chunk_id: hit.record.id,
                file_path: hit.record.file_path,
                file_name: hit.record.file_name,
                language: hit.record.language,
                chunk_index: hit.record.chunk_index,
                code_snippet: hit.record.code_snippet,
                similarity_score: hit.score,
            })
            .collect();

        tracing::debug!("Search returned {} results", results.len());
        Ok(SearchResponse {
            success: true,
            count: results.len(),
            results,
            query: request.query,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Validate an update request, trim its code and apply it
    pub async fn update(&self, request: UpdateRequest) -> Result<UpdateResponse> {
        request
            .validate_with(self.config.update.max_new_code_chars)
            .map_err(ValidationError::InvalidRequest)?;
        self.update_chunk(request.chunk_id, request.trimmed_code())
            .await
    }

    /// Replace chunk `chunk_id` with `new_code` in its source file and in the store
    ///
    /// Fails with `VectorDbError::ChunkNotFound` when the id is unknown. Otherwise
    /// the file and store sides are attempted independently and reported in
    /// `file_updated` / `database_updated`.
    pub async fn update_chunk(&self, chunk_id: u64, new_code: &str) -> Result<UpdateResponse> {
        update::do_update(self, chunk_id, new_code).await
    }

    /// Chunk counts for the collection; zero when it does not exist yet
    pub async fn statistics(&self) -> Result<StatisticsResponse> {
        let collection_name = self.vector_db.collection_name().to_string();
        if !self.vector_db.has_collection().await? {
            return Ok(StatisticsResponse {
                collection_name,
                total_chunks: 0,
                language_breakdown: Vec::new(),
            });
        }

        let stats = self
            .vector_db
            .get_statistics()
            .await
            .context("Failed to get statistics")?;

        Ok(StatisticsResponse {
            collection_name,
            total_chunks: stats.total_chunks,
            language_breakdown: stats
                .language_breakdown
                .into_iter()
                .map(|(language, chunk_count)| LanguageStats {
                    language,
                    chunk_count,
                })
                .collect(),
        })
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let collection_exists = self.vector_db.has_collection().await?;
        let index_state = self.index_state();
        let healthy = collection_exists && !self.rebuild_slot.is_busy().await
            && index_state == IndexState::Ready;

        Ok(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            collection_name: self.vector_db.collection_name().to_string(),
            collection_exists,
            index_state,
            model_name: self.embedding_provider.model_name().to_string(),
            root_path: self.root.display().to_string(),
        })
    }
}

/// Canonical root when it exists, otherwise the path made absolute
fn absolute_root(root: &Path) -> PathBuf {
    std::fs::canonicalize(root)
        .or_else(|_| std::path::absolute(root))
        .unwrap_or_else(|_| root.to_path_buf())
}
