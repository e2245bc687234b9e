//! Full rebuild: walk the root, chunk, embed, and replace the collection

use super::CodeSyncClient;
use crate::error::IndexingError;
use crate::indexer::{CodeChunk, CodeChunker, FileWalker};
use crate::types::{IndexState, RebuildResponse};
use crate::vector_db::ChunkRecord;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Records per insert call; cancellation is checked between batches
const INSERT_BATCH_SIZE: usize = 256;

struct Extraction {
    files_found: usize,
    files_by_extension: BTreeMap<String, usize>,
    chunks: Vec<CodeChunk>,
}

fn check_cancelled(cancel_token: &CancellationToken) -> Result<()> {
    if cancel_token.is_cancelled() {
        tracing::info!("Rebuild cancelled");
        return Err(IndexingError::Cancelled.into());
    }
    Ok(())
}

pub(crate) async fn do_rebuild(
    client: &CodeSyncClient,
    cancel_token: &CancellationToken,
) -> Result<RebuildResponse> {
    let start = Instant::now();
    let collection_name = client.vector_db.collection_name().to_string();
    tracing::info!(
        "Rebuilding collection '{}' from {}",
        collection_name,
        client.root.display()
    );

    let extraction = extract_chunks(client).await?;
    check_cancelled(cancel_token)?;

    let mut chunks_by_language: BTreeMap<String, usize> = BTreeMap::new();
    for chunk in &extraction.chunks {
        *chunks_by_language
            .entry(chunk.language.as_str().to_string())
            .or_insert(0) += 1;
    }

    let dimension = client.embedding_provider.dimension();
    let mut response = RebuildResponse {
        collection_name,
        files_found: extraction.files_found,
        files_by_extension: extraction.files_by_extension,
        chunks_created: extraction.chunks.len(),
        chunks_by_language,
        dimension,
        ..Default::default()
    };

    if extraction.chunks.is_empty() {
        tracing::warn!("No chunks extracted, leaving the existing collection untouched");
        response.duration_ms = start.elapsed().as_millis() as u64;
        return Ok(response);
    }

    let mut vectors = Vec::with_capacity(extraction.chunks.len());
    for (i, chunk) in extraction.chunks.iter().enumerate() {
        check_cancelled(cancel_token)?;
        match client.embed_text(&chunk.code_snippet).await {
            Ok(vector) => vectors.push(vector),
            Err(e) => {
                tracing::warn!(
                    "Embedding failed for chunk {} of {}, storing a zero vector: {:#}",
                    chunk.chunk_id,
                    chunk.file_path,
                    e
                );
                response.embedding_failures += 1;
                vectors.push(vec![0.0; dimension]);
            }
        }
        if (i + 1) % 100 == 0 {
            tracing::info!("Embedded {}/{} chunks", i + 1, extraction.chunks.len());
        }
    }
    check_cancelled(cancel_token)?;

    // Past this point the old collection is gone
    client.set_index_state(IndexState::Replacing);
    client
        .vector_db
        .drop_collection()
        .await
        .context("Failed to drop collection")?;
    client
        .vector_db
        .create_collection(dimension)
        .await
        .context("Failed to create collection")?;

    let records: Vec<ChunkRecord> = extraction.chunks.iter().map(ChunkRecord::from).collect();
    let mut record_iter = records.into_iter();
    let mut vector_iter = vectors.into_iter();
    loop {
        let batch: Vec<ChunkRecord> = record_iter.by_ref().take(INSERT_BATCH_SIZE).collect();
        if batch.is_empty() {
            break;
        }
        let batch_vectors: Vec<Vec<f32>> = vector_iter.by_ref().take(batch.len()).collect();
        check_cancelled(cancel_token)?;
        response.chunks_inserted += client
            .vector_db
            .insert(batch, batch_vectors)
            .await
            .context("Failed to insert chunks")?;
    }

    response.duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Rebuild complete: {} files, {} chunks inserted, {} embedding failures in {} ms",
        response.files_found,
        response.chunks_inserted,
        response.embedding_failures,
        response.duration_ms
    );
    Ok(response)
}

/// Walk and chunk on a blocking thread; both touch the filesystem and parse
async fn extract_chunks(client: &CodeSyncClient) -> Result<Extraction> {
    let root = client.root.clone();
    let indexing = client.config.indexing.clone();

    tokio::task::spawn_blocking(move || -> Result<Extraction> {
        let files = FileWalker::new(&root, indexing.max_file_size)
            .with_exclude_patterns(indexing.exclude_patterns)
            .with_gitignore(indexing.respect_gitignore)
            .walk()
            .context("Failed to walk root folder")?;

        let mut files_by_extension: BTreeMap<String, usize> = BTreeMap::new();
        for file in &files {
            *files_by_extension.entry(file.extension.clone()).or_insert(0) += 1;
        }
        tracing::info!("Found {} files: {:?}", files.len(), files_by_extension);

        let chunks = CodeChunker::new(indexing.json_group_size).chunk_all(&files);
        Ok(Extraction {
            files_found: files.len(),
            files_by_extension,
            chunks,
        })
    })
    .await
    .context("Chunking task panicked")?
}
