//! Single-chunk update: patch the source file, then re-embed and replace the record

use super::CodeSyncClient;
use crate::error::VectorDbError;
use crate::patcher::{FileChange, resolve_under_root, update_local_file};
use crate::types::UpdateResponse;
use crate::vector_db::ChunkRecord;
use anyhow::{Context, Result};

pub(crate) async fn do_update(
    client: &CodeSyncClient,
    chunk_id: u64,
    new_code: &str,
) -> Result<UpdateResponse> {
    let record = client
        .vector_db
        .query_by_ids(&[chunk_id])
        .await
        .context("Failed to look up chunk")?
        .into_iter()
        .next()
        .ok_or(VectorDbError::ChunkNotFound(chunk_id))?;

    let full_path = resolve_under_root(&client.root, &record.file_path);
    tracing::info!(
        "Updating chunk {} in {} ({})",
        chunk_id,
        record.file_path,
        full_path.display()
    );

    let mut errors = Vec::new();

    let patcher = client.patcher.clone();
    let patch_path = full_path.clone();
    let old_code = record.code_snippet.clone();
    let replacement = new_code.to_string();
    let file_result = tokio::task::spawn_blocking(move || {
        update_local_file(&patcher, &patch_path, &old_code, &replacement)
    })
    .await
    .context("File update task panicked")?;

    let (file_updated, match_strategy) = match file_result {
        Ok(FileChange::Created) => (true, None),
        Ok(FileChange::Patched(strategy)) => (true, Some(strategy.as_str().to_string())),
        Err(e) => {
            tracing::warn!("File not updated for chunk {}: {}", chunk_id, e);
            errors.push(format!("file: {}", e));
            (false, None)
        }
    };

    let database_updated = match replace_record(client, &record, new_code).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Store not updated for chunk {}: {:#}", chunk_id, e);
            errors.push(format!("database: {:#}", e));
            false
        }
    };

    let success = file_updated && database_updated;
    let message = if success {
        "Code updated in both file and database".to_string()
    } else {
        format!(
            "Update incomplete (file updated: {}, database updated: {})",
            file_updated, database_updated
        )
    };

    Ok(UpdateResponse {
        success,
        database_updated,
        file_updated,
        chunk_id: Some(chunk_id),
        file_path: Some(record.file_path.clone()),
        full_local_path: Some(full_path.display().to_string()),
        old_code_length: Some(record.code_snippet.chars().count()),
        new_code_length: Some(new_code.chars().count()),
        match_strategy,
        message,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    })
}

/// Re-embed `new_code` and swap it in under the same id, keeping the metadata
async fn replace_record(client: &CodeSyncClient, record: &ChunkRecord, new_code: &str) -> Result<()> {
    let vector = client
        .embed_text(new_code)
        .await
        .context("Failed to embed new code")?;

    client
        .vector_db
        .delete_by_ids(&[record.id])
        .await
        .context("Failed to delete old record")?;

    client
        .vector_db
        .insert(vec![record.with_snippet(new_code)], vec![vector])
        .await
        .context("Failed to insert updated record")?;

    tracing::info!("Replaced record for chunk {}", record.id);
    Ok(())
}
