//! LanceDB vector database client
//!
//! One table per collection. Rows are keyed by the chunk id in an `id`
//! column; the vector column uses cosine distance.

use super::{ChunkRecord, DatabaseStats, ScoredRecord, VectorDatabase};
use crate::error::VectorDbError;
use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator,
    StringArray, UInt32Array, types::Float32Type,
};
use arrow_schema::{DataType, Field, Schema};
use futures::stream::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};
use std::collections::HashMap;
use std::sync::Arc;

/// LanceDB vector database implementation (embedded, no server required)
pub struct LanceVectorDB {
    connection: Connection,
    table_name: String,
    db_path: String,
}

impl LanceVectorDB {
    /// Connect to a database directory, operating on `collection_name`
    pub async fn with_path(db_path: &str, collection_name: &str) -> Result<Self> {
        tracing::info!("Connecting to LanceDB at: {}", db_path);

        let connection = lancedb::connect(db_path)
            .execute()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed(e.to_string()))
            .context("Failed to connect to LanceDB")?;

        Ok(Self {
            connection,
            table_name: collection_name.to_string(),
            db_path: db_path.to_string(),
        })
    }

    /// Get default database path (public for CLI version info)
    pub fn default_lancedb_path() -> String {
        crate::paths::PlatformPaths::default_lancedb_path()
            .to_string_lossy()
            .to_string()
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Create schema for the chunk table
    fn create_schema(dimension: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension as i32,
                ),
                false,
            ),
            Field::new("file_path", DataType::Utf8, false),
            Field::new("file_name", DataType::Utf8, false),
            Field::new("language", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("code_snippet", DataType::Utf8, false),
            Field::new("extra_context", DataType::Utf8, false),
        ]))
    }

    async fn get_table(&self) -> Result<Table> {
        if !self.has_collection().await? {
            return Err(VectorDbError::CollectionNotFound(self.table_name.clone()).into());
        }
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .context("Failed to open table")
    }

    /// Convert records and vectors to a RecordBatch
    fn create_record_batch(
        records: Vec<ChunkRecord>,
        vectors: Vec<Vec<f32>>,
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let dimension = vectors.first().map_or(0, |v| v.len());

        let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            vectors.into_iter().map(|v| Some(v.into_iter().map(Some))),
            dimension as i32,
        );
        let id_array = Int64Array::from(records.iter().map(|r| r.id as i64).collect::<Vec<_>>());
        let file_path_array = StringArray::from(
            records
                .iter()
                .map(|r| r.file_path.as_str())
                .collect::<Vec<_>>(),
        );
        let file_name_array = StringArray::from(
            records
                .iter()
                .map(|r| r.file_name.as_str())
                .collect::<Vec<_>>(),
        );
        let language_array = StringArray::from(
            records
                .iter()
                .map(|r| r.language.as_str())
                .collect::<Vec<_>>(),
        );
        let chunk_index_array = UInt32Array::from(
            records
                .iter()
                .map(|r| r.chunk_index as u32)
                .collect::<Vec<_>>(),
        );
        let snippet_array = StringArray::from(
            records
                .iter()
                .map(|r| r.code_snippet.as_str())
                .collect::<Vec<_>>(),
        );
        let context_array = StringArray::from(
            records
                .iter()
                .map(|r| r.extra_context.as_str())
                .collect::<Vec<_>>(),
        );

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(id_array),
                Arc::new(vector_array),
                Arc::new(file_path_array),
                Arc::new(file_name_array),
                Arc::new(language_array),
                Arc::new(chunk_index_array),
                Arc::new(snippet_array),
                Arc::new(context_array),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    /// Read the scalar columns of a result batch back into records
    fn records_from_batch(batch: &RecordBatch) -> Result<Vec<ChunkRecord>> {
        let ids = column::<Int64Array>(batch, "id")?;
        let file_paths = column::<StringArray>(batch, "file_path")?;
        let file_names = column::<StringArray>(batch, "file_name")?;
        let languages = column::<StringArray>(batch, "language")?;
        let chunk_indexes = column::<UInt32Array>(batch, "chunk_index")?;
        let snippets = column::<StringArray>(batch, "code_snippet")?;
        let contexts = column::<StringArray>(batch, "extra_context")?;

        Ok((0..batch.num_rows())
            .map(|i| ChunkRecord {
                id: ids.value(i) as u64,
                file_path: file_paths.value(i).to_string(),
                file_name: file_names.value(i).to_string(),
                language: languages.value(i).to_string(),
                chunk_index: chunk_indexes.value(i) as usize,
                code_snippet: snippets.value(i).to_string(),
                extra_context: contexts.value(i).to_string(),
            })
            .collect())
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Missing {} column", name))?
        .as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("Invalid {} type", name))
}

/// SQL filter selecting the given chunk ids
fn id_filter(ids: &[u64]) -> String {
    let list = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("id IN ({})", list)
}

#[async_trait::async_trait]
impl VectorDatabase for LanceVectorDB {
    fn collection_name(&self) -> &str {
        &self.table_name
    }

    async fn create_collection(&self, dimension: usize) -> Result<()> {
        tracing::info!(
            "Creating collection '{}' with dimension {} at {}",
            self.table_name,
            dimension,
            self.db_path
        );

        let schema = Self::create_schema(dimension);
        let empty_batch = RecordBatch::new_empty(schema.clone());
        let batches =
            RecordBatchIterator::new(vec![empty_batch].into_iter().map(Ok), schema.clone());

        self.connection
            .create_table(&self.table_name, Box::new(batches))
            .execute()
            .await
            .map_err(|e| VectorDbError::CollectionCreationFailed {
                collection: self.table_name.clone(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    async fn drop_collection(&self) -> Result<()> {
        if !self.has_collection().await? {
            return Ok(());
        }
        // Empty namespace array for default namespace
        self.connection
            .drop_table(&self.table_name, &[])
            .await
            .context("Failed to drop table")?;
        tracing::info!("Dropped collection '{}'", self.table_name);
        Ok(())
    }

    async fn has_collection(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed(e.to_string()))
            .context("Failed to list tables")?;
        Ok(table_names.contains(&self.table_name))
    }

    async fn insert(&self, records: Vec<ChunkRecord>, vectors: Vec<Vec<f32>>) -> Result<usize> {
        if records.len() != vectors.len() {
            return Err(VectorDbError::InsertFailed(format!(
                "{} records but {} vectors",
                records.len(),
                vectors.len()
            ))
            .into());
        }
        if records.is_empty() {
            return Ok(0);
        }

        let table = self.get_table().await?;
        let schema = table.schema().await.context("Failed to read table schema")?;
        if let Some(DataType::FixedSizeList(_, expected)) = schema
            .field_with_name("vector")
            .ok()
            .map(|f| f.data_type().clone())
            && let Some(bad) = vectors.iter().find(|v| v.len() != expected as usize)
        {
            return Err(VectorDbError::DimensionMismatch {
                expected: expected as usize,
                actual: bad.len(),
            }
            .into());
        }

        let batch = Self::create_record_batch(records, vectors, schema.clone())?;
        let count = batch.num_rows();
        let batches = RecordBatchIterator::new(vec![batch].into_iter().map(Ok), schema);

        table
            .add(Box::new(batches))
            .execute()
            .await
            .map_err(|e| VectorDbError::InsertFailed(e.to_string()))?;

        tracing::debug!("Inserted {} records into '{}'", count, self.table_name);
        Ok(count)
    }

    async fn delete_by_ids(&self, ids: &[u64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let table = self.get_table().await?;
        table
            .delete(&id_filter(ids))
            .await
            .map_err(|e| VectorDbError::DeleteFailed(e.to_string()))?;
        Ok(())
    }

    async fn query_by_ids(&self, ids: &[u64]) -> Result<Vec<ChunkRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let table = self.get_table().await?;
        let stream = table
            .query()
            .only_if(id_filter(ids))
            .execute()
            .await
            .map_err(|e| VectorDbError::QueryFailed(e.to_string()))?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect query results")?;

        let mut records = Vec::new();
        for batch in &batches {
            records.extend(Self::records_from_batch(batch)?);
        }
        Ok(records)
    }

    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredRecord>> {
        let table = self.get_table().await?;

        let stream = table
            .vector_search(query_vector)
            .context("Failed to create vector search")?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| VectorDbError::SearchFailed(e.to_string()))?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect search results")?;

        let mut results = Vec::new();
        for batch in &batches {
            let distances = column::<Float32Array>(batch, "_distance")?;
            for (i, record) in Self::records_from_batch(batch)?.into_iter().enumerate() {
                // Cosine distance is 1 - cosine similarity
                let score = 1.0 - distances.value(i);
                results.push(ScoredRecord { record, score });
            }
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(results)
    }

    async fn get_statistics(&self) -> Result<DatabaseStats> {
        let table = self.get_table().await?;

        // Language breakdown by scanning the language column
        let stream = table
            .query()
            .select(Select::Columns(vec!["language".to_string()]))
            .execute()
            .await
            .context("Failed to query languages")?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect language data")?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for batch in &batches {
            let languages = column::<StringArray>(batch, "language")?;
            for i in 0..batch.num_rows() {
                if !languages.is_null(i) {
                    *counts.entry(languages.value(i).to_string()).or_insert(0) += 1;
                }
            }
        }

        Ok(DatabaseStats::from_counts(counts))
    }
}

#[cfg(test)]
mod tests;
