//! In-memory vector store with brute-force cosine search

use super::{ChunkRecord, DatabaseStats, ScoredRecord, VectorDatabase};
use crate::error::VectorDbError;
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

struct Collection {
    dimension: usize,
    // BTreeMap keeps ties in search deterministic
    entries: BTreeMap<u64, (ChunkRecord, Vec<f32>)>,
}

/// Process-local [`VectorDatabase`] holding one collection behind a lock
pub struct MemoryVectorDB {
    collection_name: String,
    collection: RwLock<Option<Collection>>,
}

impl MemoryVectorDB {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            collection: RwLock::new(None),
        }
    }

    fn not_found(&self) -> anyhow::Error {
        VectorDbError::CollectionNotFound(self.collection_name.clone()).into()
    }
}

fn lock_poisoned() -> anyhow::Error {
    VectorDbError::ConnectionFailed("in-memory store lock poisoned".to_string()).into()
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait::async_trait]
impl VectorDatabase for MemoryVectorDB {
    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    async fn create_collection(&self, dimension: usize) -> Result<()> {
        let mut guard = self.collection.write().map_err(|_| lock_poisoned())?;
        if guard.is_some() {
            return Err(VectorDbError::CollectionCreationFailed {
                collection: self.collection_name.clone(),
                reason: "collection already exists".to_string(),
            }
            .into());
        }
        *guard = Some(Collection {
            dimension,
            entries: BTreeMap::new(),
        });
        Ok(())
    }

    async fn drop_collection(&self) -> Result<()> {
        let mut guard = self.collection.write().map_err(|_| lock_poisoned())?;
        *guard = None;
        Ok(())
    }

    async fn has_collection(&self) -> Result<bool> {
        let guard = self.collection.read().map_err(|_| lock_poisoned())?;
        Ok(guard.is_some())
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

        let mut guard = self.collection.write().map_err(|_| lock_poisoned())?;
        let collection = guard.as_mut().ok_or_else(|| self.not_found())?;

        if let Some(bad) = vectors.iter().find(|v| v.len() != collection.dimension) {
            return Err(VectorDbError::DimensionMismatch {
                expected: collection.dimension,
                actual: bad.len(),
            }
            .into());
        }

        let count = records.len();
        for (record, vector) in records.into_iter().zip(vectors) {
            collection.entries.insert(record.id, (record, vector));
        }
        Ok(count)
    }

    async fn delete_by_ids(&self, ids: &[u64]) -> Result<()> {
        let mut guard = self.collection.write().map_err(|_| lock_poisoned())?;
        let collection = guard.as_mut().ok_or_else(|| self.not_found())?;
        for id in ids {
            collection.entries.remove(id);
        }
        Ok(())
    }

    async fn query_by_ids(&self, ids: &[u64]) -> Result<Vec<ChunkRecord>> {
        let guard = self.collection.read().map_err(|_| lock_poisoned())?;
        let collection = guard.as_ref().ok_or_else(|| self.not_found())?;
        Ok(ids
            .iter()
            .filter_map(|id| collection.entries.get(id))
            .map(|(record, _)| record.clone())
            .collect())
    }

    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredRecord>> {
        let guard = self.collection.read().map_err(|_| lock_poisoned())?;
        let collection = guard.as_ref().ok_or_else(|| self.not_found())?;

        let mut scored: Vec<ScoredRecord> = collection
            .entries
            .values()
            .map(|(record, vector)| ScoredRecord {
                record: record.clone(),
                score: cosine_sim(&query_vector, vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn get_statistics(&self) -> Result<DatabaseStats> {
        let guard = self.collection.read().map_err(|_| lock_poisoned())?;
        let collection = guard.as_ref().ok_or_else(|| self.not_found())?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for (record, _) in collection.entries.values() {
            *counts.entry(record.language.clone()).or_insert(0) += 1;
        }
        Ok(DatabaseStats::from_counts(counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, language: &str) -> ChunkRecord {
        ChunkRecord::new(
            id,
            "src/a.js",
            "a.js",
            language,
            id as usize,
            &format!("snippet {}", id),
            "Folder: src",
        )
    }

    #[tokio::test]
    async fn test_operations_require_collection() {
        let db = MemoryVectorDB::new("code");
        assert!(!db.has_collection().await.unwrap());
        let err = db.query_by_ids(&[1]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VectorDbError>(),
            Some(VectorDbError::CollectionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_query_delete() {
        let db = MemoryVectorDB::new("code");
        db.create_collection(2).await.unwrap();

        let inserted = db
            .insert(
                vec![record(0, "javascript"), record(1, "css")],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let found = db.query_by_ids(&[1, 7]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, "css");

        db.delete_by_ids(&[1, 7]).await.unwrap();
        assert!(db.query_by_ids(&[1]).await.unwrap().is_empty());
        assert_eq!(db.get_statistics().await.unwrap().total_chunks, 1);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let db = MemoryVectorDB::new("code");
        db.create_collection(2).await.unwrap();
        db.insert(
            vec![record(0, "javascript"), record(1, "css"), record(2, "html")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        )
        .await
        .unwrap();

        let results = db.search(vec![0.0, 1.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.id, 1);
        assert_eq!(results[1].record.id, 2);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let db = MemoryVectorDB::new("code");
        db.create_collection(3).await.unwrap();
        let err = db
            .insert(vec![record(0, "css")], vec![vec![1.0]])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("3"));
    }

    #[tokio::test]
    async fn test_drop_and_recreate() {
        let db = MemoryVectorDB::new("code");
        db.drop_collection().await.unwrap();
        db.create_collection(2).await.unwrap();
        assert!(db.create_collection(2).await.is_err());
        db.insert(vec![record(0, "css")], vec![vec![1.0, 1.0]])
            .await
            .unwrap();
        db.drop_collection().await.unwrap();
        db.create_collection(2).await.unwrap();
        assert_eq!(db.get_statistics().await.unwrap(), DatabaseStats::default());
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_sim(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_sim(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
