//! SQLite-backed knowledge index.
//!
//! Passages and their embeddings live in one SQLite file; search is a
//! brute-force cosine scan over every stored vector.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{KnowledgeIndex, NewPassage, RetrievedPassage};
use crate::core::errors::ApiError;

const META_EMBEDDING_DIM: &str = "embedding_dim";
const META_EMBEDDING_MODEL: &str = "embedding_model";

pub struct SqliteKnowledgeIndex {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteKnowledgeIndex {
    /// Opens an existing index. A missing file is an error, never an empty index.
    pub async fn open(db_path: &Path) -> Result<Self, ApiError> {
        if !db_path.exists() {
            return Err(ApiError::Internal(format!(
                "Knowledge index not found at {}",
                db_path.display()
            )));
        }
        let index = Self::connect(db_path, false).await?;
        index.init_schema().await?;
        Ok(index)
    }

    /// Creates (or reopens) an index for `embedding_model`.
    pub async fn create(db_path: &Path, embedding_model: &str) -> Result<Self, ApiError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(ApiError::internal)?;
        }
        let index = Self::connect(db_path, true).await?;
        index.init_schema().await?;
        index.set_meta(META_EMBEDDING_MODEL, embedding_model).await?;
        Ok(index)
    }

    async fn connect(db_path: &Path, create: bool) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS passages (
                passage_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                metadata TEXT DEFAULT '{}',
                embedding BLOB
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub async fn embedding_model(&self) -> Result<Option<String>, ApiError> {
        self.get_meta(META_EMBEDDING_MODEL).await
    }

    /// Adds passages with their vectors. All vectors must share the index's
    /// dimension; the first batch into an empty index fixes it.
    pub async fn insert_batch(&self, items: Vec<(NewPassage, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let expected = match self.dimension().await? {
            Some(dim) => dim,
            None => items[0].1.len(),
        };
        if let Some((passage, embedding)) = items.iter().find(|(_, e)| e.len() != expected) {
            return Err(ApiError::BadRequest(format!(
                "Embedding for passage {} has dimension {}, index expects {}",
                passage.passage_id,
                embedding.len(),
                expected
            )));
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (passage, embedding) in &items {
            let blob = serialize_embedding(embedding);
            let metadata_str = passage
                .metadata
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "{}".to_string());

            sqlx::query(
                "INSERT OR REPLACE INTO passages (passage_id, content, source, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&passage.passage_id)
            .bind(&passage.content)
            .bind(&passage.source)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        sqlx::query("INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)")
            .bind(META_EMBEDDING_DIM)
            .bind(expected.to_string())
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>, ApiError> {
        let row = sqlx::query("SELECT value FROM index_meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError> {
        sqlx::query("INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }

    fn row_to_passage(row: &sqlx::sqlite::SqliteRow, score: f32) -> RetrievedPassage {
        let metadata_str: Option<String> = row.get("metadata");
        let metadata = metadata_str
            .and_then(|s| serde_json::from_str::<Value>(&s).ok())
            .filter(|v| !matches!(v, Value::Object(map) if map.is_empty()));

        RetrievedPassage {
            passage_id: row.get("passage_id"),
            content: row.get("content"),
            source: row.get("source"),
            metadata,
            score,
        }
    }
}

#[async_trait]
impl KnowledgeIndex for SqliteKnowledgeIndex {
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, ApiError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT passage_id, content, source, metadata, embedding
             FROM passages
             ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<RetrievedPassage> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Option<Vec<u8>> = row.get("embedding");
                let embedding_bytes = embedding_bytes.filter(|b| !b.is_empty())?;
                let stored = deserialize_embedding(&embedding_bytes);
                let score = cosine_similarity(query_embedding, &stored);
                Some(Self::row_to_passage(row, score))
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM passages")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        let cnt: i64 = row.get("cnt");
        Ok(cnt as usize)
    }

    async fn dimension(&self) -> Result<Option<usize>, ApiError> {
        Ok(self
            .get_meta(META_EMBEDDING_DIM)
            .await?
            .and_then(|v| v.parse::<usize>().ok()))
    }
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, content: &str) -> NewPassage {
        NewPassage {
            passage_id: id.to_string(),
            content: content.to_string(),
            source: "medical-encyclopedia.pdf".to_string(),
            metadata: Some(serde_json::json!({ "page": 12 })),
        }
    }

    async fn seeded_index(dir: &Path) -> SqliteKnowledgeIndex {
        let index = SqliteKnowledgeIndex::create(&dir.join("index.db"), "mini-lm")
            .await
            .unwrap();
        index
            .insert_batch(vec![
                (passage("flu", "Influenza is a viral infection."), vec![1.0, 0.0, 0.0]),
                (passage("acne", "Acne is a skin condition."), vec![0.0, 1.0, 0.0]),
                (passage("cold", "The common cold is viral."), vec![0.9, 0.1, 0.0]),
                (passage("gout", "Gout affects joints."), vec![0.0, 0.0, 1.0]),
            ])
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn search_returns_best_matches_first() {
        let tmp = tempfile::tempdir().unwrap();
        let index = seeded_index(tmp.path()).await;

        let results = index.search(&[1.0, 0.05, 0.0], 3).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].passage_id, "flu");
        assert_eq!(results[1].passage_id, "cold");
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
        assert_eq!(results[0].source, "medical-encyclopedia.pdf");
        assert_eq!(results[0].metadata, Some(serde_json::json!({ "page": 12 })));
    }

    #[tokio::test]
    async fn search_respects_limit_and_ties_keep_insertion_order() {
        let tmp = tempfile::tempdir().unwrap();
        let index = SqliteKnowledgeIndex::create(&tmp.path().join("ties.db"), "m")
            .await
            .unwrap();
        index
            .insert_batch(vec![
                (passage("a", "first"), vec![1.0, 0.0]),
                (passage("b", "second"), vec![1.0, 0.0]),
                (passage("c", "third"), vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|p| p.passage_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(index.search(&[1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_refuses_missing_index() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.db");

        let result = SqliteKnowledgeIndex::open(&missing).await;

        assert!(result.is_err());
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn reopen_preserves_passages_and_meta() {
        let tmp = tempfile::tempdir().unwrap();
        let path = {
            let index = seeded_index(tmp.path()).await;
            index.path().to_path_buf()
        };

        let reopened = SqliteKnowledgeIndex::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 4);
        assert_eq!(reopened.dimension().await.unwrap(), Some(3));
        assert_eq!(
            reopened.embedding_model().await.unwrap().as_deref(),
            Some("mini-lm")
        );
    }

    #[tokio::test]
    async fn insert_rejects_mismatched_dimension() {
        let tmp = tempfile::tempdir().unwrap();
        let index = seeded_index(tmp.path()).await;

        let err = index
            .insert_batch(vec![(passage("bad", "wrong size"), vec![1.0, 0.0])])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(index.count().await.unwrap(), 4);
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn embedding_blob_roundtrip() {
        let vector = vec![0.25_f32, -1.5, 3.0];
        assert_eq!(deserialize_embedding(&serialize_embedding(&vector)), vector);
    }
}
