//! Read side of the persisted vector index.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A passage returned for one query, with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub passage_id: String,
    pub content: String,
    /// Document the passage was cut from (file name, URL, ...).
    pub source: String,
    pub metadata: Option<serde_json::Value>,
    /// Cosine similarity to the query (higher = better).
    pub score: f32,
}

/// A passage handed to an index builder before it has a score.
#[derive(Debug, Clone)]
pub struct NewPassage {
    pub passage_id: String,
    pub content: String,
    pub source: String,
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    /// Top `limit` passages by similarity, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;

    /// Vector dimension recorded when the index was built, if any.
    async fn dimension(&self) -> Result<Option<usize>, ApiError>;
}
