use std::sync::Arc;

use super::embedding::EmbeddingProvider;
use super::store::{KnowledgeIndex, RetrievedPassage};
use crate::core::errors::ApiError;

/// Embeds the query and returns the `top_k` nearest passages.
#[derive(Clone)]
pub struct VectorRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn KnowledgeIndex>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn KnowledgeIndex>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>, ApiError> {
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| ApiError::Internal("Embedding provider returned no vector".to_string()))?;

        self.index.search(&query_vector, self.top_k).await
    }
}
