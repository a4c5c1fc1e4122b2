//! Retrieval-augmented generation pipeline.
//!
//! - `EmbeddingProvider`: hosted text → vector
//! - `KnowledgeIndex` / `SqliteKnowledgeIndex`: persisted passages + vectors
//! - `VectorRetriever`: top-k lookup for a query
//! - `RetrievalQa`: retrieve, stuff into a prompt, generate

mod chain;
pub mod embedding;
mod prompt;
mod retriever;
mod sqlite;
mod store;

pub use chain::{QaOutput, RetrievalQa};
pub use embedding::{EmbeddingProvider, HuggingFaceEmbeddings, OpenAiCompatibleEmbeddings};
pub use prompt::PromptTemplate;
pub use retriever::VectorRetriever;
pub use sqlite::SqliteKnowledgeIndex;
pub use store::{KnowledgeIndex, NewPassage, RetrievedPassage};
