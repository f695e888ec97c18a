//! Storage interface for the chunk index.
//!
//! The primary implementation is `SqliteVectorStore` in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::EmbedError;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Embed(#[from] EmbedError),
}

/// A chunk of source text stored with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocChunk {
    /// Unique chunk identifier.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Origin path or URL; `None` when unknown.
    pub source: Option<String>,
    /// Page number within the origin (0 for unpaged formats).
    pub page: i64,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocChunk,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embedding vectors in one transaction.
    async fn insert_batch(&self, items: Vec<(DocChunk, Vec<f32>)>) -> Result<(), IndexError>;

    /// Return the chunks most similar to the query embedding, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize, IndexError>;

    /// Remove every chunk; returns how many were deleted.
    async fn clear(&self) -> Result<usize, IndexError>;
}
