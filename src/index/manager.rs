//! DocumentIndex, the retrieval-facing view of the vector store.
//!
//! Owns an embedder and a store so callers deal in plain strings. Search
//! failures are absorbed into an empty result: retrieval going down should
//! degrade answers, not break the pipeline.

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;

use super::store::{DocChunk, IndexError, ScoredChunk, VectorStore};

pub struct DocumentIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl DocumentIndex {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// Top-k chunks for a text query, best first. Never fails: embedding or
    /// store errors are logged and produce an empty result.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        let embedding = match self.embedder.embed_query(query).await {
            Ok(embedding) => embedding,
            Err(err) => {
                tracing::warn!("similarity search skipped: query embedding failed: {}", err);
                return Vec::new();
            }
        };

        match self.store.search(&embedding, k).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!("similarity search failed: {}", err);
                Vec::new()
            }
        }
    }

    /// Embed and insert chunks; returns how many were stored.
    pub async fn add_documents(&self, chunks: Vec<DocChunk>) -> Result<usize, IndexError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;

        if embeddings.len() == chunks.len() {
            let items: Vec<_> = chunks.into_iter().zip(embeddings).collect();
            let stored = items.len();
            self.store.insert_batch(items).await?;
            return Ok(stored);
        }

        // The batch came back short, so positions no longer line up.
        // Re-embed one chunk at a time to keep every chunk paired with its
        // own vector.
        tracing::warn!(
            "batch embedding returned {} of {} vectors; re-embedding individually",
            embeddings.len(),
            chunks.len()
        );

        let mut items = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match self.embedder.embed_query(&chunk.text).await {
                Ok(embedding) => items.push((chunk, embedding)),
                Err(err) => {
                    tracing::warn!("skipping chunk {}: embedding failed: {}", chunk.id, err);
                }
            }
        }

        let stored = items.len();
        self.store.insert_batch(items).await?;
        Ok(stored)
    }

    pub async fn count(&self) -> Result<usize, IndexError> {
        self.store.count().await
    }

    pub async fn clear(&self) -> Result<usize, IndexError> {
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbedError;
    use crate::index::sqlite::SqliteVectorStore;
    use async_trait::async_trait;

    /// Maps fixed keywords to axis-aligned vectors; fails on texts marked
    /// with "!fail".
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            if text.contains("!fail") {
                return Err(EmbedError::MalformedResponse("scripted failure".into()));
            }
            if text.contains("alpha") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }
    }

    async fn test_index() -> DocumentIndex {
        let tmp = std::env::temp_dir().join(format!(
            "groundcrew-manager-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Arc::new(SqliteVectorStore::with_path(tmp).await.unwrap());
        DocumentIndex::new(store, Arc::new(KeywordEmbedder))
    }

    fn chunk(id: &str, text: &str) -> DocChunk {
        DocChunk {
            id: id.to_string(),
            text: text.to_string(),
            source: Some("doc.txt".to_string()),
            page: 0,
        }
    }

    #[tokio::test]
    async fn add_and_search_round_trip() {
        let index = test_index().await;

        let stored = index
            .add_documents(vec![chunk("c1", "alpha topic"), chunk("c2", "beta topic")])
            .await
            .unwrap();
        assert_eq!(stored, 2);

        let hits = index.similarity_search("alpha question", 1).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "c1");
    }

    #[tokio::test]
    async fn partial_embedding_failure_keeps_chunks_paired() {
        let index = test_index().await;

        let stored = index
            .add_documents(vec![
                chunk("c1", "alpha one"),
                chunk("c2", "broken !fail"),
                chunk("c3", "beta three"),
            ])
            .await
            .unwrap();
        assert_eq!(stored, 2);

        // c3 must still be retrievable under its own vector, not c2's slot.
        let hits = index.similarity_search("beta query", 1).await;
        assert_eq!(hits[0].chunk.id, "c3");
    }

    #[tokio::test]
    async fn failed_query_embedding_yields_empty_results() {
        let index = test_index().await;
        index
            .add_documents(vec![chunk("c1", "alpha one")])
            .await
            .unwrap();

        let hits = index.similarity_search("!fail query", 3).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let index = test_index().await;
        assert_eq!(index.add_documents(Vec::new()).await.unwrap(), 0);
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
