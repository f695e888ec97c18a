//! Text-embedding backends behind a uniform provider trait.

pub mod ollama;
pub mod openai;
pub mod truncate;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::settings::{ModelBackend, Settings};

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use truncate::TokenBudget;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("embedding backend returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embed a batch of documents. Resilient per item: a document whose
    /// embedding fails is logged and skipped, so the result can hold fewer
    /// vectors than `texts`.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            match self.embed_query(text).await {
                Ok(embedding) => embeddings.push(embedding),
                Err(err) => {
                    tracing::warn!(
                        "skipping document {} of {}: embedding failed: {}",
                        i + 1,
                        texts.len(),
                        err
                    );
                }
            }
        }
        Ok(embeddings)
    }
}

/// Build the embedder selected by the settings.
pub fn build_embedder(settings: &Settings) -> Arc<dyn EmbeddingProvider> {
    let budget = TokenBudget::new(
        settings.embed_max_tokens,
        settings.tokenizer_path.as_deref(),
    );

    match settings.backend {
        ModelBackend::Remote => Arc::new(OpenAiEmbedder::new(
            settings.remote_base_url.clone(),
            settings.remote_api_key.clone().unwrap_or_default(),
            settings.remote_embed_model.clone(),
            budget,
        )),
        ModelBackend::Local => Arc::new(OllamaEmbedder::new(
            settings.ollama_url.clone(),
            settings.local_embed_model.clone(),
            budget,
        )),
    }
}
