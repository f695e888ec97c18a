use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::settings::{ModelBackend, Settings};

use super::ollama::OllamaProvider;
use super::openai::OpenAiProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model backend returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// Uniform interface over a text-generation backend.
///
/// Implementations return typed errors and never decide recoverability;
/// that is the caller's job.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// return the provider name (e.g. "ollama", "openai")
    fn name(&self) -> &str;

    /// single-shot completion, optionally steered by a system instruction
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// completion used for judging; same contract as `generate`
    async fn evaluate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.generate(prompt, None).await
    }
}

/// Build the provider selected by the settings.
pub fn build_provider(settings: &Settings) -> Arc<dyn ModelProvider> {
    match settings.backend {
        ModelBackend::Remote => Arc::new(OpenAiProvider::new(
            settings.remote_base_url.clone(),
            settings.remote_api_key.clone().unwrap_or_default(),
            settings.remote_model.clone(),
        )),
        ModelBackend::Local => Arc::new(OllamaProvider::new(
            settings.ollama_url.clone(),
            settings.local_model.clone(),
        )),
    }
}
