use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::truncate::TokenBudget;
use super::{EmbedError, EmbeddingProvider};

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Client for the Ollama embeddings endpoint.
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    budget: TokenBudget,
    client: Client,
}

impl OllamaEmbedder {
    pub fn new(base_url: String, model: String, budget: TokenBudget) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            budget,
            client,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let input = self.budget.clamp(text);

        let body = json!({
            "model": self.model,
            "prompt": input.as_ref(),
        });

        let res = self.client.post(&url).json(&body).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(EmbedError::Api { status, body });
        }

        let payload: Value = res.json().await?;
        let values = payload["embedding"]
            .as_array()
            .ok_or_else(|| EmbedError::MalformedResponse("missing embedding field".to_string()))?;

        Ok(values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect())
    }
}
