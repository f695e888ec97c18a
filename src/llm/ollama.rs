use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{ModelProvider, ProviderError};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client for a local Ollama instance.
#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        }
    }

    /// `/api/generate` takes a single prompt string, so a system
    /// instruction is prepended textually instead of as a separate role.
    fn compose_prompt(prompt: &str, system_prompt: Option<&str>) -> String {
        match system_prompt {
            Some(system) => format!("System: {}\n\nUser: {}", system, prompt),
            None => prompt.to_string(),
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let body = json!({
            "model": self.model,
            "prompt": Self::compose_prompt(prompt, system_prompt),
            "stream": false,
            "options": { "temperature": 0.0 },
        });

        let res = self.client.post(&url).json(&body).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let payload: Value = res.json().await?;
        payload["response"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ProviderError::MalformedResponse("missing response field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_is_prepended() {
        let composed = OllamaProvider::compose_prompt("What is Rust?", Some("Be brief."));
        assert_eq!(composed, "System: Be brief.\n\nUser: What is Rust?");
    }

    #[test]
    fn no_system_prompt_leaves_prompt_untouched() {
        let composed = OllamaProvider::compose_prompt("What is Rust?", None);
        assert_eq!(composed, "What is Rust?");
    }
}
