use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{ModelProvider, ProviderError};

/// Decoding parameters for grounded answering. Deliberately conservative:
/// the model should restate the context, not improvise.
const TEMPERATURE: f32 = 0.0;
const TOP_P: f32 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 300;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client for any OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client,
        }
    }

    /// Payload for `/v1/chat/completions`. Strict endpoints reject
    /// unrecognized sampling fields, so only the portable ones are sent.
    fn request_body(&self, prompt: &str, system_prompt: Option<&str>) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
            "max_tokens": MAX_OUTPUT_TOKENS,
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request_body(prompt, system_prompt);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let payload: Value = res.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("missing choices[0].message.content".to_string())
            })
    }
}
