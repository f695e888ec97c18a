//! Environment-driven settings.
//!
//! Everything is read once at startup; nothing re-reads the environment
//! mid-session. Bad values are configuration errors, not silent defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

/// Which model backend serves generation and embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// Local Ollama instance.
    Local,
    /// Remote OpenAI-compatible endpoint.
    Remote,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: ModelBackend,

    pub remote_base_url: String,
    pub remote_api_key: Option<String>,
    pub remote_model: String,
    pub remote_embed_model: String,

    pub ollama_url: String,
    pub local_model: String,
    pub local_embed_model: String,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,

    pub embed_max_tokens: usize,
    pub tokenizer_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = parse_backend("GROUNDCREW_MODEL_BACKEND", var("GROUNDCREW_MODEL_BACKEND"))?;

        let remote_api_key = var("GROUNDCREW_REMOTE_API_KEY");
        if backend == ModelBackend::Remote && remote_api_key.is_none() {
            return Err(ConfigError::MissingVar("GROUNDCREW_REMOTE_API_KEY"));
        }

        Ok(Settings {
            backend,
            remote_base_url: var("GROUNDCREW_REMOTE_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            remote_api_key,
            remote_model: var("GROUNDCREW_REMOTE_MODEL")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            remote_embed_model: var("GROUNDCREW_REMOTE_EMBED_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            ollama_url: var("GROUNDCREW_OLLAMA_URL")
                .unwrap_or_else(|| "http://127.0.0.1:11434".to_string()),
            local_model: var("GROUNDCREW_LOCAL_MODEL").unwrap_or_else(|| "llama3".to_string()),
            local_embed_model: var("GROUNDCREW_LOCAL_EMBED_MODEL")
                .unwrap_or_else(|| "nomic-embed-text".to_string()),
            chunk_size: parse_num("GROUNDCREW_CHUNK_SIZE", var("GROUNDCREW_CHUNK_SIZE"), 1000)?,
            chunk_overlap: parse_num(
                "GROUNDCREW_CHUNK_OVERLAP",
                var("GROUNDCREW_CHUNK_OVERLAP"),
                200,
            )?,
            top_k: parse_num("GROUNDCREW_TOP_K", var("GROUNDCREW_TOP_K"), 3)?,
            embed_max_tokens: parse_num(
                "GROUNDCREW_EMBED_MAX_TOKENS",
                var("GROUNDCREW_EMBED_MAX_TOKENS"),
                8000,
            )?,
            tokenizer_path: var("GROUNDCREW_TOKENIZER_PATH").map(PathBuf::from),
        })
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_backend(
    name: &'static str,
    raw: Option<String>,
) -> Result<ModelBackend, ConfigError> {
    match raw.as_deref() {
        None => Ok(ModelBackend::Local),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "local" | "ollama" => Ok(ModelBackend::Local),
            "remote" | "openai" => Ok(ModelBackend::Remote),
            _ => Err(ConfigError::InvalidValue {
                var: name,
                value: value.to_string(),
            }),
        },
    }
}

fn parse_num<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name,
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing_accepts_aliases() {
        assert_eq!(
            parse_backend("X", Some("Remote".into())).unwrap(),
            ModelBackend::Remote
        );
        assert_eq!(
            parse_backend("X", Some("ollama".into())).unwrap(),
            ModelBackend::Local
        );
        assert_eq!(parse_backend("X", None).unwrap(), ModelBackend::Local);
        assert!(parse_backend("X", Some("bedrock2".into())).is_err());
    }

    #[test]
    fn numeric_parsing_rejects_garbage() {
        assert_eq!(parse_num("X", None, 1000usize).unwrap(), 1000);
        assert_eq!(parse_num("X", Some("250".into()), 1000usize).unwrap(), 250);
        assert!(parse_num("X", Some("lots".into()), 1000usize).is_err());
    }
}
