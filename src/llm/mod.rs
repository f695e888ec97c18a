//! Text-generation backends behind a uniform provider trait.

pub mod ollama;
pub mod openai;
pub mod provider;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{build_provider, ModelProvider, ProviderError};
