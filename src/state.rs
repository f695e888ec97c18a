use std::sync::Arc;

use thiserror::Error;

use crate::core::errors::ApiError;
use crate::core::paths::AppPaths;
use crate::core::settings::{ConfigError, Settings};
use crate::embedding::build_embedder;
use crate::index::{DocumentIndex, IndexError, SqliteVectorStore};
use crate::llm::{build_provider, ModelProvider};
use crate::rag::RagEngine;
use crate::transcript::TranscriptStore;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("transcript store unavailable: {0}")]
    Transcript(#[source] ApiError),
    #[error("document index unavailable: {0}")]
    Index(#[from] IndexError),
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub paths: Arc<AppPaths>,
    pub transcript: TranscriptStore,
    pub index: Arc<DocumentIndex>,
    pub engine: Arc<RagEngine>,
    pub llm: Arc<dyn ModelProvider>,
}

impl AppState {
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let settings = Settings::from_env()?;
        let paths = Arc::new(AppPaths::new());

        let transcript = TranscriptStore::new(paths.transcript_db_path.clone())
            .await
            .map_err(InitializationError::Transcript)?;

        let store = Arc::new(SqliteVectorStore::with_path(paths.index_db_path.clone()).await?);
        let embedder = build_embedder(&settings);
        let llm = build_provider(&settings);

        let index = Arc::new(DocumentIndex::new(store, embedder));
        let engine = Arc::new(RagEngine::new(llm.clone(), index.clone(), settings.top_k));

        Ok(Arc::new(AppState {
            settings,
            paths,
            transcript,
            index,
            engine,
            llm,
        }))
    }
}
