//! The retrieval-augmented answer pipeline.
//!
//! One call resolves one question: condense the query against the
//! conversation history, retrieve (or short-circuit for meta-questions),
//! then generate a grounded answer with the original question. Every
//! recoverable failure degrades the answer instead of surfacing an error;
//! `generate_response` is infallible by contract.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::index::DocumentIndex;
use crate::llm::ModelProvider;

use super::history::{format_history, ChatTurn};
use super::meta::is_meta_question;
use super::prompts::{
    self, FALLBACK_ANSWER, MEMORY_SOURCE, META_QUESTION_CONTEXT, NO_DOCUMENTS_CONTEXT,
};

/// Label shown when a chunk carries no source metadata.
const UNKNOWN_SOURCE: &str = "Unknown";

/// A grounded answer with its attributed sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    pub sources: Vec<String>,
}

pub struct RagEngine {
    llm: Arc<dyn ModelProvider>,
    index: Arc<DocumentIndex>,
    top_k: usize,
}

impl RagEngine {
    pub fn new(llm: Arc<dyn ModelProvider>, index: Arc<DocumentIndex>, top_k: usize) -> Self {
        Self { llm, index, top_k }
    }

    /// Answer `question` given the session history as it stood before this
    /// turn. Never fails: the worst outcome is the fixed fallback answer.
    pub async fn generate_response(&self, question: &str, history: &[ChatTurn]) -> ChatReply {
        tracing::info!("generating response ({} history turns)", history.len());

        let formatted_history = format_history(history);
        let search_query = self.condense_query(question, history, &formatted_history).await;
        let (context, sources) = self.gather_context(&search_query).await;

        // The original question goes into the prompt; the condensed query
        // was only ever for retrieval.
        let prompt = prompts::answer_prompt(&formatted_history, &context, question);

        match self.llm.generate(&prompt, None).await {
            Ok(answer) => ChatReply { answer, sources },
            Err(err) => {
                tracing::error!("answer generation failed: {}", err);
                ChatReply {
                    answer: FALLBACK_ANSWER.to_string(),
                    sources: Vec::new(),
                }
            }
        }
    }

    /// First turn searches with the raw question; later turns ask the model
    /// for a standalone rewrite. A failed or empty rewrite falls back to
    /// the raw question.
    async fn condense_query(
        &self,
        question: &str,
        history: &[ChatTurn],
        formatted_history: &str,
    ) -> String {
        if history.is_empty() {
            return question.to_string();
        }

        let prompt = prompts::condense_query_prompt(formatted_history, question);
        match self.llm.generate(&prompt, None).await {
            Ok(rewritten) => {
                let rewritten = rewritten.trim();
                if rewritten.is_empty() {
                    question.to_string()
                } else {
                    tracing::debug!("condensed search query: {}", rewritten);
                    rewritten.to_string()
                }
            }
            Err(err) => {
                tracing::warn!("query condensation failed, using raw question: {}", err);
                question.to_string()
            }
        }
    }

    /// Build the context block and the deduplicated, sorted source list.
    async fn gather_context(&self, search_query: &str) -> (String, Vec<String>) {
        if is_meta_question(search_query) {
            tracing::info!("meta-question detected, skipping retrieval");
            return (
                META_QUESTION_CONTEXT.to_string(),
                vec![MEMORY_SOURCE.to_string()],
            );
        }

        let hits = self.index.similarity_search(search_query, self.top_k).await;
        if hits.is_empty() {
            tracing::info!("no documents retrieved for query");
            return (NO_DOCUMENTS_CONTEXT.to_string(), Vec::new());
        }

        tracing::info!("retrieved {} chunks", hits.len());

        let context = hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let sources: Vec<String> = hits
            .iter()
            .map(|hit| display_name(hit.chunk.source.as_deref()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        (context, sources)
    }
}

/// Reduce a source path or URL to its basename for display.
fn display_name(source: Option<&str>) -> String {
    match source {
        Some(source) => source
            .trim_end_matches('/')
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(source)
            .to_string(),
        None => UNKNOWN_SOURCE.to_string(),
    }
}
