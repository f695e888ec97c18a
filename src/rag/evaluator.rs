//! LLM-judge scoring of generated answers.
//!
//! The judge is asked for a JSON-only verdict, but models wrap JSON in
//! prose often enough that extraction has to be forgiving. The ladder:
//! take the brace-delimited block if the regex finds one, otherwise the
//! trimmed raw output; a verdict that still fails to parse degrades to
//! score 0. Evaluation never fails the caller.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::llm::ModelProvider;

use super::prompts;

/// Judge verdict. Score runs 1-5; 0 marks a degraded (failed) evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationVerdict {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub reasoning: String,
}

pub struct ResponseEvaluator {
    llm: Arc<dyn ModelProvider>,
}

impl ResponseEvaluator {
    pub fn new(llm: Arc<dyn ModelProvider>) -> Self {
        Self { llm }
    }

    /// Score `response` against the context that produced it.
    pub async fn evaluate(
        &self,
        question: &str,
        response: &str,
        context: &str,
    ) -> EvaluationVerdict {
        let prompt = prompts::judge_prompt(question, response, context);

        match self.llm.evaluate(&prompt).await {
            Ok(raw) => parse_verdict(&raw),
            Err(err) => {
                tracing::warn!("evaluation call failed: {}", err);
                failed_verdict(err)
            }
        }
    }
}

fn json_block_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)\{.*\}").ok())
        .as_ref()
}

/// Pull a verdict out of raw judge output, however wrapped.
pub fn parse_verdict(raw: &str) -> EvaluationVerdict {
    let candidate = json_block_pattern()
        .and_then(|pattern| pattern.find(raw))
        .map(|m| m.as_str())
        .unwrap_or_else(|| raw.trim());

    match serde_json::from_str::<EvaluationVerdict>(candidate) {
        Ok(verdict) => verdict,
        Err(err) => {
            tracing::warn!("could not parse judge output: {}", err);
            failed_verdict(err)
        }
    }
}

fn failed_verdict<E: std::fmt::Display>(cause: E) -> EvaluationVerdict {
    EvaluationVerdict {
        score: 0,
        reasoning: format!("Evaluation failed: {}", cause),
    }
}
