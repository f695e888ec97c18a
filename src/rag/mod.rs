//! Retrieval-augmented generation.
//!
//! This module provides:
//! - `RagEngine`: condensation, retrieval, and grounded answering
//! - `ResponseEvaluator`: LLM-judge scoring of (question, answer, context)

pub mod engine;
pub mod evaluator;
pub mod history;
pub mod meta;
pub mod prompts;

mod tests;

pub use engine::{ChatReply, RagEngine};
pub use evaluator::{EvaluationVerdict, ResponseEvaluator};
pub use history::{format_history, ChatTurn, Role};
pub use meta::is_meta_question;
