use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Answer a question inside a session.
///
/// The engine sees the transcript as it stood before this turn; the user
/// turn and the assistant turn (with its sources) are appended afterwards.
/// Engine failures surface as the fixed apology answer, never as an HTTP
/// error; transcript failures do surface.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest(
            "question must not be empty".to_string(),
        ));
    }

    let history = state.transcript.chat_turns(&session_id).await?;
    let reply = state.engine.generate_response(question, &history).await;

    state
        .transcript
        .append_message(&session_id, Role::User, question, &[])
        .await?;
    state
        .transcript
        .append_message(&session_id, Role::Assistant, &reply.answer, &reply.sources)
        .await?;

    Ok(Json(reply))
}
