use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub title: Option<String>,
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.transcript.list_sessions().await?;
    Ok(Json(json!({ "sessions": sessions })))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = state.transcript.create_session(payload.title).await?;
    let session = state.transcript.get_session(&session_id).await?;
    Ok(Json(json!({ "session": session })))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.transcript.delete_session(&session_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!(
            "Session {} not found",
            session_id
        )));
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn get_session_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .transcript
        .get_session(&session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", session_id)))?;

    // limit=0 (the default) returns the whole transcript.
    let limit = params
        .get("limit")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);

    let messages = state.transcript.messages(&session_id, limit).await?;
    Ok(Json(json!({ "messages": messages })))
}
